use super::Estimator;

/// Krichevsky–Trofimov estimator backed by two growable prefix tables.
///
/// `ln_half[k] = ln((1/2)(3/2)..(k - 1/2))` and `ln_factorial[n] = ln n!`, so
/// `ln kt(a, b) = ln_half[a] + ln_half[b] - ln_factorial[a + b]`.
/// Memory is linear in the largest reserved total instead of quadratic.
#[derive(Debug, Clone)]
pub struct KtTable {
    ln_half: Vec<f64>,
    ln_factorial: Vec<f64>,
}

impl KtTable {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(total: u32) -> Self {
        let mut table = Self { ln_half: vec![0.0], ln_factorial: vec![0.0] };
        table.reserve(total);
        table
    }

    /// Largest total count the table answers for.
    pub fn max_total(&self) -> u32 {
        // both tables always have the same length, which is at least 1
        u32::try_from(self.ln_factorial.len() - 1).unwrap_or(u32::MAX)
    }
}

impl Default for KtTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for KtTable {
    fn reserve(&mut self, total: u32) {
        let len = total as usize + 1;
        if self.ln_factorial.len() >= len {
            return;
        }

        self.ln_half.reserve(len - self.ln_half.len());
        self.ln_factorial.reserve(len - self.ln_factorial.len());
        for k in self.ln_factorial.len()..len {
            let prev_half = self.ln_half[k - 1];
            let prev_fact = self.ln_factorial[k - 1];
            self.ln_half.push(prev_half + (k as f64 - 0.5).ln());
            self.ln_factorial.push(prev_fact + (k as f64).ln());
        }
    }

    fn ln_probability(&self, zeros: u32, ones: u32) -> f64 {
        let (a, b) = (zeros as usize, ones as usize);
        debug_assert!(a + b < self.ln_factorial.len(), "KT lookup past reserved total");
        self.ln_half[a] + self.ln_half[b] - self.ln_factorial[a + b]
    }
}
