/// Bits of `byte`, MSB first.
pub fn bits_of(byte: u8) -> impl Iterator<Item = u8> {
    (0..8).rev().map(move |shift| (byte >> shift) & 1)
}

/// Ideal code length of a predicted bit sequence, what an exact entropy
/// coder would spend on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeLength {
    bits: f64,
    count: u64,
}

impl CodeLength {
    pub fn new() -> Self {
        Self { bits: 0.0, count: 0 }
    }

    /// Charges `bit` given the predicted probability `p1` of a `1`.
    pub fn add(&mut self, bit: u8, p1: f64) {
        let p = if bit == 1 { p1 } else { 1.0 - p1 };
        self.bits -= p.log2();
        self.count += 1;
    }

    /// Same as `add`, for a 16-bit prediction.
    pub fn add_quantized(&mut self, bit: u8, p1: u16) {
        self.add(bit, f64::from(p1) / 65536.0);
    }

    pub fn bits(&self) -> f64 {
        self.bits
    }

    /// Bytes in compressed size roughly
    pub fn result(&self) -> u64 {
        (self.bits / 8.0).ceil() as u64
    }

    /// Bits charged so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_msb_first() {
        let bits: Vec<u8> = bits_of(0b1010_0011).collect();
        assert_eq!(bits, [1, 0, 1, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn coin_flips_cost_one_bit_each() {
        let mut stats = CodeLength::new();
        for byte in [0x00u8, 0xff, 0x5a] {
            for bit in bits_of(byte) {
                stats.add_quantized(bit, 32768);
            }
        }
        assert_eq!(stats.count(), 24);
        assert!((stats.bits() - 24.0).abs() < 1e-12);
        assert_eq!(stats.result(), 3);
    }

    #[test]
    fn confident_predictions_are_cheap() {
        let mut stats = CodeLength::new();
        stats.add(1, 0.75);
        stats.add(0, 0.75);
        assert!((stats.bits() - (-(0.75f64).log2() + 2.0)).abs() < 1e-12);
    }
}
