mod kt_table;

pub use self::kt_table::*;

/// Probability of an exact binary sequence, known only by its counts.
///
/// The tree calls `reserve` with the largest total it's about to query, so an
/// implementation backed by a table can grow before any lookup.
pub trait Estimator {
    fn reserve(&mut self, total: u32);
    fn ln_probability(&self, zeros: u32, ones: u32) -> f64;

    fn probability(&self, zeros: u32, ones: u32) -> f64 {
        self.ln_probability(zeros, ones).exp()
    }
}
