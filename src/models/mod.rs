pub mod ctw;

pub use self::ctw::*;

use crate::error::Result;

/// A bit predictor driven one bit at a time: `predict`, then `update` with
/// the bit that actually came.
pub trait Model {
    /// Probability of a `1` scaled to 16 bits, never `0`.
    fn predict(&self) -> u16;
    fn update(&mut self, bit: u8) -> Result<()>;
}

/// Quantizes a probability to the 16-bit scale used by [`Model::predict`].
pub fn quantize(p: f64) -> u16 {
    (p * 65536.0).round().clamp(1.0, 65535.0) as u16
}
