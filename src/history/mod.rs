pub trait History {
    fn update(&mut self, bit: u8);
    /// The context the next bit is predicted in, oldest bit first.
    fn context(&self) -> &[u8];
}

/// The last `depth` bits of a stream, oldest first.
///
/// Bits before the start of the stream read as `0`, so the very first
/// context is all zeroes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextWindow {
    bits: Vec<u8>,
}

impl ContextWindow {
    pub fn new(depth: usize) -> Self {
        Self { bits: vec![0; depth] }
    }

    pub fn depth(&self) -> usize {
        self.bits.len()
    }
}

impl History for ContextWindow {
    fn update(&mut self, bit: u8) {
        debug_assert!(bit <= 1, "Provided value wasn't a valid bit");
        if let Some(last) = self.bits.len().checked_sub(1) {
            self.bits.copy_within(1.., 0);
            self.bits[last] = bit;
        }
    }

    fn context(&self) -> &[u8] {
        &self.bits
    }
}
