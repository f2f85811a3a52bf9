//! Stroke sequence numbers.

/// Hands out strictly increasing stroke sequence numbers for one context.
///
/// Sequence numbers order strokes for drawing; they say nothing about when a
/// remote peer received them.
#[derive(Debug, Clone, Default)]
pub struct SequenceAllocator {
    next: u64,
}

impl SequenceAllocator {
    /// Starts at 1 so that 0 can mean "none".
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next sequence number.
    pub fn allocate(&mut self) -> u64 {
        let sequence = self.next.max(1);
        self.next = sequence.saturating_add(1);
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_strictly_increase() {
        let mut alloc = SequenceAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        assert!(a < b && b < c);
        assert_eq!(a, 1);
    }

    #[test]
    fn default_never_hands_out_zero() {
        let mut alloc = SequenceAllocator::default();
        assert_eq!(alloc.allocate(), 1);
    }
}
