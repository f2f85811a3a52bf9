//! Reusable payload scratch buffers.

/// Pool of fixed-size byte buffers for compressing Update payloads.
///
/// A buffer is acquired before compressing a batch and released as soon as
/// the synchronous send returns, so steady-state sending does not allocate.
#[derive(Debug)]
pub struct PayloadPool {
    buffer_len: usize,
    max_pooled: usize,
    free: Vec<Vec<u8>>,
    allocations: usize,
}

impl PayloadPool {
    /// Creates an empty pool handing out buffers of `buffer_len` bytes.
    #[must_use]
    pub const fn new(buffer_len: usize, max_pooled: usize) -> Self {
        Self {
            buffer_len,
            max_pooled,
            free: Vec::new(),
            allocations: 0,
        }
    }

    /// Length of every buffer handed out.
    #[must_use]
    pub const fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Takes a buffer from the pool, allocating one if none is free.
    pub fn acquire(&mut self) -> Vec<u8> {
        if let Some(buf) = self.free.pop() {
            return buf;
        }
        self.allocations += 1;
        vec![0u8; self.buffer_len]
    }

    /// Returns a buffer to the pool.
    ///
    /// Buffers of the wrong length, or beyond `max_pooled`, are dropped.
    pub fn release(&mut self, buf: Vec<u8>) {
        if buf.len() == self.buffer_len && self.free.len() < self.max_pooled {
            self.free.push(buf);
        }
    }

    /// Buffers currently idle in the pool.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Buffers allocated over the pool's lifetime.
    #[must_use]
    pub const fn allocations(&self) -> usize {
        self.allocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_allocates_when_empty() {
        let mut pool = PayloadPool::new(16, 4);
        let buf = pool.acquire();
        assert_eq!(buf.len(), 16);
        assert_eq!(pool.allocations(), 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn released_buffers_are_reused() {
        let mut pool = PayloadPool::new(16, 4);
        for _ in 0..10 {
            let buf = pool.acquire();
            pool.release(buf);
        }
        assert_eq!(pool.allocations(), 1);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn release_respects_capacity_and_length() {
        let mut pool = PayloadPool::new(8, 1);
        pool.release(vec![0u8; 8]);
        pool.release(vec![0u8; 8]);
        assert_eq!(pool.idle(), 1);
        pool.release(vec![0u8; 3]);
        assert_eq!(pool.idle(), 1);
    }
}
