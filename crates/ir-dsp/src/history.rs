//! Rolling input history for direct convolution
//!
//! Layout of the backing buffer:
//!
//! ```text
//! [ ... stale ... | past (required) | new block | free ... ]
//!                  ^                 ^
//!                  cursor - required cursor
//! ```
//!
//! Invariant: at the start of every block the `required` samples right
//! before `cursor` are the most recent `required` input samples (zeros
//! before any audio arrived).

use ir_core::{Sample, Tap};

/// Headroom reserved beyond one block so compaction runs rarely
const MIN_BLOCK_HEADROOM: usize = 4096;

/// Growable append-with-compaction history of past input samples
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    buffer: Vec<Tap>,
    /// Samples of past context needed for each output frame
    required: usize,
    /// First index of the current block
    cursor: usize,
}

impl HistoryBuffer {
    pub fn new(required: usize) -> Self {
        Self {
            buffer: vec![0.0; required + MIN_BLOCK_HEADROOM],
            required,
            cursor: required,
        }
    }

    /// Number of past samples each window carries
    #[inline]
    pub fn required(&self) -> usize {
        self.required
    }

    /// Current buffer length (grows, never shrinks)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Make room for a block of `frames` samples after the cursor.
    ///
    /// Moves the retained tail to the front when the block would overrun,
    /// and only reallocates if `required + frames` exceeds the buffer.
    pub fn reserve(&mut self, frames: usize) {
        if self.cursor + frames <= self.buffer.len() {
            return;
        }

        let start = self.cursor - self.required;
        self.buffer.copy_within(start..self.cursor, 0);
        self.cursor = self.required;

        let needed = self.required + frames;
        if needed > self.buffer.len() {
            self.buffer.resize(self.required + frames.max(MIN_BLOCK_HEADROOM) * 2, 0.0);
        }
    }

    /// Write a block at the cursor. Does not advance.
    pub fn push_block(&mut self, block: &[Sample]) {
        self.reserve(block.len());
        let dest = &mut self.buffer[self.cursor..self.cursor + block.len()];
        for (d, &s) in dest.iter_mut().zip(block) {
            *d = s as Tap;
        }
    }

    /// The `required + 1` samples ending at frame `frame` of the current
    /// block, oldest first.
    #[inline]
    pub fn window(&self, frame: usize) -> &[Tap] {
        let start = self.cursor - self.required + frame;
        &self.buffer[start..=self.cursor + frame]
    }

    /// Mark `frames` samples of the current block as past.
    #[inline]
    pub fn advance(&mut self, frames: usize) {
        self.cursor += frames;
    }

    /// The retained past context, oldest first.
    #[inline]
    pub fn past(&self) -> &[Tap] {
        &self.buffer[self.cursor - self.required..self.cursor]
    }

    /// Forget all input.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.cursor = self.required;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_zero_history() {
        let history = HistoryBuffer::new(3);
        assert_eq!(history.past(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_window_covers_past_and_current() {
        let mut history = HistoryBuffer::new(2);
        history.push_block(&[1.0, 2.0, 3.0]);
        assert_eq!(history.window(0), &[0.0, 0.0, 1.0]);
        assert_eq!(history.window(2), &[1.0, 2.0, 3.0]);
        history.advance(3);

        history.push_block(&[4.0]);
        assert_eq!(history.window(0), &[2.0, 3.0, 4.0]);
        history.advance(1);
        assert_eq!(history.past(), &[3.0, 4.0]);
    }

    #[test]
    fn test_compaction_keeps_tail() {
        let mut history = HistoryBuffer::new(4);
        let capacity = history.capacity();

        let mut next = 0.0;
        // Push well past the initial capacity in odd-sized blocks
        for _ in 0..(capacity / 7) * 3 {
            let block: Vec<f64> = (0..7)
                .map(|_| {
                    next += 1.0;
                    next
                })
                .collect();
            history.push_block(&block);
            history.advance(block.len());
        }

        let tail: Vec<f32> = (0..4).map(|i| (next - 3.0 + i as f64) as f32).collect();
        assert_eq!(history.past(), tail.as_slice());
        assert_eq!(history.capacity(), capacity, "steady-state blocks must not grow");
    }

    #[test]
    fn test_grows_for_large_blocks() {
        let mut history = HistoryBuffer::new(1);
        history.push_block(&[0.5; 3]);
        history.advance(3);

        let big = vec![0.25; MIN_BLOCK_HEADROOM * 3];
        history.push_block(&big);
        assert!(history.capacity() >= 1 + big.len());
        assert_eq!(history.window(0), &[0.5, 0.25]);

        history.advance(big.len());
        let grown = history.capacity();
        history.push_block(&[0.0; 16]);
        assert_eq!(history.capacity(), grown);
    }

    #[test]
    fn test_zero_required_is_single_sample_window() {
        let mut history = HistoryBuffer::new(0);
        history.push_block(&[0.5, -0.5]);
        assert_eq!(history.window(1), &[-0.5]);
        assert!(history.past().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryBuffer::new(2);
        history.push_block(&[1.0, 2.0]);
        history.advance(2);
        history.clear();
        assert_eq!(history.past(), &[0.0, 0.0]);
    }
}
