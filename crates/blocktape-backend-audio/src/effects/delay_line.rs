//! Ring buffer for the echo stage.

/// Fixed-size ring buffer read at an integer delay.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
}

impl DelayLine {
    /// Creates a delay line holding up to `max_samples` samples.
    pub fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(4)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn write(&mut self, sample: f64) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Sample written `delay_samples` writes ago (1 is the most recent).
    /// Delays beyond the capacity are clamped.
    pub fn read(&self, delay_samples: usize) -> f64 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1, len);
        self.buffer[(self.write_pos + len - delay) % len]
    }
}
