/// Tumbling-window average used for speed and altitude smoothing.
///
/// Samples accumulate until the window is full, then one mean is emitted and
/// the window starts over empty. Nothing is emitted between completions, so
/// the displayed value holds steady for `window_size` samples.
#[derive(Clone, Debug)]
pub struct WindowAverager {
    sum: f64,
    count: usize,
    window_size: usize,
}

impl WindowAverager {
    /// Create a new averager emitting every `window_size` samples (min 1)
    pub fn new(window_size: usize) -> Self {
        WindowAverager {
            sum: 0.0,
            count: 0,
            window_size: window_size.max(1),
        }
    }

    /// Add a sample. Returns the window mean when this sample completes it.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.sum += value;
        self.count += 1;

        if self.count < self.window_size {
            return None;
        }

        let mean = self.sum / self.count as f64;
        self.reset();
        Some(mean)
    }

    /// Drop any partially filled window
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }

    /// Samples in the current, incomplete window
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Running sum of the current window
    pub fn sum(&self) -> f64 {
        self.sum
    }
}
