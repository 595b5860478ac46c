//! Frames-per-second counter

/// Counts frames and recomputes the rate about once per second
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    time: f32,
    count: u32,
    fps: u32,
}

impl FpsCounter {
    /// Record one frame that took `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.count += 1;
        self.time += dt;
        if self.time >= 1.0 {
            self.fps = (self.count as f32 / self.time).round() as u32;
            self.time = 0.0;
            self.count = 0;
        }
    }

    /// Rate measured over the last full window, 0 before the first one
    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
