use std::collections::VecDeque;

const SAMPLE_COUNT: usize = 60;

/// Rolling frame timing for the bot loop.
pub struct FrameStats {
    frame_times: VecDeque<f32>,
    fps: f32,
    frames: u64,
    ticks: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(SAMPLE_COUNT),
            fps: 0.0,
            frames: 0,
            ticks: 0,
        }
    }

    pub fn record_frame(&mut self, dt: f32) {
        self.frames += 1;
        if dt <= 0.0 {
            return;
        }

        if self.frame_times.len() >= SAMPLE_COUNT {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt);

        let avg_dt: f32 = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        self.fps = 1.0 / avg_dt;
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
