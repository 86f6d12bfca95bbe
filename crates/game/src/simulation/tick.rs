/// Fixed-rate accumulator. The arena uses it to pace state publishing, the
/// headless client to pace its frames.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate.max(1) as f32,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(0.25);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    /// Consumes every pending tick and reports whether there was at least one.
    pub fn consume_all(&mut self) -> bool {
        let mut ticked = false;
        while self.consume_tick() {
            ticked = true;
        }
        ticked
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_whole_ticks() {
        let mut step = FixedTimestep::new(20);
        step.accumulate(0.03);
        assert!(!step.consume_tick());
        step.accumulate(0.03);
        assert!(step.consume_tick());
        assert!(!step.consume_tick());
    }

    #[test]
    fn spiral_clamped() {
        let mut step = FixedTimestep::new(8);
        step.accumulate(10.0);
        let mut ticks = 0;
        while step.consume_tick() {
            ticks += 1;
        }
        assert_eq!(ticks, 2);
    }

    #[test]
    fn consume_all_drains() {
        let mut step = FixedTimestep::new(10);
        step.accumulate(0.25);
        assert!(step.consume_all());
        assert!(!step.consume_tick());
        assert!(!step.consume_all());
    }
}
