use std::time::Duration;

/// Turns the elapsed time at each refresh tick into an instantaneous frame rate.
#[derive(Debug, Default)]
pub struct FrameClock {
    last_elapsed: Option<Duration>,
}

impl FrameClock {
    /// `elapsed` MUST NOT decrease between calls. Returns `1 / delta_seconds`, or `None` when
    /// there is no previous tick or no time has passed.
    pub fn tick(&mut self, elapsed: Duration) -> Option<f64> {
        let framerate = self.last_elapsed.and_then(|last| {
            let delta = elapsed.saturating_sub(last).as_secs_f64();
            (delta > 0.0).then(|| 1.0 / delta)
        });
        self.last_elapsed = Some(elapsed);
        framerate
    }
}
