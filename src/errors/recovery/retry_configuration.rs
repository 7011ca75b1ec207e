// Retry configuration for the TCP connect step
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfiguration {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfiguration {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfiguration {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    pub fn with_backoff(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before the given attempt (1-indexed), with optional +/-25% jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let base = self.initial_delay.mul_f64(exp).min(self.max_delay);

        if !self.jitter {
            return base;
        }

        let millis = base.as_millis().max(1) as i64;
        let spread = millis / 4;
        let offset = rand::random::<i64>().rem_euclid(2 * spread + 1) - spread;
        let jittered = (millis + offset).max(1) as u64;
        Duration::from_millis(jittered).min(self.max_delay)
    }
}
