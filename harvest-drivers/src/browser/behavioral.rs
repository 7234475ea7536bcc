use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Default)]
/// Produces human-like pauses between browser commands.
pub struct BehavioralEngine {
    enabled: bool,
}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Engine whose delays return immediately.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        if !self.enabled || max == 0 {
            return;
        }
        let ms = OsRng.gen_range(min..=max.max(min));
        sleep(Duration::from_millis(ms)).await;
    }
}
