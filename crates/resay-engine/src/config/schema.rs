use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ResayConfig {
    /// Lines of history kept per speaker.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Hard deadline for one correction job.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Worker threads available to correction jobs.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Cap on compiled regex size, a backstop against hostile patterns.
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
}

impl ResayConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for ResayConfig {
    fn default() -> Self {
        ResayConfig {
            history_capacity: default_history_capacity(),
            deadline_ms: default_deadline_ms(),
            workers: default_workers(),
            regex_size_limit: default_regex_size_limit(),
        }
    }
}

fn default_history_capacity() -> usize {
    50
}

fn default_deadline_ms() -> u64 {
    5000
}

fn default_workers() -> usize {
    4
}

fn default_regex_size_limit() -> usize {
    1 << 20
}
