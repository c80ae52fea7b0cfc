pub mod announcer;
pub mod config;
pub mod engine;
pub mod history;
pub mod processor;
pub mod scheduler;

pub use config::{ConfigLoader, ResayConfig};
pub use history::{HistoryStore, SpeakerId, Utterance, UtteranceKind};
pub use processor::{ChatEvent, CorrectionProcessor, Roster};
