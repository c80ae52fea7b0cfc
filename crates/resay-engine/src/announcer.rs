//! Turns correction outcomes into the one-line responses sent back to the
//! channel. A no-match outcome never reaches this module: silence is silence.

use resay_parser::ValidationError;

use crate::history::{Utterance, UtteranceKind};

pub const MALFORMED_HINT: &str =
    "Your correction is missing its closing delimiter (try s/old/new/).";

#[derive(Debug)]
pub enum CorrectionOutcome {
    Corrected {
        corrector: String,
        target: String,
        utterance: Utterance,
    },
    Malformed,
    Invalid(ValidationError),
    InvalidRegex(String),
    TimedOut,
}

pub fn format_outcome(outcome: &CorrectionOutcome) -> String {
    match outcome {
        CorrectionOutcome::Corrected {
            corrector,
            target,
            utterance,
        } => format_corrected(corrector, target, utterance),
        CorrectionOutcome::Malformed => MALFORMED_HINT.to_string(),
        CorrectionOutcome::Invalid(err) => err.to_string(),
        CorrectionOutcome::InvalidRegex(message) => {
            format!("That pattern does not compile: {}", message)
        }
        CorrectionOutcome::TimedOut => "That correction took too long and was abandoned.".to_string(),
    }
}

fn format_corrected(corrector: &str, target: &str, utterance: &Utterance) -> String {
    let self_correction = corrector.to_lowercase() == target.to_lowercase();
    match (utterance.kind, self_correction) {
        (UtteranceKind::Plain, true) => {
            format!("{} meant to say: {}", corrector, utterance.text)
        }
        (UtteranceKind::Plain, false) => {
            format!("{} thinks {} meant to say: {}", corrector, target, utterance.text)
        }
        (UtteranceKind::Action, true) => {
            format!("Correction: * {} {}", target, utterance.text)
        }
        (UtteranceKind::Action, false) => {
            format!("{} suggests a correction: * {} {}", corrector, target, utterance.text)
        }
    }
}
