//! Per-line entry point: classify a chat line, then either archive it or run
//! the correction it describes.

use async_trait::async_trait;
use resay_parser::{parse_line, Directive, ParseOutcome};
use tracing::debug;

use crate::announcer::{format_outcome, CorrectionOutcome};
use crate::config::ResayConfig;
use crate::engine::{self, EngineError};
use crate::history::{HistoryStore, SpeakerId, Utterance, UtteranceKind};
use crate::scheduler::{JobContext, JobOutcome, Scheduler};

/// Channel membership as the transport currently sees it. Directives can name
/// another speaker; only names the roster recognizes are honoured.
#[async_trait]
pub trait Roster: Send + Sync {
    /// Resolve a name to the nick of a currently-present speaker, if any.
    async fn resolve(&self, name: &str) -> Option<String>;
}

/// One delivered chat line.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub speaker: String,
    pub text: String,
    pub kind: UtteranceKind,
}

pub struct CorrectionProcessor {
    store: HistoryStore,
    scheduler: Scheduler,
    regex_size_limit: usize,
}

impl CorrectionProcessor {
    pub fn new(config: &ResayConfig) -> Self {
        CorrectionProcessor {
            store: HistoryStore::new(config.history_capacity),
            scheduler: Scheduler::new(config.workers, config.deadline()),
            regex_size_limit: config.regex_size_limit,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.store
    }

    /// Process one chat line. Returns the response to announce, if any.
    ///
    /// Non-directives are archived and produce nothing. Directives never
    /// enter history themselves, whatever their outcome.
    pub async fn process_line(&self, event: ChatEvent, roster: &dyn Roster) -> Option<String> {
        match parse_line(&event.text) {
            ParseOutcome::NotADirective => {
                self.store.record(Utterance {
                    speaker: SpeakerId::from_nick(&event.speaker),
                    text: event.text,
                    kind: event.kind,
                });
                None
            }
            ParseOutcome::Malformed => Some(format_outcome(&CorrectionOutcome::Malformed)),
            ParseOutcome::Invalid(err) => {
                debug!(speaker = %event.speaker, error = %err, "rejected directive");
                Some(format_outcome(&CorrectionOutcome::Invalid(err)))
            }
            ParseOutcome::Directive(directive) => self.run_directive(event, directive, roster).await,
        }
    }

    async fn run_directive(
        &self,
        event: ChatEvent,
        directive: Directive,
        roster: &dyn Roster,
    ) -> Option<String> {
        let corrector = event.speaker;
        // An override naming nobody present falls back to the corrector's
        // own history rather than failing.
        let target = match &directive.target_override {
            Some(name) => roster.resolve(name).await.unwrap_or_else(|| corrector.clone()),
            None => corrector.clone(),
        };

        let compiled = match engine::compile(&directive.action, self.regex_size_limit) {
            Ok(compiled) => compiled,
            Err(EngineError::InvalidRegex(err)) => {
                debug!(speaker = %corrector, error = %err, "pattern rejected");
                // Syntax errors render multi-line with caret art; the last
                // line carries the actual message and fits in one response.
                let message = err.to_string().lines().last().unwrap_or("").to_string();
                return Some(format_outcome(&CorrectionOutcome::InvalidRegex(message)));
            }
        };

        let snapshot = self.store.snapshot(&SpeakerId::from_nick(&target));
        let ctx = JobContext {
            corrector: corrector.clone(),
            directive: event.text.clone(),
        };
        let outcome = self
            .scheduler
            .submit(ctx, move |token| engine::apply(&compiled, &snapshot, token))
            .await;

        match outcome {
            JobOutcome::Completed(None) => None,
            JobOutcome::Completed(Some(corrected)) => {
                // Corrections re-enter the window so they can themselves be
                // corrected.
                self.store.record(corrected.clone());
                Some(format_outcome(&CorrectionOutcome::Corrected {
                    corrector,
                    target,
                    utterance: corrected,
                }))
            }
            JobOutcome::CancelledAfterDeadline => {
                Some(format_outcome(&CorrectionOutcome::TimedOut))
            }
        }
    }
}
