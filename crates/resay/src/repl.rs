//! Stdin stand-in for the chat transport.
//!
//! Each input line is one channel event: `<nick> text` for a message,
//! `* nick text` for an action. Every nick seen becomes part of the roster,
//! which is what directive target overrides resolve against.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use resay_engine::{ChatEvent, CorrectionProcessor, Roster, UtteranceKind};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Roster backed by the set of nicks observed on the input stream.
#[derive(Default)]
struct SeenRoster {
    // folded nick -> display nick
    nicks: Mutex<HashMap<String, String>>,
}

impl SeenRoster {
    fn observe(&self, nick: &str) {
        let mut nicks = self.nicks.lock().unwrap_or_else(|e| e.into_inner());
        nicks.insert(nick.to_lowercase(), nick.to_string());
    }
}

#[async_trait]
impl Roster for SeenRoster {
    async fn resolve(&self, name: &str) -> Option<String> {
        let nicks = self.nicks.lock().unwrap_or_else(|e| e.into_inner());
        nicks.get(&name.to_lowercase()).cloned()
    }
}

/// Parse one transcript line into a chat event. Lines that match neither
/// shape are ignored.
fn parse_transcript_line(line: &str) -> Option<ChatEvent> {
    if let Some(rest) = line.strip_prefix("* ") {
        let (nick, text) = rest.split_once(' ')?;
        return Some(ChatEvent {
            speaker: nick.to_string(),
            text: text.to_string(),
            kind: UtteranceKind::Action,
        });
    }
    let rest = line.strip_prefix('<')?;
    let (nick, text) = rest.split_once("> ")?;
    if nick.is_empty() {
        return None;
    }
    Some(ChatEvent {
        speaker: nick.to_string(),
        text: text.to_string(),
        kind: UtteranceKind::Plain,
    })
}

async fn handle_line(processor: &CorrectionProcessor, roster: &SeenRoster, line: &str) {
    let Some(event) = parse_transcript_line(line) else {
        eprintln!("Ignored line (expected '<nick> text' or '* nick text'): {}", line);
        return;
    };
    roster.observe(&event.speaker);
    if let Some(announcement) = processor.process_line(event, roster).await {
        println!("{}", announcement);
    }
}

pub async fn run_file(processor: &CorrectionProcessor, path: &str) -> anyhow::Result<()> {
    let roster = SeenRoster::default();
    let content = tokio::fs::read_to_string(path).await?;
    for line in content.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        handle_line(processor, &roster, trimmed).await;
    }
    Ok(())
}

pub async fn run_repl(processor: &CorrectionProcessor) -> anyhow::Result<()> {
    let roster = SeenRoster::default();
    println!("Channel open. Speak as '<nick> text', act as '* nick text'.");
    println!("Corrections: s/old/new/[gi], y/abc/xyz/, optionally 'nick: s/old/new/'.");
    println!("Type 'exit' or 'quit' to close.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        handle_line(processor, &roster, trimmed).await;
    }
    Ok(())
}
