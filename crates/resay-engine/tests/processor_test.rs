use async_trait::async_trait;
use resay_engine::history::{SpeakerId, UtteranceKind};
use resay_engine::{ChatEvent, ConfigLoader, CorrectionProcessor, ResayConfig, Roster};

struct StaticRoster(Vec<&'static str>);

#[async_trait]
impl Roster for StaticRoster {
    async fn resolve(&self, name: &str) -> Option<String> {
        self.0
            .iter()
            .find(|nick| nick.eq_ignore_ascii_case(name))
            .map(|nick| nick.to_string())
    }
}

fn processor() -> CorrectionProcessor {
    CorrectionProcessor::new(&ResayConfig::default())
}

fn plain(nick: &str, text: &str) -> ChatEvent {
    ChatEvent {
        speaker: nick.to_string(),
        text: text.to_string(),
        kind: UtteranceKind::Plain,
    }
}

fn action(nick: &str, text: &str) -> ChatEvent {
    ChatEvent {
        speaker: nick.to_string(),
        text: text.to_string(),
        kind: UtteranceKind::Action,
    }
}

fn stored_texts(processor: &CorrectionProcessor, nick: &str) -> Vec<String> {
    processor
        .history()
        .snapshot(&SpeakerId::from_nick(nick))
        .into_iter()
        .map(|u| u.text)
        .collect()
}

#[tokio::test]
async fn plain_lines_are_archived_silently() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    let response = processor.process_line(plain("alice", "hello world"), &roster).await;
    assert_eq!(response, None);
    assert_eq!(stored_texts(&processor, "alice"), ["hello world"]);
}

#[tokio::test]
async fn self_correction_announces_and_rejoins_history() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "I like rust"), &roster).await;
    let response = processor.process_line(plain("alice", "s/rust/Rust/"), &roster).await;
    assert_eq!(response.as_deref(), Some("alice meant to say: I like Rust"));
    // The corrected line re-enters the window; the directive never does.
    assert_eq!(stored_texts(&processor, "alice"), ["I like rust", "I like Rust"]);
}

#[tokio::test]
async fn corrections_chain() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "big"), &roster).await;
    processor.process_line(plain("alice", "s/big/bug/"), &roster).await;
    let response = processor.process_line(plain("alice", "s/bug/bag/"), &roster).await;
    assert_eq!(response.as_deref(), Some("alice meant to say: bag"));
    assert_eq!(stored_texts(&processor, "alice"), ["big", "bug", "bag"]);
}

#[tokio::test]
async fn most_recent_matching_line_is_corrected() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "foo"), &roster).await;
    processor.process_line(plain("alice", "foofoo"), &roster).await;
    let response = processor.process_line(plain("alice", "s/foo/bar/"), &roster).await;
    assert_eq!(response.as_deref(), Some("alice meant to say: barfoo"));
}

#[tokio::test]
async fn target_override_corrects_another_speaker() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice", "bob"]);
    processor.process_line(plain("alice", "teh cat"), &roster).await;
    let response = processor
        .process_line(plain("bob", "alice: s/teh/the/"), &roster)
        .await;
    assert_eq!(response.as_deref(), Some("bob thinks alice meant to say: the cat"));
    // The corrected line lands in the target's window, not the corrector's.
    assert_eq!(stored_texts(&processor, "alice"), ["teh cat", "the cat"]);
    assert!(stored_texts(&processor, "bob").is_empty());
}

#[tokio::test]
async fn unknown_target_falls_back_to_own_history() {
    let processor = processor();
    let roster = StaticRoster(vec!["bob"]);
    processor.process_line(plain("bob", "teh dog"), &roster).await;
    let response = processor
        .process_line(plain("bob", "carol: s/teh/the/"), &roster)
        .await;
    assert_eq!(response.as_deref(), Some("bob meant to say: the dog"));
}

#[tokio::test]
async fn action_corrections_use_action_formats() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice", "bob"]);
    processor.process_line(action("alice", "dances badly"), &roster).await;

    let response = processor
        .process_line(plain("alice", "s/badly/wildly/"), &roster)
        .await;
    assert_eq!(response.as_deref(), Some("Correction: * alice dances wildly"));

    let response = processor
        .process_line(plain("bob", "alice: s/wildly/gracefully/"), &roster)
        .await;
    assert_eq!(
        response.as_deref(),
        Some("bob suggests a correction: * alice dances gracefully")
    );
}

#[tokio::test]
async fn speaker_identity_ignores_nick_casing() {
    let processor = processor();
    let roster = StaticRoster(vec!["Alice"]);
    processor.process_line(plain("Alice", "teh thing"), &roster).await;
    let response = processor.process_line(plain("alice", "s/teh/the/"), &roster).await;
    assert_eq!(response.as_deref(), Some("alice meant to say: the thing"));
}

#[tokio::test]
async fn malformed_directive_gets_a_hint_and_is_not_archived() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    let response = processor.process_line(plain("alice", "s/x/y"), &roster).await;
    assert_eq!(
        response.as_deref(),
        Some("Your correction is missing its closing delimiter (try s/old/new/).")
    );
    assert!(stored_texts(&processor, "alice").is_empty());
}

#[tokio::test]
async fn invalid_regex_is_reported_and_history_untouched() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "some line"), &roster).await;
    let response = processor.process_line(plain("alice", "s/[/bad/"), &roster).await;
    let text = response.expect("bad pattern should be reported");
    assert!(text.starts_with("That pattern does not compile:"), "{}", text);
    assert_eq!(stored_texts(&processor, "alice"), ["some line"]);
}

#[tokio::test]
async fn invalid_options_are_reported() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    let response = processor.process_line(plain("alice", "s/a/b/z"), &roster).await;
    assert_eq!(
        response.as_deref(),
        Some("unknown substitution option 'z' (only g and i are understood)")
    );
}

#[tokio::test]
async fn length_mismatch_is_reported_without_touching_history() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "cab"), &roster).await;
    let response = processor.process_line(plain("alice", "y/ab/x/"), &roster).await;
    assert_eq!(
        response.as_deref(),
        Some("transliteration sets must be the same length (2 vs 1)")
    );
    assert_eq!(stored_texts(&processor, "alice"), ["cab"]);
}

#[tokio::test]
async fn transliteration_end_to_end() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "cab"), &roster).await;
    let response = processor.process_line(plain("alice", "y/abc/xyz/"), &roster).await;
    assert_eq!(response.as_deref(), Some("alice meant to say: zxy"));
}

#[tokio::test]
async fn no_match_is_silent() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "hello"), &roster).await;
    let response = processor.process_line(plain("alice", "s/absent/x/"), &roster).await;
    assert_eq!(response, None);
    assert_eq!(stored_texts(&processor, "alice"), ["hello"]);
}

#[tokio::test]
async fn directive_against_empty_history_is_silent() {
    let processor = processor();
    let roster = StaticRoster(vec!["alice"]);
    let response = processor.process_line(plain("alice", "s/a/b/"), &roster).await;
    assert_eq!(response, None);
}

#[tokio::test]
async fn deadline_expiry_reports_a_timeout_and_discards_the_job() {
    let config = ResayConfig {
        deadline_ms: 0,
        ..ResayConfig::default()
    };
    let processor = CorrectionProcessor::new(&config);
    let roster = StaticRoster(vec!["alice"]);
    processor.process_line(plain("alice", "foo"), &roster).await;

    let response = processor.process_line(plain("alice", "s/foo/bar/"), &roster).await;
    assert_eq!(
        response.as_deref(),
        Some("That correction took too long and was abandoned.")
    );

    // The abandoned job never writes back, and ingestion keeps moving.
    processor.process_line(plain("alice", "next line"), &roster).await;
    assert_eq!(stored_texts(&processor, "alice"), ["foo", "next line"]);
}

#[tokio::test]
async fn capacity_comes_from_config() {
    let config = ResayConfig {
        history_capacity: 2,
        ..ResayConfig::default()
    };
    let processor = CorrectionProcessor::new(&config);
    let roster = StaticRoster(vec!["alice"]);
    for text in ["one", "two", "three"] {
        processor.process_line(plain("alice", text), &roster).await;
    }
    assert_eq!(stored_texts(&processor, "alice"), ["two", "three"]);
}

#[tokio::test]
async fn config_loads_from_yaml_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "history_capacity: 7\ndeadline_ms: 250").expect("write config");
    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("config should parse");
    assert_eq!(config.history_capacity, 7);
    assert_eq!(config.deadline_ms, 250);
    assert_eq!(config.workers, 4);
}
