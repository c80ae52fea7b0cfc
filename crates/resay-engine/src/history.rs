//! Per-speaker bounded history of recent chat lines.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Stable speaker identity. Nicknames are reused with arbitrary casing, so
/// the key is the case-folded form; the display spelling travels with each
/// utterance instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeakerId(String);

impl SpeakerId {
    pub fn from_nick(nick: &str) -> Self {
        SpeakerId(nick.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceKind {
    /// A normal chat message.
    Plain,
    /// A `/me` style action line.
    Action,
}

/// One recorded chat line. Never mutated after construction; corrections
/// produce a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub speaker: SpeakerId,
    pub text: String,
    pub kind: UtteranceKind,
}

/// Ring of the most recent utterances for one speaker.
#[derive(Debug)]
struct Window {
    entries: VecDeque<Utterance>,
    capacity: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Window {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, utterance: Utterance) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(utterance);
    }
}

/// Store of per-speaker windows. Speakers get a window lazily on their first
/// line and keep it for the life of the process; each window is capped, so
/// total memory is bounded by the set of speakers seen.
///
/// Locking is two-level: a map lock taken briefly to find or create a
/// speaker's window, then a per-window mutex. Records for different speakers
/// never contend on the same window lock, and no lock is held across an
/// await point anywhere in the crate.
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    windows: RwLock<HashMap<SpeakerId, Arc<Mutex<Window>>>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        HistoryStore {
            capacity: capacity.max(1),
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Append an utterance to its speaker's window, evicting the oldest
    /// entry once the window is full.
    pub fn record(&self, utterance: Utterance) {
        let window = self.window_for(&utterance.speaker);
        lock(&window).push(utterance);
    }

    /// Point-in-time copy of a speaker's window, oldest first. A speaker
    /// with no history yields an empty vec. The copy is owned: later
    /// `record` calls never show through it.
    pub fn snapshot(&self, speaker: &SpeakerId) -> Vec<Utterance> {
        let window = read(&self.windows).get(speaker).cloned();
        match window {
            Some(window) => lock(&window).entries.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    fn window_for(&self, speaker: &SpeakerId) -> Arc<Mutex<Window>> {
        if let Some(window) = read(&self.windows).get(speaker) {
            return window.clone();
        }
        write(&self.windows)
            .entry(speaker.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Window::new(self.capacity))))
            .clone()
    }
}

// Poisoning only happens if a writer panicked; the windows hold plain data,
// so the value is still coherent and the lock is taken anyway.
fn lock(window: &Mutex<Window>) -> MutexGuard<'_, Window> {
    window.lock().unwrap_or_else(|e| e.into_inner())
}

fn read<K, V>(map: &RwLock<HashMap<K, V>>) -> RwLockReadGuard<'_, HashMap<K, V>> {
    map.read().unwrap_or_else(|e| e.into_inner())
}

fn write<K, V>(map: &RwLock<HashMap<K, V>>) -> RwLockWriteGuard<'_, HashMap<K, V>> {
    map.write().unwrap_or_else(|e| e.into_inner())
}
