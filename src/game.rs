use crate::leaderboard::{top_scores, LeaderboardEntry, ScoreStore};
use crate::selector::{self, Drawn};
use crate::words::WordSet;
use crate::TICK_RATE_MS;
use chrono::Local;
use std::collections::HashSet;

pub const DEFAULT_ROUND_SECS: f64 = 60.0;

/// How long the correctness indicator is shown after an answer. Input is
/// locked for the whole window; a second submit inside it is dropped, not
/// queued.
pub const REVEAL_MS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Playing,
    End,
}

/// One answered word. Appended once per answer, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub word: String,
    /// The correct layer, regardless of what the player chose.
    pub layer: String,
    pub correct: bool,
}

/// The transient correctness indicator and its remaining display time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reveal {
    pub correct: bool,
    millis_left: f64,
}

/// Round lifecycle, timer, score and answer history for one player session.
/// Driven from the single event loop by ticks, key events and leaderboard
/// snapshots; nothing here blocks.
#[derive(Debug)]
pub struct Game {
    pub word_set: WordSet,
    pub phase: Phase,
    pub current: Option<Drawn>,
    pub score: u32,
    pub duration_secs: f64,
    pub seconds_remaining: f64,
    pub history: Vec<AnswerRecord>,
    pub seen: HashSet<String>,
    pub reveal: Option<Reveal>,
    pub submitted: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub store_error: Option<String>,
}

impl Game {
    pub fn new(word_set: WordSet, duration_secs: f64) -> Self {
        Self {
            word_set,
            phase: Phase::Start,
            current: None,
            score: 0,
            duration_secs,
            seconds_remaining: duration_secs,
            history: Vec::new(),
            seen: HashSet::new(),
            reveal: None,
            submitted: false,
            leaderboard: Vec::new(),
            store_error: None,
        }
    }

    /// Resets all per-session state and draws the first word. Works both
    /// from `Start` and as the play-again transition from `End`. An empty
    /// pool ends the round immediately.
    pub fn start_game(&mut self) {
        self.seen.clear();
        self.score = 0;
        self.history.clear();
        self.submitted = false;
        self.reveal = None;
        self.store_error = None;
        self.seconds_remaining = self.duration_secs;

        match self.draw() {
            Some(drawn) => {
                self.current = Some(drawn);
                self.phase = Phase::Playing;
            }
            None => {
                self.current = None;
                self.phase = Phase::End;
            }
        }
    }

    /// Advances the countdown and the resolution lock by one tick. Ticks
    /// outside `Playing` are ignored, so a stale tick can never decrement a
    /// reset timer or resurrect a finished round.
    pub fn on_tick(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }

        self.seconds_remaining -= TICK_RATE_MS as f64 / 1000.0;
        if self.seconds_remaining <= 0.0 {
            self.seconds_remaining = 0.0;
            self.reveal = None;
            self.phase = Phase::End;
            return;
        }

        if let Some(reveal) = &mut self.reveal {
            reveal.millis_left -= TICK_RATE_MS as f64;
            if reveal.millis_left <= 0.0 {
                self.reveal = None;
                self.advance();
            }
        }
    }

    /// Scores the chosen layer against the current word. A no-op while the
    /// reveal lock is held, so a rapid double-submit cannot double-score.
    pub fn submit_answer(&mut self, layer_name: &str) {
        if self.phase != Phase::Playing || self.reveal.is_some() {
            return;
        }
        let Some(current) = &self.current else {
            return;
        };

        let correct = layer_name == current.layer;
        self.history.push(AnswerRecord {
            word: current.word.clone(),
            layer: current.layer.clone(),
            correct,
        });
        if correct {
            self.score += 1;
        }
        self.reveal = Some(Reveal {
            correct,
            millis_left: REVEAL_MS,
        });
    }

    /// Writes the final score to the store, once per session. A write
    /// failure is kept for display and leaves the submitted flag false so
    /// the same name can be retried.
    pub fn submit_score(&mut self, name: &str, store: &dyn ScoreStore) {
        if self.phase != Phase::End || self.submitted || name.trim().is_empty() {
            return;
        }

        let entry = LeaderboardEntry {
            name: name.trim().to_string(),
            score: self.score,
            submitted_at: Local::now(),
        };
        match store.append(&entry) {
            Ok(()) => {
                self.submitted = true;
                self.store_error = None;
            }
            Err(err) => {
                self.store_error = Some(err.to_string());
            }
        }
    }

    /// Installs a fresh top-10 snapshot, typically pushed by the store
    /// subscription.
    pub fn set_leaderboard(&mut self, entries: Vec<LeaderboardEntry>) {
        self.leaderboard = top_scores(&entries);
    }

    pub fn is_locked(&self) -> bool {
        self.reveal.is_some()
    }

    pub fn correct_answers(&self) -> usize {
        self.history.iter().filter(|r| r.correct).count()
    }

    fn draw(&mut self) -> Option<Drawn> {
        let drawn = selector::next_word(&self.word_set, &self.seen, &mut rand::thread_rng())?;
        self.seen.insert(drawn.word.clone());
        Some(drawn)
    }

    fn advance(&mut self) {
        match self.draw() {
            Some(drawn) => self.current = Some(drawn),
            None => {
                self.current = None;
                self.phase = Phase::End;
            }
        }
    }
}
