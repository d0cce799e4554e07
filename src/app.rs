use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::{Game, Phase};
use crate::leaderboard::ScoreStore;

const MAX_NAME_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Holds the game plus the input surface around it: the name-entry buffer
/// and the key bindings for each screen.
pub struct App {
    pub game: Game,
    pub name_input: String,
    default_name: Option<String>,
}

impl App {
    pub fn new(game: Game, default_name: Option<String>) -> Self {
        Self {
            name_input: default_name.clone().unwrap_or_default(),
            game,
            default_name,
        }
    }

    /// Routes one key event to the current screen. Digit keys pick a layer
    /// while playing; any text goes to the name buffer on the end screen.
    pub fn handle_key(&mut self, key: KeyEvent, store: &dyn ScoreStore) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match self.game.phase {
            Phase::Start => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => KeyOutcome::Quit,
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.start_round();
                    KeyOutcome::Continue
                }
                _ => KeyOutcome::Continue,
            },
            Phase::Playing => match key.code {
                KeyCode::Esc => KeyOutcome::Quit,
                KeyCode::Char(c) => {
                    if let Some(layer) = self.layer_for_digit(c) {
                        self.game.submit_answer(&layer);
                    }
                    KeyOutcome::Continue
                }
                _ => KeyOutcome::Continue,
            },
            Phase::End => match key.code {
                KeyCode::Esc => KeyOutcome::Quit,
                KeyCode::Enter => {
                    if self.game.submitted {
                        self.start_round();
                    } else if self.name_input.trim().is_empty() {
                        // Nothing to submit; Enter also doubles as play-again.
                        self.start_round();
                    } else {
                        let name = self.name_input.clone();
                        self.game.submit_score(&name, store);
                    }
                    KeyOutcome::Continue
                }
                KeyCode::Backspace => {
                    if !self.game.submitted {
                        self.name_input.pop();
                    }
                    KeyOutcome::Continue
                }
                KeyCode::Char(c) => {
                    if !self.game.submitted
                        && !c.is_control()
                        && self.name_input.chars().count() < MAX_NAME_LEN
                    {
                        self.name_input.push(c);
                    }
                    KeyOutcome::Continue
                }
                _ => KeyOutcome::Continue,
            },
        }
    }

    fn start_round(&mut self) {
        self.name_input = self.default_name.clone().unwrap_or_default();
        self.game.start_game();
    }

    /// Maps '1'..'9' to a layer name by catalog order.
    fn layer_for_digit(&self, c: char) -> Option<String> {
        let idx = c.to_digit(10)? as usize;
        if idx == 0 {
            return None;
        }
        self.game
            .word_set
            .layers
            .get(idx - 1)
            .map(|layer| layer.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::DEFAULT_ROUND_SECS;
    use crate::leaderboard::MemoryScoreStore;
    use crate::words::WordSet;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let set = WordSet::from_pairs(&[("A", &["x", "y"]), ("B", &["z"])]);
        App::new(Game::new(set, DEFAULT_ROUND_SECS), None)
    }

    #[test]
    fn test_enter_starts_round_from_start_screen() {
        let mut app = app();
        let store = MemoryScoreStore::new();

        let outcome = app.handle_key(key(KeyCode::Enter), &store);

        assert_eq!(outcome, KeyOutcome::Continue);
        assert_eq!(app.game.phase, Phase::Playing);
    }

    #[test]
    fn test_esc_quits_from_start_screen() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        assert_eq!(app.handle_key(key(KeyCode::Esc), &store), KeyOutcome::Quit);
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        app.handle_key(key(KeyCode::Enter), &store);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_c, &store), KeyOutcome::Quit);
    }

    #[test]
    fn test_digit_key_answers_by_catalog_order() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        app.handle_key(key(KeyCode::Enter), &store);
        let correct_is_first = app.game.current.as_ref().unwrap().layer == "A";

        app.handle_key(key(KeyCode::Char('1')), &store);

        assert_eq!(app.game.history.len(), 1);
        assert_eq!(app.game.history[0].correct, correct_is_first);
        assert_eq!(app.game.score, u32::from(correct_is_first));
    }

    #[test]
    fn test_out_of_range_digit_is_ignored() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        app.handle_key(key(KeyCode::Enter), &store);

        app.handle_key(key(KeyCode::Char('9')), &store);
        app.handle_key(key(KeyCode::Char('0')), &store);

        assert!(app.game.history.is_empty());
    }

    #[test]
    fn test_name_entry_and_submit_on_end_screen() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        app.game.start_game();
        app.game.phase = Phase::End;

        for c in "דנה".chars() {
            app.handle_key(key(KeyCode::Char(c)), &store);
        }
        assert_eq!(app.name_input, "דנה");

        app.handle_key(key(KeyCode::Enter), &store);

        assert!(app.game.submitted);
        let all = store.fetch_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "דנה");
    }

    #[test]
    fn test_backspace_edits_name() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        app.game.start_game();
        app.game.phase = Phase::End;

        app.handle_key(key(KeyCode::Char('a')), &store);
        app.handle_key(key(KeyCode::Char('b')), &store);
        app.handle_key(key(KeyCode::Backspace), &store);

        assert_eq!(app.name_input, "a");
    }

    #[test]
    fn test_name_buffer_frozen_after_submit() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        app.game.start_game();
        app.game.phase = Phase::End;

        app.handle_key(key(KeyCode::Char('a')), &store);
        app.handle_key(key(KeyCode::Enter), &store);
        assert!(app.game.submitted);

        app.handle_key(key(KeyCode::Char('b')), &store);
        assert_eq!(app.name_input, "a");
    }

    #[test]
    fn test_enter_after_submit_plays_again() {
        let mut app = app();
        let store = MemoryScoreStore::new();
        app.game.start_game();
        app.game.phase = Phase::End;

        app.handle_key(key(KeyCode::Char('a')), &store);
        app.handle_key(key(KeyCode::Enter), &store);
        app.handle_key(key(KeyCode::Enter), &store);

        assert_eq!(app.game.phase, Phase::Playing);
        assert_eq!(app.game.score, 0);
        assert!(app.name_input.is_empty());
    }

    #[test]
    fn test_default_name_prefills_buffer() {
        let set = WordSet::from_pairs(&[("A", &["x"])]);
        let app = App::new(
            Game::new(set, DEFAULT_ROUND_SECS),
            Some("דנה".to_string()),
        );
        assert_eq!(app.name_input, "דנה");
    }
}
