use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::game::{Game, Phase};
use crate::leaderboard::LeaderboardEntry;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const TITLE: &str = "משחק רובדי הלשון";
const INTRO: &str = "זהו את רובד הלשון של המילה המוצגת. יש לכם דקה!";
const LEADERBOARD_TITLE: &str = "טבלת שיאים:";
const POINTS: &str = "נקודות";
const SCORE_LABEL: &str = "ניקוד";
const GAME_OVER: &str = "המשחק נגמר!";
const FINAL_SCORE: &str = "הניקוד הסופי שלך";
const OUT_OF_WORDS: &str = "מתוך {} מילים";
const NAME_PROMPT: &str = "הכנס את שמך לטבלת השיאים:";
const SCORE_SAVED: &str = "התוצאה נשמרה בהצלחה!";
const SUMMARY_TITLE: &str = "סיכום המשחק:";
const START_HINT: &str = "Enter: התחל משחק   Esc: יציאה";
const SUBMIT_HINT: &str = "Enter: שמור תוצאה";
const AGAIN_HINT: &str = "Enter: שחק שוב   Esc: יציאה";

/// Countdown display, m:ss over the whole seconds left.
pub fn format_timer(seconds_remaining: f64) -> String {
    let secs = seconds_remaining.ceil().max(0.0) as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Truncates a display string to `max` terminal columns.
pub fn fit_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for c in s.chars() {
        if format!("{}{}", out, c).width() > max.saturating_sub(1) {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.game.phase {
            Phase::Start => render_start(self, area, buf),
            Phase::Playing => render_playing(self, area, buf),
            Phase::End => render_end(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_italic() -> Style {
    Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC)
}

fn leaderboard_lines(entries: &[LeaderboardEntry], width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(LEADERBOARD_TITLE, bold()))];
    for entry in entries {
        lines.push(Line::from(vec![
            Span::raw(fit_width(&entry.name, width.saturating_sub(12))),
            Span::raw("  "),
            Span::styled(format!("{} {}", entry.score, POINTS), bold()),
        ]));
    }
    lines
}

fn render_start(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Length(2), // intro
            Constraint::Min(1),    // leaderboard
            Constraint::Length(1), // hint
        ])
        .split(area);

    Paragraph::new(Span::styled(TITLE, bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(INTRO)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

    if !app.game.leaderboard.is_empty() {
        Paragraph::new(leaderboard_lines(
            &app.game.leaderboard,
            chunks[2].width as usize,
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled(START_HINT, dim_italic()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let game = &app.game;
    let layer_count = game.word_set.layers.len() as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),           // score + timer
            Constraint::Length(1),           // correctness indicator
            Constraint::Length(2),           // the word
            Constraint::Length(layer_count), // layer choices
            Constraint::Min(0),
        ])
        .split(area);

    let status = format!(
        "{}: {}   {}",
        SCORE_LABEL,
        game.score,
        format_timer(game.seconds_remaining)
    );
    Paragraph::new(Span::styled(status, bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if let Some(reveal) = &game.reveal {
        let (mark, style) = if reveal.correct {
            ("✓", bold().fg(Color::Green))
        } else {
            ("✗", bold().fg(Color::Red))
        };
        Paragraph::new(Span::styled(mark, style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }

    if let Some(current) = &game.current {
        Paragraph::new(Span::styled(current.word.clone(), bold()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);
    }

    let lines: Vec<Line> = game
        .word_set
        .layers
        .iter()
        .enumerate()
        .map(|(idx, layer)| {
            let label = format!("({}) {}", idx + 1, layer.name);
            // While the indicator is shown, highlight the correct layer
            // and dim the rest.
            let style = match (&game.reveal, &game.current) {
                (Some(_), Some(current)) if current.layer == layer.name => {
                    bold().fg(Color::Green)
                }
                (Some(_), _) => Style::default().add_modifier(Modifier::DIM),
                _ => Style::default(),
            };
            Line::from(Span::styled(label, style))
        })
        .collect();

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

fn render_end(app: &App, area: Rect, buf: &mut Buffer) {
    let game = &app.game;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Length(2), // final score
            Constraint::Length(3), // name entry / saved notice
            Constraint::Min(1),    // summary + leaderboard
            Constraint::Length(1), // hint
        ])
        .split(area);

    Paragraph::new(Span::styled(GAME_OVER, bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let score_line = Line::from(vec![
        Span::styled(format!("{}: {}  ", FINAL_SCORE, game.score), bold()),
        Span::styled(
            OUT_OF_WORDS.replace("{}", &game.history.len().to_string()),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    Paragraph::new(score_line)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let mut entry_lines = Vec::new();
    if game.submitted {
        entry_lines.push(Line::from(Span::styled(
            SCORE_SAVED,
            bold().fg(Color::Green),
        )));
    } else {
        entry_lines.push(Line::from(NAME_PROMPT));
        entry_lines.push(Line::from(Span::styled(
            format!("{}▌", app.name_input),
            bold(),
        )));
        if let Some(err) = &game.store_error {
            entry_lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(Color::Red),
            )));
        }
    }
    Paragraph::new(entry_lines)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let mut body = summary_lines(game);
    if !game.leaderboard.is_empty() {
        body.push(Line::from(""));
        body.extend(leaderboard_lines(
            &game.leaderboard,
            chunks[3].width as usize,
        ));
    }
    Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    let hint = if game.submitted || app.name_input.trim().is_empty() {
        AGAIN_HINT
    } else {
        SUBMIT_HINT
    };
    Paragraph::new(Span::styled(hint, dim_italic()))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}

/// End-of-round summary: answered words grouped per layer, each word
/// colored by whether the player classified it correctly.
fn summary_lines(game: &Game) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(SUMMARY_TITLE, bold()))];

    for layer in &game.word_set.layers {
        let answered: Vec<_> = game
            .history
            .iter()
            .filter(|r| r.layer == layer.name)
            .collect();
        if answered.is_empty() {
            continue;
        }

        let mut spans = vec![Span::styled(format!("{}: ", layer.name), bold())];
        for (i, record) in answered.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            let style = if record.correct {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            spans.push(Span::styled(record.word.clone(), style));
        }
        lines.push(Line::from(spans));
    }

    lines
}
