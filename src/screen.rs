//! Display surface for a session.
//!
//! A [`Screen`] receives transcript lines, the countdown value and the stats
//! values. [`TerminalScreen`] prints transcript lines in order and keeps the
//! line the user types on untouched: the countdown goes to the window title,
//! stats are printed as their own line when they change. [`BufferScreen`]
//! keeps everything in memory.

use std::io::{self, IsTerminal, Write};

use colored::*;

use crate::protocol::StatsView;
use crate::transcript::{Line, LineKind};

pub trait Screen {
    /// Show a new transcript line below all previous ones.
    fn append(&mut self, line: &Line);
    /// Show the countdown value.
    fn set_timer(&mut self, remaining: i64);
    /// Show level, answered count and average score.
    fn set_stats(&mut self, stats: &StatsView);
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Cursor up one line, then clear it.
const ERASE_PREVIOUS_LINE: &str = "\x1b[1A\r\x1b[2K";

fn title_sequence(title: &str) -> String {
    format!("\x1b]0;{title}\x07")
}

pub struct TerminalScreen<W: Write> {
    out: W,
    /// Escape sequences are allowed (output is a terminal).
    ansi: bool,
    /// The terminal echoes typed lines, so a submitted answer is already on
    /// the line above the cursor and is replaced by its transcript line.
    replace_echo: bool,
    timer: Option<i64>,
    stats: Option<StatsView>,
}

impl TerminalScreen<io::Stdout> {
    pub fn stdout() -> Self {
        let ansi = io::stdout().is_terminal();
        Self::new(io::stdout())
            .with_ansi(ansi)
            .with_replace_echo(ansi && io::stdin().is_terminal())
    }

    /// Put back an empty window title once the session is over.
    pub fn reset_title() {
        if io::stdout().is_terminal() {
            let mut out = io::stdout();
            let _ = write!(out, "{}", title_sequence(""));
            let _ = out.flush();
        }
    }
}

impl<W: Write> TerminalScreen<W> {
    /// A plain-text screen: no escape sequences.
    pub fn new(out: W) -> Self {
        TerminalScreen {
            out,
            ansi: false,
            replace_echo: false,
            timer: None,
            stats: None,
        }
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    pub fn with_replace_echo(mut self, replace_echo: bool) -> Self {
        self.replace_echo = replace_echo;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn status_line(&self) -> String {
        let mut parts = Vec::new();
        if let Some(stats) = &self.stats {
            parts.push(format!("level {}", stats.level));
            parts.push(format!("answered {}", stats.answered));
            parts.push(format!("avg {}", stats.average));
        }
        if let Some(remaining) = self.timer {
            parts.push(format!("⏱ {remaining}s"));
        }
        parts.join(" · ")
    }

    // Terminal output errors are not recoverable here; the session keeps
    // running and the transcript stays intact.

    fn redraw_title(&mut self) {
        if !self.ansi {
            return;
        }
        let title = title_sequence(&self.status_line());
        let _ = write!(self.out, "{title}");
        let _ = self.out.flush();
    }
}

fn styled(line: &Line) -> ColoredString {
    match line.kind {
        LineKind::Question => line.text.bright_cyan().bold(),
        LineKind::Feedback => line.text.green(),
        LineKind::You => line.text.normal(),
        LineKind::Notice => line.text.yellow(),
    }
}

impl<W: Write> Screen for TerminalScreen<W> {
    fn append(&mut self, line: &Line) {
        if self.replace_echo && line.kind == LineKind::You {
            let _ = write!(self.out, "{ERASE_PREVIOUS_LINE}");
        }
        let _ = writeln!(self.out, "{}", styled(line));
        let _ = self.out.flush();
    }

    fn set_timer(&mut self, remaining: i64) {
        self.timer = Some(remaining);
        self.redraw_title();
    }

    fn set_stats(&mut self, stats: &StatsView) {
        if self.stats.as_ref() == Some(stats) {
            return;
        }
        self.stats = Some(stats.clone());
        let summary = format!(
            "level {} · answered {} · avg {}",
            stats.level, stats.answered, stats.average
        );
        let _ = writeln!(self.out, "{}", summary.dimmed());
        self.redraw_title();
        let _ = self.out.flush();
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Records everything shown. Useful for headless runs and tests.
#[derive(Debug, Default, Clone)]
pub struct BufferScreen {
    pub lines: Vec<Line>,
    /// Every timer value shown, in order.
    pub timer_updates: Vec<i64>,
    pub stats: Option<StatsView>,
}

impl BufferScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&self) -> Option<i64> {
        self.timer_updates.last().copied()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

impl Screen for BufferScreen {
    fn append(&mut self, line: &Line) {
        self.lines.push(line.clone());
    }

    fn set_timer(&mut self, remaining: i64) {
        self.timer_updates.push(remaining);
    }

    fn set_stats(&mut self, stats: &StatsView) {
        self.stats = Some(stats.clone());
    }
}
