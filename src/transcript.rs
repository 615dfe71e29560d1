//! Append-only session transcript.

use serde::Serialize;

use crate::protocol::{display_value, Feedback, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Question,
    Feedback,
    You,
    /// Client-side notices: dropped frames, connection loss.
    Notice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    pub fn question(q: &Question) -> Self {
        Line {
            kind: LineKind::Question,
            text: format!(
                "🛈 ({}) {} Q: {}",
                display_value(&q.level),
                q.category.to_uppercase(),
                q.text
            ),
        }
    }

    pub fn feedback(fb: &Feedback) -> Self {
        Line {
            kind: LineKind::Feedback,
            text: format!("✓ Score {}/5 — {}", display_value(&fb.score), fb.explanation),
        }
    }

    /// Echo of what the user typed, untrimmed.
    pub fn you(input: &str) -> Self {
        Line {
            kind: LineKind::You,
            text: format!("You: {input}"),
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Line {
            kind: LineKind::Notice,
            text: text.into(),
        }
    }
}

/// Ordered record of every rendered line. Lines are never removed or edited.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Transcript {
    lines: Vec<Line>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line) -> &Line {
        self.lines.push(line);
        &self.lines[self.lines.len() - 1]
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn last(&self) -> Option<&Line> {
        self.lines.last()
    }
}
