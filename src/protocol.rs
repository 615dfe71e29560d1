//! Wire protocol: JSON text frames tagged by a `type` field.
//!
//! Inbound frames are handled as `serde_json::Value` first so that unknown
//! tags and extra fields pass through untouched; only the tags the client
//! acts on are deserialized into typed records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SessionError;

/// Text sent on the client's behalf when a countdown runs out.
pub const EXPIRY_ANSWER: &str = "Time’s up — please summarise";

/// A question prompt. `level` is whatever the server uses (`"easy"` or `2`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Question {
    pub level: Value,
    pub category: String,
    pub text: String,
    /// Seconds allowed for this question.
    pub time: i64,
}

/// Scored feedback on the previous answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feedback {
    pub score: Value,
    pub explanation: String,
}

/// Server-side running totals. Other fields (streak counters) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stats {
    pub level: Value,
    pub answered: u64,
    pub total_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tagged {
    Question(Question),
    Feedback(Feedback),
    /// Any other tag, or none.
    Other,
}

/// One decoded inbound frame. A frame may carry both a tagged payload and stats.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub tagged: Tagged,
    pub stats: Option<Stats>,
}

/// Decode an inbound text frame.
///
/// A recognized tag with missing or mistyped fields fails the whole frame, as
/// does a present but malformed `stats` object. A `null` stats field is treated
/// as absent.
pub fn parse_frame(text: &str) -> Result<Frame, SessionError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(SessionError::Protocol("frame is not a JSON object".to_string()));
    }

    let tagged = match value.get("type").and_then(|t| t.as_str()) {
        Some("question") => Tagged::Question(
            serde_json::from_value(value.clone())
                .map_err(|e| SessionError::Protocol(format!("question: {e}")))?,
        ),
        Some("feedback") => Tagged::Feedback(
            serde_json::from_value(value.clone())
                .map_err(|e| SessionError::Protocol(format!("feedback: {e}")))?,
        ),
        _ => Tagged::Other,
    };

    let stats = match value.get("stats") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value(raw.clone())
                .map_err(|e| SessionError::Protocol(format!("stats: {e}")))?,
        ),
    };

    Ok(Frame { tagged, stats })
}

/// Outbound frames. Only answers exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    Answer { answer: String },
}

impl Outbound {
    pub fn answer(text: impl Into<String>) -> Self {
        Outbound::Answer { answer: text.into() }
    }

    pub fn to_json(&self) -> String {
        // A single string field cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Render a loosely typed scalar the way a browser would print it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            // Whole floats print without a fraction, and -0 prints as 0.
            Some(f) if f == 0.0 => "0".to_string(),
            Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Average score shown next to the stats: two decimals, or `0` before any
/// answer has been scored.
pub fn average_display(total_score: f64, answered: u64) -> String {
    if answered == 0 {
        "0".to_string()
    } else {
        two_decimals_half_up(total_score / answered as f64)
    }
}

/// Two-decimal rendering where exact ties round away from zero, so `1.125`
/// shows as `1.13` (plain `{:.2}` rounds ties to even).
fn two_decimals_half_up(value: f64) -> String {
    if !value.is_finite() || value.abs() >= 1e21 {
        return format!("{value:.2}");
    }
    let x = value.abs();
    let mut hundredths = (x * 100.0).floor();
    // Fused multiply-add rounds once, so the sign of the difference against
    // the midpoint is exact even when `x * 100` alone is not.
    if x.mul_add(100.0, -(hundredths + 0.5)) >= 0.0 {
        hundredths += 1.0;
    }
    let hundredths = hundredths as u128;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}.{:02}", hundredths / 100, hundredths % 100)
}

/// The three values the stats panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub level: String,
    pub answered: String,
    pub average: String,
}

impl From<&Stats> for StatsView {
    fn from(stats: &Stats) -> Self {
        StatsView {
            level: display_value(&stats.level),
            answered: stats.answered.to_string(),
            average: average_display(stats.total_score, stats.answered),
        }
    }
}
