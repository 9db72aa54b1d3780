//! Cell value representation for consolidation datasets

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Layout used when a date/time cell is rendered as text
pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// ISO 8601 layout of a date/time join key
pub const DATETIME_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A single cell value read from (or written to) a worksheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Blank cell
    #[default]
    Empty,
    /// Text value
    String(String),
    /// Any numeric cell (Excel stores integers as floats too)
    Number(f64),
    /// Boolean cell
    Bool(bool),
    /// Date and/or time, as stored in the sheet (no timezone)
    DateTime(NaiveDateTime),
}

impl Value {
    /// Check if this value carries no data (blank or whitespace-only text)
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Normalize this value for use as a join key
    ///
    /// Both sides of a join go through this function, so a numeric order code
    /// (`1001.0` from a number-formatted column) matches the same code typed as
    /// text (`"1001"`). Blank cells yield `None` and never match anything.
    pub fn join_key(&self) -> Option<String> {
        let key = match self {
            Value::Empty => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_KEY_FORMAT).to_string(),
        };

        if key.is_empty() { None } else { Some(key) }
    }
}

/// Render a number the way a spreadsheet shows it in a general-format cell
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_DISPLAY_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}
