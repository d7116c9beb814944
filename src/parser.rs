//! # Per-line classification of worker output.
//!
//! [`classify`] is a pure function from one output line to a [`LineUpdate`]:
//! whether the line reports an accepted share, and the new speed if it reports
//! one. The grammar is chosen by the worker variant.
//!
//! ## Grammars
//! ```text
//! Xmrig (xmrig, xmrig-upx, ninjarig):
//!   contains "accepted"        → accepted share
//!   else contains "speed"      → speed = token[5], or token[4] if token[5] == "n/a"
//!
//! Violet (violetminer):
//!   contains "share accepted"  → accepted share
//!   else contains "hashrate:"  → speed = token[2]
//!
//! PassThrough (unknown variants): never matches
//! ```
//! Keyword matching is case-insensitive; tokens are whitespace-separated and
//! taken from the unmodified line. A matched line that is too short for the
//! expected token yields no speed update.

/// Log grammar of a worker family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Xmrig,
    Violet,
    PassThrough,
}

/// Metrics extracted from one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineUpdate {
    /// The line reports an accepted share.
    pub accepted: bool,
    /// The line reports a new speed.
    pub speed: Option<String>,
}

impl LineUpdate {
    fn accepted() -> Self {
        Self {
            accepted: true,
            speed: None,
        }
    }

    fn speed(speed: Option<&str>) -> Self {
        Self {
            accepted: false,
            speed: speed.map(str::to_string),
        }
    }

    /// True when nothing in the line affects the counters.
    pub fn is_empty(&self) -> bool {
        !self.accepted && self.speed.is_none()
    }
}

/// Classifies one line of worker output.
pub fn classify(grammar: Grammar, line: &str) -> LineUpdate {
    let lower = line.to_lowercase();
    match grammar {
        Grammar::Xmrig => {
            if lower.contains("accepted") {
                LineUpdate::accepted()
            } else if lower.contains("speed") {
                LineUpdate::speed(xmrig_speed(line))
            } else {
                LineUpdate::default()
            }
        }
        Grammar::Violet => {
            if lower.contains("share accepted") {
                LineUpdate::accepted()
            } else if lower.contains("hashrate:") {
                LineUpdate::speed(line.split_whitespace().nth(2))
            } else {
                LineUpdate::default()
            }
        }
        Grammar::PassThrough => LineUpdate::default(),
    }
}

fn xmrig_speed(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace().skip(4);
    let fallback = tokens.next();
    match tokens.next() {
        Some("n/a") => fallback,
        Some(speed) => Some(speed),
        None => None,
    }
}
