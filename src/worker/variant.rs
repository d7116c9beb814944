use std::fmt;

use crate::parser::Grammar;

/// Known worker builds.
///
/// The variant decides which output grammar the parser applies. Unknown
/// identifiers are kept verbatim in [`WorkerVariant::Other`] and get no metrics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkerVariant {
    Xmrig,
    XmrigUpx,
    Ninjarig,
    Violetminer,
    Other(String),
}

impl WorkerVariant {
    /// Maps a worker identifier (case-insensitive) to a variant.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "xmrig" => WorkerVariant::Xmrig,
            "xmrig-upx" | "xmrig_upx" => WorkerVariant::XmrigUpx,
            "ninjarig" => WorkerVariant::Ninjarig,
            "violetminer" => WorkerVariant::Violetminer,
            _ => WorkerVariant::Other(id.to_string()),
        }
    }

    /// Stable identifier of the variant.
    pub fn id(&self) -> &str {
        match self {
            WorkerVariant::Xmrig => "xmrig",
            WorkerVariant::XmrigUpx => "xmrig-upx",
            WorkerVariant::Ninjarig => "ninjarig",
            WorkerVariant::Violetminer => "violetminer",
            WorkerVariant::Other(id) => id,
        }
    }

    /// Output grammar used by this variant.
    pub fn grammar(&self) -> Grammar {
        match self {
            WorkerVariant::Xmrig | WorkerVariant::XmrigUpx | WorkerVariant::Ninjarig => {
                Grammar::Xmrig
            }
            WorkerVariant::Violetminer => Grammar::Violet,
            WorkerVariant::Other(_) => Grammar::PassThrough,
        }
    }
}

impl From<&str> for WorkerVariant {
    fn from(id: &str) -> Self {
        WorkerVariant::from_id(id)
    }
}

impl fmt::Display for WorkerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
