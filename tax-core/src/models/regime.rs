use std::fmt;

use serde::{Deserialize, Serialize};

/// Income-tax regime a slab configuration belongs to.
///
/// Only the new regime is modelled.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    #[default]
    New,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            _ => None,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
