//! Display locale for account-facing text.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Locales the shop frontend can render in.
///
/// Carried as the `lang` claim of the bearer token and persisted under the
/// `locale` storage key so the choice survives a reload. Unrecognized
/// values fall back to [`Locale::En`] at the parse site rather than here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Polish.
    Pl,
}

impl Locale {
    /// The lowercase language tag used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Pl => "pl",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "pl" => Ok(Self::Pl),
            _ => Err(format!("unsupported locale: {s}")),
        }
    }
}
