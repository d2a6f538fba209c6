//! Shared prompt types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use booksum_core::AppError;

/// Output language for generated summaries.
///
/// Selects which wording every prompt template uses. Spanish is the
/// default throughout the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    /// Suffix used to select localized templates ("es" | "en").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "es" | "spanish" => Ok(Self::Es),
            "en" | "english" => Ok(Self::En),
            other => Err(AppError::Config(format!(
                "Unknown language: {}. Supported: es, en",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("es".parse::<Language>().unwrap(), Language::Es);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("english".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_default() {
        assert_eq!(Language::default(), Language::Es);
    }
}
