use std::env;
use std::fmt;

use crate::parse_bool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes applied to the refresh-token cookie.
#[derive(Clone, Debug)]
pub struct CookieConfig {
    pub domain: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookieConfig {
    pub fn from_env() -> Self {
        Self {
            domain: env::var("COOKIE_DOMAIN").unwrap_or_else(|_| "localhost".to_string()),
            secure: env::var("COOKIE_SECURE")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
            same_site: env::var("COOKIE_SAME_SITE")
                .ok()
                .and_then(|s| SameSite::parse(&s))
                .unwrap_or_default(),
        }
    }
}
