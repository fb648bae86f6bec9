//! Keyword routing between the two backends
//!
//! A message goes to the moon backend when its lower-cased text contains
//! any lunar keyword (English or Russian); everything else goes to the
//! crypto backend.

use std::fmt;

/// Substrings that mark a message as lunar
pub const MOON_KEYWORDS: &[&str] = &[
    "moon",
    "lunar",
    "луна",
    "лунн",
    "фаз",
    "phase",
    "полнолуние",
    "новолуние",
    "full moon",
    "new moon",
    "waxing",
    "waning",
    "растущая",
    "убывающая",
    "lunation",
    "лунация",
    "moon phase",
];

/// Backend selected for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Crypto,
    Moon,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Crypto => write!(f, "crypto"),
            BackendKind::Moon => write!(f, "moon"),
        }
    }
}

/// Pick the backend for a message
///
/// # Examples
///
/// ```
/// use cryptomoon::router::{detect_backend, BackendKind};
///
/// assert_eq!(detect_backend("Какая сейчас ЛУНА?"), BackendKind::Moon);
/// assert_eq!(detect_backend("btc price"), BackendKind::Crypto);
/// ```
pub fn detect_backend(message: &str) -> BackendKind {
    let lowered = message.to_lowercase();
    if MOON_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        BackendKind::Moon
    } else {
        BackendKind::Crypto
    }
}
