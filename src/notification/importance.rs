//! Importance levels for rendered notifications
//!
//! Importance decides how loudly the renderer presents a notification:
//! - HIGH: heads-up, sound and vibration
//! - DEFAULT: normal shade entry with sound
//! - LOW: silent shade entry

use serde::{Deserialize, Serialize};

/// Importance level, ordered `Low < Default < High`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Default,
    High,
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "HIGH",
            Importance::Default => "DEFAULT",
            Importance::Low => "LOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_ordering() {
        assert!(Importance::Low < Importance::Default);
        assert!(Importance::Default < Importance::High);
        assert_eq!(
            [Importance::High, Importance::Low, Importance::Default].iter().max(),
            Some(&Importance::High)
        );
    }

    #[test]
    fn test_importance_display() {
        assert_eq!(format!("{}", Importance::High), "HIGH");
        assert_eq!(format!("{}", Importance::Default), "DEFAULT");
        assert_eq!(format!("{}", Importance::Low), "LOW");
    }

    #[test]
    fn test_importance_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Importance::High).unwrap(), "\"high\"");
        let parsed: Importance = serde_json::from_str("\"default\"").unwrap();
        assert_eq!(parsed, Importance::Default);
    }
}
