// src/services/tier.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::{STRONG_FROM, WEAK_BELOW},
    error::AppError,
};

/// Ordinal classification of a subject's accuracy.
///
/// The cut points (weak < 40 <= moderate < 70 <= strong) are part of the
/// public API; reports and UIs reproduce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Weak,
    Moderate,
    Strong,
}

impl Tier {
    pub fn classify(accuracy: f64) -> Result<Tier, AppError> {
        if !(0.0..=100.0).contains(&accuracy) {
            return Err(AppError::Validation(format!(
                "accuracy must be within 0..=100, got {}",
                accuracy
            )));
        }

        Ok(if accuracy < WEAK_BELOW {
            Tier::Weak
        } else if accuracy < STRONG_FROM {
            Tier::Moderate
        } else {
            Tier::Strong
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Weak => "weak",
            Tier::Moderate => "moderate",
            Tier::Strong => "strong",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies every subject of a performance mapping.
pub fn classify_all(performance: &BTreeMap<String, f64>) -> Result<BTreeMap<String, Tier>, AppError> {
    performance
        .iter()
        .map(|(subject, accuracy)| {
            Tier::classify(*accuracy)
                .map(|tier| (subject.clone(), tier))
                .map_err(|e| match e {
                    AppError::Validation(msg) => AppError::Validation(format!("{}: {}", subject, msg)),
                    other => other,
                })
        })
        .collect()
}
