// src/config.rs

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Accuracy below this is classified as weak.
pub const WEAK_BELOW: f64 = 40.0;

/// Accuracy at or above this is classified as strong.
pub const STRONG_FROM: f64 = 70.0;

/// Minimum change (in percentage points) between two attempts before a
/// subject counts as improved or downgraded.
pub const TREND_DELTA_POINTS: f64 = 2.0;

/// Number of most recent submissions returned as a user's history.
pub const HISTORY_LIMIT: i64 = 5;

/// Subject weights used by the mixed test pattern.
pub const MIXED_PATTERN_WEIGHTS: &[(&str, f64)] = &[
    ("Polity", 0.25),
    ("Economy", 0.25),
    ("History", 0.20),
    ("Geography", 0.15),
    ("Environment", 0.15),
];

/// Default weekly base hours per subject.
pub const DEFAULT_BASE_HOURS: &[(&str, f64)] = &[
    ("Polity", 5.0),
    ("History", 5.0),
    ("Geography", 4.0),
    ("Environment", 3.0),
    ("Economy", 4.0),
    ("Current Affairs", 3.0),
    ("Science & Tech", 3.0),
];

/// Knobs for the weekly hours allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    /// Base hours per subject. Lookups are case-insensitive.
    pub base_hours: BTreeMap<String, f64>,
    /// Base hours for subjects missing from `base_hours`.
    pub fallback_base_hours: f64,
    /// Hours distributed on top of the base according to weakness.
    pub extra_hours: f64,
    /// Exponent applied to weakness before normalising; >1 favours the weakest.
    pub amplify_exponent: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            base_hours: DEFAULT_BASE_HOURS
                .iter()
                .map(|(s, h)| (s.to_string(), *h))
                .collect(),
            fallback_base_hours: 3.0,
            extra_hours: 6.0,
            amplify_exponent: 1.6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub default_test_size: usize,
    pub max_test_size: usize,
    pub seed_questions_path: Option<String>,
    pub mixed_weights: Vec<(String, f64)>,
    pub planner: PlannerSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quizplan.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::InternalServerError("JWT_SECRET must be set".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let default_test_size = parse_var("DEFAULT_TEST_SIZE", 10)?;
        let max_test_size = parse_var("MAX_TEST_SIZE", 100)?;
        if default_test_size == 0 || default_test_size > max_test_size {
            return Err(AppError::InternalServerError(format!(
                "DEFAULT_TEST_SIZE must be between 1 and {}",
                max_test_size
            )));
        }

        let seed_questions_path = env::var("SEED_QUESTIONS_PATH").ok();

        let planner = PlannerSettings {
            extra_hours: parse_var("PLANNER_EXTRA_HOURS", 6.0)?,
            ..PlannerSettings::default()
        };

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            default_test_size,
            max_test_size,
            seed_questions_path,
            mixed_weights: default_mixed_weights(),
            planner,
        })
    }

    /// Configuration for tests and local tooling: in-memory database, fixed secret.
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: jwt_secret.to_string(),
            rust_log: "error".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            default_test_size: 10,
            max_test_size: 100,
            seed_questions_path: None,
            mixed_weights: default_mixed_weights(),
            planner: PlannerSettings::default(),
        }
    }
}

pub fn default_mixed_weights() -> Vec<(String, f64)> {
    MIXED_PATTERN_WEIGHTS
        .iter()
        .map(|(s, w)| (s.to_string(), *w))
        .collect()
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
