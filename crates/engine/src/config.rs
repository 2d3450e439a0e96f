//! Engine configuration read from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;

use crate::use_cases::encounter::EncounterSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub db_path: String,
    pub server_host: String,
    pub server_port: u16,
    /// Comma-separated origins, or `*`; CORS stays off when unset
    pub cors_allowed_origins: Option<String>,
    /// JSON catalog upserted into the official partition at startup
    pub official_catalog_path: Option<PathBuf>,
    pub encounter: EncounterSettings,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = EncounterSettings::default();

        let port_key = if text("SERVER_PORT").is_some() {
            "SERVER_PORT"
        } else {
            "PORT"
        };

        Self {
            db_path: text("TABLESMITH_DB").unwrap_or_else(|| "tablesmith.db".into()),
            server_host: text("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parsed(&text, port_key, 3000),
            cors_allowed_origins: text("CORS_ALLOWED_ORIGINS"),
            official_catalog_path: text("OFFICIAL_CATALOG_PATH").map(PathBuf::from),
            encounter: EncounterSettings {
                snapshot_concurrency: parsed(
                    &text,
                    "SNAPSHOT_CONCURRENCY",
                    defaults.snapshot_concurrency,
                )
                .max(1),
                replace_max_attempts: parsed(
                    &text,
                    "REPLACE_MAX_ATTEMPTS",
                    defaults.replace_max_attempts,
                )
                .max(1),
                slug_max_attempts: parsed(&text, "SLUG_MAX_ATTEMPTS", defaults.slug_max_attempts)
                    .max(1),
            },
        }
    }
}

fn parsed<T>(text: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match text(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid number, using default");
            default
        }),
    }
}
