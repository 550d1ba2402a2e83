//! Timer preset model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Timer preset entity
#[derive(Debug, Clone, FromRow)]
pub struct Preset {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub created_at: DateTime<Utc>,
}

/// Preset create/update request
///
/// Omitted time fields default to zero; the handler validates the ranges
/// before any store call.
#[derive(Debug, Deserialize)]
pub struct PresetRequest {
    pub name: String,
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub seconds: i64,
}

/// Preset as returned to the client
#[derive(Debug, Serialize)]
pub struct PresetResponse {
    pub id: i64,
    pub name: String,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Preset> for PresetResponse {
    fn from(preset: Preset) -> Self {
        Self {
            id: preset.id,
            name: preset.name,
            hours: preset.hours,
            minutes: preset.minutes,
            seconds: preset.seconds,
            created_at: preset.created_at,
        }
    }
}
