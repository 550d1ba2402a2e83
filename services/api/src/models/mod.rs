//! API service models

pub mod preference;
pub mod preset;
pub mod user;

// Re-export for convenience
pub use preference::{PreferencesResponse, SetPreferenceRequest, SetPreferencesRequest};
pub use preset::{Preset, PresetRequest, PresetResponse};
pub use user::{LoginRequest, RegisterRequest, User, UserPublic};
