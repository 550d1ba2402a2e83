//! Preference payloads
//!
//! Preferences are arbitrary string key/value pairs scoped to a user;
//! the repository returns them as a plain map, so there is no row entity
//! here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bulk preference update request
#[derive(Debug, Deserialize)]
pub struct SetPreferencesRequest {
    pub preferences: HashMap<String, String>,
}

/// Single preference update request
#[derive(Debug, Deserialize)]
pub struct SetPreferenceRequest {
    pub value: String,
}

/// All preferences for the current user
#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub preferences: HashMap<String, String>,
}
