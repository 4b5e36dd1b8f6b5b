//! Per-conversation user profile.

use serde::{Deserialize, Serialize};

/// What the bot knows about the user it is talking to.
///
/// Only the dialog steps change `suicidal_risk` and `frequency`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub suicidal_risk: i32,
    #[serde(default)]
    pub frequency: Option<String>,
}
