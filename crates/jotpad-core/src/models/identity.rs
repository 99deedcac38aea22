//! Signed-in identity model

use serde::{Deserialize, Serialize};

const OFFLINE_DEMO_UID: &str = "offline-demo-user";
const OFFLINE_DEMO_EMAIL: &str = "demo@offline.com";
const OFFLINE_DEMO_DISPLAY_NAME: &str = "Offline Demo User";

/// The identity a session runs as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub email_verified: bool,
    /// Anonymous identities (including the demo user) have no backing account
    pub is_anonymous: bool,
}

impl Identity {
    /// The fixed synthetic identity that owns every offline demo note.
    #[must_use]
    pub fn offline_demo() -> Self {
        Self {
            uid: OFFLINE_DEMO_UID.to_string(),
            email: Some(OFFLINE_DEMO_EMAIL.to_string()),
            display_name: Some(OFFLINE_DEMO_DISPLAY_NAME.to_string()),
            email_verified: false,
            is_anonymous: true,
        }
    }

    #[must_use]
    pub fn is_offline_demo(&self) -> bool {
        self.uid == OFFLINE_DEMO_UID
    }
}
