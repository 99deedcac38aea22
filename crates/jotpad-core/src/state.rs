//! Session and store-mode state shared by the facade and its consumers.

use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// Which backing store a note operation is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    Online,
    OfflineDemo,
}

impl StoreMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::OfflineDemo => "offline demo",
        }
    }
}

impl std::fmt::Display for StoreMode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Where the session currently stands.
///
/// `Unauthenticated -> Online` on remote sign-in, `Unauthenticated ->
/// OfflineDemo` on demo activation, and either signed-in state back to
/// `Unauthenticated` on sign-out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Online(Identity),
    OfflineDemo(Identity),
}

impl SessionState {
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Unauthenticated => None,
            Self::Online(identity) | Self::OfflineDemo(identity) => Some(identity),
        }
    }

    pub const fn store_mode(&self) -> Option<StoreMode> {
        match self {
            Self::Unauthenticated => None,
            Self::Online(_) => Some(StoreMode::Online),
            Self::OfflineDemo(_) => Some(StoreMode::OfflineDemo),
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}
