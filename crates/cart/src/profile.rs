//! The signed-in customer's identity as kept in client-local storage.

use common::CustomerId;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{CUSTOMER_KEY, SessionId, Storage};

/// Customer identity and contact details saved at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: CustomerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Free-text address as the customer entered it.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl CustomerProfile {
    /// Loads the stored profile.
    ///
    /// Returns `None` if nobody is signed in or the stored value is unreadable.
    pub async fn load<S: Storage + ?Sized>(storage: &S) -> Option<Self> {
        let raw = match storage.get(CUSTOMER_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read customer profile");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed customer profile");
                None
            }
        }
    }

    /// Saves the profile, replacing any previous one.
    pub async fn save<S: Storage + ?Sized>(&self, storage: &S, origin: SessionId) -> Result<()> {
        let value = serde_json::to_string(self)?;
        storage.set(origin, CUSTOMER_KEY, value).await
    }
}
