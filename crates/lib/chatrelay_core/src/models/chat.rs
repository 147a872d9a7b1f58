//! Chat domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted chat, owned by a single user.
///
/// Serialized in camelCase since it is returned to the browser as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// `"private"` or `"public"`.
    pub visibility: String,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Whether `user_id` owns this chat.
    pub fn is_owned_by(&self, user_id: &Uuid) -> bool {
        &self.user_id == user_id
    }
}
