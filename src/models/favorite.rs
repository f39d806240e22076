//! Favorite route join record.

use serde::{Deserialize, Serialize};

/// A user's favorite route (`user_favorites` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRoute {
    /// Document ID
    pub id: String,
    pub user_id: String,
    pub route_id: String,
    /// When the favorite was added (ISO 8601)
    pub created_at: String,
}
