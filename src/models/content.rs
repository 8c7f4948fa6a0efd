use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A processed page. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub full_text: String,
    pub created_at: DateTime<Utc>,
}
