use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for category
///
/// `parent_id` is not guaranteed to reference an existing row: it may point to
/// the row itself or to an id that no longer exists. The tree builder treats
/// both cases as roots.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub category_type: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub is_featured: bool,
    pub is_disable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
