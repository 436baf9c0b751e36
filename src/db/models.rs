use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout written by SQLite's `strftime('%Y-%m-%d %H:%M:%f')`.
const DB_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// The group a listed post belongs to, as much as a post card needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

/// A post joined with its author and group, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub author_id: String,
    pub author_username: String,
    pub group: Option<GroupRef>,
    pub created_at: String,
}

impl PostView {
    pub fn group_id(&self) -> Option<i64> {
        self.group.as_ref().map(|g| g.id)
    }

    /// First 30 characters of the text, used as the detail page title.
    pub fn headline(&self) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(30).collect();
        if chars.next().is_some() {
            format!("{head}…")
        } else {
            head
        }
    }

    /// Human-readable publication date, e.g. "14 October 2026".
    pub fn pub_date(&self) -> String {
        NaiveDateTime::parse_from_str(&self.created_at, DB_TIMESTAMP)
            .map(|ts| ts.format("%-d %B %Y").to_string())
            .unwrap_or_else(|_| self.created_at.clone())
    }
}
