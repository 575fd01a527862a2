//! Takes wire models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short video in the feed
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Take {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub user_avatar: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub audio_name: String,
    pub audio_url: Option<String>,
    /// Length in seconds
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub shares_count: u64,
    #[serde(default)]
    pub views_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_saved: bool,
    #[serde(default)]
    pub hashtags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// One page of the feed
#[derive(Debug, Clone, Deserialize)]
pub struct TakesFeed {
    pub takes: Vec<Take>,
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TakeComment {
    pub id: String,
    pub take_id: String,
    pub user_id: String,
    pub username: String,
    pub user_avatar: Option<String>,
    pub text: String,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of comments under a take
#[derive(Debug, Clone, Deserialize)]
pub struct CommentsPage {
    pub comments: Vec<TakeComment>,
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub has_more: bool,
}

/// Body of `POST /takes/{id}/comments`
#[derive(Debug, Clone, Serialize)]
pub struct AddCommentRequest {
    pub text: String,
}
