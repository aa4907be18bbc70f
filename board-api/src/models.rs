use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text, Timestamptz};
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{comments, likes, posts, users, verifications};

// --- Users ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
}

// --- Verifications ---

/// What a verification code unlocks. Stored as text in `verifications.purpose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationPurpose {
    Signup,
    PasswordChange,
}

impl VerificationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::PasswordChange => "password-change",
        }
    }
}

impl std::fmt::Display for VerificationPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = verifications)]
pub struct Verification {
    pub id: Uuid,
    pub email: String,
    pub purpose: String,
    #[serde(skip_serializing)]
    pub code: i32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Verification {
    pub fn is_expired(&self, ttl_secs: i64, now: DateTime<Utc>) -> bool {
        ttl_secs > 0 && self.created_at + chrono::Duration::seconds(ttl_secs) < now
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = verifications)]
pub struct NewVerification {
    pub id: Uuid,
    pub email: String,
    pub purpose: String,
    pub code: i32,
}

// --- Posts ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub view: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
}

// --- Comments ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub reply_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.reply_comment_id.is_some()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub reply_comment_id: Option<Uuid>,
    pub content: String,
}

// --- Likes ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
}

// --- Read models ---

/// One row of a post listing.
#[derive(Debug, Clone, QueryableByName, Serialize)]
pub struct PostSummary {
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: Uuid,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub content: String,
    #[diesel(sql_type = Text)]
    pub writer: String,
    #[diesel(sql_type = Timestamptz)]
    pub date: DateTime<Utc>,
    #[diesel(sql_type = Integer)]
    pub view: i32,
    #[diesel(sql_type = BigInt)]
    #[serde(rename = "like")]
    pub like_count: i64,
    #[diesel(sql_type = BigInt)]
    #[serde(rename = "comment")]
    pub comment_count: i64,
}

/// A comment joined with its author's nickname.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub writer: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub writer: String,
    pub date: DateTime<Utc>,
    pub view: i32,
    pub like: i64,
    pub liked_users: Vec<String>,
    pub comments: Vec<CommentView>,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub like: i64,
}
