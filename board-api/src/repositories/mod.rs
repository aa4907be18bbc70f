//! Storage contracts, one trait per entity. `postgres` is the production
//! backend; `memory` keeps everything in process.

use async_trait::async_trait;
use uuid::Uuid;

use board_shared::errors::AppResult;
use board_shared::types::PaginationParams;

use crate::models::{
    Comment, CommentView, Like, NewComment, NewLike, NewPost, NewUser, NewVerification, Post,
    PostSummary, User, Verification, VerificationPurpose,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `EmailAlreadyExists` when the email is taken.
    async fn create(&self, user: NewUser) -> AppResult<User>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Returns false when no such user exists.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<bool>;
    async fn update_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> AppResult<bool>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Fails with `VerificationAlreadySent` when (email, purpose) is taken.
    async fn create(&self, verification: NewVerification) -> AppResult<Verification>;
    async fn find(&self, email: &str, purpose: VerificationPurpose) -> AppResult<Option<Verification>>;
    async fn find_matching(
        &self,
        email: &str,
        code: i32,
        purpose: VerificationPurpose,
    ) -> AppResult<Option<Verification>>;
    async fn mark_verified(&self, id: Uuid) -> AppResult<()>;
    async fn delete(&self, email: &str, purpose: VerificationPurpose) -> AppResult<bool>;
}

/// Sort key for post listings. Always descending, ties broken by newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    #[default]
    CreatedAt,
    View,
    Like,
}

impl PostOrder {
    /// Unknown values fall back to newest-first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("view") => Self::View,
            Some("like") => Self::Like,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub search: Option<String>,
    pub order: PostOrder,
    pub page: PaginationParams,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> AppResult<Post>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>>;
    /// Deletes the post only if `user_id` wrote it.
    async fn delete_owned(&self, user_id: Uuid, post_id: Uuid) -> AppResult<Option<Post>>;
    /// Returns the view count after incrementing.
    async fn increment_view(&self, id: Uuid) -> AppResult<Option<i32>>;
    /// One page of summaries plus the size of the whole filtered set.
    async fn list(&self, query: &PostQuery) -> AppResult<(Vec<PostSummary>, u64)>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> AppResult<Comment>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>>;
    async fn delete_owned(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<Option<Comment>>;
    /// Oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> AppResult<Vec<CommentView>>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> AppResult<Option<Like>>;
    async fn create(&self, like: NewLike) -> AppResult<Like>;
    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> AppResult<bool>;
    async fn count_for_post(&self, post_id: Uuid) -> AppResult<i64>;
    async fn liked_nicknames(&self, post_id: Uuid) -> AppResult<Vec<String>>;
}
