use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use board_shared::errors::{AppError, AppResult, ErrorCode};

use super::{
    CommentRepository, LikeRepository, PostOrder, PostQuery, PostRepository, UserRepository,
    VerificationRepository,
};
use crate::models::{
    Comment, CommentView, Like, NewComment, NewLike, NewPost, NewUser, NewVerification, Post,
    PostSummary, User, Verification, VerificationPurpose,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    verifications: HashMap<Uuid, Verification>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    likes: HashMap<Uuid, Like>,
}

impl Tables {
    fn nickname(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.nickname.clone())
            .unwrap_or_default()
    }

    fn remove_post(&mut self, post_id: Uuid) -> Option<Post> {
        let post = self.posts.remove(&post_id)?;
        self.comments.retain(|_, c| c.post_id != post_id);
        self.likes.retain(|_, l| l.post_id != post_id);
        Some(post)
    }

    fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let comment = self.comments.remove(&comment_id)?;
        self.comments.retain(|_, c| c.reply_comment_id != Some(comment_id));
        Some(comment)
    }

    fn remove_user(&mut self, user_id: Uuid) -> bool {
        if self.users.remove(&user_id).is_none() {
            return false;
        }
        let owned: Vec<Uuid> = self
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            self.remove_post(post_id);
        }
        let authored: Vec<Uuid> = self
            .comments
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.id)
            .collect();
        for comment_id in authored {
            self.remove_comment(comment_id);
        }
        self.likes.retain(|_, l| l.user_id != user_id);
        true
    }
}

/// In-process store with the same uniqueness and cascade rules as the
/// Postgres schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a verification's creation time.
    #[cfg(test)]
    pub(crate) async fn backdate_verification(&self, id: Uuid, created_at: chrono::DateTime<Utc>) {
        if let Some(v) = self.tables.write().await.verifications.get_mut(&id) {
            v.created_at = created_at;
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::new(ErrorCode::EmailAlreadyExists, "이미 가입되어 있는 이메일입니다."));
        }
        let now = Utc::now();
        let row = User {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.users.get_mut(&id) {
            Some(user) => {
                user.refresh_token_hash = token_hash.map(str::to_string);
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.remove_user(id))
    }
}

#[async_trait]
impl VerificationRepository for MemoryStore {
    async fn create(&self, verification: NewVerification) -> AppResult<Verification> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .verifications
            .values()
            .any(|v| v.email == verification.email && v.purpose == verification.purpose);
        if taken {
            return Err(AppError::new(ErrorCode::VerificationAlreadySent, "이미 코드가 전송되었습니다."));
        }
        let row = Verification {
            id: verification.id,
            email: verification.email,
            purpose: verification.purpose,
            code: verification.code,
            verified: false,
            created_at: Utc::now(),
        };
        tables.verifications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find(&self, email: &str, purpose: VerificationPurpose) -> AppResult<Option<Verification>> {
        Ok(self
            .tables
            .read()
            .await
            .verifications
            .values()
            .find(|v| v.email == email && v.purpose == purpose.as_str())
            .cloned())
    }

    async fn find_matching(
        &self,
        email: &str,
        code: i32,
        purpose: VerificationPurpose,
    ) -> AppResult<Option<Verification>> {
        Ok(self
            .tables
            .read()
            .await
            .verifications
            .values()
            .find(|v| v.email == email && v.code == code && v.purpose == purpose.as_str())
            .cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> AppResult<()> {
        if let Some(v) = self.tables.write().await.verifications.get_mut(&id) {
            v.verified = true;
        }
        Ok(())
    }

    async fn delete(&self, email: &str, purpose: VerificationPurpose) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.verifications.len();
        tables
            .verifications
            .retain(|_, v| !(v.email == email && v.purpose == purpose.as_str()));
        Ok(tables.verifications.len() < before)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> AppResult<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.user_id) {
            return Err(AppError::new(ErrorCode::UserNotFound, "존재하지 않는 유저입니다."));
        }
        let now = Utc::now();
        let row = Post {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            content: post.content,
            view: 0,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn delete_owned(&self, user_id: Uuid, post_id: Uuid) -> AppResult<Option<Post>> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .posts
            .get(&post_id)
            .is_some_and(|p| p.user_id == user_id);
        Ok(if owned { tables.remove_post(post_id) } else { None })
    }

    async fn increment_view(&self, id: Uuid) -> AppResult<Option<i32>> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.get_mut(&id).map(|p| {
            p.view += 1;
            p.view
        }))
    }

    async fn list(&self, query: &PostQuery) -> AppResult<(Vec<PostSummary>, u64)> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PostSummary> = tables
            .posts
            .values()
            .filter(|p| match query.search.as_deref() {
                Some(term) => p.title.contains(term) || p.content.contains(term),
                None => true,
            })
            .map(|p| PostSummary {
                id: p.id,
                title: p.title.clone(),
                content: p.content.clone(),
                writer: tables.nickname(p.user_id),
                date: p.created_at,
                view: p.view,
                like_count: tables.likes.values().filter(|l| l.post_id == p.id).count() as i64,
                comment_count: tables.comments.values().filter(|c| c.post_id == p.id).count() as i64,
            })
            .collect();

        rows.sort_by(|a, b| {
            let primary = match query.order {
                PostOrder::CreatedAt => b.date.cmp(&a.date),
                PostOrder::View => b.view.cmp(&a.view),
                PostOrder::Like => b.like_count.cmp(&a.like_count),
            };
            primary.then_with(|| b.date.cmp(&a.date)).then_with(|| b.id.cmp(&a.id))
        });

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit() as usize)
            .collect();
        Ok((items, total))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> AppResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(AppError::new(ErrorCode::PostNotFound, "post not found"));
        }
        let row = Comment {
            id: comment.id,
            user_id: comment.user_id,
            post_id: comment.post_id,
            reply_comment_id: comment.reply_comment_id,
            content: comment.content,
            created_at: Utc::now(),
        };
        tables.comments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn delete_owned(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .comments
            .get(&comment_id)
            .is_some_and(|c| c.user_id == user_id);
        Ok(if owned { tables.remove_comment(comment_id) } else { None })
    }

    async fn list_for_post(&self, post_id: Uuid) -> AppResult<Vec<CommentView>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(rows
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                content: c.content.clone(),
                writer: tables.nickname(c.user_id),
                date: c.created_at,
                reply: c.reply_comment_id,
            })
            .collect())
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> AppResult<Option<Like>> {
        Ok(self
            .tables
            .read()
            .await
            .likes
            .values()
            .find(|l| l.user_id == user_id && l.post_id == post_id)
            .cloned())
    }

    async fn create(&self, like: NewLike) -> AppResult<Like> {
        let mut tables = self.tables.write().await;
        let exists = tables
            .likes
            .values()
            .any(|l| l.user_id == like.user_id && l.post_id == like.post_id);
        if exists {
            return Err(AppError::internal("duplicate like"));
        }
        let row = Like {
            id: like.id,
            user_id: like.user_id,
            post_id: like.post_id,
            created_at: Utc::now(),
        };
        tables.likes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.likes.len();
        tables
            .likes
            .retain(|_, l| !(l.user_id == user_id && l.post_id == post_id));
        Ok(tables.likes.len() < before)
    }

    async fn count_for_post(&self, post_id: Uuid) -> AppResult<i64> {
        Ok(self
            .tables
            .read()
            .await
            .likes
            .values()
            .filter(|l| l.post_id == post_id)
            .count() as i64)
    }

    async fn liked_nicknames(&self, post_id: Uuid) -> AppResult<Vec<String>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Like> = tables.likes.values().filter(|l| l.post_id == post_id).collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows.into_iter().map(|l| tables.nickname(l.user_id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, email: &str) -> User {
        UserRepository::create(
            store,
            NewUser {
                id: Uuid::now_v7(),
                email: email.into(),
                nickname: email.split('@').next().unwrap_or_default().into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        user(&store, "a@x.com").await;

        let err = UserRepository::create(
            &store,
            NewUser {
                id: Uuid::now_v7(),
                email: "a@x.com".into(),
                nickname: "other".into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn one_pending_code_per_email_and_purpose() {
        let store = MemoryStore::new();
        let pending = |purpose: VerificationPurpose, code| NewVerification {
            id: Uuid::now_v7(),
            email: "a@x.com".into(),
            purpose: purpose.as_str().into(),
            code,
        };

        VerificationRepository::create(&store, pending(VerificationPurpose::Signup, 111_111))
            .await
            .unwrap();
        let err = VerificationRepository::create(&store, pending(VerificationPurpose::Signup, 222_222))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::VerificationAlreadySent));

        let kept = VerificationRepository::find(&store, "a@x.com", VerificationPurpose::Signup)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.code, 111_111);

        // the other purpose is an independent slot
        VerificationRepository::create(&store, pending(VerificationPurpose::PasswordChange, 333_333))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn one_like_per_user_and_post() {
        let store = MemoryStore::new();
        let author = user(&store, "a@x.com").await;
        let post = PostRepository::create(
            &store,
            NewPost { id: Uuid::now_v7(), user_id: author.id, title: "t".into(), content: "c".into() },
        )
        .await
        .unwrap();
        let like = || NewLike { id: Uuid::now_v7(), user_id: author.id, post_id: post.id };

        LikeRepository::create(&store, like()).await.unwrap();
        assert!(LikeRepository::create(&store, like()).await.is_err());
        assert_eq!(store.count_for_post(post.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_content() {
        let store = MemoryStore::new();
        let author = user(&store, "a@x.com").await;
        let fan = user(&store, "b@x.com").await;

        let post = PostRepository::create(
            &store,
            NewPost { id: Uuid::now_v7(), user_id: author.id, title: "t".into(), content: "c".into() },
        )
        .await
        .unwrap();
        LikeRepository::create(&store, NewLike { id: Uuid::now_v7(), user_id: fan.id, post_id: post.id })
            .await
            .unwrap();

        assert!(UserRepository::delete(&store, author.id).await.unwrap());
        assert!(PostRepository::find_by_id(&store, post.id).await.unwrap().is_none());
        assert_eq!(store.count_for_post(post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_comment_removes_its_replies() {
        let store = MemoryStore::new();
        let author = user(&store, "a@x.com").await;
        let post = PostRepository::create(
            &store,
            NewPost { id: Uuid::now_v7(), user_id: author.id, title: "t".into(), content: "c".into() },
        )
        .await
        .unwrap();
        let parent = CommentRepository::create(
            &store,
            NewComment { id: Uuid::now_v7(), user_id: author.id, post_id: post.id, reply_comment_id: None, content: "p".into() },
        )
        .await
        .unwrap();
        CommentRepository::create(
            &store,
            NewComment { id: Uuid::now_v7(), user_id: author.id, post_id: post.id, reply_comment_id: Some(parent.id), content: "r".into() },
        )
        .await
        .unwrap();

        CommentRepository::delete_owned(&store, author.id, parent.id).await.unwrap();
        assert!(store.list_for_post(post.id).await.unwrap().is_empty());
    }
}
