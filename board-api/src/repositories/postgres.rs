use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Nullable, Text};
use uuid::Uuid;

use board_shared::clients::db::{checkout, DbPool};
use board_shared::errors::{AppError, AppResult, ErrorCode};

use super::{
    CommentRepository, LikeRepository, PostOrder, PostQuery, PostRepository, UserRepository,
    VerificationRepository,
};
use crate::models::{
    Comment, CommentView, Like, NewComment, NewLike, NewPost, NewUser, NewVerification, Post,
    PostSummary, User, Verification, VerificationPurpose,
};
use crate::schema::{comments, likes, posts, users, verifications};

/// Diesel-backed implementation of every repository over one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn on_unique_violation(err: DieselError, code: ErrorCode, message: &str) -> AppError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => AppError::new(code, message),
        other => AppError::Database(other),
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut conn = checkout(&self.pool)?;
        diesel::insert_into(users::table)
            .values(&user)
            .get_result::<User>(&mut conn)
            .map_err(|e| on_unique_violation(e, ErrorCode::EmailAlreadyExists, "이미 가입되어 있는 이메일입니다."))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut conn = checkout(&self.pool)?;
        Ok(users::table.find(id).first::<User>(&mut conn).optional()?)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let mut conn = checkout(&self.pool)?;
        Ok(users::table
            .filter(users::email.eq(email))
            .first::<User>(&mut conn)
            .optional()?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<bool> {
        let mut conn = checkout(&self.pool)?;
        let updated = diesel::update(users::table.find(id))
            .set((
                users::password_hash.eq(password_hash),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    async fn update_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> AppResult<bool> {
        let mut conn = checkout(&self.pool)?;
        let updated = diesel::update(users::table.find(id))
            .set((
                users::refresh_token_hash.eq(token_hash),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::delete(users::table.find(id)).execute(&mut conn)? > 0)
    }
}

#[async_trait]
impl VerificationRepository for PgStore {
    async fn create(&self, verification: NewVerification) -> AppResult<Verification> {
        let mut conn = checkout(&self.pool)?;
        diesel::insert_into(verifications::table)
            .values(&verification)
            .get_result::<Verification>(&mut conn)
            .map_err(|e| on_unique_violation(e, ErrorCode::VerificationAlreadySent, "이미 코드가 전송되었습니다."))
    }

    async fn find(&self, email: &str, purpose: VerificationPurpose) -> AppResult<Option<Verification>> {
        let mut conn = checkout(&self.pool)?;
        Ok(verifications::table
            .filter(verifications::email.eq(email))
            .filter(verifications::purpose.eq(purpose.as_str()))
            .first::<Verification>(&mut conn)
            .optional()?)
    }

    async fn find_matching(
        &self,
        email: &str,
        code: i32,
        purpose: VerificationPurpose,
    ) -> AppResult<Option<Verification>> {
        let mut conn = checkout(&self.pool)?;
        Ok(verifications::table
            .filter(verifications::email.eq(email))
            .filter(verifications::code.eq(code))
            .filter(verifications::purpose.eq(purpose.as_str()))
            .first::<Verification>(&mut conn)
            .optional()?)
    }

    async fn mark_verified(&self, id: Uuid) -> AppResult<()> {
        let mut conn = checkout(&self.pool)?;
        diesel::update(verifications::table.find(id))
            .set(verifications::verified.eq(true))
            .execute(&mut conn)?;
        Ok(())
    }

    async fn delete(&self, email: &str, purpose: VerificationPurpose) -> AppResult<bool> {
        let mut conn = checkout(&self.pool)?;
        let deleted = diesel::delete(
            verifications::table
                .filter(verifications::email.eq(email))
                .filter(verifications::purpose.eq(purpose.as_str())),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

const POST_FILTER: &str =
    "($1::text IS NULL OR strpos(p.title, $1) > 0 OR strpos(p.content, $1) > 0)";

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

fn order_column(order: PostOrder) -> &'static str {
    match order {
        PostOrder::CreatedAt => "p.created_at",
        PostOrder::View => "p.view",
        PostOrder::Like => "like_count",
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn create(&self, post: NewPost) -> AppResult<Post> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(posts::table)
            .values(&post)
            .get_result::<Post>(&mut conn)?)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>> {
        let mut conn = checkout(&self.pool)?;
        Ok(posts::table.find(id).first::<Post>(&mut conn).optional()?)
    }

    async fn delete_owned(&self, user_id: Uuid, post_id: Uuid) -> AppResult<Option<Post>> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::delete(
            posts::table
                .filter(posts::id.eq(post_id))
                .filter(posts::user_id.eq(user_id)),
        )
        .get_result::<Post>(&mut conn)
        .optional()?)
    }

    async fn increment_view(&self, id: Uuid) -> AppResult<Option<i32>> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::update(posts::table.find(id))
            .set(posts::view.eq(posts::view + 1))
            .returning(posts::view)
            .get_result::<i32>(&mut conn)
            .optional()?)
    }

    async fn list(&self, query: &PostQuery) -> AppResult<(Vec<PostSummary>, u64)> {
        let mut conn = checkout(&self.pool)?;
        let search = query.search.as_deref();

        let sql = format!(
            "SELECT p.id, p.title, p.content, u.nickname AS writer, p.created_at AS date, p.view, \
                    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count, \
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count \
             FROM posts p JOIN users u ON u.id = p.user_id \
             WHERE {POST_FILTER} \
             ORDER BY {} DESC, p.created_at DESC \
             LIMIT $2 OFFSET $3",
            order_column(query.order),
        );

        let items = diesel::sql_query(sql)
            .bind::<Nullable<Text>, _>(search)
            .bind::<BigInt, _>(i64::try_from(query.page.limit()).unwrap_or(i64::MAX))
            .bind::<BigInt, _>(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
            .load::<PostSummary>(&mut conn)?;

        let total = diesel::sql_query(format!("SELECT COUNT(*) AS total FROM posts p WHERE {POST_FILTER}"))
            .bind::<Nullable<Text>, _>(search)
            .get_result::<CountRow>(&mut conn)?
            .total;

        Ok((items, total.max(0) as u64))
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn create(&self, comment: NewComment) -> AppResult<Comment> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(comments::table)
            .values(&comment)
            .get_result::<Comment>(&mut conn)?)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let mut conn = checkout(&self.pool)?;
        Ok(comments::table.find(id).first::<Comment>(&mut conn).optional()?)
    }

    async fn delete_owned(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<Option<Comment>> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::delete(
            comments::table
                .filter(comments::id.eq(comment_id))
                .filter(comments::user_id.eq(user_id)),
        )
        .get_result::<Comment>(&mut conn)
        .optional()?)
    }

    async fn list_for_post(&self, post_id: Uuid) -> AppResult<Vec<CommentView>> {
        let mut conn = checkout(&self.pool)?;
        let rows = comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post_id))
            .order(comments::created_at.asc())
            .select((comments::all_columns, users::nickname))
            .load::<(Comment, String)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(comment, writer)| CommentView {
                id: comment.id,
                content: comment.content,
                writer,
                date: comment.created_at,
                reply: comment.reply_comment_id,
            })
            .collect())
    }
}

#[async_trait]
impl LikeRepository for PgStore {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> AppResult<Option<Like>> {
        let mut conn = checkout(&self.pool)?;
        Ok(likes::table
            .filter(likes::user_id.eq(user_id))
            .filter(likes::post_id.eq(post_id))
            .first::<Like>(&mut conn)
            .optional()?)
    }

    async fn create(&self, like: NewLike) -> AppResult<Like> {
        let mut conn = checkout(&self.pool)?;
        Ok(diesel::insert_into(likes::table)
            .values(&like)
            .get_result::<Like>(&mut conn)?)
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> AppResult<bool> {
        let mut conn = checkout(&self.pool)?;
        let deleted = diesel::delete(
            likes::table
                .filter(likes::user_id.eq(user_id))
                .filter(likes::post_id.eq(post_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    async fn count_for_post(&self, post_id: Uuid) -> AppResult<i64> {
        let mut conn = checkout(&self.pool)?;
        Ok(likes::table
            .filter(likes::post_id.eq(post_id))
            .count()
            .get_result::<i64>(&mut conn)?)
    }

    async fn liked_nicknames(&self, post_id: Uuid) -> AppResult<Vec<String>> {
        let mut conn = checkout(&self.pool)?;
        Ok(likes::table
            .inner_join(users::table)
            .filter(likes::post_id.eq(post_id))
            .order(likes::created_at.asc())
            .select(users::nickname)
            .load::<String>(&mut conn)?)
    }
}
