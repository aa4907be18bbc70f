use uuid::Uuid;

use board_shared::errors::{AppError, AppResult, ErrorCode};
use board_shared::types::pagination::Paginated;

use crate::models::{Comment, CommentView, LikeToggle, NewComment, NewLike, NewPost, Post, PostDetail, PostSummary};
use crate::repositories::PostQuery;
use crate::AppState;

fn post_not_found() -> AppError {
    AppError::new(ErrorCode::PostNotFound, "존재하지 않는 게시글입니다.")
}

fn comment_not_found() -> AppError {
    AppError::new(ErrorCode::CommentNotFound, "존재하지 않는 댓글입니다.")
}

pub async fn create_post(state: &AppState, user_id: Uuid, title: &str, content: &str) -> AppResult<Post> {
    let post = state
        .posts
        .create(NewPost {
            id: Uuid::now_v7(),
            user_id,
            title: title.to_string(),
            content: content.to_string(),
        })
        .await?;

    tracing::info!(post_id = %post.id, user_id = %user_id, "post created");
    Ok(post)
}

pub async fn delete_post(state: &AppState, user_id: Uuid, post_id: Uuid) -> AppResult<Post> {
    let post = state
        .posts
        .delete_owned(user_id, post_id)
        .await?
        .ok_or_else(post_not_found)?;

    tracing::info!(post_id = %post.id, user_id = %user_id, "post deleted");
    Ok(post)
}

pub async fn list_posts(state: &AppState, query: PostQuery) -> AppResult<Paginated<PostSummary>> {
    let (items, total) = state.posts.list(&query).await?;
    Ok(Paginated::new(items, total, &query.page))
}

/// Counts the read and assembles the detail view.
pub async fn post_info(state: &AppState, post_id: Uuid) -> AppResult<PostDetail> {
    let view = state
        .posts
        .increment_view(post_id)
        .await?
        .ok_or_else(post_not_found)?;
    let post = state.posts.find_by_id(post_id).await?.ok_or_else(post_not_found)?;

    let writer = state
        .users
        .find_by_id(post.user_id)
        .await?
        .map(|u| u.nickname)
        .unwrap_or_default();
    let liked_users = state.likes.liked_nicknames(post_id).await?;
    let (replies, comments): (Vec<CommentView>, Vec<CommentView>) = state
        .comments
        .list_for_post(post_id)
        .await?
        .into_iter()
        .partition(|c| c.reply.is_some());

    Ok(PostDetail {
        id: post.id,
        title: post.title,
        content: post.content,
        writer,
        date: post.created_at,
        view,
        like: liked_users.len() as i64,
        liked_users,
        comments,
        replies,
    })
}

pub async fn create_comment(
    state: &AppState,
    user_id: Uuid,
    post_id: Uuid,
    content: &str,
    reply: Option<Uuid>,
) -> AppResult<Comment> {
    if state.posts.find_by_id(post_id).await?.is_none() {
        return Err(post_not_found());
    }

    if let Some(target_id) = reply {
        let target = state
            .comments
            .find_by_id(target_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(comment_not_found)?;
        if target.is_reply() {
            return Err(AppError::new(ErrorCode::ReplyToReply, "답글에는 답글을 달 수 없습니다."));
        }
    }

    let comment = state
        .comments
        .create(NewComment {
            id: Uuid::now_v7(),
            user_id,
            post_id,
            reply_comment_id: reply,
            content: content.to_string(),
        })
        .await?;

    tracing::info!(comment_id = %comment.id, post_id = %post_id, "comment created");
    Ok(comment)
}

pub async fn delete_comment(state: &AppState, user_id: Uuid, comment_id: Uuid) -> AppResult<Comment> {
    let comment = state
        .comments
        .delete_owned(user_id, comment_id)
        .await?
        .ok_or_else(comment_not_found)?;

    tracing::info!(comment_id = %comment.id, user_id = %user_id, "comment deleted");
    Ok(comment)
}

/// Likes the post if the caller hasn't yet, otherwise takes the like back.
pub async fn like_post(state: &AppState, user_id: Uuid, post_id: Uuid) -> AppResult<LikeToggle> {
    if state.posts.find_by_id(post_id).await?.is_none() {
        return Err(post_not_found());
    }

    let liked = match state.likes.find(user_id, post_id).await? {
        Some(_) => {
            state.likes.delete(user_id, post_id).await?;
            false
        }
        None => {
            state
                .likes
                .create(NewLike { id: Uuid::now_v7(), user_id, post_id })
                .await?;
            true
        }
    };
    let like = state.likes.count_for_post(post_id).await?;

    tracing::debug!(post_id = %post_id, user_id = %user_id, liked, "like toggled");
    Ok(LikeToggle { liked, like })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, User};
    use crate::repositories::PostOrder;
    use crate::services::test_support::{harness, Harness};
    use board_shared::types::pagination::PaginationParams;

    async fn user(h: &Harness, nickname: &str) -> User {
        h.state
            .users
            .create(NewUser {
                id: Uuid::now_v7(),
                email: format!("{nickname}@x.com"),
                nickname: nickname.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
    }

    fn query(search: Option<&str>, order: PostOrder, page: u64) -> PostQuery {
        PostQuery {
            search: search.map(str::to_string),
            order,
            page: PaginationParams::new(page),
        }
    }

    #[tokio::test]
    async fn like_toggle_is_its_own_inverse() {
        let h = harness();
        let author = user(&h, "author").await;
        let fan = user(&h, "fan").await;
        let post = create_post(&h.state, author.id, "t", "c").await.unwrap();

        let on = like_post(&h.state, fan.id, post.id).await.unwrap();
        assert!(on.liked);
        assert_eq!(on.like, 1);

        let off = like_post(&h.state, fan.id, post.id).await.unwrap();
        assert!(!off.liked);
        assert_eq!(off.like, 0);
        assert!(h.state.likes.find(fan.id, post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn like_missing_post_fails() {
        let h = harness();
        let fan = user(&h, "fan").await;
        let err = like_post(&h.state, fan.id, Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PostNotFound));
    }

    #[tokio::test]
    async fn only_owner_deletes_post() {
        let h = harness();
        let author = user(&h, "author").await;
        let other = user(&h, "other").await;
        let post = create_post(&h.state, author.id, "t", "c").await.unwrap();

        let err = delete_post(&h.state, other.id, post.id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PostNotFound));

        let deleted = delete_post(&h.state, author.id, post.id).await.unwrap();
        assert_eq!(deleted.id, post.id);
        assert!(h.state.posts.find_by_id(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_paginates_and_orders() {
        let h = harness();
        let author = user(&h, "author").await;
        let fan = user(&h, "fan").await;

        let mut ids = Vec::new();
        for i in 0..12 {
            let post = create_post(&h.state, author.id, &format!("post {i}"), "body").await.unwrap();
            ids.push(post.id);
        }
        like_post(&h.state, fan.id, ids[3]).await.unwrap();
        post_info(&h.state, ids[5]).await.unwrap();
        post_info(&h.state, ids[5]).await.unwrap();

        let first = list_posts(&h.state, query(None, PostOrder::CreatedAt, 1)).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total, 12);
        assert_eq!(first.total_pages, 2);

        let second = list_posts(&h.state, query(None, PostOrder::CreatedAt, 2)).await.unwrap();
        assert_eq!(second.items.len(), 2);

        let by_like = list_posts(&h.state, query(None, PostOrder::Like, 1)).await.unwrap();
        assert_eq!(by_like.items[0].id, ids[3]);
        assert_eq!(by_like.items[0].like_count, 1);

        let by_view = list_posts(&h.state, query(None, PostOrder::View, 1)).await.unwrap();
        assert_eq!(by_view.items[0].id, ids[5]);
        assert_eq!(by_view.items[0].view, 2);
        assert_eq!(by_view.items[0].writer, "author");
    }

    #[tokio::test]
    async fn search_matches_title_or_content() {
        let h = harness();
        let author = user(&h, "author").await;
        create_post(&h.state, author.id, "rust tips", "body").await.unwrap();
        create_post(&h.state, author.id, "other", "all about rust").await.unwrap();
        create_post(&h.state, author.id, "unrelated", "nothing").await.unwrap();

        let found = list_posts(&h.state, query(Some("rust"), PostOrder::CreatedAt, 1)).await.unwrap();
        assert_eq!(found.total, 2);

        let found = list_posts(&h.state, query(Some("Rust"), PostOrder::CreatedAt, 1)).await.unwrap();
        assert_eq!(found.total, 0);
    }

    #[tokio::test]
    async fn post_info_splits_comments_and_replies() {
        let h = harness();
        let author = user(&h, "author").await;
        let fan = user(&h, "fan").await;
        let post = create_post(&h.state, author.id, "t", "c").await.unwrap();

        let parent = create_comment(&h.state, fan.id, post.id, "first", None).await.unwrap();
        create_comment(&h.state, author.id, post.id, "thanks", Some(parent.id)).await.unwrap();
        like_post(&h.state, fan.id, post.id).await.unwrap();

        let detail = post_info(&h.state, post.id).await.unwrap();
        assert_eq!(detail.view, 1);
        assert_eq!(detail.writer, "author");
        assert_eq!(detail.like, 1);
        assert_eq!(detail.liked_users, vec!["fan".to_string()]);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.replies.len(), 1);
        assert_eq!(detail.replies[0].reply, Some(parent.id));

        let again = post_info(&h.state, post.id).await.unwrap();
        assert_eq!(again.view, 2);
    }

    #[tokio::test]
    async fn replies_are_single_level() {
        let h = harness();
        let author = user(&h, "author").await;
        let post = create_post(&h.state, author.id, "t", "c").await.unwrap();
        let elsewhere = create_post(&h.state, author.id, "t2", "c2").await.unwrap();

        let parent = create_comment(&h.state, author.id, post.id, "p", None).await.unwrap();
        let reply = create_comment(&h.state, author.id, post.id, "r", Some(parent.id)).await.unwrap();

        let err = create_comment(&h.state, author.id, post.id, "rr", Some(reply.id)).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ReplyToReply));

        let err = create_comment(&h.state, author.id, elsewhere.id, "x", Some(parent.id)).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CommentNotFound));

        let err = create_comment(&h.state, author.id, Uuid::now_v7(), "x", None).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PostNotFound));
    }

    #[tokio::test]
    async fn only_owner_deletes_comment() {
        let h = harness();
        let author = user(&h, "author").await;
        let other = user(&h, "other").await;
        let post = create_post(&h.state, author.id, "t", "c").await.unwrap();
        let comment = create_comment(&h.state, author.id, post.id, "p", None).await.unwrap();

        let err = delete_comment(&h.state, other.id, comment.id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CommentNotFound));
        assert!(delete_comment(&h.state, author.id, comment.id).await.is_ok());
    }
}
