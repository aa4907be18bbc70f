use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use board_shared::errors::AppResult;
use board_shared::types::auth::AuthUser;
use board_shared::types::pagination::{Paginated, PaginationParams};
use board_shared::types::ApiResponse;

use crate::models::{Post, PostDetail, PostSummary};
use crate::repositories::{PostOrder, PostQuery};
use crate::services::post_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostRequest {
    pub post_id: Uuid,
}

/// Query string of the listing routes. Missing or zero `page` means the first.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<u64>,
    order: Option<String>,
    search: Option<String>,
}

impl ListParams {
    fn into_query(self, search: Option<String>) -> PostQuery {
        PostQuery {
            search,
            order: PostOrder::parse(self.order.as_deref()),
            page: PaginationParams::new(self.page.unwrap_or(1)),
        }
    }
}

pub async fn create_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    req.validate()?;
    let post = post_service::create_post(&state, user.id, &req.title, &req.content).await?;
    Ok(Json(ApiResponse::ok(post)))
}

pub async fn delete_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeletePostRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let post = post_service::delete_post(&state, user.id, req.post_id).await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// GET /post/list?page=1&order=createdAt
pub async fn list_posts(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<Paginated<PostSummary>>>> {
    let page = post_service::list_posts(&state, params.into_query(None)).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /post/list/search?search=<term>&page=1&order=view
pub async fn search_posts(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(mut params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<Paginated<PostSummary>>>> {
    let search = params.search.take().unwrap_or_default();
    let page = post_service::list_posts(&state, params.into_query(Some(search))).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn post_info(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PostDetail>>> {
    let detail = post_service::post_info(&state, post_id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}
