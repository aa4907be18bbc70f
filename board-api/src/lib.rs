use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use board_shared::clients::email::Mailer;
use board_shared::middleware::{metrics_middleware, JwtSecrets};

pub mod config;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod services;

use config::AppConfig;
use repositories::{
    CommentRepository, LikeRepository, PostRepository, UserRepository, VerificationRepository,
};

pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires every repository to the same backing store.
    pub fn new<S>(config: AppConfig, store: S, mailer: Arc<dyn Mailer>) -> Self
    where
        S: UserRepository
            + VerificationRepository
            + PostRepository
            + CommentRepository
            + LikeRepository
            + Clone
            + 'static,
    {
        Self {
            config,
            users: Arc::new(store.clone()),
            verifications: Arc::new(store.clone()),
            posts: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            likes: Arc::new(store),
            mailer,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

impl JwtSecrets for AppState {
    fn access_secret(&self) -> &str {
        &self.config.jwt_access_secret
    }

    fn refresh_secret(&self) -> &str {
        &self.config.jwt_refresh_secret
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Auth
        .route("/auth/signUp", post(routes::auth::sign_up))
        .route("/auth/signIn", post(routes::auth::sign_in))
        .route("/auth/signUp/sendEmail", post(routes::verification::send_signup_code))
        .route("/auth/signUp/checkEmail", post(routes::verification::check_signup_code))
        .route("/auth/changePW", post(routes::auth::change_password))
        .route("/auth/changePW/sendEmail", post(routes::verification::send_password_change_code))
        .route("/auth/changePW/checkEmail", post(routes::verification::check_password_change_code))
        .route("/auth/delete", delete(routes::auth::delete_account))
        .route("/auth/refresh", post(routes::auth::refresh))
        // Posts
        .route("/post/create", post(routes::posts::create_post))
        .route("/post/delete", delete(routes::posts::delete_post))
        .route("/post/list", get(routes::posts::list_posts))
        .route("/post/list/search", get(routes::posts::search_posts))
        .route("/post/info/:postId", get(routes::posts::post_info))
        .route("/post/comment/create", post(routes::comments::create_comment))
        .route("/post/comment/delete", delete(routes::comments::delete_comment))
        .route("/post/like/:postId", put(routes::likes::like_post))
        .route_layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
