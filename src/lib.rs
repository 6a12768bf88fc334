pub mod auth;
pub mod config;
pub mod db;
pub mod index;
pub mod policy;
pub mod profiles;
pub mod res;
pub mod rooms;
pub mod session;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}, Router};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(index::router())
        .merge(auth::router())
        .nest("/room", rooms::router())
        .nest("/message", rooms::messages_router())
        .merge(profiles::router())
}

pub fn session_layer(secure: bool, inactivity_minutes: i64) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(inactivity_minutes)))
}

/// The whole site: routes, cookie sessions and request tracing.
/// Shared by `main` and the integration tests.
pub fn app(state: AppState, sessions: SessionManagerLayer<MemoryStore>) -> Router {
    router()
        .with_state(state)
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You are not authorized")]
    NotAuthorized,

    #[error("A user with that username already exists")]
    UsernameTaken,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, res::sorry(what)).into_response(),
            AppError::NotAuthorized => {
                (StatusCode::FORBIDDEN, "You are not authorized").into_response()
            }
            AppError::UsernameTaken => (StatusCode::CONFLICT, self.to_string()).into_response(),
            AppError::Internal(err) => {
                tracing::error!("{err:#}\n\n{}", err.backtrace());
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Internal(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::Internal(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(tokio::task::JoinError);
