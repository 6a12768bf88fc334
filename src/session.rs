use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db::users::User, AppError, AppResult};

pub const USER_ID: &str = "user_id";
pub const RETURN_URL: &str = "return_url";

/// Whoever is making the request, if they are logged in.
pub struct Viewer(pub Option<User>);

/// A logged in user. Anonymous requests are sent to the login page.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for Viewer
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::from(msg))?;

        let Some(user_id) = session.get::<Uuid>(USER_ID).await? else {
            return Ok(Viewer(None));
        };

        let db_pool = SqlitePool::from_ref(state);
        Ok(Viewer(User::get(&db_pool, user_id).await?))
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Viewer(user) = Viewer::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if let Some(user) = user {
            return Ok(CurrentUser(user));
        }

        // nested routers see a stripped uri
        let path = match parts.extensions.get::<OriginalUri>() {
            Some(OriginalUri(uri)) => uri.path().to_owned(),
            None => parts.uri.path().to_owned(),
        };
        let return_url = urlencoding::encode(&path);
        Err(Redirect::to(&format!("/login?return_url={return_url}")).into_response())
    }
}

/// Logs `user` in on this session under a fresh session id.
pub async fn start(session: &Session, user: &User) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_ID, user.id).await?;
    Ok(())
}

pub async fn end(session: &Session) {
    session.clear().await;
}

/// Only same-site paths are accepted as post-login destinations.
pub fn local_path(url: &str) -> Option<&str> {
    (url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')).then_some(url)
}
