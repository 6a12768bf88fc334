use axum::{
    debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    db::users::{self, User},
    include_res,
    res::{self, fill},
    session::{self, local_path, Viewer, RETURN_URL},
    AppResult, AppState,
};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

fn login_form(notices: &[String]) -> Response {
    let body = fill(
        include_res!(str, "/pages/auth/login.html"),
        &[("notices", &res::notices(notices))],
    );
    res::page("Login", None, &body).into_response()
}

#[debug_handler(state = AppState)]
pub(crate) async fn login_page(
    Viewer(viewer): Viewer,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    session: Session,
) -> AppResult<Response> {
    if viewer.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    if let Some(return_url) = return_url.as_deref().and_then(local_path) {
        session.insert(RETURN_URL, return_url).await?;
    }

    Ok(login_form(&[]))
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    Viewer(viewer): Viewer,
    session: Session,
    Form(LoginForm { username, password }): Form<LoginForm>,
) -> AppResult<Response> {
    if viewer.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = username.to_lowercase();
    let mut notices = Vec::new();

    // a missing user is reported, then authentication is attempted anyway
    if User::find_by_username(&db_pool, &username).await?.is_none() {
        notices.push("Username not found".to_owned());
    }

    let Some(user) = users::authenticate(&db_pool, &username, &password).await? else {
        notices.push("Invalid username or password".to_owned());
        return Ok(login_form(&notices));
    };

    let return_url: Option<String> = session.remove(RETURN_URL).await?;
    session::start(&session, &user).await?;
    tracing::info!("welcome @{}", user.username);

    let return_url = return_url.as_deref().and_then(local_path).unwrap_or("/");
    Ok(Redirect::to(return_url).into_response())
}
