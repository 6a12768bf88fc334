use axum::{
    debug_handler,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    db::users::User,
    include_res,
    res::{self, escape, fill},
    session::{self, Viewer},
    AppError, AppResult, AppState,
};

use super::{password_problems, username_problems};

#[derive(Deserialize)]
pub(crate) struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password1: String,
    #[serde(default)]
    password2: String,
}

fn register_form(username: &str, notices: &[String]) -> Response {
    let body = fill(
        include_res!(str, "/pages/auth/register.html"),
        &[("notices", &res::notices(notices)), ("username", &escape(username))],
    );
    res::page("Sign up", None, &body).into_response()
}

fn rejected(username: &str, problems: Vec<String>) -> Response {
    let mut notices = vec!["An error occurred during registration".to_owned()];
    notices.extend(problems);
    register_form(username, &notices)
}

#[debug_handler(state = AppState)]
pub(crate) async fn register_page(Viewer(viewer): Viewer) -> Response {
    if viewer.is_some() {
        return Redirect::to("/").into_response();
    }
    register_form("", &[])
}

#[debug_handler(state = AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RegisterForm { username, password1, password2 }): Form<RegisterForm>,
) -> AppResult<Response> {
    let username = username.trim().to_lowercase();

    let mut problems = username_problems(&username);
    if problems.is_empty() && User::username_taken(&db_pool, &username, None).await? {
        problems.push("A user with that username already exists".to_owned());
    }
    problems.extend(password_problems(&password1, &password2));

    if !problems.is_empty() {
        return Ok(rejected(&username, problems));
    }

    // another sign-up may claim the name while the password hashes
    let user = match User::create(&db_pool, &username, &password1).await {
        Err(AppError::UsernameTaken) => {
            return Ok(rejected(&username, vec![AppError::UsernameTaken.to_string()]));
        }
        user => user?,
    };
    session::start(&session, &user).await?;
    tracing::info!("adding @{} as {}", user.username, user.alias);

    Ok(Redirect::to("/").into_response())
}
