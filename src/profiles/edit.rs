use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    auth::username_problems,
    db::users::User,
    include_res,
    res::{self, escape, fill},
    session::CurrentUser,
    AppError, AppResult, AppState,
};

#[derive(Deserialize)]
pub(crate) struct UserForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    email: String,
}

fn user_form(user: &User, form: &UserForm, notices: &[String]) -> Html<String> {
    let body = fill(
        include_res!(str, "/pages/profiles/update_user.html"),
        &[
            ("notices", &res::notices(notices)),
            ("username", &escape(&form.username)),
            ("alias", &escape(&form.alias)),
            ("email", &escape(&form.email)),
            ("user_id", &user.id.to_string()),
        ],
    );
    res::page("Edit profile", Some(user), &body)
}

fn email_problem(email: &str) -> Option<String> {
    if email.is_empty() {
        return None;
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => None,
        _ => Some("Enter a valid email address".to_owned()),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_user_page(CurrentUser(user): CurrentUser) -> Html<String> {
    let form = UserForm {
        username: user.username.clone(),
        alias: user.alias.clone(),
        email: user.email.clone().unwrap_or_default(),
    };
    user_form(&user, &form, &[])
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_user(
    State(db_pool): State<SqlitePool>,
    CurrentUser(mut user): CurrentUser,
    Form(form): Form<UserForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_lowercase();
    let alias = form.alias.trim();
    let email = form.email.trim();

    let mut problems = username_problems(&username);
    if problems.is_empty() && User::username_taken(&db_pool, &username, Some(user.id)).await? {
        problems.push("A user with that username already exists".to_owned());
    }
    problems.extend(email_problem(email));

    if !problems.is_empty() {
        return Ok(user_form(&user, &form, &problems).into_response());
    }

    let alias = if alias.is_empty() { user.alias.clone() } else { alias.to_owned() };
    let email = (!email.is_empty()).then(|| email.to_owned());
    let updated = user.update_profile(&db_pool, username, alias, email).await;
    if let Err(AppError::UsernameTaken) = updated {
        let problems = [AppError::UsernameTaken.to_string()];
        return Ok(user_form(&user, &form, &problems).into_response());
    }
    updated?;
    tracing::info!("@{} updated their profile", user.username);

    Ok(Redirect::to(&format!("/profile/{}", user.id)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_optional_but_checked() {
        assert_eq!(email_problem(""), None);
        assert_eq!(email_problem("a@b.io"), None);
        assert!(email_problem("nope").is_some());
        assert!(email_problem("@b.io").is_some());
        assert!(email_problem("a@localhost").is_some());
    }
}
