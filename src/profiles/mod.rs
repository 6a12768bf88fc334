mod edit;
mod page;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{id}", get(page::profile))
        .route("/update-user", get(edit::update_user_page).post(edit::update_user))
}
