use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use sqlx::SqlitePool;

use crate::{
    db::{rooms::Room, topics::{self, Topic}},
    session::CurrentUser,
    AppResult, AppState,
};

use super::{room_form_page, RoomForm};

#[debug_handler(state = AppState)]
pub(crate) async fn new_room_page(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Response> {
    let topics = topics::all(&db_pool).await?;
    Ok(room_form_page(&user, "Create room", "/room/new", "/", &RoomForm::default(), &topics, &[])
        .into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_room(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let problems = form.problems();
    if !problems.is_empty() {
        let topics = topics::all(&db_pool).await?;
        return Ok(room_form_page(&user, "Create room", "/room/new", "/", &form, &topics, &problems)
            .into_response());
    }

    let (topic, created) = Topic::get_or_create(&db_pool, form.topic.trim()).await?;
    if created {
        tracing::info!("new topic {}", topic.name);
    }

    let room_id = Room::create(&db_pool, user.id, &topic, form.name.trim(), &form.description).await?;
    tracing::info!("@{} opened room {room_id}", user.username);

    Ok(Redirect::to("/").into_response())
}
