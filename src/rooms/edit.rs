use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::topics::{self, Topic},
    policy::ensure_can_modify,
    session::CurrentUser,
    AppResult, AppState,
};

use super::{load, room_form_page, RoomForm};

#[debug_handler(state = AppState)]
pub(crate) async fn edit_room_page(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let room = load(&db_pool, room_id).await?;
    ensure_can_modify(&user, &room)?;

    let topics = topics::all(&db_pool).await?;
    Ok(room_form_page(
        &user,
        "Update room",
        &format!("/room/{room_id}/edit"),
        &format!("/room/{room_id}"),
        &RoomForm::from_room(&room),
        &topics,
        &[],
    )
    .into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_room(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<Uuid>,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let room = load(&db_pool, room_id).await?;
    ensure_can_modify(&user, &room)?;

    let problems = form.problems();
    if !problems.is_empty() {
        let topics = topics::all(&db_pool).await?;
        return Ok(room_form_page(
            &user,
            "Update room",
            &format!("/room/{room_id}/edit"),
            &format!("/room/{room_id}"),
            &form,
            &topics,
            &problems,
        )
        .into_response());
    }

    let (topic, _) = Topic::get_or_create(&db_pool, form.topic.trim()).await?;
    room.update(&db_pool, &topic, form.name.trim(), &form.description).await?;
    tracing::info!("@{} updated room {room_id}", user.username);

    Ok(Redirect::to("/").into_response())
}
