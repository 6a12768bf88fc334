use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, Redirect},
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{policy::ensure_can_modify, session::CurrentUser, AppResult, AppState};

use super::{delete_page, load};

#[debug_handler(state = AppState)]
pub(crate) async fn delete_room_page(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let room = load(&db_pool, room_id).await?;
    ensure_can_modify(&user, &room)?;

    Ok(delete_page(&user, &room.name, &format!("/room/{room_id}")))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_room(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<Uuid>,
) -> AppResult<Redirect> {
    let room = load(&db_pool, room_id).await?;
    ensure_can_modify(&user, &room)?;

    room.delete(&db_pool).await?;
    tracing::info!("@{} deleted room {room_id}", user.username);

    Ok(Redirect::to("/"))
}
