use axum::{debug_handler, extract::{Path, State}, response::Html};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    db::{messages, rooms, topics, users::User},
    include_res,
    index::{activity_items, room_items, topic_items},
    res::{self, escape, fill},
    session::Viewer,
    AppError, AppResult, AppState,
};

fn joined(millis: i64) -> String {
    match OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000) {
        Ok(at) => at.date().to_string(),
        Err(_) => res::ago(millis),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    Path(user_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    Viewer(viewer): Viewer,
) -> AppResult<Html<String>> {
    let user = User::get(&db_pool, user_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;

    let hosted = rooms::hosted_by(&db_pool, user.id).await?;
    let room_messages = messages::by_user(&db_pool, user.id).await?;
    let topics = topics::all(&db_pool).await?;

    let edit = match &viewer {
        Some(viewer) if viewer.id == user.id => include_res!(str, "/pages/profiles/edit_link.html"),
        _ => "",
    };

    let body = fill(
        include_res!(str, "/pages/profiles/profile.html"),
        &[
            ("topics", &topic_items(&topics)),
            ("alias", &escape(&user.alias)),
            ("username", &escape(&user.username)),
            ("joined", &joined(user.joined)),
            ("edit", edit),
            ("rooms", &room_items(&hosted)),
            ("activity", &activity_items(&room_messages, viewer.as_ref())),
        ],
    );

    Ok(res::page(&user.alias, viewer.as_ref(), &body))
}
