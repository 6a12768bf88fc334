use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, Redirect},
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{messages::Message, users::User},
    include_res,
    policy::{can_modify, ensure_can_modify},
    res::{self, escape, fill},
    session::CurrentUser,
    AppError, AppResult, AppState,
};

use super::delete_page;

fn delete_link(message: &Message, viewer: Option<&User>) -> String {
    match viewer {
        Some(user) if can_modify(user, message) => fill(
            include_res!(str, "/pages/rooms/delete_link.html"),
            &[("id", &message.id.to_string())],
        ),
        _ => String::new(),
    }
}

/// A message as it appears in its room's thread.
pub(crate) fn msg_to_html(message: &Message, viewer: Option<&User>) -> String {
    fill(
        include_res!(str, "/pages/rooms/message.html"),
        &[
            ("id", &message.id.to_string()),
            ("user_id", &message.user_id.to_string()),
            ("username", &escape(&message.username)),
            ("alias", &escape(&message.alias)),
            ("ago", &res::ago(message.created)),
            ("delete", &delete_link(message, viewer)),
            ("body", &res::markdown(&message.body)),
        ],
    )
}

/// A message as it appears in activity feeds, naming its room.
pub(crate) fn activity_html(message: &Message, viewer: Option<&User>) -> String {
    fill(
        include_res!(str, "/pages/rooms/activity.html"),
        &[
            ("user_id", &message.user_id.to_string()),
            ("username", &escape(&message.username)),
            ("ago", &res::ago(message.created)),
            ("room_id", &message.room_id.to_string()),
            ("room_name", &escape(&message.room_name)),
            ("body", &res::markdown(&message.body)),
            ("delete", &delete_link(message, viewer)),
        ],
    )
}

async fn load(db_pool: &SqlitePool, id: Uuid) -> AppResult<Message> {
    Message::get(db_pool, id).await?.ok_or(AppError::NotFound("message"))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_message_page(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let message = load(&db_pool, message_id).await?;
    ensure_can_modify(&user, &message)?;

    Ok(delete_page(&user, &message.body, &format!("/room/{}", message.room_id)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_message(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<Uuid>,
) -> AppResult<Redirect> {
    let message = load(&db_pool, message_id).await?;
    ensure_can_modify(&user, &message)?;

    message.delete(&db_pool).await?;
    tracing::info!("@{} deleted message {message_id}", user.username);

    Ok(Redirect::to(&format!("/room/{}", message.room_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(user_id: Uuid) -> Message {
        Message {
            id: Uuid::now_v7(),
            room_id: Uuid::now_v7(),
            room_name: "<b>room</b>".to_owned(),
            user_id,
            username: "alice".to_owned(),
            alias: "Calm Owl".to_owned(),
            body: "hello *world*".to_owned(),
            created: crate::db::now(),
        }
    }

    fn user(id: Uuid) -> User {
        User {
            id,
            username: "alice".to_owned(),
            alias: "Calm Owl".to_owned(),
            email: None,
            password_hash: String::new(),
            joined: 0,
        }
    }

    #[test]
    fn delete_link_is_for_the_author_only() {
        let author = user(Uuid::now_v7());
        let stranger = user(Uuid::now_v7());
        let message = message(author.id);

        let delete = format!("/message/{}/delete", message.id);
        assert!(msg_to_html(&message, Some(&author)).contains(&delete));
        assert!(!msg_to_html(&message, Some(&stranger)).contains(&delete));
        assert!(!msg_to_html(&message, None).contains(&delete));
    }

    #[test]
    fn activity_escapes_room_names_and_renders_markdown() {
        let message = message(Uuid::now_v7());
        let html = activity_html(&message, None);

        assert!(html.contains("&lt;b&gt;room&lt;/b&gt;"));
        assert!(html.contains("<em>world</em>"));
    }
}
