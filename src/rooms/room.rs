use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{
        messages::{self, Message},
        rooms::Room,
        users::User,
    },
    include_res,
    policy::can_modify,
    res::{self, escape, fill},
    session::{CurrentUser, Viewer},
    AppResult, AppState,
};

use super::{load, msg};

#[derive(Deserialize)]
pub(crate) struct MessageForm {
    #[serde(default)]
    body: String,
}

async fn room_page(
    db_pool: &SqlitePool,
    room: &Room,
    viewer: Option<&User>,
    notices: &[String],
) -> AppResult<Html<String>> {
    let room_id = room.id.to_string();

    let thread: String = messages::in_room(db_pool, room.id)
        .await?
        .iter()
        .map(|message| msg::msg_to_html(message, viewer))
        .collect();

    let participants: String = room
        .participants(db_pool)
        .await?
        .iter()
        .map(|participant| {
            fill(
                include_res!(str, "/pages/rooms/participant.html"),
                &[
                    ("id", &participant.id.to_string()),
                    ("alias", &escape(&participant.alias)),
                    ("username", &escape(&participant.username)),
                ],
            )
        })
        .collect();

    let host_actions = match viewer {
        Some(user) if can_modify(user, room) => fill(
            include_res!(str, "/pages/rooms/host_actions.html"),
            &[("room_id", &room_id)],
        ),
        _ => String::new(),
    };

    let compose = match viewer {
        Some(_) => fill(include_res!(str, "/pages/rooms/compose.html"), &[("room_id", &room_id)]),
        None => fill(include_res!(str, "/pages/rooms/join.html"), &[("room_id", &room_id)]),
    };

    let body = fill(
        include_res!(str, "/pages/rooms/room.html"),
        &[
            ("room_name", &escape(&room.name)),
            ("host_id", &room.host_id.to_string()),
            ("host_username", &escape(&room.host_username)),
            ("ago", &res::ago(room.created)),
            ("topic_name", &escape(&room.topic_name)),
            ("host_actions", &host_actions),
            ("description", &escape(room.description.as_deref().unwrap_or_default())),
            ("notices", &res::notices(notices)),
            ("compose", &compose),
            ("messages", &thread),
            ("participant_count", &room.participant_count.to_string()),
            ("participants", &participants),
        ],
    );

    Ok(res::page(&room.name, viewer, &body))
}

#[debug_handler(state = AppState)]
pub(crate) async fn room(
    State(db_pool): State<SqlitePool>,
    Viewer(viewer): Viewer,
    Path(room_id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let room = load(&db_pool, room_id).await?;
    room_page(&db_pool, &room, viewer.as_ref(), &[]).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn post_message(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(room_id): Path<Uuid>,
    Form(MessageForm { body }): Form<MessageForm>,
) -> AppResult<Response> {
    let room = load(&db_pool, room_id).await?;

    let body = body.trim();
    if body.is_empty() {
        let notices = ["Messages can't be empty".to_owned()];
        return Ok(room_page(&db_pool, &room, Some(&user), &notices).await?.into_response());
    }

    let (message_id, joined) = Message::post(&db_pool, &room, user.id, body).await?;
    if joined {
        tracing::info!("@{} joined room {room_id}", user.username);
    }
    tracing::debug!("message {message_id} in room {room_id}");

    Ok(Redirect::to(&format!("/room/{room_id}")).into_response())
}
