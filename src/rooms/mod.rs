mod delete;
mod edit;
mod msg;
mod new;
mod room;

use axum::{response::Html, routing::get, Router};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{rooms::Room, topics::TopicSummary, users::User},
    include_res,
    res::{self, escape, fill},
    AppError, AppResult, AppState,
};

pub(crate) use msg::activity_html;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_room_page).post(new::new_room))
        .route("/{id}", get(room::room).post(room::post_message))
        .route("/{id}/edit", get(edit::edit_room_page).post(edit::edit_room))
        .route("/{id}/delete", get(delete::delete_room_page).post(delete::delete_room))
}

pub fn messages_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/delete", get(msg::delete_message_page).post(msg::delete_message))
}

pub(crate) async fn load(db_pool: &SqlitePool, id: Uuid) -> AppResult<Room> {
    Room::get(db_pool, id).await?.ok_or(AppError::NotFound("room"))
}

/// What the create and edit room forms submit.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RoomForm {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

impl RoomForm {
    fn from_room(room: &Room) -> Self {
        RoomForm {
            topic: room.topic_name.clone(),
            name: room.name.clone(),
            description: room.description.clone().unwrap_or_default(),
        }
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.topic.trim().is_empty() {
            problems.push("Pick or name a topic".to_owned());
        }
        if self.name.trim().is_empty() {
            problems.push("Give the room a name".to_owned());
        } else if self.name.trim().chars().count() > 200 {
            problems.push("Room names are at most 200 characters".to_owned());
        }
        problems
    }
}

pub(crate) fn room_form_page(
    viewer: &User,
    heading: &str,
    action: &str,
    back: &str,
    form: &RoomForm,
    topics: &[TopicSummary],
    notices: &[String],
) -> Html<String> {
    let topic_options: String = topics
        .iter()
        .map(|topic| format!(r#"<option value="{}">"#, escape(&topic.name)))
        .collect();

    let body = fill(
        include_res!(str, "/pages/rooms/room_form.html"),
        &[
            ("heading", heading),
            ("notices", &res::notices(notices)),
            ("action", action),
            ("back", back),
            ("topic", &escape(&form.topic)),
            ("topic_options", &topic_options),
            ("name", &escape(&form.name)),
            ("description", &escape(&form.description)),
        ],
    );
    res::page(heading, Some(viewer), &body)
}

pub(crate) fn delete_page(viewer: &User, obj: &str, back: &str) -> Html<String> {
    let body = fill(
        include_res!(str, "/pages/delete.html"),
        &[("obj", &escape(obj)), ("back", back)],
    );
    res::page("Delete", Some(viewer), &body)
}
