use axum::{debug_handler, extract::{Query, State}, response::Html, routing::get, Router};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        messages,
        rooms::{self, Room},
        topics::{self, TopicSummary},
        users::User,
    },
    include_res,
    res::{self, escape, fill},
    rooms::activity_html,
    session::Viewer,
    AppResult, AppState,
};

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/topics", get(topics_page))
        .route("/activity", get(activity))
}

pub(crate) fn room_items(rooms: &[Room]) -> String {
    rooms
        .iter()
        .map(|room| {
            fill(
                include_res!(str, "/pages/room_item.html"),
                &[
                    ("id", &room.id.to_string()),
                    ("name", &escape(&room.name)),
                    ("host_id", &room.host_id.to_string()),
                    ("host_username", &escape(&room.host_username)),
                    ("ago", &res::ago(room.created)),
                    ("participant_count", &room.participant_count.to_string()),
                    ("topic_name", &escape(&room.topic_name)),
                ],
            )
        })
        .collect()
}

pub(crate) fn topic_items(topics: &[TopicSummary]) -> String {
    topics
        .iter()
        .map(|topic| {
            fill(
                include_res!(str, "/pages/topic_item.html"),
                &[
                    ("q", &urlencoding::encode(&topic.name)),
                    ("name", &escape(&topic.name)),
                    ("room_count", &topic.room_count.to_string()),
                ],
            )
        })
        .collect()
}

pub(crate) fn activity_items(messages: &[messages::Message], viewer: Option<&User>) -> String {
    messages
        .iter()
        .map(|message| activity_html(message, viewer))
        .collect()
}

#[debug_handler(state = AppState)]
pub(crate) async fn home(
    State(db_pool): State<SqlitePool>,
    Viewer(viewer): Viewer,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Html<String>> {
    let rooms = rooms::search(&db_pool, &q).await?;
    let topics = topics::search(&db_pool, "", Some(5)).await?;
    let room_count = rooms::count(&db_pool).await?;
    let room_messages = messages::recent(&db_pool, &q, None).await?;

    let body = fill(
        include_res!(str, "/pages/home.html"),
        &[
            ("topics", &topic_items(&topics)),
            ("room_count", &room_count.to_string()),
            ("rooms", &room_items(&rooms)),
            ("activity", &activity_items(&room_messages, viewer.as_ref())),
        ],
    );
    Ok(res::page("Home", viewer.as_ref(), &body))
}

#[debug_handler(state = AppState)]
pub(crate) async fn topics_page(
    State(db_pool): State<SqlitePool>,
    Viewer(viewer): Viewer,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Html<String>> {
    let topics = topics::search(&db_pool, &q, None).await?;

    let body = fill(
        include_res!(str, "/pages/topics.html"),
        &[("q", &escape(&q)), ("topics", &topic_items(&topics))],
    );
    Ok(res::page("Topics", viewer.as_ref(), &body))
}

#[debug_handler(state = AppState)]
pub(crate) async fn activity(
    State(db_pool): State<SqlitePool>,
    Viewer(viewer): Viewer,
) -> AppResult<Html<String>> {
    let room_messages = messages::recent(&db_pool, "", Some(5)).await?;

    let body = fill(
        include_res!(str, "/pages/activity.html"),
        &[("activity", &activity_items(&room_messages, viewer.as_ref()))],
    );
    Ok(res::page("Activity", viewer.as_ref(), &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn topic_links_encode_the_query() {
        let topics = [TopicSummary { id: Uuid::now_v7(), name: "C++ & Rust".to_owned(), room_count: 2 }];
        let html = topic_items(&topics);
        assert!(html.contains(r#"href="/?q=C%2B%2B%20%26%20Rust""#), "{html}");
        assert!(html.contains(">C++ &amp; Rust</a>"));
    }
}
