use axum::response::Html;
use pulldown_cmark::{Event, Parser};

use crate::db::users::User;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Substitutes `{key}` placeholders in one pass, so values are never rescanned.
/// Braces that don't name a known key are copied through untouched.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Message bodies are markdown. Raw HTML in them is shown as text.
pub fn markdown(body: &str) -> String {
    let parser = Parser::new(body).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        _ => event,
    });

    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

/// Coarse "how long ago" for a unix-millisecond timestamp.
pub fn ago(millis: i64) -> String {
    let secs = (crate::db::now() - millis).max(0) / 1000;

    let (n, unit) = match secs {
        0..60 => return "just now".to_owned(),
        60..3_600 => (secs / 60, "minute"),
        3_600..86_400 => (secs / 3_600, "hour"),
        86_400..2_592_000 => (secs / 86_400, "day"),
        2_592_000..31_536_000 => (secs / 2_592_000, "month"),
        _ => (secs / 31_536_000, "year"),
    };

    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

pub fn notices(notices: &[String]) -> String {
    if notices.is_empty() {
        return String::new();
    }

    let items: String = notices
        .iter()
        .map(|notice| format!("<li>{}</li>", escape(notice)))
        .collect();
    format!(r#"<ul class="notices">{items}</ul>"#)
}

/// Wraps page content in the site layout.
pub fn page(title: &str, viewer: Option<&User>, content: &str) -> Html<String> {
    let nav = match viewer {
        Some(user) => fill(
            include_res!(str, "/pages/nav_user.html"),
            &[
                ("user_id", &user.id.to_string()),
                ("username", &escape(&user.username)),
            ],
        ),
        None => include_res!(str, "/pages/nav_guest.html").to_owned(),
    };

    Html(fill(
        include_res!(str, "/pages/base.html"),
        &[("title", &escape(title)), ("nav", &nav), ("content", content)],
    ))
}

pub fn sorry(what: &str) -> Html<String> {
    page(
        "Not found",
        None,
        &fill(include_res!(str, "/pages/sorry.html"), &[("what", &escape(what))]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_does_not_rescan_values() {
        let out = fill("<h1>{name}</h1><p>{body}</p>", &[("name", "{body}"), ("body", "hi")]);
        assert_eq!(out, "<h1>{body}</h1><p>hi</p>");
    }

    #[test]
    fn fill_keeps_unknown_braces() {
        let out = fill("a { color: red } {x} {", &[("x", "1")]);
        assert_eq!(out, "a { color: red } 1 {");
    }

    #[test]
    fn escape_covers_attribute_quotes() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn markdown_renders_raw_html_as_text() {
        let html = markdown("**hi** <script>alert(1)</script>");
        assert!(html.contains("<strong>hi</strong>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn ago_buckets() {
        let now = crate::db::now();
        assert_eq!(ago(now), "just now");
        assert_eq!(ago(now - 61_000), "1 minute ago");
        assert_eq!(ago(now - 3 * 3_600_000 - 5), "3 hours ago");
    }
}
