mod login;
mod logout;
mod register;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", post(logout::logout))
        .route("/register", get(register::register_page).post(register::register))
}

/// Problems with a proposed (already lowercased) username, if any.
pub(crate) fn username_problems(username: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if username.is_empty() {
        problems.push("Username is required".to_owned());
    } else if username.chars().count() > 150 {
        problems.push("Usernames are at most 150 characters".to_owned());
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        problems.push("Usernames may only contain letters, digits and @/./+/-/_".to_owned());
    }

    problems
}

pub(crate) fn password_problems(password1: &str, password2: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if password1 != password2 {
        problems.push("The two password fields didn't match".to_owned());
    }
    if password1.chars().count() < 8 {
        problems.push("Passwords must be at least 8 characters".to_owned());
    }
    if !password1.is_empty() && password1.chars().all(|c| c.is_ascii_digit()) {
        problems.push("Passwords can't be entirely numeric".to_owned());
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(username_problems("alice.b+c@x_y-z").is_empty());
        assert_eq!(username_problems("").len(), 1);
        assert_eq!(username_problems("no spaces").len(), 1);
        assert_eq!(username_problems(&"a".repeat(151)).len(), 1);
    }

    #[test]
    fn passwords() {
        assert!(password_problems("correct horse", "correct horse").is_empty());
        assert_eq!(
            password_problems("correct horse", "correct horsf"),
            ["The two password fields didn't match"]
        );
        assert_eq!(password_problems("short", "short"), ["Passwords must be at least 8 characters"]);
        assert_eq!(password_problems("12345678", "12345678"), ["Passwords can't be entirely numeric"]);
    }
}
