use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::seq::IndexedRandom;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult};

const ADJECTIVES: &[&str] = &[
    "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
    "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy", "Sad",
    "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Dark", "Lucky",
];

const NOUNS: &[&str] = &[
    "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
    "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Puppy", "Phoenix", "Griffin",
    "Unicorn", "Turtle", "Dolphin", "Whale", "Elephant", "Giraffe", "Zebra",
];

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub alias: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub joined: i64,
}

pub fn random_alias() -> String {
    let mut rng = rand::rng();
    format!(
        "{} {}",
        ADJECTIVES.choose(&mut rng).unwrap_or(&"Quiet"),
        NOUNS.choose(&mut rng).unwrap_or(&"Guest"),
    )
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?
        .to_string())
}

/// The users table only has one unique column besides the key.
fn username_clash(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::UsernameTaken;
        }
    }
    err.into()
}

fn verify_password(password_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

impl User {
    /// Inserts a user. `username` is stored as given; callers lowercase it.
    pub async fn create(db_pool: &SqlitePool, username: &str, password: &str) -> AppResult<User> {
        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let user = User {
            id: Uuid::now_v7(),
            username: username.to_owned(),
            alias: random_alias(),
            email: None,
            password_hash,
            joined: super::now(),
        };

        sqlx::query("INSERT INTO users (id,username,alias,email,password_hash,joined) VALUES (?,?,?,?,?,?)")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.alias)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.joined)
            .execute(db_pool)
            .await
            .map_err(username_clash)?;

        Ok(user)
    }

    pub async fn get(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id=?")
            .bind(id)
            .fetch_optional(db_pool)
            .await?)
    }

    pub async fn find_by_username(db_pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE username=?")
            .bind(username)
            .fetch_optional(db_pool)
            .await?)
    }

    /// Whether someone other than `except` already holds `username`.
    pub async fn username_taken(
        db_pool: &SqlitePool,
        username: &str,
        except: Option<Uuid>,
    ) -> AppResult<bool> {
        let holder: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username=?")
            .bind(username)
            .fetch_optional(db_pool)
            .await?;

        Ok(matches!(holder, Some((id,)) if Some(id) != except))
    }

    pub async fn update_profile(
        &mut self,
        db_pool: &SqlitePool,
        username: String,
        alias: String,
        email: Option<String>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET username=?, alias=?, email=? WHERE id=?")
            .bind(&username)
            .bind(&alias)
            .bind(&email)
            .bind(self.id)
            .execute(db_pool)
            .await
            .map_err(username_clash)?;

        self.username = username;
        self.alias = alias;
        self.email = email;
        Ok(())
    }

    pub async fn check_password(&self, password: &str) -> AppResult<bool> {
        let password_hash = self.password_hash.clone();
        let password = password.to_owned();
        Ok(tokio::task::spawn_blocking(move || verify_password(&password_hash, &password)).await?)
    }
}

/// Resolves a username/password pair to a user, if they match.
pub async fn authenticate(
    db_pool: &SqlitePool,
    username: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let Some(user) = User::find_by_username(db_pool, username).await? else {
        return Ok(None);
    };

    if user.check_password(password).await? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}
