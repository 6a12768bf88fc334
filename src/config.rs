use std::str::FromStr;

use anyhow::Context;

/// Runtime settings, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub session_minutes: i64,
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://studyrooms.db".to_owned(),
            bind_addr: "0.0.0.0:8080".to_owned(),
            max_connections: 16,
            session_minutes: 60,
            secure_cookies: false,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name}={value:?} is not valid")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            database_url: dotenv::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            session_minutes: parse_var("SESSION_INACTIVITY_MINUTES", defaults.session_minutes)?,
            secure_cookies: parse_var("SECURE_COOKIES", defaults.secure_cookies)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_vars_fall_back() {
        let value = parse_var("STUDYROOMS_SURELY_UNSET_VAR", 7u32).unwrap();
        assert_eq!(value, 7);
    }
}
