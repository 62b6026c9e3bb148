use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use url::Url;

use super::config_model::{BackendServer, Database, DotEnvyConfig, Stripe, UserSecret};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: parse_var("SERVER_PORT_BACKEND")?,
        body_limit: parse_var("SERVER_BODY_LIMIT")?,
        timeout: parse_var("SERVER_TIMEOUT")?,
        public_base_url: public_base_url()?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: parse_var_or("DATABASE_MAX_CONNECTIONS", 10)?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        currency: optional("STRIPE_CURRENCY")
            .unwrap_or_else(|| "usd".to_string())
            .to_ascii_lowercase(),
        product_name: optional("STRIPE_PRODUCT_NAME")
            .unwrap_or_else(|| "Sports field booking".to_string()),
        timeout: Duration::from_secs(parse_var_or("STRIPE_TIMEOUT_SECS", 10)?),
    };

    // Read per request by the auth extractor; checked here so a missing
    // secret stops startup instead of failing every authenticated call.
    get_user_secret()?;

    Ok(DotEnvyConfig {
        backend_server,
        database,
        stripe,
    })
}

pub fn get_user_secret() -> Result<UserSecret> {
    dotenvy::dotenv().ok();

    Ok(UserSecret {
        secret: required("JWT_USER_SECRET")?,
    })
}

fn public_base_url() -> Result<String> {
    let raw = required("PUBLIC_BASE_URL")?;
    let url = Url::parse(&raw).with_context(|| format!("PUBLIC_BASE_URL is invalid: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("PUBLIC_BASE_URL must be http(s): {raw}"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| anyhow!("{key} is invalid"))
}

fn parse_var<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .trim()
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn parse_var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}
