use std::{
    env,
    net::{IpAddr, SocketAddr},
};

use anyhow::Context;

/// Longest accepted `TOKEN_TTL_HOURS`; larger values fall back to the default.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Process configuration, read once at startup and handed to constructors.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparsable optional values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .context("JWT_SECRET is not set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let token_ttl_hours = lookup("TOKEN_TTL_HOURS")
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| (1..=MAX_TOKEN_TTL_HOURS).contains(h))
            .unwrap_or(24);
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            token_ttl_hours,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("APP_HOST {:?} is not an IP address", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_to_optional_values() {
        let config = AppConfig::from_lookup(lookup_in(&[
            ("DATABASE_URL", "postgres://localhost/pizza"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_HOURS", "-4"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn oversized_token_ttl_falls_back_to_default() {
        for ttl in ["9223372036854775807", "8761"] {
            let config = AppConfig::from_lookup(lookup_in(&[
                ("DATABASE_URL", "postgres://localhost/pizza"),
                ("JWT_SECRET", "s3cret"),
                ("TOKEN_TTL_HOURS", ttl),
            ]))
            .unwrap();
            assert_eq!(config.token_ttl_hours, 24, "{ttl}");
        }

        let config = AppConfig::from_lookup(lookup_in(&[
            ("DATABASE_URL", "postgres://localhost/pizza"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_HOURS", "8760"),
        ]))
        .unwrap();
        assert_eq!(config.token_ttl_hours, MAX_TOKEN_TTL_HOURS);
    }

    #[test]
    fn secret_is_required() {
        let err = AppConfig::from_lookup(lookup_in(&[(
            "DATABASE_URL",
            "postgres://localhost/pizza",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn hostnames_are_rejected_as_bind_address() {
        let config = AppConfig::from_lookup(lookup_in(&[
            ("DATABASE_URL", "postgres://localhost/pizza"),
            ("JWT_SECRET", "s3cret"),
            ("APP_HOST", "localhost"),
        ]))
        .unwrap();
        assert!(config.bind_addr().is_err());
    }
}
