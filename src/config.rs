use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is not a valid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: Option<String>,
    pub db_name: String,
    pub bind_addr: String,

    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    pub jwt_access_ttl_seconds: i64,
    pub jwt_refresh_ttl_seconds: i64,

    // 0 disables the sweep
    pub refresh_sweep_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongodb_uri = get("MONGODB_URI").filter(|v| !v.trim().is_empty());
        let db_name = get("DB_NAME").unwrap_or_else(|| "auth_db".to_string());
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string());

        let jwt_access_secret =
            get("JWT_ACCESS_SECRET").ok_or(ConfigError::Missing("JWT_ACCESS_SECRET"))?;
        let jwt_refresh_secret =
            get("JWT_REFRESH_SECRET").ok_or(ConfigError::Missing("JWT_REFRESH_SECRET"))?;

        let jwt_access_ttl_seconds = positive(&get, "JWT_ACCESS_TTL_SECONDS", 15 * 60)?;
        let jwt_refresh_ttl_seconds =
            positive(&get, "JWT_REFRESH_TTL_SECONDS", 30 * 24 * 60 * 60)?;

        let refresh_sweep_interval_seconds = match get("REFRESH_SWEEP_INTERVAL_SECONDS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "REFRESH_SWEEP_INTERVAL_SECONDS",
                value: v,
            })?,
            None => 60 * 60,
        };

        Ok(Self {
            mongodb_uri,
            db_name,
            bind_addr,
            jwt_access_secret,
            jwt_refresh_secret,
            jwt_access_ttl_seconds,
            jwt_refresh_ttl_seconds,
            refresh_sweep_interval_seconds,
        })
    }
}

fn positive<F>(get: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let cfg = Config::from_lookup(lookup(&[
            ("JWT_ACCESS_SECRET", "a"),
            ("JWT_REFRESH_SECRET", "r"),
        ]))
        .unwrap();

        assert!(cfg.mongodb_uri.is_none());
        assert_eq!(cfg.db_name, "auth_db");
        assert_eq!(cfg.bind_addr, "127.0.0.1:3000");
        assert_eq!(cfg.jwt_access_ttl_seconds, 900);
        assert_eq!(cfg.jwt_refresh_ttl_seconds, 2_592_000);
        assert_eq!(cfg.refresh_sweep_interval_seconds, 3600);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("JWT_ACCESS_SECRET", "a")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_REFRESH_SECRET")));
    }

    #[test]
    fn ttl_must_be_a_positive_number() {
        for bad in ["0", "-5", "soon"] {
            let err = Config::from_lookup(lookup(&[
                ("JWT_ACCESS_SECRET", "a"),
                ("JWT_REFRESH_SECRET", "r"),
                ("JWT_ACCESS_TTL_SECONDS", bad),
            ]))
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    name: "JWT_ACCESS_TTL_SECONDS",
                    ..
                }
            ));
        }
    }

    #[test]
    fn blank_mongodb_uri_means_in_memory() {
        let cfg = Config::from_lookup(lookup(&[
            ("JWT_ACCESS_SECRET", "a"),
            ("JWT_REFRESH_SECRET", "r"),
            ("MONGODB_URI", "  "),
            ("REFRESH_SWEEP_INTERVAL_SECONDS", "0"),
        ]))
        .unwrap();
        assert!(cfg.mongodb_uri.is_none());
        assert_eq!(cfg.refresh_sweep_interval_seconds, 0);
    }
}
