use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    token_ttl_hours: Option<i64>,
    log_dir: Option<String>,
    db_max_connections: Option<u32>,
    bcrypt_cost: Option<u32>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = match config_path {
            Some(path_str) => {
                let path = Path::new(path_str);
                if path.exists() {
                    let contents = fs::read_to_string(path)
                        .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                    parse_toml(&contents).map_err(|e| {
                        format!("Failed to parse TOML from config file at {path:?}: {e}")
                    })?
                } else {
                    PartialServerConfig::default()
                }
            }
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn merge(primary: PartialServerConfig, fallback: PartialServerConfig) -> Result<Self, String> {
        let config = ServerConfig {
            database_url: primary.database_url.or(fallback.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: primary.jwt_secret.or(fallback.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            listen_addr: primary.listen_addr.or(fallback.listen_addr)
                .unwrap_or_else(default_listen_addr),
            token_ttl_hours: primary.token_ttl_hours.or(fallback.token_ttl_hours)
                .unwrap_or_else(default_token_ttl_hours),
            log_dir: primary.log_dir.or(fallback.log_dir)
                .unwrap_or_else(default_log_dir),
            db_max_connections: primary.db_max_connections.or(fallback.db_max_connections)
                .unwrap_or_else(default_db_max_connections),
            bcrypt_cost: primary.bcrypt_cost.or(fallback.bcrypt_cost)
                .unwrap_or_else(default_bcrypt_cost),
        };

        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&config.bcrypt_cost) {
            return Err(format!(
                "BCRYPT_COST must be between {BCRYPT_MIN_COST} and {BCRYPT_MAX_COST}"
            ));
        }
        Ok(config)
    }
}

fn parse_toml(contents: &str) -> Result<PartialServerConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_values_with_defaults() {
        let file = parse_toml(
            r#"
            database_url = "postgres://localhost/recipes"
            jwt_secret = "file-secret"
            "#,
        )
        .unwrap();
        let config = ServerConfig::merge(PartialServerConfig::default(), file).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/recipes");
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = parse_toml(
            r#"
            database_url = "postgres://localhost/recipes"
            jwt_secret = "file-secret"
            token_ttl_hours = 48
            "#,
        )
        .unwrap();
        let env = PartialServerConfig {
            jwt_secret: Some("env-secret".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::merge(env, file).unwrap();
        assert_eq!(config.jwt_secret, "env-secret");
        assert_eq!(config.token_ttl_hours, 48);
    }

    #[test]
    fn test_missing_required_values() {
        let err =
            ServerConfig::merge(PartialServerConfig::default(), PartialServerConfig::default())
                .unwrap_err();
        assert_eq!(err, "DATABASE_URL is required");
    }

    #[test]
    fn test_bcrypt_cost_out_of_range() {
        let env = PartialServerConfig {
            database_url: Some("sqlite::memory:".to_string()),
            jwt_secret: Some("s".to_string()),
            bcrypt_cost: Some(1),
            ..Default::default()
        };
        assert!(ServerConfig::merge(env, PartialServerConfig::default()).is_err());
    }
}
