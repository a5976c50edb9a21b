// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Construite une seule fois au démarrage (après dotenv) puis injectée via
//   web::Data. Aucun module ne relit les variables d'environnement ensuite.
//
// Variables:
//   - DATABASE_URL (obligatoire)
//   - JWT_SECRET, JWT_TTL_HOURS (24)
//   - PUBLIC_BASE_URL (http://localhost:3000) : préfixe des liens /verify/<token>
//   - UPLOAD_DIR (uploads), MAX_UPLOAD_BYTES (5 Mo)
//   - PASSWORD_HASH_ITERATIONS (260000)
//   - HOST (127.0.0.1), PORT (5000)
//   - ADMIN_USERNAME, ADMIN_EMAIL, ADMIN_PASSWORD, ADMIN_FULL_NAME
//
// ============================================================================

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_JWT_SECRET: &str = "default-insecure-key-change-this";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Compte administrateur créé au premier démarrage
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub public_base_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub password_hash_iterations: u32,
    pub host: String,
    pub port: u16,
    pub admin: AdminSeed,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construit la config à partir d'une fonction de lecture (testable sans env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not found in .env, using default (INSECURE)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let admin_password = lookup("ADMIN_PASSWORD").unwrap_or_else(|| {
            tracing::warn!("ADMIN_PASSWORD not found in .env, default admin password in use");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 24)?,
            public_base_url,
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            password_hash_iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", 260_000)?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 5000)?,
            admin: AdminSeed {
                username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                email: lookup("ADMIN_EMAIL").unwrap_or_else(|| "admin@digitalid.kz".to_string()),
                password: admin_password,
                full_name: lookup("ADMIN_FULL_NAME")
                    .unwrap_or_else(|| "System Administrator".to_string()),
            },
        })
    }

    /// URL publique de vérification d'un document (encodée dans le QR code)
    pub fn public_url(&self, token: &str) -> String {
        format!("{}/verify/{}", self.public_base_url, token)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
