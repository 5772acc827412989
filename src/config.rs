// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

/// Page size used by course listings when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Number of questions drawn by the random question endpoint by default.
pub const DEFAULT_RANDOM_QUESTION_COUNT: i64 = 10;

/// Where uploaded files are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files written below `Config::upload_dir` and served from `/files/...`.
    Local,
    /// Files pushed to an HTTP object store (`<url>/<bucket>/<path>`).
    Object {
        url: String,
        key: String,
        bucket: String,
    },
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
    /// TLS from the first byte (usually port 465).
    Tls,
    /// Unencrypted. Local mail catchers only.
    None,
}

/// Outgoing mail server. Without one, mail is only logged.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub security: SmtpSecurity,
}

impl SmtpSettings {
    fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;

        let security = match env::var("SMTP_SECURITY").as_deref() {
            Ok("tls") => SmtpSecurity::Tls,
            Ok("none") => SmtpSecurity::None,
            _ => SmtpSecurity::StartTls,
        };
        let default_port = match security {
            SmtpSecurity::Tls => 465,
            SmtpSecurity::StartTls => 587,
            SmtpSecurity::None => 25,
        };

        Some(Self {
            host,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_port),
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            from: env::var("SMTP_FROM").expect("SMTP_FROM must be set when SMTP_HOST is set"),
            security,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub max_upload_mb: u64,
    pub app_base_url: String,
    pub storage: StorageBackend,
    pub smtp: Option<SmtpSettings>,
    pub verification_token_ttl_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://lms.db?mode=rwc".to_string(),
            jwt_secret: String::new(),
            jwt_expiration: 86_400,
            rust_log: "info".to_string(),
            admin_username: None,
            admin_password: None,
            bind_addr: "0.0.0.0:8080".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_mb: 100,
            app_base_url: "http://localhost:8080".to_string(),
            storage: StorageBackend::Local,
            smtp: None,
            verification_token_ttl_hours: 24,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.jwt_expiration);

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);

        let storage = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("object") => StorageBackend::Object {
                url: env::var("OBJECT_STORAGE_URL")
                    .expect("OBJECT_STORAGE_URL must be set when STORAGE_BACKEND=object"),
                key: env::var("OBJECT_STORAGE_KEY")
                    .expect("OBJECT_STORAGE_KEY must be set when STORAGE_BACKEND=object"),
                bucket: env::var("OBJECT_STORAGE_BUCKET")
                    .expect("OBJECT_STORAGE_BUCKET must be set when STORAGE_BACKEND=object"),
            },
            _ => StorageBackend::Local,
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            upload_dir: env::var("FILE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_mb),
            app_base_url: env::var("APP_BASE_URL").unwrap_or(defaults.app_base_url),
            storage,
            smtp: SmtpSettings::from_env(),
            verification_token_ttl_hours: env::var("VERIFICATION_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.verification_token_ttl_hours),
        }
    }

    /// WAL journal plus a busy timeout, so a writer waits for a concurrent
    /// one instead of failing with "database is locked".
    pub fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        Ok(SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true))
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}
