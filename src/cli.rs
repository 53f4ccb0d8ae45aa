//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::{
    DEFAULT_ACCESS_TOKEN_LIFETIME_SECS, DEFAULT_REFRESH_TOKEN_LIFETIME_SECS,
    MAX_TOKEN_LIFETIME_SECS, TokenLifetimes,
};
use crate::password::hash_password;
use clap::Parser;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tokencookie",
    about = "Cookie-transported JWT authentication API"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7291")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tokens.db")]
    pub database: String,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_LIFETIME", default_value_t = DEFAULT_ACCESS_TOKEN_LIFETIME_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_LIFETIME_SECS))]
    pub access_token_lifetime: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_LIFETIME", default_value_t = DEFAULT_REFRESH_TOKEN_LIFETIME_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_LIFETIME_SECS))]
    pub refresh_token_lifetime: u64,

    /// Set the Secure flag on token cookies (use when served over HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Create a user with this username on startup, password taken from CREATE_USER_PASSWORD
    #[arg(long, value_name = "USERNAME")]
    pub create_user: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Args {
    pub fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: self.access_token_lifetime,
            refresh: self.refresh_token_lifetime,
        }
    }
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    validate_jwt_secret(secret)
}

fn validate_jwt_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Handle the --create-user flag. Exits the process on failure.
pub async fn handle_create_user(db: &Database, username: &str) {
    let password = match std::env::var("CREATE_USER_PASSWORD") {
        Ok(password) if !password.is_empty() => {
            // SAFETY: still single-threaded startup, nothing else reads this variable.
            unsafe { std::env::remove_var("CREATE_USER_PASSWORD") };
            password
        }
        _ => {
            error!("CREATE_USER_PASSWORD must be set when using --create-user");
            std::process::exit(1);
        }
    };

    match db.users().get_by_username(username).await {
        Ok(Some(existing)) => {
            info!(user_id = existing.id, username = %existing.username, "User already exists");
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            std::process::exit(1);
        }
    }

    let hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            std::process::exit(1);
        }
    };

    match db.users().create(username, &hash).await {
        Ok(id) => info!(user_id = id, username = %username, "User created"),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    lifetimes: TokenLifetimes,
    secure_cookies: bool,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        lifetimes,
        secure_cookies,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
