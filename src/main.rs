use clap::Parser;
use tokencookie::cli::{
    Args, build_config, handle_create_user, init_logging, load_jwt_secret, open_database,
};
use tokencookie::create_app;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(username) = args.create_user.as_deref() {
        handle_create_user(&db, username).await;
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to read local address");
        std::process::exit(1);
    });

    let lifetimes = args.lifetimes();
    let config = build_config(db, jwt_secret, lifetimes, args.secure_cookies);
    let app = create_app(&config);

    info!(
        address = %local_addr,
        access_lifetime = lifetimes.access,
        refresh_lifetime = lifetimes.refresh,
        "Listening"
    );

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
