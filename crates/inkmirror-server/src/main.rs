//! InkMirror Static Server
//!
//! Serves the built drawing pad and mirror UI. Drawing data never passes
//! through the server: the two views replicate through a shared local
//! channel, so this process only hands out files.
//!
//! ## Routes
//!
//! - `GET /api/health` returns `ok`
//! - any other `/api/*` path returns 404
//! - everything else is served from the dist directory, falling back to
//!   `index.html` so client-side routes like `/mirror` resolve

use axum::{Router, http::StatusCode, routing::get};
use std::{
    net::SocketAddr,
    path::PathBuf,
    process::ExitCode,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

const DEFAULT_PORT: u16 = 8090;
const DEFAULT_DIST_DIR: &str = "client/dist";

/// Server configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerConfig {
    port: u16,
    /// Built UI bundle.
    dist_dir: PathBuf,
    /// Open the default browser once listening.
    open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            open_browser: true,
        }
    }
}

impl ServerConfig {
    /// `INKMIRROR_DIST` overrides the bundle location; setting
    /// `INKMIRROR_NO_BROWSER` skips opening a browser.
    fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dist) = var("INKMIRROR_DIST").filter(|d| !d.trim().is_empty()) {
            config.dist_dir = PathBuf::from(dist);
        }
        if var("INKMIRROR_NO_BROWSER").is_some() {
            config.open_browser = false;
        }
        config
    }
}

/// Build the router.
fn app(config: &ServerConfig) -> Router {
    let index = config.dist_dir.join("index.html");
    let static_files = ServeDir::new(&config.dist_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(index));

    let api = Router::new()
        .route("/health", get(health))
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn api_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Ask the OS to open `url` in the default browser.
async fn open_browser(url: &str) {
    let (program, args): (&str, Vec<String>) = match std::env::consts::OS {
        "macos" => ("open", vec![url.to_string()]),
        // cmd.exe treats '&' as a command separator.
        "windows" => (
            "cmd",
            vec!["/c".into(), "start".into(), url.replace('&', "^&")],
        ),
        "linux" => ("xdg-open", vec![url.to_string()]),
        other => {
            warn!("Unsupported OS {}, not opening a browser", other);
            return;
        }
    };

    info!("Opening browser: {} {}", program, args.join(" "));
    match tokio::process::Command::new(program).args(&args).output().await {
        Ok(output) if output.status.success() => info!("Browser open command issued"),
        Ok(output) => warn!(
            "Failed to open browser ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => warn!("Failed to run {}: {}", program, e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkmirror_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    if !config.dist_dir.join("index.html").exists() {
        warn!(
            "No index.html in {}; build the client first",
            config.dist_dir.display()
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let url = format!("http://localhost:{}", config.port);
    info!("InkMirror listening on {}", addr);
    info!("Serving {} at {}", config.dist_dir.display(), url);

    if config.open_browser {
        tokio::spawn(async move { open_browser(&url).await });
    }

    if let Err(e) = axum::serve(listener, app(&config)).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
