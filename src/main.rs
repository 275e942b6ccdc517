use std::env;

use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_logging();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = rtp_projection::api::run_http_server(port).await {
            error!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = rtp_projection::api::run_cli(raw_args) {
        error!("Projection failed: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so JSON written to stdout stays machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
