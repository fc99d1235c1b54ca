use anyhow::Result;
use axum::Router;
use clap::Parser;
use seekdex_core::config::{SearchConfig, DEFAULT_TOP_K};
use seekdex_server::build_app;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus root holding indices/ and posting_keys.json
    #[arg(long, default_value = ".")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Results returned when the request does not set k
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// Per-request timeout
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = SearchConfig::new(&args.index).with_top_k(args.top_k);
    let app: Router = build_app(config, Duration::from_secs(args.timeout_secs))?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
