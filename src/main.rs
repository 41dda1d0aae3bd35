use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{serve, AppState};
use wardline_core::{CoreConfig, LoggingDischargeSync, WardServices};
use wardline_types::NonEmptyText;

/// Main entry point for the wardline application.
///
/// Opens the ward store, wires the core services, and runs the REST API with
/// the outbox drain in the background.
///
/// # Environment Variables
/// - `WARDLINE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `WARD_DATA_DIR`: directory for the store snapshot (default: "ward_data")
/// - `WARDLINE_FACILITY`: facility code for operational logs (default: "wardline.dev.1")
/// - `WARDLINE_OUTBOX_DRAIN_SECS`: outbox drain interval (default: 30)
///
/// # Returns
/// * `Ok(())` - if the server starts and runs successfully
/// * `Err(anyhow::Error)` - if startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wardline=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("wardline_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("WARDLINE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("WARD_DATA_DIR")
        .unwrap_or_else(|_| wardline_core::constants::DEFAULT_WARD_DATA_DIR.into());
    let facility = std::env::var("WARDLINE_FACILITY").unwrap_or_else(|_| "wardline.dev.1".into());
    let drain_secs: u64 = std::env::var("WARDLINE_OUTBOX_DRAIN_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    let cfg = CoreConfig::new(
        Some(PathBuf::from(&data_dir)),
        NonEmptyText::new(facility).map_err(|e| anyhow::anyhow!("invalid facility code: {e}"))?,
    )?;
    let services = WardServices::open(&cfg)?;

    tracing::info!(
        addr = %addr,
        data_dir = %data_dir,
        "starting wardline"
    );

    let state = AppState {
        services,
        gateway: Arc::new(LoggingDischargeSync),
    };

    serve(&addr, state, Duration::from_secs(drain_secs)).await
}
