//! Cascade binary.

use cascade::{Config, run};
use cascade_infrastructure::to_json_stable;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        path = %config.scene_path.display(),
        "Starting Cascade v{}",
        env!("CARGO_PKG_VERSION")
    );

    let report = run(&config.scene_path).await?;
    print!("{}", to_json_stable(&report)?);

    Ok(())
}
