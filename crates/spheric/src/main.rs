//! Moving-square benchmark binary.
//!
//! Usage: `spheric [config.json]`. Without an argument the published case
//! constants are used.

use spheric::{build_solver, CaseConfig, JsonSnapshotWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spheric=info,sph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!("loading configuration from {path}");
            CaseConfig::load(&path)?
        }
        None => {
            tracing::info!("no config file given, using the published case constants");
            let config = CaseConfig::default();
            config.validate()?;
            config
        }
    };

    let mut solver = build_solver(&config)?;
    let mut writer = JsonSnapshotWriter::benchmark(&config.output_dir)?;
    solver.run(&mut writer)?;
    Ok(())
}
