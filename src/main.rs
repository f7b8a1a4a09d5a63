//! v2g-planner entry point: CLI wiring, pipeline run, and output.

use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use v2g_planner::cli::Cli;
use v2g_planner::io::export::export_csv;
use v2g_planner::pipeline::Pipeline;
use v2g_planner::report::PlanReport;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match cli.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        process::exit(1);
    }

    let plan = match Pipeline::new(cfg).and_then(|mut pipeline| pipeline.run()) {
        Ok(plan) => plan,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    println!("{}", PlanReport::new(&plan));

    if let Some(ref path) = cli.csv_out {
        if let Err(e) = export_csv(&plan.days, path) {
            error!("failed to write CSV: {e}");
            process::exit(1);
        }
        info!(path = %path.display(), "plan written");
    }

    #[cfg(not(feature = "api"))]
    if cli.serve {
        tracing::warn!("--serve ignored: built without the `api` feature");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(v2g_planner::api::AppState { plan });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("failed to create tokio runtime: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = rt.block_on(v2g_planner::api::serve(state, addr)) {
            error!("server error: {e}");
            process::exit(1);
        }
    }
}
