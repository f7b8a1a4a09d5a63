//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, PlannerConfig};

#[derive(Debug, Parser)]
#[command(name = "v2g-planner")]
#[command(author, version, about = "Weekly V2G versus diesel sourcing planner")]
#[command(
    long_about = "Forecasts load, solar production, and EV power available for V2G over the\n\
    next 7 days, then picks V2G or diesel to cover each day's deficit.\n\
    \nExamples:\n  \
    v2g-planner                                  # demo preset, synthetic history\n  \
    v2g-planner --preset cheap_v2g --csv-out plan.csv\n  \
    v2g-planner --config site.toml --diesel-price 2.8"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in preset (demo, cheap_v2g, price_parity)
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the synthetic-history seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the diesel price per kWh
    #[arg(long)]
    pub diesel_price: Option<f64>,

    /// Override the V2G price per kWh
    #[arg(long)]
    pub v2g_price: Option<f64>,

    /// Write the day records to a CSV file
    #[arg(long)]
    pub csv_out: Option<PathBuf>,

    /// Serve the plan over HTTP after computing it (requires the `api` feature)
    #[arg(long, default_value_t = false)]
    pub serve: bool,

    /// API server port
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

impl Cli {
    /// Resolves the configuration source and applies command-line overrides.
    ///
    /// `--config` takes priority, then `--preset`, then the `demo` preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn load_config(&self) -> Result<PlannerConfig, ConfigError> {
        let mut cfg = match (&self.config, &self.preset) {
            (Some(path), _) => PlannerConfig::from_toml_file(path)?,
            (None, Some(name)) => PlannerConfig::from_preset(name)?,
            (None, None) => PlannerConfig::demo(),
        };
        if let Some(seed) = self.seed {
            cfg.synthetic.seed = seed;
        }
        if let Some(price) = self.diesel_price {
            cfg.prices.diesel_price_per_kwh = price;
        }
        if let Some(price) = self.v2g_price {
            cfg.prices.v2g_price_per_kwh = price;
        }
        Ok(cfg)
    }
}
