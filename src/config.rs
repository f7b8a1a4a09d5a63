//! TOML-based planner configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::forecast::window::Scaling;
use crate::series::SeriesKind;

/// Number of days covered by one planning run.
pub const FORECAST_DAYS: usize = 7;

/// Top-level planner configuration parsed from TOML.
///
/// All sections have defaults matching the `demo` preset. Load from TOML
/// with [`PlannerConfig::from_toml_file`] or use [`PlannerConfig::demo`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// Forecast horizon and resolution.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Diesel and V2G energy prices.
    #[serde(default)]
    pub prices: PriceConfig,
    /// Synthetic history used for series without an input file.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
    /// Per-series input files, lookback lengths and scaling.
    #[serde(default)]
    pub series: SeriesSection,
    /// Model artifact paths.
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Forecast horizon and resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Days to plan; only [`FORECAST_DAYS`] is accepted.
    pub days: usize,
    /// Observations per day in the input series (24 for hourly data).
    pub steps_per_day: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            days: FORECAST_DAYS,
            steps_per_day: 24,
        }
    }
}

/// Energy prices, per kWh of delivered energy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    pub diesel_price_per_kwh: f64,
    pub v2g_price_per_kwh: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        // 2500 and 200 per MWh.
        Self {
            diesel_price_per_kwh: 2.5,
            v2g_price_per_kwh: 0.2,
        }
    }
}

/// Parameters of the seeded synthetic history.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Master random seed.
    pub seed: u64,
    /// Days of history to generate.
    pub days: usize,
    /// Observations per day; must match `forecast.steps_per_day`.
    pub steps_per_day: usize,
    /// Timestamp of the first observation.
    pub start: NaiveDateTime,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            days: 14,
            steps_per_day: 24,
            start: default_origin(),
        }
    }
}

/// How the time column of an input file is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// Calendar timestamps (RFC 3339, `%Y-%m-%d %H:%M[:%S]`, or Excel dates).
    Datetime,
    /// Seconds elapsed since `origin`.
    SecondsOffset,
    /// Hours elapsed since `origin`.
    HoursOffset,
}

/// Input and windowing parameters for one series.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesConfig {
    /// CSV or XLSX file; synthetic history is used when absent.
    pub path: Option<PathBuf>,
    pub time_column: String,
    pub value_column: String,
    pub time_format: TimeFormat,
    /// Reference instant for offset time formats.
    pub origin: NaiveDateTime,
    /// Lookback window length; must equal the model's input length.
    pub lookback: usize,
    /// Scaling the model was trained with.
    pub scaling: Scaling,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            path: None,
            time_column: "time".to_string(),
            value_column: "value".to_string(),
            time_format: TimeFormat::Datetime,
            origin: default_origin(),
            lookback: 24,
            scaling: Scaling::Identity,
        }
    }
}

impl SeriesConfig {
    /// Column layout of the dashboard's bundled data files for `kind`.
    pub fn dashboard_layout(kind: SeriesKind) -> Self {
        let (time_column, value_column, time_format) = match kind {
            SeriesKind::Load => ("Time", "Load", TimeFormat::SecondsOffset),
            SeriesKind::Solar => ("Time", "SolarEnergy", TimeFormat::SecondsOffset),
            SeriesKind::V2g => (
                "Hour",
                "total_usable_power_all_profiles_MW",
                TimeFormat::HoursOffset,
            ),
        };
        Self {
            time_column: time_column.to_string(),
            value_column: value_column.to_string(),
            time_format,
            ..Self::default()
        }
    }
}

/// A `[series.<kind>]` table as written; unset keys keep the kind's
/// dashboard layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SeriesOverrides {
    path: Option<PathBuf>,
    time_column: Option<String>,
    value_column: Option<String>,
    time_format: Option<TimeFormat>,
    origin: Option<NaiveDateTime>,
    lookback: Option<usize>,
    scaling: Option<Scaling>,
}

impl SeriesOverrides {
    fn apply(self, kind: SeriesKind) -> SeriesConfig {
        let base = SeriesConfig::dashboard_layout(kind);
        SeriesConfig {
            path: self.path.or(base.path),
            time_column: self.time_column.unwrap_or(base.time_column),
            value_column: self.value_column.unwrap_or(base.value_column),
            time_format: self.time_format.unwrap_or(base.time_format),
            origin: self.origin.unwrap_or(base.origin),
            lookback: self.lookback.unwrap_or(base.lookback),
            scaling: self.scaling.unwrap_or(base.scaling),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSeriesSection {
    load: SeriesOverrides,
    solar: SeriesOverrides,
    v2g: SeriesOverrides,
}

/// Per-series input configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(from = "RawSeriesSection")]
pub struct SeriesSection {
    pub load: SeriesConfig,
    pub solar: SeriesConfig,
    pub v2g: SeriesConfig,
}

impl From<RawSeriesSection> for SeriesSection {
    fn from(raw: RawSeriesSection) -> Self {
        Self {
            load: raw.load.apply(SeriesKind::Load),
            solar: raw.solar.apply(SeriesKind::Solar),
            v2g: raw.v2g.apply(SeriesKind::V2g),
        }
    }
}

impl Default for SeriesSection {
    fn default() -> Self {
        RawSeriesSection::default().into()
    }
}

impl SeriesSection {
    pub fn get(&self, kind: SeriesKind) -> &SeriesConfig {
        match kind {
            SeriesKind::Load => &self.load,
            SeriesKind::Solar => &self.solar,
            SeriesKind::V2g => &self.v2g,
        }
    }
}

/// Model artifact per series. A missing entry selects the persistence model.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelsConfig {
    pub load: Option<PathBuf>,
    pub solar: Option<PathBuf>,
    pub v2g: Option<PathBuf>,
}

impl ModelsConfig {
    pub fn get(&self, kind: SeriesKind) -> Option<&Path> {
        match kind {
            SeriesKind::Load => self.load.as_deref(),
            SeriesKind::Solar => self.solar.as_deref(),
            SeriesKind::V2g => self.v2g.as_deref(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.steps_per_day"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn default_origin() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 6, 7)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl PlannerConfig {
    /// Returns the demo configuration: synthetic history, persistence models,
    /// dashboard default prices.
    pub fn demo() -> Self {
        Self {
            forecast: ForecastConfig::default(),
            prices: PriceConfig::default(),
            synthetic: SyntheticConfig::default(),
            series: SeriesSection::default(),
            models: ModelsConfig::default(),
        }
    }

    /// Returns the cheap-V2G preset: V2G at a tenth of the demo price and
    /// pricier diesel, so every deficit day leans on parked EVs.
    pub fn cheap_v2g() -> Self {
        Self {
            prices: PriceConfig {
                diesel_price_per_kwh: 3.0,
                v2g_price_per_kwh: 0.02,
            },
            synthetic: SyntheticConfig {
                seed: 7,
                ..SyntheticConfig::default()
            },
            ..Self::demo()
        }
    }

    /// Returns the price-parity preset: V2G costs as much as diesel, so the
    /// plan shows no savings.
    pub fn price_parity() -> Self {
        Self {
            prices: PriceConfig {
                diesel_price_per_kwh: 2.5,
                v2g_price_per_kwh: 2.5,
            },
            ..Self::demo()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "cheap_v2g", "price_parity"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "cheap_v2g" => Ok(Self::cheap_v2g()),
            "price_parity" => Ok(Self::price_parity()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// Relative series and model paths are resolved against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            cfg.resolve_paths(base);
        }
        Ok(cfg)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p.as_mut().filter(|path| path.is_relative()) {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.series.load.path);
        resolve(&mut self.series.solar.path);
        resolve(&mut self.series.v2g.path);
        resolve(&mut self.models.load);
        resolve(&mut self.models.solar);
        resolve(&mut self.models.v2g);
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Prices are left to [`PriceParameters`](crate::optimize::PriceParameters),
    /// which reports them as `InvalidPriceParameters`. Returns an empty vector
    /// if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let f = &self.forecast;

        if f.days != FORECAST_DAYS {
            errors.push(ConfigError::new(
                "forecast.days",
                format!("must be {FORECAST_DAYS}, got {}", f.days),
            ));
        }
        if f.steps_per_day == 0 || 86_400 % f.steps_per_day != 0 {
            errors.push(ConfigError::new(
                "forecast.steps_per_day",
                "must be > 0 and divide a day into whole seconds",
            ));
        }

        let syn = &self.synthetic;
        let uses_synthetic = SeriesKind::ALL
            .iter()
            .any(|&kind| self.series.get(kind).path.is_none());
        if syn.days == 0 {
            errors.push(ConfigError::new("synthetic.days", "must be > 0"));
        }
        if uses_synthetic && syn.steps_per_day != f.steps_per_day {
            errors.push(ConfigError::new(
                "synthetic.steps_per_day",
                "must equal forecast.steps_per_day",
            ));
        }

        for kind in SeriesKind::ALL {
            let s = self.series.get(kind);
            if s.lookback == 0 {
                errors.push(ConfigError::new(
                    format!("series.{kind}.lookback"),
                    "must be > 0",
                ));
            }
            if let Scaling::MinMax { min, max } = s.scaling {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    errors.push(ConfigError::new(
                        format!("series.{kind}.scaling"),
                        "min_max bounds must be finite with min < max",
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_preset_valid() {
        let cfg = PlannerConfig::demo();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "demo should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = PlannerConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in PlannerConfig::PRESETS {
            let cfg = PlannerConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[forecast]
steps_per_day = 24

[prices]
diesel_price_per_kwh = 2.0
v2g_price_per_kwh = 1.0

[series.load]
path = "data/Total_Load.csv"
lookback = 15
scaling = { kind = "min_max", min = 0.0, max = 20.0 }

[series.v2g]
path = "data/ev.xlsx"
time_column = "Hour"
value_column = "total_usable_power_all_profiles_MW"
time_format = "hours_offset"
origin = "2022-06-07T00:00:00"
lookback = 15

[models]
load = "models/load_gru.json"
"#;
        let cfg = PlannerConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.prices.diesel_price_per_kwh, 2.0);
        assert_eq!(cfg.series.load.lookback, 15);
        assert_eq!(
            cfg.series.load.scaling,
            Scaling::MinMax { min: 0.0, max: 20.0 }
        );
        // Unspecified columns keep the dashboard layout.
        assert_eq!(cfg.series.load.value_column, "Load");
        assert_eq!(cfg.series.solar.value_column, "SolarEnergy");
        assert_eq!(cfg.series.v2g.time_format, TimeFormat::HoursOffset);
        assert!(cfg.models.get(SeriesKind::Load).is_some());
        assert!(cfg.models.get(SeriesKind::Solar).is_none());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[prices]
diesel_price_per_kwh = 2.0
bogus_field = true
"#;
        assert!(PlannerConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn series_table_rejects_unknown_keys() {
        let toml = r#"
[series.solar]
colum = "SolarEnergy"
"#;
        assert!(PlannerConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_leaves_prices_to_price_parameters() {
        let mut cfg = PlannerConfig::demo();
        cfg.prices.v2g_price_per_kwh = 0.0;
        cfg.prices.diesel_price_per_kwh = -1.0;
        let errors = cfg.validate();
        assert!(errors.is_empty(), "prices are not config errors: {errors:?}");
    }

    #[test]
    fn synthetic_resolution_only_checked_when_used() {
        let mut cfg = PlannerConfig::demo();
        cfg.forecast.steps_per_day = 1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "synthetic.steps_per_day"));

        cfg.series.load.path = Some(PathBuf::from("load.csv"));
        cfg.series.solar.path = Some(PathBuf::from("solar.csv"));
        cfg.series.v2g.path = Some(PathBuf::from("ev.csv"));
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_requires_a_week() {
        let mut cfg = PlannerConfig::demo();
        cfg.forecast.days = 3;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "forecast.days"));
    }

    #[test]
    fn validation_catches_bad_scaling_and_lookback() {
        let mut cfg = PlannerConfig::demo();
        cfg.series.solar.scaling = Scaling::MinMax { min: 5.0, max: 5.0 };
        cfg.series.v2g.lookback = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "series.solar.scaling"));
        assert!(errors.iter().any(|e| e.field == "series.v2g.lookback"));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let mut cfg = PlannerConfig::demo();
        cfg.series.load.path = Some(PathBuf::from("data/load.csv"));
        cfg.models.solar = Some(PathBuf::from("/abs/solar.json"));
        cfg.resolve_paths(Path::new("/etc/planner"));
        assert_eq!(
            cfg.series.load.path.as_deref(),
            Some(Path::new("/etc/planner/data/load.csv"))
        );
        assert_eq!(cfg.models.solar.as_deref(), Some(Path::new("/abs/solar.json")));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[synthetic]
seed = 99
"#;
        let cfg = PlannerConfig::from_toml_str(toml).expect("partial TOML should parse");
        assert_eq!(cfg.synthetic.seed, 99);
        assert_eq!(cfg.forecast.steps_per_day, 24);
        assert_eq!(cfg.prices.v2g_price_per_kwh, 0.2);
    }
}
