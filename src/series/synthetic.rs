use chrono::{NaiveDateTime, TimeDelta};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Observation, SeriesError, SeriesKind, TimeSeries};
use crate::config::SyntheticConfig;

/// Seed offsets so the three generators do not share a noise stream.
const SOLAR_SEED_OFFSET: u64 = 1;
const V2G_SEED_OFFSET: u64 = 57;

/// Shape parameters of one synthetic profile.
///
/// Every profile is `base + amp * sin(2*pi*day_pos) + ripple_amp *
/// sin(2*pi*ripple_cycles*day_pos) + noise`, scaled by `scale` and clamped
/// to be non-negative.
#[derive(Debug, Clone, Copy)]
struct Profile {
    scale: f64,
    base: f64,
    amp: f64,
    ripple_amp: f64,
    ripple_cycles: f64,
    noise_std: f64,
}

impl Profile {
    fn for_kind(kind: SeriesKind) -> Self {
        match kind {
            // Residential demand swinging around 10 units with an intra-day ripple.
            SeriesKind::Load => Self {
                scale: 1.0,
                base: 10.0,
                amp: 5.0,
                ripple_amp: 2.0,
                ripple_cycles: 4.0,
                noise_std: 0.5,
            },
            // Daylight curve peaking at 7 units.
            SeriesKind::Solar => Self {
                scale: 7.0,
                base: 0.5,
                amp: 0.5,
                ripple_amp: 0.0,
                ripple_cycles: 0.0,
                noise_std: 0.3 / 7.0,
            },
            // Parked EVs: availability is highest at night, mirror of the solar curve.
            SeriesKind::V2g => Self {
                scale: 8.0,
                base: 0.5,
                amp: -0.35,
                ripple_amp: 0.0,
                ripple_cycles: 0.0,
                noise_std: 0.2 / 8.0,
            },
        }
    }

    fn value(&self, day_pos: f64, rng: &mut StdRng) -> f64 {
        let angle = 2.0 * std::f64::consts::PI * day_pos;
        let shape = self.base
            + self.amp * angle.sin()
            + self.ripple_amp * (angle * self.ripple_cycles).sin()
            + gaussian_noise(rng, self.noise_std);
        (shape * self.scale).max(0.0)
    }
}

/// Generates a deterministic synthetic history for `kind`.
///
/// The same `config` always produces the same series, which keeps demo runs
/// reproducible.
///
/// # Errors
///
/// Returns [`SeriesError::Empty`] when `config` asks for zero observations.
pub fn generate(kind: SeriesKind, config: &SyntheticConfig) -> Result<TimeSeries, SeriesError> {
    let steps_per_day = config.steps_per_day.max(1);
    let total = config.days * steps_per_day;
    let step = TimeDelta::seconds(86_400 / steps_per_day as i64);
    let seed = match kind {
        SeriesKind::Load => config.seed,
        SeriesKind::Solar => config.seed.wrapping_add(SOLAR_SEED_OFFSET),
        SeriesKind::V2g => config.seed.wrapping_add(V2G_SEED_OFFSET),
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let profile = Profile::for_kind(kind);

    let mut observations = Vec::with_capacity(total);
    let mut timestamp: NaiveDateTime = config.start;
    for t in 0..total {
        let day_pos = (t % steps_per_day) as f64 / steps_per_day as f64;
        observations.push(Observation::new(timestamp, profile.value(day_pos, &mut rng)));
        timestamp += step;
    }
    TimeSeries::new(kind, observations)
}

/// Gaussian noise via the Box-Muller transform.
///
/// Returns 0.0 for a non-positive `std_dev` without consuming randomness.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
