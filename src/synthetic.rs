//! Synthetic GPS trace generator for tests and demos.
//!
//! Builds deterministic traces with known dwell/travel structure, giving
//! tests ground truth for stop detection, classification and tagging.
//!
//! Feature-gated behind `synthetic` — not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use traceprofile::synthetic::TraceBuilder;
//!
//! let start = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
//! let fixes = TraceBuilder::new(42, start)
//!     .interval_s(60)
//!     .dwell(48.8566, 2.3522, 3600)
//!     .travel(48.8800, 2.3550, 1800)
//!     .dwell(48.8800, 2.3550, 7200)
//!     .build();
//! assert!(fixes.len() > 100);
//! ```

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo_utils::METERS_PER_DEG_LAT;
use crate::Fix;

/// Builder for synthetic traces composed of dwell and travel segments.
pub struct TraceBuilder {
    rng: StdRng,
    cursor: DateTime<Utc>,
    interval_s: i64,
    noise_sigma_m: f64,
    position: Option<(f64, f64)>,
    fixes: Vec<Fix>,
}

impl TraceBuilder {
    /// Create a builder with a fixed RNG seed and a starting instant.
    pub fn new(seed: u64, start: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            cursor: start,
            interval_s: 60,
            noise_sigma_m: 3.0,
            position: None,
            fixes: Vec::new(),
        }
    }

    /// Sampling interval between generated fixes (seconds). Default: 60
    pub fn interval_s(mut self, interval_s: i64) -> Self {
        self.interval_s = interval_s.max(1);
        self
    }

    /// GPS noise standard deviation in meters. Default: 3.0
    pub fn noise_sigma_m(mut self, sigma: f64) -> Self {
        self.noise_sigma_m = sigma.max(0.0);
        self
    }

    /// Stay at a coordinate for `duration_s` seconds, emitting noisy fixes.
    pub fn dwell(mut self, lat: f64, lon: f64, duration_s: i64) -> Self {
        let steps = (duration_s / self.interval_s).max(1);
        for _ in 0..steps {
            self.emit(lat, lon);
            self.cursor += Duration::seconds(self.interval_s);
        }
        self.position = Some((lat, lon));
        self
    }

    /// Travel linearly from the current position to a destination over
    /// `duration_s` seconds. Without a prior position, jumps there.
    pub fn travel(mut self, to_lat: f64, to_lon: f64, duration_s: i64) -> Self {
        let (from_lat, from_lon) = match self.position {
            Some(p) => p,
            None => {
                self.position = Some((to_lat, to_lon));
                return self;
            }
        };

        let steps = (duration_s / self.interval_s).max(1);
        for k in 1..=steps {
            let f = k as f64 / steps as f64;
            let lat = from_lat + f * (to_lat - from_lat);
            let lon = from_lon + f * (to_lon - from_lon);
            self.emit(lat, lon);
            self.cursor += Duration::seconds(self.interval_s);
        }
        self.position = Some((to_lat, to_lon));
        self
    }

    /// Advance time without emitting fixes (signal loss).
    pub fn gap(mut self, duration_s: i64) -> Self {
        self.cursor += Duration::seconds(duration_s);
        self
    }

    /// Finish and return the generated fixes.
    pub fn build(self) -> Vec<Fix> {
        self.fixes
    }

    fn emit(&mut self, lat: f64, lon: f64) {
        let (dn, de) = self.noise_m();
        let noisy_lat = lat + dn / METERS_PER_DEG_LAT;
        let meters_per_deg_lon = METERS_PER_DEG_LAT * lat.to_radians().cos();
        let noisy_lon = lon + de / meters_per_deg_lon;
        self.fixes.push(Fix::new(self.cursor, noisy_lat, noisy_lon));
    }

    /// Gaussian noise pair in meters (Box-Muller).
    fn noise_m(&mut self) -> (f64, f64) {
        if self.noise_sigma_m == 0.0 {
            return (0.0, 0.0);
        }
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        let r = (-2.0 * u1.ln()).sqrt() * self.noise_sigma_m;
        let theta = 2.0 * std::f64::consts::PI * u2;
        (r * theta.cos(), r * theta.sin())
    }
}

/// A week of commuter life: home every night, work on weekdays.
///
/// `start` should be a Monday midnight in the subject's clock frame. Each
/// day dwells at home 00:00–08:00 and 18:30–24:00; Monday–Friday add a
/// commute out, a 09:00–17:30 dwell at work and a commute back. Weekend
/// afternoons visit a third location.
pub fn commuter_week(
    seed: u64,
    home: (f64, f64),
    work: (f64, f64),
    weekend_spot: (f64, f64),
    start: DateTime<Utc>,
) -> Vec<Fix> {
    let mut builder = TraceBuilder::new(seed, start).interval_s(120);

    for day in 0..7 {
        let workday = day < 5;
        // night at home
        builder = builder.dwell(home.0, home.1, 8 * 3600);
        if workday {
            builder = builder
                .travel(work.0, work.1, 3600)
                .dwell(work.0, work.1, 8 * 3600 + 1800)
                .travel(home.0, home.1, 3600);
        } else {
            builder = builder
                .travel(weekend_spot.0, weekend_spot.1, 3600)
                .dwell(weekend_spot.0, weekend_spot.1, 3 * 3600)
                .travel(home.0, home.1, 3600)
                .dwell(home.0, home.1, 5 * 3600 + 1800);
        }
        // evening at home until midnight
        builder = builder.dwell(home.0, home.1, 5 * 3600 + 1800);
    }

    builder.build()
}
