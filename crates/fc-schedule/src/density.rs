//! Empirical parking-density profiles.
//!
//! # CSV format
//!
//! Headerless, one row per second of day, density as a fraction of the
//! day's parking events:
//!
//! ```csv
//! 10800,0.0000112
//! 10801,0.0000113
//! 10802,0.0000109
//! ```
//!
//! Rows may appear in any order; seconds not listed have density zero.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::{ScheduleError, ScheduleResult};

/// Ordered `(second_of_day, density)` samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DensityProfile {
    samples: Vec<(u64, f64)>,
}

impl DensityProfile {
    /// Build a profile from samples in any order.
    ///
    /// Rejects negative or non-finite densities and repeated seconds.
    pub fn from_samples(mut samples: Vec<(u64, f64)>) -> ScheduleResult<Self> {
        for &(second, value) in &samples {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ScheduleError::InvalidDensity { second, value });
            }
        }
        samples.sort_by_key(|&(second, _)| second);
        if let Some(w) = samples.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ScheduleError::DuplicateSecond(w[0].0));
        }
        Ok(Self { samples })
    }

    /// Equal density on every second of `[start, end)`, summing to 1 over
    /// that window.  Empty if the window is empty.
    pub fn uniform(start: u64, end: u64) -> Self {
        if end <= start {
            return Self::default();
        }
        let d = 1.0 / (end - start) as f64;
        Self { samples: (start..end).map(|s| (s, d)).collect() }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Density at `second` (zero if not listed).
    pub fn density(&self, second: u64) -> f64 {
        match self.samples.binary_search_by_key(&second, |&(s, _)| s) {
            Ok(i) => self.samples[i].1,
            Err(_) => 0.0,
        }
    }

    /// Samples with `start <= second < end`, in second order.
    pub fn window(&self, start: u64, end: u64) -> &[(u64, f64)] {
        let lo = self.samples.partition_point(|&(s, _)| s < start);
        let hi = self.samples.partition_point(|&(s, _)| s < end);
        &self.samples[lo..hi.max(lo)]
    }

    /// Total density over `[start, end)`.
    pub fn mass(&self, start: u64, end: u64) -> f64 {
        self.window(start, end).iter().map(|&(_, d)| d).sum()
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DensityRecord {
    second:  u64,
    density: f64,
}

/// Load a headerless `second,density` CSV file.
pub fn load_density_csv(path: &Path) -> ScheduleResult<DensityProfile> {
    let file = std::fs::File::open(path)?;
    load_density_reader(file)
}

/// Like [`load_density_csv`] but accepts any `Read` source.
pub fn load_density_reader<R: Read>(reader: R) -> ScheduleResult<DensityProfile> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for result in csv_reader.deserialize::<DensityRecord>() {
        let row = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        samples.push((row.second, row.density));
    }
    DensityProfile::from_samples(samples)
}
