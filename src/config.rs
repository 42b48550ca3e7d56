use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

/// The tolerance used by [`CompareConfig::default`].
pub const DEFAULT_EPSILON: f32 = 1e-3;

/// Contains the parameters of a keypoint comparison.
///
/// The most important parameter is `epsilon`, which bounds every floating-point
/// comparison made while sorting and diffing. [`CompareConfig::new`] sets it and
/// leaves everything else at the defaults.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Two floats whose difference has a magnitude below this are considered equal.
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,
    /// Reject tokens that follow the declared records instead of ignoring them.
    #[serde(default)]
    pub strict: bool,
    /// The number of mismatching positions whose details are kept in a report.
    ///
    /// The mismatch count itself is never capped.
    #[serde(default = "default_max_reported_mismatches")]
    pub max_reported_mismatches: usize,
}

fn default_epsilon() -> f32 {
    DEFAULT_EPSILON
}

fn default_max_reported_mismatches() -> usize {
    32
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            strict: false,
            max_reported_mismatches: default_max_reported_mismatches(),
        }
    }
}

impl CompareConfig {
    /// This convenience constructor is provided for the very common case
    /// that only the tolerance needs to be modified.
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon,
            ..Default::default()
        }
    }

    /// Create a `CompareConfig` that rejects trailing input.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    /// Load settings from a JSON file. Missing fields take their default values.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::FileAccess {
            path: path.to_owned(),
            source,
        })?;
        let config: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Settings {
                path: path.to_owned(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the tolerance can actually be used for comparisons.
    pub fn validate(&self) -> Result<()> {
        if self.epsilon.is_finite() && self.epsilon >= 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidEpsilon(self.epsilon))
        }
    }
}
