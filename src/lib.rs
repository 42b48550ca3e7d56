//! Checks that two keypoint descriptor files are equivalent.
//!
//! Two SIFT implementations, or two runs of the same one, rarely agree bit for
//! bit: keypoints come out in a different order and their positions, scales and
//! orientations carry floating-point noise. This crate parses both files, puts
//! each into a canonical order that tolerates that noise, and then compares
//! them position by position.
//!
//! ```
//! use kpcmp::{CompareConfig, KeypointSet, Report};
//!
//! let config = CompareConfig::default();
//! let a = KeypointSet::parse("1 3\n10.0 20.0 1.5 0.2 5 10 15\n", &config).unwrap();
//! let b = KeypointSet::parse("1 3\n10.0 20.0 1.5 0.2009 5 10 15\n", &config).unwrap();
//! let report = Report::new("a.key", "b.key", &a, &b, &config).unwrap();
//! assert!(report.is_equivalent());
//! ```

mod compare;
mod config;
mod error;
mod keypoint;
mod keypoints;
mod ordering;
mod parse;

pub use crate::compare::{compare, compare_files, compare_many, Mismatch, Outcome, Report};
pub use crate::config::{CompareConfig, DEFAULT_EPSILON};
pub use crate::error::{Error, MalformedReason, Result};
pub use crate::keypoint::{Descriptor, FieldDiff, Keypoint};
pub use crate::keypoints::KeypointSet;
pub use crate::ordering::{
    canonical_cmp, epsilon_cmp, epsilon_sign, field_diff, is_canonical, near_eq,
};
