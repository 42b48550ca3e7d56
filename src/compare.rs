use crate::ordering::field_diff;
use crate::{CompareConfig, Error, FieldDiff, Keypoint, KeypointSet, Result};
use log::*;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// One position in canonical order where the two sets disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// The position in canonical order.
    pub index: usize,
    pub fields: FieldDiff,
    pub left: Keypoint,
    pub right: Keypoint,
}

impl Mismatch {
    /// The first byte at which the two descriptors differ, if any.
    pub fn first_descriptor_difference(&self) -> Option<usize> {
        let (a, b) = (&self.left.descriptor, &self.right.descriptor);
        a.iter()
            .zip(b.iter())
            .position(|(x, y)| x != y)
            .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {} differ", self.index, self.fields)?;
        if let Some(byte) = self.first_descriptor_difference() {
            write!(f, " (descriptor byte {})", byte)?;
        }
        for (side, kp) in [("A", &self.left), ("B", &self.right)] {
            write!(
                f,
                "\n    {}: row={} col={} scale={} orientation={}",
                side, kp.row, kp.col, kp.scale, kp.orientation
            )?;
        }
        Ok(())
    }
}

/// The result of comparing two keypoint sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Every position matched within tolerance.
    Equivalent,
    /// The sets have the same size, but `count` positions differ.
    ///
    /// `details` holds at most `max_reported_mismatches` of them.
    Different { count: usize, details: Vec<Mismatch> },
    /// The sets have different sizes, so no positions were compared.
    SizeMismatch {
        left: usize,
        right: usize,
        delta: usize,
    },
}

impl Outcome {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Outcome::Equivalent)
    }

    /// The number of mismatching positions, or `None` if the sizes differ.
    pub fn mismatch_count(&self) -> Option<usize> {
        match self {
            Outcome::Equivalent => Some(0),
            Outcome::Different { count, .. } => Some(*count),
            Outcome::SizeMismatch { .. } => None,
        }
    }

    /// The absolute difference in keypoint counts, if the sizes differ.
    pub fn size_delta(&self) -> Option<usize> {
        match self {
            Outcome::SizeMismatch { delta, .. } => Some(*delta),
            _ => None,
        }
    }

    pub fn details(&self) -> &[Mismatch] {
        match self {
            Outcome::Different { details, .. } => details,
            _ => &[],
        }
    }
}

/// Compares two canonically ordered sets position by position.
///
/// The sets must share a block size; anything else is a usage error and fails
/// with [`Error::BlockSizeMismatch`]. Sets of different sizes are not aligned.
/// The outcome only carries the size difference in that case.
pub fn compare(left: &KeypointSet, right: &KeypointSet, config: &CompareConfig) -> Result<Outcome> {
    if left.block_size() != right.block_size() {
        return Err(Error::BlockSizeMismatch {
            left: left.block_size(),
            right: right.block_size(),
        });
    }
    for set in [left, right] {
        if set.epsilon() != config.epsilon {
            warn!(
                "Set was ordered with epsilon {} but is compared with epsilon {}",
                set.epsilon(),
                config.epsilon
            );
        }
    }

    if left.len() != right.len() {
        debug!("Sizes differ ({} vs {}), skipping comparison", left.len(), right.len());
        return Ok(Outcome::SizeMismatch {
            left: left.len(),
            right: right.len(),
            delta: left.len().abs_diff(right.len()),
        });
    }

    let mut count = 0;
    let mut details = Vec::new();
    for (index, (a, b)) in left.iter().zip(right).enumerate() {
        let fields = field_diff(a, b, config.epsilon);
        if fields.any() {
            trace!("Keypoint {} differs in {}", index, fields);
            count += 1;
            if details.len() < config.max_reported_mismatches {
                details.push(Mismatch {
                    index,
                    fields,
                    left: a.clone(),
                    right: b.clone(),
                });
            }
        }
    }
    debug!("{} of {} keypoints differ", count, left.len());

    Ok(if count == 0 {
        Outcome::Equivalent
    } else {
        Outcome::Different { count, details }
    })
}

/// A comparison of two labelled keypoint sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub left: String,
    pub right: String,
    pub block_size: usize,
    /// The number of keypoints in the left set.
    pub total: usize,
    pub outcome: Outcome,
}

impl Report {
    pub fn new(
        left_label: impl Into<String>,
        right_label: impl Into<String>,
        left: &KeypointSet,
        right: &KeypointSet,
        config: &CompareConfig,
    ) -> Result<Self> {
        let outcome = compare(left, right, config)?;
        Ok(Self {
            left: left_label.into(),
            right: right_label.into(),
            block_size: left.block_size(),
            total: left.len(),
            outcome,
        })
    }

    pub fn is_equivalent(&self) -> bool {
        self.outcome.is_equivalent()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = (&self.left, &self.right);
        match &self.outcome {
            Outcome::Equivalent => write!(f, "{}, {} no difference found", a, b),
            Outcome::Different { count, .. } => write!(
                f,
                "{}, {} is different in {} blocks out of {} blocks in total!",
                a, b, count, self.total
            ),
            Outcome::SizeMismatch { left, right, delta } => write!(
                f,
                "{}, {} size differed by {} blocks ({} vs {})",
                a, b, delta, left, right
            ),
        }
    }
}

/// Loads two keypoint files and compares them.
pub fn compare_files(
    left: impl AsRef<Path>,
    right: impl AsRef<Path>,
    config: &CompareConfig,
) -> Result<Report> {
    let (left, right) = (left.as_ref(), right.as_ref());
    let left_set = KeypointSet::open(left, config)?;
    let right_set = KeypointSet::open(right, config)?;
    let report = Report::new(
        left.display().to_string(),
        right.display().to_string(),
        &left_set,
        &right_set,
        config,
    )?;
    info!("{}", report);
    Ok(report)
}

/// Compares many pairs of keypoint files independently.
///
/// Results are returned in the order of `pairs`.
pub fn compare_many(pairs: &[(PathBuf, PathBuf)], config: &CompareConfig) -> Vec<Result<Report>> {
    #[cfg(not(feature = "rayon"))]
    {
        pairs
            .iter()
            .map(|(left, right)| compare_files(left, right, config))
            .collect()
    }
    #[cfg(feature = "rayon")]
    {
        pairs
            .par_iter()
            .map(|(left, right)| compare_files(left, right, config))
            .collect()
    }
}
