use derive_more::{AsRef, Deref, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A feature descriptor: one byte per bin.
///
/// Descriptors are compared as exact data, never with a tolerance.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    AsRef,
    Deref,
    From,
    Into,
    Serialize,
    Deserialize,
)]
pub struct Descriptor(pub Vec<u8>);

/// A point of interest as written by a SIFT-style extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Subpixel row of the keypoint.
    pub row: f32,
    /// Subpixel column of the keypoint.
    pub col: f32,
    /// The scale the keypoint was detected at.
    pub scale: f32,
    /// The orientation angle, in the range [-π, π].
    pub orientation: f32,
    pub descriptor: Descriptor,
}

impl Keypoint {
    pub fn new(row: f32, col: f32, scale: f32, orientation: f32, descriptor: Vec<u8>) -> Self {
        Self {
            row,
            col,
            scale,
            orientation,
            descriptor: Descriptor(descriptor),
        }
    }

    /// The length of the descriptor.
    pub fn block_size(&self) -> usize {
        self.descriptor.len()
    }
}

/// The fields in which two keypoints disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Either the bytes or the length of the descriptors differ.
    pub descriptor: bool,
    pub row: bool,
    pub col: bool,
    pub scale: bool,
    pub orientation: bool,
}

impl FieldDiff {
    /// Returns `true` if any field differs.
    pub fn any(&self) -> bool {
        self.descriptor || self.row || self.col || self.scale || self.orientation
    }

    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.descriptor, "descriptor"),
            (self.row, "row"),
            (self.col, "col"),
            (self.scale, "scale"),
            (self.orientation, "orientation"),
        ]
        .iter()
        .filter(|&&(differs, _)| differs)
        .map(|&(_, name)| name)
        .collect()
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any() {
            write!(f, "{}", self.names().join(", "))
        } else {
            write!(f, "none")
        }
    }
}
