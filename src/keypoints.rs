use crate::ordering::canonical_sort;
use crate::parse::{decode_utf8, parse_keypoints, Parsed};
use crate::{CompareConfig, Error, Keypoint, Result};
use log::*;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::Path;

/// The number of descriptor values written per line by [`KeypointSet::write_to`].
const VALUES_PER_LINE: usize = 16;

/// All keypoints read from one file, kept in canonical order.
///
/// A set is built once and never modified. Every keypoint carries a descriptor
/// of exactly `block_size` bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeypointSet {
    block_size: usize,
    epsilon: f32,
    keypoints: Vec<Keypoint>,
}

impl KeypointSet {
    /// Builds a set from keypoints in any order.
    ///
    /// Fails with [`Error::BlockSizeMismatch`] if a descriptor does not have
    /// `block_size` bytes.
    pub fn new(block_size: usize, keypoints: Vec<Keypoint>, epsilon: f32) -> Result<Self> {
        if let Some(kp) = keypoints.iter().find(|kp| kp.block_size() != block_size) {
            return Err(Error::BlockSizeMismatch {
                left: block_size,
                right: kp.block_size(),
            });
        }
        Ok(Self::canonicalized(block_size, keypoints, epsilon))
    }

    fn canonicalized(block_size: usize, mut keypoints: Vec<Keypoint>, epsilon: f32) -> Self {
        canonical_sort(&mut keypoints, epsilon);
        Self {
            block_size,
            epsilon,
            keypoints,
        }
    }

    /// Parses a set from keypoint text.
    pub fn parse(input: &str, config: &CompareConfig) -> Result<Self> {
        let Parsed {
            block_size,
            keypoints,
        } = parse_keypoints(input, config)?;
        Ok(Self::canonicalized(block_size, keypoints, config.epsilon))
    }

    /// Parses a set from a stream of keypoint text.
    pub fn from_reader(mut reader: impl Read, config: &CompareConfig) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::parse(decode_utf8(&bytes)?, config)
    }

    /// Parses a set from a keypoint file on disk.
    ///
    /// Failing to read the file is reported as [`Error::FileAccess`]; contents
    /// that are not keypoint text are [`Error::MalformedInput`].
    pub fn open(path: impl AsRef<Path>, config: &CompareConfig) -> Result<Self> {
        let path = path.as_ref();
        trace!("Reading {}.", path.display());
        let bytes = std::fs::read(path).map_err(|source| Error::FileAccess {
            path: path.to_owned(),
            source,
        })?;
        let set = Self::parse(decode_utf8(&bytes)?, config)?;
        info!(
            "Loaded {} keypoints of block size {} from {}",
            set.len(),
            set.block_size,
            path.display()
        );
        Ok(set)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The tolerance the set was put into canonical order with.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// The keypoints in canonical order.
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keypoint> {
        self.keypoints.iter()
    }

    /// Writes the set in the text format it is parsed from.
    ///
    /// Each keypoint gets one line for its position, scale and orientation,
    /// followed by its descriptor in lines of 16 values.
    pub fn write_to(&self, mut writer: impl Write) -> io::Result<()> {
        writeln!(writer, "{} {}", self.len(), self.block_size)?;
        for kp in &self.keypoints {
            writeln!(
                writer,
                "{} {} {} {}",
                kp.row, kp.col, kp.scale, kp.orientation
            )?;
            for chunk in kp.descriptor.chunks(VALUES_PER_LINE) {
                let line: Vec<String> = chunk.iter().map(u8::to_string).collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
        }
        writer.flush()
    }
}

impl<'a> IntoIterator for &'a KeypointSet {
    type Item = &'a Keypoint;
    type IntoIter = std::slice::Iter<'a, Keypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPSILON;

    fn sample() -> Vec<Keypoint> {
        vec![
            Keypoint::new(5.25, 7.5, 2.0, -1.0, (0..20).collect()),
            Keypoint::new(1.0, 2.0, 1.5, 0.2, (0..20).rev().collect()),
            Keypoint::new(3.0, 4.0, 1.0, 3.1, (0..20).collect()),
        ]
    }

    #[test]
    fn new_sorts_into_canonical_order() {
        let set = KeypointSet::new(20, sample(), DEFAULT_EPSILON).unwrap();
        let rows: Vec<f32> = set.iter().map(|kp| kp.row).collect();
        assert_eq!(rows, vec![3.0, 5.25, 1.0]);
    }

    #[test]
    fn new_rejects_wrong_descriptor_length() {
        let mut keypoints = sample();
        keypoints.push(Keypoint::new(0.0, 0.0, 1.0, 0.0, vec![1, 2]));
        assert!(matches!(
            KeypointSet::new(20, keypoints, DEFAULT_EPSILON),
            Err(Error::BlockSizeMismatch { left: 20, right: 2 })
        ));
    }

    #[test]
    fn written_output_parses_back_to_the_same_set() {
        let set = KeypointSet::new(20, sample(), DEFAULT_EPSILON).unwrap();
        let mut out = Vec::new();
        set.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("3 20\n3 4 1 3.1\n0 1 2 3"));
        let parsed = KeypointSet::parse(&text, &CompareConfig::strict()).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn from_reader_rejects_binary_input() {
        let bytes: &[u8] = b"1 3\n10.0 20.0 1.5 0.2 5 10 \xff\n";
        assert!(matches!(
            KeypointSet::from_reader(bytes, &CompareConfig::default()),
            Err(Error::MalformedInput {
                line: 2,
                reason: crate::MalformedReason::InvalidUtf8 { .. }
            })
        ));
    }

    #[test]
    fn from_reader_reports_io_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
            }
        }
        assert!(matches!(
            KeypointSet::from_reader(Broken, &CompareConfig::default()),
            Err(Error::Io(_))
        ));
    }
}
