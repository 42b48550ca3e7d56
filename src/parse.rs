//! Reader for the whitespace-delimited keypoint text format.
//!
//! ```text
//! <count> <block_size>
//! <row> <col> <scale> <orientation> <d_0> <d_1> ... <d_{block_size-1}>
//! ... (repeated <count> times)
//! ```
//!
//! Line breaks carry no meaning; they are only tracked for error messages.

use crate::{CompareConfig, Error, Keypoint, MalformedReason, Result};
use core::f32::consts::PI;
use log::*;

/// The header and records of one keypoint stream, in file order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parsed {
    pub block_size: usize,
    pub keypoints: Vec<Keypoint>,
}

struct Tokens<I> {
    inner: I,
    line: usize,
}

impl<'a, I> Tokens<I>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    fn new(inner: I) -> Self {
        Self { inner, line: 1 }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let (line, token) = self.inner.next()?;
        self.line = line;
        Some((line, token))
    }

    fn expect(&mut self, expected: &'static str) -> Result<(usize, &'a str)> {
        let line = self.line;
        self.next().ok_or(Error::MalformedInput {
            line,
            reason: MalformedReason::UnexpectedEof { expected },
        })
    }

    fn usize(&mut self, expected: &'static str) -> Result<usize> {
        let (line, token) = self.expect(expected)?;
        token.parse().map_err(|_| Error::MalformedInput {
            line,
            reason: MalformedReason::InvalidInteger {
                token: token.to_owned(),
            },
        })
    }

    fn float(&mut self, expected: &'static str) -> Result<f32> {
        let (line, token) = self.expect(expected)?;
        let value: f32 = token.parse().map_err(|_| Error::MalformedInput {
            line,
            reason: MalformedReason::InvalidFloat {
                token: token.to_owned(),
            },
        })?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::MalformedInput {
                line,
                reason: MalformedReason::NonFiniteFloat {
                    token: token.to_owned(),
                },
            })
        }
    }

    fn byte(&mut self) -> Result<u8> {
        let (line, token) = self.expect("descriptor value")?;
        token.parse().map_err(|_| {
            let token = token.to_owned();
            let reason = if token.parse::<i128>().is_ok() {
                MalformedReason::ByteOutOfRange { token }
            } else {
                MalformedReason::InvalidInteger { token }
            };
            Error::MalformedInput { line, reason }
        })
    }
}

/// Checks that raw keypoint input is text.
///
/// The reported line is the one holding the first invalid byte.
pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        Error::MalformedInput {
            line: 1 + valid.iter().filter(|&&b| b == b'\n').count(),
            reason: MalformedReason::InvalidUtf8 {
                offset: e.valid_up_to(),
            },
        }
    })
}

/// Parses a whole keypoint stream.
///
/// Either every declared record is read or an error is returned. Tokens after
/// the last record are rejected when `config.strict`, otherwise ignored.
pub(crate) fn parse_keypoints(input: &str, config: &CompareConfig) -> Result<Parsed> {
    let mut tokens = Tokens::new(
        input
            .lines()
            .enumerate()
            .flat_map(|(ix, line)| line.split_ascii_whitespace().map(move |t| (ix + 1, t))),
    );

    let count = tokens.usize("keypoint count")?;
    let block_size = tokens.usize("descriptor block size")?;
    debug!("Header declares {} keypoints of block size {}", count, block_size);

    // Every value takes at least two bytes of input, so this bounds any
    // allocation a bogus header could ask for.
    let mut keypoints = Vec::with_capacity(count.min(input.len() / 2));
    for _ in 0..count {
        let row = tokens.float("row")?;
        let col = tokens.float("col")?;
        let scale = tokens.float("scale")?;
        let orientation = tokens.float("orientation")?;
        let mut descriptor = Vec::with_capacity(block_size.min(input.len() / 2));
        for _ in 0..block_size {
            descriptor.push(tokens.byte()?);
        }
        keypoints.push(Keypoint::new(row, col, scale, orientation, descriptor));
    }

    if let Some((line, token)) = tokens.next() {
        if config.strict {
            return Err(Error::MalformedInput {
                line,
                reason: MalformedReason::TrailingData {
                    token: token.to_owned(),
                },
            });
        }
        let ignored = 1 + tokens.inner.count();
        warn!(
            "Ignoring {} trailing tokens starting on line {}",
            ignored, line
        );
    }

    let (bad_scale, bad_orientation) = count_unusual(&keypoints, config.epsilon);
    if bad_scale > 0 {
        warn!("{} keypoints have a non-positive scale", bad_scale);
    }
    if bad_orientation > 0 {
        warn!(
            "{} keypoints have an orientation outside [-pi, pi]",
            bad_orientation
        );
    }
    Ok(Parsed {
        block_size,
        keypoints,
    })
}

/// Counts keypoints with a non-positive scale and with an orientation outside
/// [-π, π] by more than `epsilon`.
///
/// Extractors should never produce these, but they do not prevent a comparison.
fn count_unusual(keypoints: &[Keypoint], epsilon: f32) -> (usize, usize) {
    let bad_scale = keypoints.iter().filter(|kp| kp.scale <= 0.0).count();
    let bad_orientation = keypoints
        .iter()
        .filter(|kp| kp.orientation.abs() > PI + epsilon)
        .count();
    (bad_scale, bad_orientation)
}
