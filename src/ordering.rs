//! The canonical order over keypoints.
//!
//! Extractors emit keypoints in whatever order their scale-space traversal
//! produces. Sorting both sides with [`canonical_cmp`] before diffing makes the
//! comparison independent of that order.

use crate::{FieldDiff, Keypoint};
use core::cmp::Ordering;
use log::*;

/// The sign of `x`, where anything with a magnitude below `epsilon` counts as zero.
pub fn epsilon_sign(x: f32, epsilon: f32) -> Ordering {
    if x.abs() < epsilon {
        Ordering::Equal
    } else if x > 0.0 {
        Ordering::Greater
    } else if x < 0.0 {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Compares two floats, treating them as equal when they are within `epsilon`.
pub fn epsilon_cmp(a: f32, b: f32, epsilon: f32) -> Ordering {
    epsilon_sign(a - b, epsilon)
}

/// The canonical three-way order between two keypoints.
///
/// Keys, from most to least significant:
/// 1. descriptor length
/// 2. descriptor bytes, lexicographically
/// 3. row, col, scale, orientation, each within `epsilon`
///
/// Keypoints that agree on every key are `Equal`.
///
/// The tolerance makes this relation non-transitive: `0.0 ≈ 0.0006 ≈ 0.0012`
/// while `0.0 < 0.0012`. Two logically equal sets with values straddling such a
/// boundary can therefore sort differently and produce a spurious mismatch.
pub fn canonical_cmp(a: &Keypoint, b: &Keypoint, epsilon: f32) -> Ordering {
    a.block_size()
        .cmp(&b.block_size())
        .then_with(|| a.descriptor[..].cmp(&b.descriptor[..]))
        .then_with(|| epsilon_cmp(a.row, b.row, epsilon))
        .then_with(|| epsilon_cmp(a.col, b.col, epsilon))
        .then_with(|| epsilon_cmp(a.scale, b.scale, epsilon))
        .then_with(|| epsilon_cmp(a.orientation, b.orientation, epsilon))
}

/// Determines which fields of two keypoints differ beyond `epsilon`.
pub fn field_diff(a: &Keypoint, b: &Keypoint, epsilon: f32) -> FieldDiff {
    FieldDiff {
        descriptor: a.descriptor != b.descriptor,
        row: epsilon_cmp(a.row, b.row, epsilon).is_ne(),
        col: epsilon_cmp(a.col, b.col, epsilon).is_ne(),
        scale: epsilon_cmp(a.scale, b.scale, epsilon).is_ne(),
        orientation: epsilon_cmp(a.orientation, b.orientation, epsilon).is_ne(),
    }
}

/// Two keypoints are near-equal if their descriptors are identical and every
/// float field is within `epsilon`.
pub fn near_eq(a: &Keypoint, b: &Keypoint, epsilon: f32) -> bool {
    !field_diff(a, b, epsilon).any()
}

/// Returns `true` if no adjacent pair of `keypoints` is out of canonical order.
pub fn is_canonical(keypoints: &[Keypoint], epsilon: f32) -> bool {
    keypoints
        .windows(2)
        .all(|pair| canonical_cmp(&pair[0], &pair[1], epsilon) != Ordering::Greater)
}

/// Sorts `keypoints` into canonical order. Already canonical input is left untouched.
///
/// The standard library sorts may panic when handed a comparator that is not a
/// total order, so this uses a stable merge sort that only ever asks which of
/// two elements goes first.
pub(crate) fn canonical_sort(keypoints: &mut Vec<Keypoint>, epsilon: f32) {
    if is_canonical(keypoints, epsilon) {
        trace!("{} keypoints already in canonical order", keypoints.len());
        return;
    }
    trace!("Sorting {} keypoints.", keypoints.len());
    let unsorted = core::mem::take(keypoints);
    *keypoints = merge_sort(unsorted, &|a, b| canonical_cmp(a, b, epsilon));
}

fn merge_sort<T>(mut items: Vec<T>, cmp: &impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // Ties go to the left run to keep the sort stable.
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPSILON as EPS;
    use test_case::test_case;

    fn kp(row: f32, orientation: f32, descriptor: &[u8]) -> Keypoint {
        Keypoint::new(row, 20.0, 1.5, orientation, descriptor.to_vec())
    }

    #[test_case(0.0, Ordering::Equal; "zero")]
    #[test_case(0.0009, Ordering::Equal; "just below epsilon")]
    #[test_case(-0.0009, Ordering::Equal; "just above negative epsilon")]
    #[test_case(0.002, Ordering::Greater; "positive")]
    #[test_case(-0.002, Ordering::Less; "negative")]
    fn sign_with_tolerance(x: f32, expected: Ordering) {
        assert_eq!(epsilon_sign(x, EPS), expected);
    }

    #[test]
    fn zero_epsilon_is_exact() {
        assert_eq!(epsilon_cmp(1.0, 1.0, 0.0), Ordering::Equal);
        assert_eq!(epsilon_cmp(1.0, 1.000_001, 0.0), Ordering::Less);
    }

    #[test]
    fn descriptor_dominates_position() {
        let a = kp(100.0, 0.0, &[1, 2, 3]);
        let b = kp(0.0, 0.0, &[1, 2, 4]);
        assert_eq!(canonical_cmp(&a, &b, EPS), Ordering::Less);
        assert_eq!(canonical_cmp(&b, &a, EPS), Ordering::Greater);
    }

    #[test]
    fn shorter_descriptor_sorts_first() {
        let a = kp(0.0, 0.0, &[255, 255]);
        let b = kp(0.0, 0.0, &[0, 0, 0]);
        assert_eq!(canonical_cmp(&a, &b, EPS), Ordering::Less);
    }

    #[test]
    fn orientation_is_the_last_tie_break() {
        let a = kp(10.0, 0.1, &[1]);
        let b = kp(10.0, 0.2, &[1]);
        assert_eq!(canonical_cmp(&a, &b, EPS), Ordering::Less);
        assert_eq!(canonical_cmp(&b, &a, EPS), Ordering::Greater);
    }

    #[test]
    fn exhausted_keys_are_equal() {
        let a = kp(10.0, 0.2, &[1, 2, 3]);
        let b = kp(10.0005, 0.2005, &[1, 2, 3]);
        assert_eq!(canonical_cmp(&a, &b, EPS), Ordering::Equal);
        assert!(near_eq(&a, &b, EPS));
    }

    #[test]
    fn half_epsilon_orientation_is_equal() {
        let a = kp(10.0, 0.0, &[1, 2, 3]);
        let b = kp(10.0, EPS / 2.0, &[1, 2, 3]);
        assert!(near_eq(&a, &b, EPS));
    }

    #[test]
    fn double_epsilon_orientation_is_unequal() {
        let a = kp(10.0, 0.0, &[1, 2, 3]);
        let b = kp(10.0, EPS * 2.0, &[1, 2, 3]);
        assert!(!near_eq(&a, &b, EPS));
        assert_eq!(
            field_diff(&a, &b, EPS),
            FieldDiff {
                orientation: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn descriptor_is_exact() {
        let a = kp(10.0, 0.2, &[1, 2, 3]);
        let b = kp(10.0, 0.2, &[1, 2, 4]);
        assert!(!near_eq(&a, &b, 1.0e6));
        assert!(field_diff(&a, &b, EPS).descriptor);
    }

    #[test]
    fn sort_orders_by_descriptor_then_row() {
        let mut keypoints = vec![
            kp(3.0, 0.0, &[2]),
            kp(2.0, 0.0, &[1]),
            kp(1.0, 0.0, &[2]),
            kp(1.0, 0.0, &[1]),
        ];
        canonical_sort(&mut keypoints, EPS);
        let order: Vec<(u8, f32)> = keypoints
            .iter()
            .map(|k| (k.descriptor[0], k.row))
            .collect();
        assert_eq!(order, vec![(1, 1.0), (1, 2.0), (2, 1.0), (2, 3.0)]);
        assert!(is_canonical(&keypoints, EPS));
    }

    #[test]
    fn sort_is_stable_for_equivalent_keypoints() {
        let mut keypoints = vec![
            kp(1.0002, 0.0, &[7]),
            kp(0.5, 0.0, &[7]),
            kp(1.0, 0.0, &[7]),
        ];
        canonical_sort(&mut keypoints, EPS);
        let rows: Vec<f32> = keypoints.iter().map(|k| k.row).collect();
        assert_eq!(rows, vec![0.5, 1.0002, 1.0]);
    }
}
