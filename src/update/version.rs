//! Dotted numeric version comparison.
//!
//! Versions are compared segment by segment after splitting on `.`. A
//! segment missing from the shorter version counts as `0`, so `1.2` and
//! `1.2.0` are equal while `1.2.0.1` is newer than `1.2`. Segments that do
//! not parse as an unsigned integer also count as `0`.

use std::cmp::Ordering;

fn segment(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

/// Compare two dotted numeric version strings.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.').map(segment);
    let mut right = b.split('.').map(segment);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => match l.unwrap_or(0).cmp(&r.unwrap_or(0)) {
                Ordering::Equal => {}
                decided => return decided,
            },
        }
    }
}

/// Whether `candidate` is strictly newer than `installed`.
#[must_use]
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    compare_versions(installed, candidate) == Ordering::Less
}
