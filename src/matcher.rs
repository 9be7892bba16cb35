use crate::store::StudentRecord;

/// Maximum Euclidean distance at which two descriptors are considered
/// the same identity.
pub const DEFAULT_THRESHOLD: f32 = 0.6;

/// Euclidean distance between two descriptors. Descriptors of differing
/// length never match, so their distance is `None` (infinitely far).
pub fn distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let sq: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sq.sqrt())
}

/// Scan every enrolled descriptor and return the index of the record
/// with the smallest distance strictly below `threshold`, together with
/// that distance. Ties break to the first record in insertion order.
/// Records without a descriptor are skipped.
pub fn best_match(records: &[StudentRecord], probe: &[f32], threshold: f32) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, record) in records.iter().enumerate() {
        let Some(descriptor) = record.face_descriptor.as_deref() else {
            continue;
        };
        let Some(dist) = distance(descriptor, probe) else {
            continue;
        };
        if dist >= threshold {
            continue;
        }
        match best {
            Some((_, best_dist)) if best_dist <= dist => {}
            _ => best = Some((idx, dist)),
        }
    }
    best
}

/// Confidence score for a match at the given distance.
pub fn confidence(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(&[0.0, 0.0], &[3.0, 4.0]), Some(5.0));
        assert_eq!(distance(&[0.0], &[0.0, 0.0]), None);
        assert_eq!(distance(&[], &[]), Some(0.0));
    }

    #[test]
    fn test_confidence_clamped() {
        assert!((confidence(0.4) - 0.6).abs() < 1e-6);
        assert_eq!(confidence(1.5), 0.0);
    }
}
