use crate::error::BucketError;

/// Parameters of the geometric progression used for latency histogram buckets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BucketConfig {
    pub start: f64,
    pub step: f64,
    pub limit: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            start: 0.25,
            step: 1.5,
            limit: 31,
        }
    }
}

impl BucketConfig {
    pub fn boundaries(&self) -> Result<Vec<f64>, BucketError> {
        geometric_sequence(self.start, self.step, self.limit)
    }
}

/// Returns `limit` boundaries where `sequence[i] = round(start * step^i, 2)`.
///
/// Fails if `start` is not positive, if `step` is not greater than one, or if
/// rounding to two decimals would make the sequence stop ascending.
pub fn geometric_sequence(start: f64, step: f64, limit: usize) -> Result<Vec<f64>, BucketError> {
    if !start.is_finite() || start <= 0.0 {
        return Err(BucketError::InvalidStart(start));
    }
    if !step.is_finite() || step <= 1.0 {
        return Err(BucketError::InvalidStep(step));
    }

    let mut sequence = Vec::with_capacity(limit);
    for index in 0..limit {
        let current = round2(start * step.powi(index as i32));
        if current <= 0.0 {
            return Err(BucketError::InvalidStart(start));
        }
        if let Some(&previous) = sequence.last()
            && current <= previous
        {
            return Err(BucketError::NotAscending {
                index,
                previous,
                current,
            });
        }
        sequence.push(current);
    }

    Ok(sequence)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_calibration_matches_closed_form() {
        let buckets = BucketConfig::default().boundaries().unwrap();

        assert_eq!(buckets.len(), 31);
        assert_eq!(buckets[0], 0.25);
        assert_eq!(buckets[1], 0.38);
        assert_eq!(buckets[2], 0.56);
        assert_eq!(buckets[30], round2(0.25 * 1.5f64.powi(30)));
        assert!(buckets.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn zero_limit_is_empty() {
        assert!(geometric_sequence(0.25, 1.5, 0).unwrap().is_empty());
        assert!(geometric_sequence(10.0, 2.0, 0).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_preconditions() {
        assert_eq!(
            geometric_sequence(0.0, 1.5, 3),
            Err(BucketError::InvalidStart(0.0))
        );
        assert_eq!(
            geometric_sequence(-1.0, 1.5, 3),
            Err(BucketError::InvalidStart(-1.0))
        );
        assert_eq!(
            geometric_sequence(1.0, 1.0, 3),
            Err(BucketError::InvalidStep(1.0))
        );
        assert_eq!(
            geometric_sequence(1.0, 0.5, 3),
            Err(BucketError::InvalidStep(0.5))
        );
        assert!(geometric_sequence(f64::NAN, 1.5, 3).is_err());
    }

    #[test]
    fn rounding_collapse_is_reported() {
        // 1.001 and 1.0011 both round to 1.00.
        let err = geometric_sequence(1.001, 1.0001, 3).unwrap_err();
        assert!(matches!(err, BucketError::NotAscending { index: 1, .. }));

        assert_eq!(
            geometric_sequence(0.001, 2.0, 1),
            Err(BucketError::InvalidStart(0.001))
        );
    }
}
