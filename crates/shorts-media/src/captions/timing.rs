//! Uniform time slicing of caption lines.

use shorts_models::TimeSpan;

use crate::error::{CaptionError, CaptionResult};

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Split `[0, total_duration]` into `line_count` equal, contiguous spans.
///
/// Boundaries are rounded to 2 decimals and shared between neighbours, so
/// `spans[i].end == spans[i + 1].start` holds exactly and the last span ends
/// at the rounded total.
pub fn allocate_intervals(line_count: usize, total_duration: f64) -> CaptionResult<Vec<TimeSpan>> {
    if line_count == 0 {
        return Err(CaptionError::NoLines);
    }
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(CaptionError::InvalidDuration(total_duration));
    }

    let per_line = total_duration / line_count as f64;
    let boundary = |i: usize| {
        if i == line_count {
            round2(total_duration)
        } else {
            round2(i as f64 * per_line)
        }
    };

    Ok((0..line_count)
        .map(|i| TimeSpan::new(boundary(i), boundary(i + 1)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(spans: &[TimeSpan], total: f64) {
        assert_eq!(spans[0].start, 0.0);
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        let covered: f64 = spans.iter().map(TimeSpan::duration).sum();
        assert!((covered - total).abs() <= 0.01, "covered {covered}, total {total}");
    }

    #[test]
    fn test_even_split() {
        let spans = allocate_intervals(4, 10.0).unwrap();
        assert_eq!(
            spans,
            vec![
                TimeSpan::new(0.0, 2.5),
                TimeSpan::new(2.5, 5.0),
                TimeSpan::new(5.0, 7.5),
                TimeSpan::new(7.5, 10.0),
            ]
        );
    }

    #[test]
    fn test_uneven_split_stays_contiguous() {
        for (count, total) in [(3, 10.0), (7, 23.47), (1, 0.3), (9, 59.0), (13, 41.93)] {
            let spans = allocate_intervals(count, total).unwrap();
            assert_eq!(spans.len(), count);
            assert_tiles(&spans, total);
        }
    }

    #[test]
    fn test_rounding_to_two_places() {
        let spans = allocate_intervals(3, 10.0).unwrap();
        assert_eq!(spans[0].end, 3.33);
        assert_eq!(spans[1].end, 6.67);
        assert_eq!(spans[2].end, 10.0);
    }

    #[test]
    fn test_rejects_zero_lines() {
        assert_eq!(allocate_intervals(0, 10.0), Err(CaptionError::NoLines));
    }

    #[test]
    fn test_rejects_bad_duration() {
        assert!(matches!(
            allocate_intervals(2, 0.0),
            Err(CaptionError::InvalidDuration(_))
        ));
        assert!(matches!(
            allocate_intervals(2, -3.0),
            Err(CaptionError::InvalidDuration(_))
        ));
        assert!(matches!(
            allocate_intervals(2, f64::NAN),
            Err(CaptionError::InvalidDuration(_))
        ));
    }
}
