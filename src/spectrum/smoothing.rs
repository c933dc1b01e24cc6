/// Running sums of the finite samples and of how many there are.
fn prefix_sums(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut sums = Vec::with_capacity(values.len() + 1);
    let mut counts = Vec::with_capacity(values.len() + 1);
    let (mut sum, mut count) = (0.0, 0.0);
    sums.push(sum);
    counts.push(count);

    for &value in values {
        if value.is_finite() {
            sum += value;
            count += 1.0;
        }
        sums.push(sum);
        counts.push(count);
    }

    (sums, counts)
}

/// Moving average with a boxcar of `width` pixels.
///
/// Odd widths average `width` equal pixels. Even widths cannot be centered on a pixel, so
/// the window spans `width + 1` pixels with half weight on the two outermost ones.
///
/// The output has the same length as the input. Near the edges, and around non-finite
/// samples, only the available finite samples contribute and the average is renormalized by
/// their weights. A bin with no finite neighbours at all becomes NaN. Widths beyond twice
/// the input length all give the average of the whole array.
pub fn boxcar_smooth(values: &[f64], width: usize) -> Vec<f64> {
    let n = values.len();
    let width = width.max(1);
    let half = (width / 2).min(n);
    let even = width % 2 == 0;
    let (sums, counts) = prefix_sums(values);

    let finite_at = |j: Option<usize>| match j {
        Some(j) if j < n && values[j].is_finite() => Some(values[j]),
        _ => None,
    };

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let mut sum = sums[hi + 1] - sums[lo];
            let mut weight = counts[hi + 1] - counts[lo];

            if even {
                for edge in [i.checked_sub(half), Some(i + half)] {
                    if let Some(value) = finite_at(edge) {
                        sum -= 0.5 * value;
                        weight -= 0.5;
                    }
                }
            }

            if weight > 0.0 { sum / weight } else { f64::NAN }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_width_half_weights_the_ends() {
        let values = vec![0.0, 0.0, 4.0, 0.0, 0.0];
        let smoothed = boxcar_smooth(&values, 2);
        assert!((smoothed[1] - 1.0).abs() < 1e-12);
        assert!((smoothed[2] - 2.0).abs() < 1e-12);
        assert!((smoothed[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn interior_is_plain_average() {
        let values = vec![0.0, 0.0, 3.0, 0.0, 0.0];
        let smoothed = boxcar_smooth(&values, 3);
        assert_eq!(smoothed.len(), values.len());
        assert!((smoothed[1] - 1.0).abs() < 1e-12);
        assert!((smoothed[2] - 1.0).abs() < 1e-12);
        assert!((smoothed[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn edges_use_available_samples() {
        let values = vec![2.0, 4.0, 6.0, 8.0];
        let smoothed = boxcar_smooth(&values, 3);
        assert!((smoothed[0] - 3.0).abs() < 1e-12);
        assert!((smoothed[3] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn constant_input_stays_constant() {
        let values = vec![5.0; 20];
        for width in [1, 2, 5, 8, 40] {
            let smoothed = boxcar_smooth(&values, width);
            assert!(smoothed.iter().all(|v| (v - 5.0).abs() < 1e-12));
        }
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let values = vec![1.0, f64::NAN, 3.0];
        let smoothed = boxcar_smooth(&values, 3);
        assert!((smoothed[1] - 2.0).abs() < 1e-12);
        assert!(boxcar_smooth(&[f64::NAN], 3)[0].is_nan());
    }

    #[test]
    fn huge_width_averages_everything() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        for width in [13, 14, 1_000_000_000_000, usize::MAX] {
            let smoothed = boxcar_smooth(&values, width);
            assert_eq!(smoothed.len(), values.len());
            assert!(smoothed.iter().all(|v| (v - 3.5).abs() < 1e-12));
        }
        assert!(boxcar_smooth(&[], usize::MAX).is_empty());
    }
}
