/// Descriptive statistics summarizing a dataset.
///
/// This structure contains the measures of central tendency and dispersion
/// used by the accuracy tables: count, extremes, mean, median and the
/// unbiased sample variance.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    /// The number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean of the dataset.
    pub mean: f64,
    /// The median of the dataset.
    ///
    /// For an even number of values this is the mean of the two middle values.
    pub median: f64,
    /// The unbiased sample variance (`n - 1` denominator).
    ///
    /// `None` when the dataset has fewer than two values.
    pub variance: Option<f64>,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use pmiacc_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.variance, Some(2.5));
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// This is an optimized version that skips the sorting step.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pmiacc_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[2.0, 4.0]).unwrap();
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.variance, Some(2.0));
    ///
    /// let single = DescriptiveStats::from_sorted(&[7.0]).unwrap();
    /// assert_eq!(single.variance, None);
    /// ```
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let mean = mean(sorted_values.iter().copied())?;
        let median = median_sorted(sorted_values)?;
        let variance = sample_variance(sorted_values.iter().copied());

        Some(Self {
            count: sorted_values.len(),
            min,
            max,
            mean,
            median,
            variance,
        })
    }
}

/// Arithmetic mean of the values, `None` for an empty input.
///
/// ```
/// # use pmiacc_stats::descriptive::mean;
/// assert_eq!(mean([1.0, 2.0, 6.0]), Some(3.0));
/// assert_eq!(mean(std::iter::empty()), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Median of unsorted values, `None` for an empty input.
///
/// ```
/// # use pmiacc_stats::descriptive::median;
/// assert_eq!(median([4.0, 2.0]), Some(3.0));
/// assert_eq!(median([9.0, 1.0, 5.0]), Some(5.0));
/// ```
#[must_use]
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut values = values.into_iter().collect::<Vec<_>>();
    values.sort_by(f64::total_cmp);
    median_sorted(&values)
}

/// Median of values sorted in ascending order.
#[must_use]
pub fn median_sorted(sorted_values: &[f64]) -> Option<f64> {
    let len = sorted_values.len();
    if len == 0 {
        return None;
    }
    let mid = len / 2;
    if len % 2 == 1 {
        Some(sorted_values[mid])
    } else {
        Some(f64::midpoint(sorted_values[mid - 1], sorted_values[mid]))
    }
}

/// Unbiased sample variance (`n - 1` denominator).
///
/// Undefined for fewer than two values, which is reported as `None` rather
/// than zero.
///
/// ```
/// # use pmiacc_stats::descriptive::sample_variance;
/// assert_eq!(sample_variance([1.0, 2.0, 3.0, 4.0]), Some(5.0 / 3.0));
/// assert_eq!(sample_variance([1.0]), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn sample_variance<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let values = values.into_iter().collect::<Vec<_>>();
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values.iter().copied())?;
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some(sum_sq / (values.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::new(std::iter::empty()).is_none());
        assert_eq!(median(std::iter::empty()), None);
        assert_eq!(sample_variance(std::iter::empty()), None);
    }

    #[test]
    fn test_even_median_averages_middle_pair() {
        assert_eq!(median([1.0, 10.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.variance, None);
    }

    #[test]
    fn test_constant_values_have_zero_variance() {
        assert_eq!(sample_variance([3.0, 3.0, 3.0]), Some(0.0));
    }

    #[test]
    #[should_panic(expected = "values must be sorted")]
    fn test_from_sorted_rejects_unsorted() {
        let _ = DescriptiveStats::from_sorted(&[2.0, 1.0]);
    }
}
