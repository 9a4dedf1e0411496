//! Summary statistics over numeric samples.
//!
//! Missing values never reach these functions: callers collect only the
//! defined samples, and an empty sample yields `None` for every statistic.

/// Min, max, mean and median of a non-empty sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl Summary {
    /// Summarize `values`, or `None` if there are none.
    ///
    /// NaN entries are ignored.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        let min = *sorted.first()?;
        let max = *sorted.last()?;
        Some(Self {
            count: sorted.len(),
            min,
            max,
            mean: mean(&sorted)?,
            median: median_of_sorted(&sorted)?,
        })
    }
}

/// Arithmetic mean of the non-NaN entries.
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Median of the non-NaN entries; the mean of the two middle values for an
/// even count.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    median_of_sorted(&sorted)
}

fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted.get(mid).copied()
    } else {
        let lower = sorted.get(mid.checked_sub(1)?)?;
        let upper = sorted.get(mid)?;
        Some((lower + upper) / 2.0)
    }
}
