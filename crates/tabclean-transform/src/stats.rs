//! Column statistics over optional numeric values.
//!
//! Missing values are skipped everywhere; every function returns `None`
//! when there is nothing to compute over.

/// Arithmetic mean of the observed values.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn sum(values: &[Option<f64>]) -> Option<f64> {
    let mut observed = values.iter().flatten().peekable();
    observed.peek()?;
    Some(observed.sum())
}

pub fn min(values: &[Option<f64>]) -> Option<f64> {
    values.iter().flatten().copied().reduce(f64::min)
}

pub fn max(values: &[Option<f64>]) -> Option<f64> {
    values.iter().flatten().copied().reduce(f64::max)
}

/// Median; the mean of the two middle values for even counts.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator). Needs two observations.
pub fn std_sample(values: &[Option<f64>]) -> Option<f64> {
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.len() < 2 {
        return None;
    }
    let n = observed.len() as f64;
    let avg = observed.iter().sum::<f64>() / n;
    let squares: f64 = observed.iter().map(|v| (v - avg).powi(2)).sum();
    Some((squares / (n - 1.0)).sqrt())
}

/// Count of observed values.
pub fn count(values: &[Option<f64>]) -> usize {
    values.iter().flatten().count()
}
