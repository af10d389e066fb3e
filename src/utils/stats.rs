//! Descriptive statistics over per-sample values
//!
//! Population variance (divide by n), matching how field sample sets are
//! summarised for consistency screening.

/// Mean, population standard deviation and coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// `std_dev / mean`; `None` when the mean is zero
    pub cv: Option<f64>,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of `values`, 0 when empty
pub fn mean_or_zero(values: &[f64]) -> f64 {
    mean(values).unwrap_or(0.0)
}

pub fn summarize(values: &[f64]) -> Option<Summary> {
    let mean = mean(values)?;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let std_dev = variance.sqrt();
    let cv = if mean != 0.0 { Some(std_dev / mean.abs()) } else { None };

    Some(Summary {
        n: values.len(),
        mean,
        variance,
        std_dev,
        cv,
    })
}

/// `|x - mean| / std_dev`; `None` for a zero-spread set
pub fn z_score(value: f64, summary: &Summary) -> Option<f64> {
    if summary.std_dev > 0.0 {
        Some((value - summary.mean).abs() / summary.std_dev)
    } else {
        None
    }
}
