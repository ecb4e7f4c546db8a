//! Multiple-Comparison Corrector - Benjamini–Hochberg FDR adjustment.

use std::cmp::Ordering;

use super::analyzer::CorrelationResult;

/// BH-adjusted p-values, returned in input order.
///
/// Sorted ascending, the i-th smallest (1-indexed) of `m` becomes
/// `p_i * m / i`; a running minimum from the largest rank down keeps the
/// adjusted values monotone, and everything is capped at 1. Every adjusted
/// value is at least its raw value.
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    if m == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&i, &j| {
        p_values[i]
            .partial_cmp(&p_values[j])
            .unwrap_or(Ordering::Equal)
            .then(i.cmp(&j))
    });

    let mut adjusted = vec![1.0; m];
    let mut running_min = 1.0_f64;
    for (rank, &idx) in order.iter().enumerate().rev() {
        let p = p_values[idx];
        let candidate = if p.is_finite() {
            p * m as f64 / (rank + 1) as f64
        } else {
            1.0
        };
        running_min = running_min.min(candidate);
        adjusted[idx] = running_min.min(1.0);
    }
    adjusted
}

/// Writes BH-adjusted p-values onto every result of one run.
///
/// Must see the whole run: `m` is the number of results passed in.
pub fn apply_benjamini_hochberg<'a, I>(results: I)
where
    I: IntoIterator<Item = &'a mut CorrelationResult>,
{
    let mut results: Vec<&mut CorrelationResult> = results.into_iter().collect();
    let raw: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    for (result, adjusted) in results.iter_mut().zip(benjamini_hochberg(&raw)) {
        result.adjusted_p_value = adjusted;
    }
}
