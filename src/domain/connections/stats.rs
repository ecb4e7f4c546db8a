//! Numeric kernel shared by the analyzer and the confounder checker.
//!
//! Everything here works on plain `f64` slices and never panics on short or
//! degenerate input; "undefined" is expressed as `None` or a neutral value.

use std::cmp::Ordering;
use std::f64::consts::PI;

/// Sum of squared deviations at or below this is treated as zero variance.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// Residuals within this fraction of the input scale are exact zeros.
const RESIDUAL_TOLERANCE: f64 = 1e-9;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];
const BETA_CF_MAX_ITER: usize = 300;
const BETA_CF_EPS: f64 = 1e-14;
const BETA_CF_TINY: f64 = 1e-300;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); zero for a single value.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// 1-based ranks; tied values share the average of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        values[i]
            .partial_cmp(&values[j])
            .unwrap_or(Ordering::Equal)
            .then(i.cmp(&j))
    });

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1 ..= end.
        let shared = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = shared;
        }
        start = end;
    }
    ranks
}

/// Pearson correlation, `None` when lengths differ, n < 2, or either side
/// has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= VARIANCE_FLOOR || syy <= VARIANCE_FLOOR {
        return None;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Spearman rank correlation: Pearson on average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Lag-1 autocorrelation; 0 when undefined.
///
/// `days[i]` is the day number of `values[i]`. Only pairs exactly one day
/// apart count as neighbours, so values observed across a gap are never
/// treated as yesterday and today. With no gaps this is the usual
/// `sum((x_t - m)(x_t+1 - m)) / sum((x_t - m)^2)`; with gaps the numerator
/// is rescaled to `n - 1` neighbour pairs.
pub fn lag1_autocorrelation(values: &[f64], days: &[i64]) -> f64 {
    let n = values.len();
    if n < 3 || days.len() != n {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let denom: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    if denom <= VARIANCE_FLOOR {
        return 0.0;
    }

    let (num, neighbours) = values
        .windows(2)
        .zip(days.windows(2))
        .filter(|(_, d)| d[1] - d[0] == 1)
        .fold((0.0, 0usize), |(sum, count), (v, _)| {
            (sum + (v[0] - m) * (v[1] - m), count + 1)
        });
    if neighbours < 2 {
        return 0.0;
    }
    let scaled = num * (n - 1) as f64 / neighbours as f64;
    (scaled / denom).clamp(-1.0, 1.0)
}

/// `n * (1 - r1) / (1 + r1)`, clamped to `[2, n]`.
pub fn effective_sample_size(n: usize, r1: f64) -> f64 {
    let n_f = n as f64;
    if n == 0 {
        return 0.0;
    }
    let floor = 2.0_f64.min(n_f);
    if !r1.is_finite() || r1 <= -1.0 {
        return n_f;
    }
    let raw = n_f * (1.0 - r1) / (1.0 + r1);
    raw.clamp(floor, n_f)
}

/// Two-sided p-value for a correlation `r` over `sample_size` points, via
/// `t = r * sqrt(df / (1 - r²))` with `df = sample_size - 2`.
///
/// Fractional sample sizes are allowed (effective sample size).
pub fn correlation_p_value(r: f64, sample_size: f64) -> f64 {
    if !r.is_finite() || !sample_size.is_finite() {
        return 1.0;
    }
    let df = sample_size - 2.0;
    if df <= 0.0 {
        return 1.0;
    }
    let r_sq = r * r;
    if r_sq >= 1.0 {
        return 0.0;
    }
    let t = r * (df / (1.0 - r_sq)).sqrt();
    student_t_two_tailed(t, df)
}

/// Two-tailed tail probability of Student's t with `df` degrees of freedom.
pub fn student_t_two_tailed(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    if df <= 0.0 {
        return 1.0;
    }
    let x = df / (df + t * t);
    regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Regularized incomplete beta `I_x(a, b)`.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta (modified Lentz).
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < BETA_CF_TINY {
        d = BETA_CF_TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=BETA_CF_MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETA_CF_TINY {
            d = BETA_CF_TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETA_CF_TINY {
            c = BETA_CF_TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETA_CF_TINY {
            d = BETA_CF_TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETA_CF_TINY {
            c = BETA_CF_TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < BETA_CF_EPS {
            break;
        }
    }
    h
}

/// Lanczos approximation of `ln Γ(z)` for `z > 0`.
fn ln_gamma(z: f64) -> f64 {
    if z < 0.5 {
        // Reflection formula.
        return PI.ln() - (PI * z).sin().abs().ln() - ln_gamma(1.0 - z);
    }
    let shifted = z - 1.0;
    let mut x = LANCZOS_COEFFICIENTS[0];
    for (idx, coefficient) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        x += coefficient / (shifted + idx as f64);
    }
    let t = shifted + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (shifted + 0.5) * t.ln() - t + x.ln()
}

/// Removes per-group means (e.g. weekday effects).
///
/// `groups[i]` is the group of `values[i]`. Equivalent to an OLS fit on
/// one-hot group indicators.
pub fn residualize_by_group(values: &[f64], groups: &[usize]) -> Vec<f64> {
    debug_assert_eq!(values.len(), groups.len());
    let group_count = groups.iter().copied().max().map_or(0, |g| g + 1);
    let mut sums = vec![0.0; group_count];
    let mut counts = vec![0usize; group_count];
    for (value, &group) in values.iter().zip(groups) {
        sums[group] += value;
        counts[group] += 1;
    }

    let residuals: Vec<f64> = values
        .iter()
        .zip(groups)
        .map(|(value, &group)| value - sums[group] / counts[group] as f64)
        .collect();
    snap_to_zero(residuals, values)
}

/// Removes the least-squares line of `values` against `positions`.
pub fn residualize_linear(values: &[f64], positions: &[f64]) -> Vec<f64> {
    debug_assert_eq!(values.len(), positions.len());
    let (Some(mv), Some(mp)) = (mean(values), mean(positions)) else {
        return Vec::new();
    };

    let mut spp = 0.0;
    let mut spv = 0.0;
    for (v, p) in values.iter().zip(positions) {
        spp += (p - mp) * (p - mp);
        spv += (p - mp) * (v - mv);
    }
    let slope = if spp > VARIANCE_FLOOR { spv / spp } else { 0.0 };

    let residuals: Vec<f64> = values
        .iter()
        .zip(positions)
        .map(|(v, p)| v - (mv + slope * (p - mp)))
        .collect();
    snap_to_zero(residuals, values)
}

/// Floating-point leftovers of an exact fit must not rank as signal.
fn snap_to_zero(mut residuals: Vec<f64>, original: &[f64]) -> Vec<f64> {
    let scale = 1.0 + original.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = RESIDUAL_TOLERANCE * scale;
    for r in residuals.iter_mut() {
        if r.abs() <= tolerance {
            *r = 0.0;
        }
    }
    residuals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn ranks_average_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 20.0, 5.0, 20.0]);
        assert_eq!(ranks, vec![2.0, 4.0, 4.0, 1.0, 4.0]);
    }

    #[test]
    fn ranks_of_empty_input_are_empty() {
        assert!(average_ranks(&[]).is_empty());
    }

    #[test]
    fn pearson_of_perfect_lines() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0, 1e-12));
        assert!(close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0, 1e-12));
    }

    #[test]
    fn pearson_undefined_for_constant_or_mismatched_input() {
        assert!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
    }

    #[test]
    fn spearman_is_invariant_to_monotone_transforms() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v: &f64| v.powi(3) + 7.0).collect();
        assert!(close(spearman(&x, &y).unwrap(), 1.0, 1e-12));
    }

    #[test]
    fn spearman_matches_textbook_example() {
        // Classic 10-point IQ vs TV-hours example, rho = -0.175757...
        let iq = [106.0, 100.0, 86.0, 101.0, 99.0, 103.0, 97.0, 113.0, 112.0, 110.0];
        let tv = [7.0, 27.0, 2.0, 50.0, 28.0, 29.0, 20.0, 12.0, 6.0, 17.0];
        assert!(close(spearman(&iq, &tv).unwrap(), -0.175_757_575_757_575_76, 1e-9));
    }

    #[test]
    fn p_value_reference_points() {
        // t = 2.228 at df = 10 is the two-sided 5% critical value.
        assert!(close(student_t_two_tailed(2.228, 10.0), 0.05, 1e-3));
        // t = 2.0 at df = 10 -> 0.0734
        assert!(close(student_t_two_tailed(2.0, 10.0), 0.0734, 1e-3));
        assert!(close(student_t_two_tailed(0.0, 10.0), 1.0, 1e-12));
    }

    #[test]
    fn correlation_p_value_edge_cases() {
        assert_eq!(correlation_p_value(0.9, 2.0), 1.0);
        assert_eq!(correlation_p_value(1.0, 20.0), 0.0);
        assert_eq!(correlation_p_value(f64::NAN, 20.0), 1.0);
        let weak = correlation_p_value(0.1, 30.0);
        let strong = correlation_p_value(0.6, 30.0);
        assert!(weak > 0.5 && strong < 0.001);
    }

    #[test]
    fn ln_gamma_known_values() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-12));
        assert!(close(ln_gamma(5.0), (24.0_f64).ln(), 1e-10));
        assert!(close(ln_gamma(0.5), PI.sqrt().ln(), 1e-10));
    }

    #[test]
    fn autocorrelation_signs() {
        let days: Vec<i64> = (0..30).collect();
        let trend: Vec<f64> = (0..30).map(f64::from).collect();
        assert!(lag1_autocorrelation(&trend, &days) > 0.8);

        let alternating: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        assert!(lag1_autocorrelation(&alternating, &days) < -0.8);

        assert_eq!(lag1_autocorrelation(&[3.0, 3.0, 3.0, 3.0], &days[..4]), 0.0);
        assert_eq!(lag1_autocorrelation(&[1.0, 2.0], &days[..2]), 0.0);
    }

    #[test]
    fn autocorrelation_only_pairs_calendar_neighbours() {
        let trend: Vec<f64> = (0..30).map(f64::from).collect();

        // Every other day: no two observations are one day apart.
        let every_other: Vec<i64> = (0..30).map(|i| i * 2).collect();
        assert_eq!(lag1_autocorrelation(&trend, &every_other), 0.0);

        // A single gap leaves the rest of the series contiguous.
        let one_gap: Vec<i64> = (0..30).map(|i| if i < 15 { i } else { i + 10 }).collect();
        let contiguous: Vec<i64> = (0..30).collect();
        let gapped = lag1_autocorrelation(&trend, &one_gap);
        assert!(gapped > 0.8);
        assert!(gapped >= lag1_autocorrelation(&trend, &contiguous) - 0.05);
    }

    #[test]
    fn effective_sample_size_is_clamped() {
        assert_eq!(effective_sample_size(30, 0.0), 30.0);
        assert_eq!(effective_sample_size(30, -0.5), 30.0);
        assert!(close(effective_sample_size(30, 0.5), 10.0, 1e-12));
        assert_eq!(effective_sample_size(30, 0.99), 2.0);
        assert_eq!(effective_sample_size(30, 1.0), 2.0);
    }

    #[test]
    fn linear_residuals_of_a_pure_trend_are_exact_zeros() {
        let positions: Vec<f64> = (0..35).map(f64::from).collect();
        let trend: Vec<f64> = positions.iter().map(|p| 3.7 * p + 120.0).collect();
        assert!(residualize_linear(&trend, &positions).iter().all(|r| *r == 0.0));
    }

    #[test]
    fn group_residuals_remove_group_means() {
        let values = [1.0, 10.0, 3.0, 12.0];
        let groups = [0, 1, 0, 1];
        assert_eq!(residualize_by_group(&values, &groups), vec![-1.0, -1.0, 1.0, 1.0]);
    }

    #[test]
    fn std_dev_of_short_inputs() {
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(sample_std_dev(&[4.0]), Some(0.0));
        assert!(close(sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(), 2.138_089_935, 1e-6));
    }
}
