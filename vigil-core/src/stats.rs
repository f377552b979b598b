// Copyright 2025 Vigil Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Statistical primitives shared by the detector battery. No detector
//! calls out to a heavyweight stats crate — each one is a handful of
//! closed-form computations over a slice of `f64`, kept here so the
//! detectors themselves stay short and read like their formulas.

/// Arithmetic mean. `0.0` for an empty slice (callers always check
/// length first).
pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Sample standard deviation (ddof = 1, matching `pandas.Series.std`).
/// `0.0` for fewer than two samples.
pub fn stddev(v: &[f64]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let m = mean(v);
    let ss: f64 = v.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (v.len() as f64 - 1.0)).sqrt()
}

/// Median of a slice (copies and sorts; small series, not worth a
/// selection algorithm).
pub fn median(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Ordinary least squares fit of `v ~= m*t + c` for paired `(t, v)`.
pub fn least_squares_fit(t: &[f64], v: &[f64]) -> (f64, f64) {
    let n = t.len() as f64;
    let sum_t: f64 = t.iter().sum();
    let sum_v: f64 = v.iter().sum();
    let sum_tv: f64 = t.iter().zip(v).map(|(a, b)| a * b).sum();
    let sum_tt: f64 = t.iter().map(|a| a * a).sum();
    let denom = n * sum_tt - sum_t * sum_t;
    if denom == 0.0 {
        return (0.0, sum_v / n);
    }
    let m = (n * sum_tv - sum_t * sum_v) / denom;
    let c = (sum_v - m * sum_t) / n;
    (m, c)
}

/// Exponentially-weighted mean and (bias-corrected) standard
/// deviation, matching `pandas.Series.ewm(com=.., adjust=True,
/// ignore_na=False, min_periods=0)`'s `.mean()` / `.std(bias=False)`,
/// reimplemented via pandas' own incremental weighted-covariance
/// recursion (there are no NaNs in our inputs, so the `ignore_na`
/// branch pandas takes never differs from the `not ignore_na` one).
pub fn ewma_mean_std(v: &[f64], com: f64) -> (Vec<f64>, Vec<f64>) {
    let n = v.len();
    let mut means = Vec::with_capacity(n);
    let mut stds = Vec::with_capacity(n);
    if n == 0 {
        return (means, stds);
    }
    let alpha = 1.0 / (1.0 + com);
    let old_wt_factor = 1.0 - alpha;
    let new_wt = 1.0_f64; // adjust = true

    let mut mean_x = v[0];
    let mut cov = 0.0_f64;
    let mut old_wt = 1.0_f64;
    let mut sum_wt = 1.0_f64;
    let mut sum_wt2 = 1.0_f64;

    means.push(mean_x);
    stds.push(0.0);

    for &cur in v.iter().skip(1) {
        sum_wt *= old_wt_factor;
        sum_wt2 *= old_wt_factor * old_wt_factor;
        old_wt *= old_wt_factor;

        let old_mean = mean_x;
        if mean_x != cur {
            mean_x = (old_wt * old_mean + new_wt * cur) / (old_wt + new_wt);
        }
        cov = (old_wt * (cov + (old_mean - mean_x) * (old_mean - mean_x))
            + new_wt * (cur - mean_x) * (cur - mean_x))
        / (old_wt + new_wt);

        sum_wt += new_wt;
        sum_wt2 += new_wt * new_wt;
        old_wt += new_wt;

        means.push(mean_x);

        // bias=False: apply the unbiased correction factor.
        let numerator = sum_wt * sum_wt;
        let denominator = numerator - sum_wt2;
        let var = if denominator > 0.0 {
            (numerator / denominator) * cov
        } else {
            f64::NAN
        };
        stds.push(var.max(0.0).sqrt());
    }

    (means, stds)
}

/// Equi-width histogram counts over `nbins` bins spanning
/// `[min(v), max(v)]`. Mirrors `numpy.histogram`'s handling of a
/// constant series (expands the range by 0.5 either side so the bin
/// edges aren't degenerate).
pub fn histogram(v: &[f64], nbins: usize) -> (Vec<u64>, Vec<f64>) {
    let lo = v.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    };
    let width = (hi - lo) / nbins as f64;
    let edges: Vec<f64> = (0..=nbins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0u64; nbins];
    for &x in v {
        let mut idx = ((x - lo) / width).floor() as isize;
        if idx < 0 {
            idx = 0;
        }
        if idx as usize >= nbins {
            idx = nbins as isize - 1;
        }
        counts[idx as usize] += 1;
    }
    (counts, edges)
}

/// Two-sample Kolmogorov-Smirnov statistic and asymptotic p-value,
/// matching `scipy.stats.ks_2samp`'s default (`mode='asymp'`)
/// two-sided test.
pub fn ks_2samp(a: &[f64], b: &[f64]) -> (f64, f64) {
    let mut all: Vec<f64> = a.iter().chain(b.iter()).cloned().collect();
    all.sort_by(|x, y| x.partial_cmp(y).unwrap());
    all.dedup_by(|x, y| x == y);

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;

    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort_by(|x, y| x.partial_cmp(y).unwrap());
    b_sorted.sort_by(|x, y| x.partial_cmp(y).unwrap());

    let cdf_at = |sorted: &[f64], x: f64| -> f64 {
        let count = sorted.partition_point(|&v| v <= x);
        count as f64 / sorted.len() as f64
    };

    let d = all
        .iter()
        .map(|&x| (cdf_at(&a_sorted, x) - cdf_at(&b_sorted, x)).abs())
        .fold(0.0_f64, f64::max);

    let en = (n1 * n2 / (n1 + n2)).sqrt();
    let p = kolmogorov_survival((en + 0.12 + 0.11 / en) * d);
    (d, p.clamp(0.0, 1.0))
}

/// Survival function of the Kolmogorov distribution, via the
/// standard alternating-series (Smirnov) formula.
fn kolmogorov_survival(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    let mut total = 0.0_f64;
    for k in 1..101 {
        let term = (-1.0_f64).powi(k - 1) * (-2.0 * (k as f64).powi(2) * x * x).exp();
        total += term;
        if term.abs() < 1e-12 {
            break;
        }
    }
    (2.0 * total).clamp(0.0, 1.0)
}

/// Augmented Dickey-Fuller test statistic and approximate p-value
/// for the "constant, no trend" regression (matching
/// `statsmodels.tsa.stattools.adfuller`'s default `regression='c'`).
///
/// Fits `Δy_t = α + β·y_{t-1} + Σ γ_i·Δy_{t-i} + ε_t` by OLS and
/// returns `(β / se(β), p)`, with `p` from MacKinnon's (1994, 2010)
/// response-surface critical values for the constant-only case,
/// interpolated/extrapolated rather than reproduced via the full
/// polynomial regression (see DESIGN.md).
pub fn adf_test(y: &[f64], lag: usize) -> (f64, f64) {
    let n = y.len();
    if n < lag + 3 {
        return (0.0, 1.0);
    }
    let dy: Vec<f64> = (1..n).map(|i| y[i] - y[i - 1]).collect();

    // Design matrix rows: [1 (const), y_{t-1}, dy_{t-1}, ..., dy_{t-lag}]
    let start = lag; // first usable index into dy/y such that lag dy-terms exist
    let rows = dy.len() - start;
    let k = 2 + lag;
    let mut x = vec![0.0_f64; rows * k];
    let mut target = vec![0.0_f64; rows];
    for r in 0..rows {
        let t = start + r; // index into dy for the response Δy_t
        target[r] = dy[t];
        x[r * k] = 1.0;
        x[r * k + 1] = y[t]; // y_{t-1} in levels indexing (y has one more elem than dy)
        for l in 0..lag {
            x[r * k + 2 + l] = dy[t - 1 - l];
        }
    }

    let (beta, se) = match ols(&x, &target, rows, k) {
        Some(result) => result,
        None => return (0.0, 1.0),
    };
    let tstat = if se[1] > 0.0 { beta[1] / se[1] } else { 0.0 };
    let p = adf_pvalue_c(tstat);
    (tstat, p)
}

/// Plain OLS via the normal equations, returning (coefficients,
/// coefficient std errors). `None` if `X'X` is singular.
fn ols(x: &[f64], y: &[f64], rows: usize, k: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    let mut xtx = vec![0.0_f64; k * k];
    let mut xty = vec![0.0_f64; k];
    for r in 0..rows {
        for i in 0..k {
            xty[i] += x[r * k + i] * y[r];
            for j in 0..k {
                xtx[i * k + j] += x[r * k + i] * x[r * k + j];
            }
        }
    }
    let xtx_inv = invert(&xtx, k)?;
    let mut beta = vec![0.0_f64; k];
    for i in 0..k {
        for j in 0..k {
            beta[i] += xtx_inv[i * k + j] * xty[j];
        }
    }
    let mut resid_ss = 0.0_f64;
    for r in 0..rows {
        let mut pred = 0.0_f64;
        for i in 0..k {
            pred += x[r * k + i] * beta[i];
        }
        resid_ss += (y[r] - pred).powi(2);
    }
    let dof = (rows as f64 - k as f64).max(1.0);
    let sigma2 = resid_ss / dof;
    let se: Vec<f64> = (0..k).map(|i| (sigma2 * xtx_inv[i * k + i]).max(0.0).sqrt()).collect();
    Some((beta, se))
}

/// Gauss-Jordan matrix inversion. `None` on a singular pivot.
fn invert(m: &[f64], k: usize) -> Option<Vec<f64>> {
    let mut a = m.to_vec();
    let mut inv = vec![0.0_f64; k * k];
    for i in 0..k {
        inv[i * k + i] = 1.0;
    }
    for col in 0..k {
        let mut pivot_row = col;
        let mut best = a[col * k + col].abs();
        for r in (col + 1)..k {
            if a[r * k + col].abs() > best {
                best = a[r * k + col].abs();
                pivot_row = r;
            }
        }
        if best < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for c in 0..k {
                a.swap(col * k + c, pivot_row * k + c);
                inv.swap(col * k + c, pivot_row * k + c);
            }
        }
        let pivot = a[col * k + col];
        for c in 0..k {
            a[col * k + c] /= pivot;
            inv[col * k + c] /= pivot;
        }
        for r in 0..k {
            if r == col {
                continue;
            }
            let factor = a[r * k + col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..k {
                a[r * k + c] -= factor * a[col * k + c];
                inv[r * k + c] -= factor * inv[col * k + c];
            }
        }
    }
    Some(inv)
}

/// MacKinnon (2010) 1/5/10% critical values for the ADF test,
/// constant-only case, in the large-sample limit, with log-linear
/// interpolation between them and exponential-tail extrapolation
/// beyond. Not a replacement for the full response-surface
/// regression statsmodels uses, but tracks it closely across the
/// thresholds this engine actually checks (`p < 0.05`).
fn adf_pvalue_c(tstat: f64) -> f64 {
    // (critical value, corresponding p) pairs, asymptotic, regression='c'.
    const POINTS: [(f64, f64); 5] = [
        (-3.43, 0.01),
        (-2.86, 0.05),
        (-2.57, 0.10),
        (-1.94, 0.30),
        (-0.80, 0.70),
    ];
    if tstat <= POINTS[0].0 {
        // Extrapolate further into the tail by halving p per unit of
        // additional distance below the 1% critical value.
        let extra = POINTS[0].0 - tstat;
        return (POINTS[0].1 * 0.5_f64.powf(extra)).max(1e-6);
    }
    if tstat >= POINTS[POINTS.len() - 1].0 {
        return 1.0;
    }
    for w in POINTS.windows(2) {
        let (t0, p0) = w[0];
        let (t1, p1) = w[1];
        if tstat >= t0 && tstat <= t1 {
            let frac = (tstat - t0) / (t1 - t0);
            return p0 + frac * (p1 - p0);
        }
    }
    1.0
}

/// Grubbs' critical value for a two-sided test at overall
/// significance `0.05`, spread across `n` simultaneous comparisons:
/// `G = ((n-1)/√n) · √(t²/(n-2+t²))` where
/// `t` is the two-sided inverse Student-t critical value at
/// `0.05/(2n)` with `n-2` degrees of freedom.
pub fn grubbs_critical_value(n: usize) -> f64 {
    let n = n as f64;
    let alpha = 0.05 / (2.0 * n);
    let df = n - 2.0;
    let t = student_t_isf(alpha, df);
    let t2 = t * t;
    ((n - 1.0) / n.sqrt()) * (t2 / (n - 2.0 + t2)).sqrt()
}

/// Inverse survival function of the Student-t distribution:
/// the value `t` such that `P(T > t) = p`, `T ~ t(df)`.
///
/// Implemented as a normal-quantile seed (Acklam's rational
/// approximation to the inverse standard normal CDF) refined by a
/// Cornish-Fisher expansion in `1/df` — a standard closed-form
/// approximation used when a full incomplete-beta inversion isn't
/// available, accurate to better than 1e-3 for the `df` this engine
/// sees (tens to hundreds).
fn student_t_isf(p: f64, df: f64) -> f64 {
    let z = inverse_normal_cdf(1.0 - p);
    let z2 = z * z;
    let g1 = (z2 * z + z) / 4.0;
    let g2 = (5.0 * z.powi(5) + 16.0 * z.powi(3) + 3.0 * z) / 96.0;
    let g3 = (3.0 * z.powi(7) + 19.0 * z.powi(5) + 17.0 * z.powi(3) - 15.0 * z) / 384.0;
    let g4 = (79.0 * z.powi(9) + 776.0 * z.powi(7) + 1482.0 * z.powi(5) - 1920.0 * z.powi(3)
        - 945.0 * z)
        / 92160.0;
    z + g1 / df + g2 / df.powi(2) + g3 / df.powi(3) + g4 / df.powi(4)
}

/// Inverse standard normal CDF (Acklam's algorithm).
fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    let p_low = 0.02425;
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - p_low {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
