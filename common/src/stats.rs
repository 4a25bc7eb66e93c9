use crate::{matrix::Method, reconcile::Canonical};

/// `avg_height / log2(n)`. Undefined for `n <= 1`.
pub fn height_ratio(avg_height: f64, n: f64) -> Option<f64> {
    (n > 1.0).then(|| avg_height / n.log2())
}

/// `total / n`.
pub fn per_operation(total: f64, n: f64) -> f64 {
    total / n
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// How much lower a randomized method's height is than the unshuffled one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Improvement {
    pub method: Method,
    pub n: f64,
    pub ratio: f64,
}

/// `height[NoShuffle] / height[m]` for every randomized method, at the
/// largest `n` among the reconciled `height_comp` rows.
pub fn improvement_ratios(height_comp: &[Canonical]) -> Vec<Improvement> {
    let Some(largest) = height_comp
        .iter()
        .filter(|row| matches!(row, Canonical::Comparison { .. }))
        .max_by(|a, b| a.n().total_cmp(&b.n()))
    else {
        return Vec::new();
    };
    let Some(baseline) = largest.value(Method::NoShuffle) else {
        return Vec::new();
    };

    Method::SHUFFLES[1..]
        .iter()
        .filter_map(|&method| {
            let height = largest.value(method)?;
            (height > 0.0).then(|| Improvement {
                method,
                n: largest.n(),
                ratio: baseline / height,
            })
        })
        .collect()
}

/// Theoretical curves overlaid on the measured series.
pub mod reference {
    pub fn log2(sizes: &[f64]) -> Vec<(f64, f64)> {
        scaled_log2(sizes, 1.0)
    }

    pub fn scaled_log2(sizes: &[f64], scale: f64) -> Vec<(f64, f64)> {
        sizes.iter().map(|&n| (n, scale * n.log2())).collect()
    }

    /// `n * log2(n) * scale`
    pub fn n_log2_n(sizes: &[f64], scale: f64) -> Vec<(f64, f64)> {
        sizes.iter().map(|&n| (n, n * n.log2() * scale)).collect()
    }

    /// `n * scale`
    pub fn linear(sizes: &[f64], scale: f64) -> Vec<(f64, f64)> {
        sizes.iter().map(|&n| (n, n * scale)).collect()
    }

    /// `n / log2(n)`, the height ratio of a degenerate tree.
    pub fn n_over_log2_n(sizes: &[f64]) -> Vec<(f64, f64)> {
        sizes
            .iter()
            .filter(|&&n| n > 1.0)
            .map(|&n| (n, n / n.log2()))
            .collect()
    }

    /// A constant line across the size range.
    pub fn constant(sizes: &[f64], value: f64) -> Vec<(f64, f64)> {
        sizes.iter().map(|&n| (n, value)).collect()
    }

    /// Factor that makes `log2(n)` pass through `value` at the last size.
    pub fn last_point_scale(last_n: f64, value: f64) -> Option<f64> {
        (last_n > 1.0).then(|| value / last_n.log2())
    }
}
