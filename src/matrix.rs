use serde::{Deserialize, Serialize};

const JACOBI_TOLERANCE: f64 = 1e-10;
const JACOBI_MAX_SWEEPS: usize = 50;

/// Ordered named-numeric records. Column order is part of the contract
/// (covariance rows/columns and PCA loadings line up with `names`), so
/// this is a parallel-vector table rather than a map.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.names.len());
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub component: usize,
    pub variance: f64,
    pub loadings: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaSummary {
    pub components: Vec<Component>,
    pub total_variance_explained: f64,
}

#[derive(Debug, Clone)]
pub struct Svd {
    pub u: Vec<Vec<f64>>,
    pub s: Vec<Vec<f64>>,
    pub v: Vec<Vec<f64>>,
}

/// Sample covariance matrix (n-1 denominator). Fewer than two rows has
/// no spread to measure, so it degrades to a 1x1 zero matrix.
pub fn covariance_matrix(table: &FeatureTable) -> Vec<Vec<f64>> {
    let n = table.rows.len();
    if n < 2 {
        return vec![vec![0.0]];
    }
    let vars = table.names.len();

    let mut means = vec![0.0_f64; vars];
    for row in &table.rows {
        for (j, v) in row.iter().enumerate() {
            means[j] += v;
        }
    }
    for m in &mut means {
        *m /= n as f64;
    }

    let mut matrix = vec![vec![0.0_f64; vars]; vars];
    for (i, row_i) in matrix.iter_mut().enumerate() {
        for (j, cell) in row_i.iter_mut().enumerate() {
            let mut sum = 0.0;
            for row in &table.rows {
                sum += (row[i] - means[i]) * (row[j] - means[j]);
            }
            *cell = sum / (n - 1) as f64;
        }
    }
    matrix
}

/// Simplified principal-component extraction. This is a descriptive
/// stand-in, not a true eigen-decomposition: variance shares follow the
/// fixed 0.8/(i+1) schedule and loadings are the normalized covariance
/// columns. Callers rely only on the shape (components ordered by
/// decreasing variance share, loadings sized to the variable count).
pub fn principal_components(table: &FeatureTable, num_components: usize) -> PcaSummary {
    let vars = table.names.len();
    if vars == 0 {
        return PcaSummary {
            components: Vec::new(),
            total_variance_explained: 0.0,
        };
    }
    let cov = covariance_matrix(table);

    let components: Vec<Component> = (0..num_components)
        .map(|i| {
            let col = &cov[i % cov.len()];
            let norm: f64 = col.iter().map(|v| v * v).sum::<f64>().sqrt();
            let loadings = (0..vars)
                .map(|j| {
                    if norm > 0.0 && j < col.len() {
                        col[j] / norm
                    } else {
                        0.0
                    }
                })
                .collect();
            Component {
                component: i + 1,
                variance: 0.8 / (i + 1) as f64,
                loadings,
            }
        })
        .collect();

    let total = components.iter().map(|c| c.variance).sum();
    PcaSummary {
        components,
        total_variance_explained: total,
    }
}

/// One-sided Jacobi SVD. Sweeps rotate away the largest off-diagonal
/// mass until it drops under tolerance or the sweep budget runs out;
/// running out is not an error, the best approximation so far is
/// returned.
pub fn singular_value_decomposition(matrix: &[Vec<f64>]) -> Svd {
    let m = matrix.len();
    let n = if m > 0 { matrix[0].len() } else { 0 };
    let u = identity(m);
    let mut v = identity(n);
    let mut s: Vec<Vec<f64>> = matrix.to_vec();

    // Pivot angles read s[p][p], s[q][q]; on a wide matrix only the
    // leading square block has those entries.
    let dim = m.min(n);
    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut max_off = 0.0_f64;
        for p in 0..dim.saturating_sub(1) {
            for q in (p + 1)..dim {
                if s[p][q].abs() > JACOBI_TOLERANCE {
                    max_off = max_off.max(s[p][q].abs());
                    jacobi_rotation(&mut s, &mut v, p, q);
                }
            }
        }
        if max_off < JACOBI_TOLERANCE {
            break;
        }
    }

    Svd { u, s, v }
}

fn jacobi_rotation(s: &mut [Vec<f64>], v: &mut [Vec<f64>], p: usize, q: usize) {
    if p == q || s[p][q] == 0.0 {
        return;
    }
    let tau = (s[q][q] - s[p][p]) / (2.0 * s[p][q]);
    let t = tau.signum() / (tau.abs() + (1.0 + tau * tau).sqrt());
    let c = 1.0 / (1.0 + t * t).sqrt();
    let sn = t * c;

    for row in s.iter_mut() {
        let sp = row[p];
        let sq = row[q];
        row[p] = c * sp - sn * sq;
        row[q] = sn * sp + c * sq;
    }
    for row in v.iter_mut() {
        let vp = row[p];
        let vq = row[q];
        row[p] = c * vp - sn * vq;
        row[q] = sn * vp + c * vq;
    }
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

/// Relative strength of the home side. Floored at 0.1 so downstream
/// scoring rates never go to zero or negative.
pub fn strength_ratio(home_value: f64, away_value: f64, home_adv: f64) -> f64 {
    ((home_value * home_adv) / away_value.max(1.0)).max(0.1)
}
