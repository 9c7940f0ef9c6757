//! Multiplicative-update SymNMF optimizer.
//!
//! Minimizes ||W - H·Hᵗ||²_F over H ≥ 0 with the damped multiplicative rule
//! of Kuang, Ding & Park (2012):
//!
//! ```text
//! H[i,j] ← H[i,j] · (1/2 + 1/2 · (W·H)[i,j] / (H·HᵗH)[i,j])
//! ```
//!
//! Every iteration computes the new H into a fresh buffer and swaps it in,
//! so a failed iteration never leaves a half-updated factor behind. The
//! convergence test compares the **squared** Frobenius norm of the
//! per-iteration change against [`FactorizeConfig::tol`]; no square root is
//! taken anywhere.

use ndarray::Array2;
use rand::Rng;
use tracing::debug;

use crate::{ensure_square, frobenius_norm_squared, matmul, Error, Result};

/// Denominators smaller than this are treated as degenerate.
const DEGENERACY_EPS: f64 = 1e-12;

/// What to do when an update denominator is zero or near zero.
///
/// The ratio (W·H)/(H·HᵗH) is undefined there; both policies guarantee that
/// no non-finite value ever enters H.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneracyPolicy {
    /// Leave the affected entry at its previous value for this iteration.
    SkipEntry,
    /// Abort the whole factorization with [`Error::DegenerateUpdate`].
    Fail,
}

/// Optimizer parameters.
#[derive(Debug, Clone, Copy)]
pub struct FactorizeConfig {
    /// Iteration cap. Reaching it is a normal termination mode, not an error.
    pub max_iter: usize,
    /// Convergence threshold on the squared Frobenius norm of H - H_prev.
    pub tol: f64,
    /// Near-zero denominator handling.
    pub degeneracy: DegeneracyPolicy,
}

impl Default for FactorizeConfig {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tol: 1e-4,
            degeneracy: DegeneracyPolicy::SkipEntry,
        }
    }
}

/// How the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The squared-norm delta fell below the threshold.
    Converged,
    /// The iteration cap was reached first. The factor is still usable.
    IterationLimit,
}

/// Result of a SymNMF run.
#[derive(Debug, Clone)]
pub struct Factorization {
    /// Final factor matrix, n × k, entrywise non-negative.
    pub h: Array2<f64>,
    pub termination: Termination,
    /// Iterations actually performed.
    pub iterations: usize,
    /// Squared Frobenius norm of the last per-iteration change.
    pub delta: f64,
}

/// Factor a symmetric non-negative matrix: W ≈ H·Hᵗ.
///
/// `h0` is the caller-supplied non-negative starting factor (see
/// [`random_init`] for the standard choice); it is consumed and updated by
/// value. Given non-negative `w` and `h0`, every intermediate H is entrywise
/// non-negative: the update rescales each entry by a ratio of non-negative
/// terms.
///
/// # Errors
///
/// - [`Error::NotSquare`] when `w` is not n × n.
/// - [`Error::DimensionMismatch`] when `h0` does not have n rows.
/// - [`Error::InvalidRank`] unless 0 < k < n.
/// - [`Error::DegenerateUpdate`] for a near-zero denominator under
///   [`DegeneracyPolicy::Fail`].
pub fn factorize(w: &Array2<f64>, h0: Array2<f64>, cfg: &FactorizeConfig) -> Result<Factorization> {
    let n = ensure_square(w)?;
    if h0.nrows() != n {
        return Err(Error::DimensionMismatch {
            lhs_rows: n,
            lhs_cols: n,
            rhs_rows: h0.nrows(),
            rhs_cols: h0.ncols(),
        });
    }
    let k = h0.ncols();
    if k == 0 || k >= n {
        return Err(Error::InvalidRank { k, n });
    }

    let mut h = h0;
    let mut delta = f64::INFINITY;

    for iteration in 1..=cfg.max_iter {
        let numerator = matmul(w, &h)?;
        // H·HᵗH via the k × k Gram matrix: same product, O(nk²) instead of O(n²k).
        let gram = h.t().dot(&h);
        let denominator = h.dot(&gram);

        let mut next = h.clone();
        let mut skipped = 0usize;
        for i in 0..n {
            for j in 0..k {
                let den = denominator[[i, j]];
                if den.abs() < DEGENERACY_EPS {
                    match cfg.degeneracy {
                        DegeneracyPolicy::SkipEntry => {
                            skipped += 1;
                            continue;
                        }
                        DegeneracyPolicy::Fail => {
                            return Err(Error::DegenerateUpdate {
                                row: i,
                                col: j,
                                iteration,
                            });
                        }
                    }
                }
                next[[i, j]] = h[[i, j]] * (0.5 + 0.5 * numerator[[i, j]] / den);
            }
        }

        delta = frobenius_norm_squared(&(&next - &h));
        if skipped > 0 {
            debug!(iteration, skipped, "near-zero denominators, entries held");
        }
        debug!(iteration, delta, "multiplicative update");

        h = next;

        if delta < cfg.tol {
            return Ok(Factorization {
                h,
                termination: Termination::Converged,
                iterations: iteration,
                delta,
            });
        }
    }

    Ok(Factorization {
        h,
        termination: Termination::IterationLimit,
        iterations: cfg.max_iter,
        delta,
    })
}

/// Standard starting factor: entries uniform on [0, 2·√(mean(W)/k)).
///
/// The upper bound makes the expected magnitude of H₀·H₀ᵗ match the mean of
/// W, which keeps early update ratios near 1. This lives outside
/// [`factorize`] on purpose: the optimizer itself never chooses H₀.
pub fn random_init<R: Rng>(w: &Array2<f64>, k: usize, rng: &mut R) -> Result<Array2<f64>> {
    let n = ensure_square(w)?;
    if k == 0 || k >= n {
        return Err(Error::InvalidRank { k, n });
    }

    let mean = w.mean().unwrap_or(0.0);
    let upper = 2.0 * (mean / k as f64).sqrt();

    // An all-zero W gives an empty range; the degenerate draw is all zeros.
    Ok(Array2::from_shape_fn((n, k), |_| {
        if upper > 0.0 {
            rng.gen_range(0.0..upper)
        } else {
            0.0
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalized_from_points;
    use ndarray::array;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn exact_factorization_converges_in_one_iteration() {
        // W = H₀·H₀ᵗ makes numerator == denominator, so the first update is
        // the identity and the delta is exactly zero.
        let h0 = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let w = h0.dot(&h0.t());

        let result = factorize(&w, h0.clone(), &FactorizeConfig::default()).unwrap();

        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.delta, 0.0);
        assert_eq!(result.h, h0);
    }

    #[test]
    fn zero_tolerance_exhausts_iteration_limit() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [4.0, 4.0]];
        let w = normalized_from_points(&points).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let h0 = random_init(&w, 2, &mut rng).unwrap();

        let cfg = FactorizeConfig {
            tol: 0.0,
            ..Default::default()
        };
        let result = factorize(&w, h0, &cfg).unwrap();

        // delta < 0.0 can never hold, so the cap is the only exit, and it is
        // reported as a normal outcome.
        assert_eq!(result.termination, Termination::IterationLimit);
        assert_eq!(result.iterations, 300);
        assert!(result.h.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_start_is_held_under_skip_policy() {
        // H = 0 makes every denominator zero. SkipEntry holds all entries,
        // the delta is zero, and the run converges trivially without NaN.
        let w = array![[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]];
        let h0 = Array2::<f64>::zeros((3, 1));

        let result = factorize(&w, h0, &FactorizeConfig::default()).unwrap();

        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.iterations, 1);
        assert!(result.h.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_start_fails_under_fail_policy() {
        let w = array![[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]];
        let h0 = Array2::<f64>::zeros((3, 1));

        let cfg = FactorizeConfig {
            degeneracy: DegeneracyPolicy::Fail,
            ..Default::default()
        };
        let err = factorize(&w, h0, &cfg).unwrap_err();
        match err {
            Error::DegenerateUpdate {
                row: 0,
                col: 0,
                iteration: 1,
            } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_rank_not_below_n() {
        let w = Array2::<f64>::ones((3, 3));
        let h0 = Array2::<f64>::ones((3, 3));

        let err = factorize(&w, h0, &FactorizeConfig::default()).unwrap_err();
        match err {
            Error::InvalidRank { k: 3, n: 3 } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_factor_with_wrong_row_count() {
        let w = Array2::<f64>::ones((3, 3));
        let h0 = Array2::<f64>::ones((2, 1));

        let err = factorize(&w, h0, &FactorizeConfig::default()).unwrap_err();
        match err {
            Error::DimensionMismatch { rhs_rows: 2, .. } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn random_init_is_seeded_and_bounded() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let w = normalized_from_points(&points).unwrap();
        let upper = 2.0 * (w.mean().unwrap() / 2.0).sqrt();

        let mut rng_a = StdRng::seed_from_u64(1234);
        let mut rng_b = StdRng::seed_from_u64(1234);
        let h_a = random_init(&w, 2, &mut rng_a).unwrap();
        let h_b = random_init(&w, 2, &mut rng_b).unwrap();

        assert_eq!(h_a, h_b);
        assert_eq!(h_a.dim(), (3, 2));
        assert!(h_a.iter().all(|&v| (0.0..upper).contains(&v)));
    }

    proptest! {
        /// Non-negativity invariant: from a non-negative start against a
        /// non-negative target, no update can produce a negative entry.
        #[test]
        fn prop_factor_stays_nonnegative(
            coords in prop::collection::vec(-3.0f64..3.0, 8..24),
            init in prop::collection::vec(0.0f64..2.0, 8),
            k in 1usize..3,
        ) {
            let n = 4;
            let d = coords.len() / n;
            let mut points = Array2::<f64>::zeros((n, d));
            for i in 0..n {
                for j in 0..d {
                    points[[i, j]] = coords[i * d + j];
                }
            }
            let w = normalized_from_points(&points).unwrap();

            let mut h0 = Array2::<f64>::zeros((n, k));
            for i in 0..n {
                for j in 0..k {
                    h0[[i, j]] = init[i * k + j];
                }
            }

            let cfg = FactorizeConfig { max_iter: 25, ..Default::default() };
            let result = factorize(&w, h0, &cfg).unwrap();

            for &v in result.h.iter() {
                prop_assert!(v >= 0.0);
                prop_assert!(v.is_finite());
            }
        }
    }
}
