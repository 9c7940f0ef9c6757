//! # symnmf
//!
//! Symmetric non-negative matrix factorization (SymNMF) for graph-based
//! clustering.
//!
//! ## The Core Idea
//!
//! A symmetric non-negative matrix W (here: a degree-normalized similarity
//! graph over a point set) is approximated by a low-rank product H·Hᵗ with
//! H ≥ 0. Each row of H scores one point against k latent clusters, so the
//! factorization doubles as a soft cluster assignment.
//!
//! ## Key Functions
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`similarity_matrix`] | Gaussian affinity A from raw points (unit bandwidth) |
//! | [`degree_matrix`] | Diagonal degree matrix D of row sums |
//! | [`normalized_affinity`] | W = D^{-1/2} A D^{-1/2} |
//! | [`factorize`] | Multiplicative-update SymNMF: W ≈ H·Hᵗ |
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use rand::{rngs::StdRng, SeedableRng};
//! use symnmf::{factorize, random_init, normalized_from_points, FactorizeConfig};
//!
//! let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]];
//!
//! let w = normalized_from_points(&points)?;
//! let mut rng = StdRng::seed_from_u64(1234);
//! let h0 = random_init(&w, 2, &mut rng)?;
//! let result = factorize(&w, h0, &FactorizeConfig::default())?;
//!
//! assert_eq!(result.h.dim(), (4, 2));
//! # Ok::<(), symnmf::Error>(())
//! ```
//!
//! ## The Pipeline
//!
//! ```text
//! points (n × d)
//!   │  similarity_matrix         Gaussian kernel, zero diagonal
//!   ▼
//! A (n × n)
//!   │  degree_matrix             D[i,i] = Σⱼ A[i,j]
//!   ▼
//! (D, A)
//!   │  normalized_affinity       W = D^{-1/2} A D^{-1/2}
//!   ▼
//! W (n × n)
//!   │  factorize                 multiplicative updates, W ≈ H·Hᵗ
//!   ▼
//! H (n × k)
//! ```
//!
//! ## Why SymNMF?
//!
//! - **Clustering without eigensolvers**: spectral clustering needs an
//!   eigendecomposition of the graph Laplacian; SymNMF reaches a comparable
//!   partition with nothing heavier than matrix products.
//! - **Interpretable factors**: H is non-negative, so row i reads directly
//!   as cluster affinities for point i.
//! - **Non-negativity is free**: multiplicative updates rescale entries by
//!   ratios of non-negative terms and cannot flip sign.
//!
//! ## What Can Go Wrong
//!
//! 1. **Isolated points**: a zero row in A makes D^{-1/2} undefined.
//!    [`normalized_affinity`] rejects this with [`Error::ZeroDegree`] instead
//!    of emitting infinities.
//! 2. **Degenerate updates**: a near-zero denominator in the update step
//!    would propagate NaN through H. The optimizer detects it and either
//!    skips the entry or fails, per [`DegeneracyPolicy`].
//! 3. **Slow convergence**: the iteration cap (300 by default) is a normal
//!    termination mode, not an error; check [`Factorization::termination`].
//! 4. **Scaling**: O(n²) storage for the dense affinity matrix. This crate
//!    is deliberately dense and single-threaded.
//!
//! ## References
//!
//! - Kuang, Ding, Park (2012). "Symmetric Nonnegative Matrix Factorization
//!   for Graph Clustering"
//! - Lee & Seung (2000). "Algorithms for Non-negative Matrix Factorization"
//! - von Luxburg (2007). "A Tutorial on Spectral Clustering"

use ndarray::{Array1, Array2};
use thiserror::Error;

mod factorize;
pub mod io;

pub use factorize::{
    factorize, random_init, DegeneracyPolicy, Factorization, FactorizeConfig, Termination,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("matrix is not square: {0} x {1}")]
    NotSquare(usize, usize),

    #[error("cannot multiply {lhs_rows}x{lhs_cols} by {rhs_rows}x{rhs_cols}")]
    DimensionMismatch {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("zero degree at index {0}: normalized affinity is undefined")]
    ZeroDegree(usize),

    #[error("near-zero update denominator at ({row}, {col}) in iteration {iteration}")]
    DegenerateUpdate {
        row: usize,
        col: usize,
        iteration: usize,
    },

    #[error("invalid rank k={k} for n={n}")]
    InvalidRank { k: usize, n: usize },

    #[error("input format error at line {line}: {reason}")]
    InputFormat { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

fn ensure_square(a: &Array2<f64>) -> Result<usize> {
    let (n, m) = a.dim();
    if n != m {
        return Err(Error::NotSquare(n, m));
    }
    Ok(n)
}

/// Checked matrix product.
///
/// Returns [`Error::DimensionMismatch`] when the inner dimensions disagree,
/// instead of panicking like [`ndarray::ArrayBase::dot`].
pub fn matmul(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    if a.ncols() != b.nrows() {
        return Err(Error::DimensionMismatch {
            lhs_rows: a.nrows(),
            lhs_cols: a.ncols(),
            rhs_rows: b.nrows(),
            rhs_cols: b.ncols(),
        });
    }
    Ok(a.dot(b))
}

/// Squared Frobenius norm: the sum of squared entries, equivalently
/// trace(MᵗM).
///
/// This is the *squared* norm, no square root is taken. The optimizer's
/// convergence test compares this quantity directly against its threshold,
/// so the unit convention matters.
pub fn frobenius_norm_squared(m: &Array2<f64>) -> f64 {
    m.iter().map(|x| x * x).sum()
}

/// Gaussian affinity matrix from points, with unit bandwidth.
///
/// A[i,j] = exp(-||x_i - x_j||² / 2) for i ≠ j, and A[i,i] = 0.
///
/// The zero diagonal (rather than self-similarity 1) is what SymNMF wants:
/// the degree of a point should measure closeness to *other* points only.
/// Each pair is computed once and mirrored, so symmetry of the result is
/// exact.
///
/// # Arguments
///
/// * `points` - n × d matrix (n points, d dimensions)
pub fn similarity_matrix(points: &Array2<f64>) -> Array2<f64> {
    let n = points.nrows();
    let d = points.ncols();

    let mut adj = Array2::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let mut dist_sq = 0.0;
            for t in 0..d {
                let diff = points[[i, t]] - points[[j, t]];
                dist_sq += diff * diff;
            }

            let sim = (-0.5 * dist_sq).exp();
            adj[[i, j]] = sim;
            adj[[j, i]] = sim;
        }
    }

    adj
}

/// Compute degree matrix D from affinity matrix A.
///
/// D[i,i] = sum of row i; all off-diagonal entries are zero.
pub fn degree_matrix(adj: &Array2<f64>) -> Array2<f64> {
    let n = adj.nrows();
    let mut d = Array2::zeros((n, n));

    for i in 0..n {
        d[[i, i]] = adj.row(i).sum();
    }

    d
}

/// Compute degree vector (row sums) from affinity matrix.
pub fn degree_vector(adj: &Array2<f64>) -> Array1<f64> {
    Array1::from_shape_fn(adj.nrows(), |i| adj.row(i).sum())
}

/// Degree-normalized affinity: W = D^{-1/2} A D^{-1/2}.
///
/// The diagonal sandwich is applied as elementwise scaling,
/// W[i,j] = A[i,j] / √(dᵢ·dⱼ), which is the same product without
/// materializing D^{-1/2}. The upper triangle is computed once and mirrored,
/// so symmetry of the result is exact.
///
/// # Errors
///
/// - [`Error::NotSquare`] when `adj` is not n × n.
/// - [`Error::ZeroDegree`] when any row of `adj` sums to zero. An isolated
///   node makes D^{-1/2} undefined; failing here beats silently emitting
///   infinite or NaN entries.
pub fn normalized_affinity(adj: &Array2<f64>) -> Result<Array2<f64>> {
    let n = ensure_square(adj)?;
    let degrees = degree_vector(adj);

    if let Some((idx, _)) = degrees.iter().enumerate().find(|(_, &d)| d <= 0.0) {
        return Err(Error::ZeroDegree(idx));
    }

    let d_inv_sqrt: Array1<f64> = degrees.mapv(|d| 1.0 / d.sqrt());

    let mut w = Array2::zeros((n, n));
    for i in 0..n {
        w[[i, i]] = d_inv_sqrt[i] * adj[[i, i]] * d_inv_sqrt[i];
        for j in (i + 1)..n {
            let val = d_inv_sqrt[i] * adj[[i, j]] * d_inv_sqrt[j];
            w[[i, j]] = val;
            w[[j, i]] = val;
        }
    }

    Ok(w)
}

/// Degree matrix straight from points: `degree_matrix(similarity_matrix(points))`.
///
/// Entry point for callers that only want the degree stage; the intermediate
/// affinity matrix is recomputed and dropped.
pub fn degree_from_points(points: &Array2<f64>) -> Array2<f64> {
    degree_matrix(&similarity_matrix(points))
}

/// Normalized affinity straight from points.
///
/// Recomputes A and D internally; the usual entry point for building the
/// SymNMF optimization target W.
pub fn normalized_from_points(points: &Array2<f64>) -> Result<Array2<f64>> {
    normalized_affinity(&similarity_matrix(points))
}
