//! Statistics: single-series summaries, Pearson correlation, correlation matrices

pub mod matrix;
pub mod summary;

pub use matrix::{
    compute_matrix, CorrelationMatrix, CorrelationMatrixBuilder, MatrixBuildFailure, DEFAULT_LIMIT,
};
pub use summary::{correlation, mean, mean_and_std_dev, variance, Normalization, SeriesSummary};
