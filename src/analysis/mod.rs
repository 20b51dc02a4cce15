//! Reshaping of loaded data for the recommender prototype.

pub mod pivot;

pub use pivot::UserItemMatrix;
