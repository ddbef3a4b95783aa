//! Core rust implementation of infopt, a crate for infinite-dimensional optimization.
//!
//! Models over continuous domains (time, space, uncertainty) are built as an
//! [`InfiniteModel`], transformed into a finite [`Problem`](optimize::problem::Problem) by a
//! [`TransformationBackend`](transformation::TransformationBackend), and solved by a
//! [`Solver`](optimize::solvers::Solver). Results are queried on the infinite model and mapped
//! back to its references.

pub mod configuration;
pub mod infinite_model;
pub mod io;
pub mod optimize;
pub mod results;
pub mod transformation;

pub use infinite_model::InfiniteModel;
pub use transformation::Mapped;
