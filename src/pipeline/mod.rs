//! Document processing pipeline: remote analysis, annotation
//! partitioning, and the sequential batch runner.

pub mod analysis;
pub mod annotate;
pub mod batch;
