/// CLI Indexes: Datasets
pub mod datasets;

/// CLI Indexes: Models
pub mod models;

/// CLI Indexes: Pipelines
pub mod pipelines;
