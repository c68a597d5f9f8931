//! The analytical query compiler.
//!
//! ```text
//! SlicerRequest ──► Slicer::to_request ──► Request
//!                                            │
//!                                   compiler::compile
//!                                            │
//!                                      CompiledQuery ──► materialize::execute ──► Table
//! ```

pub mod compiler;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod materialize;
pub mod reference;
pub mod schema;

pub use compiler::{compile, compile_dimension_options, CompiledQuery, JoinSpec, Pagination, Request};
pub use descriptor::{
    default_label, BucketParam, Dimension, DimensionKind, DimensionValue, Field, Metric,
    NumericInterval,
};
pub use error::{SlicerError, SlicerResult};
pub use filter::{ComparisonOp, Filter, FilterValue};
pub use materialize::{execute, MaterializeOptions, Table};
pub use reference::{Modifier, Reference, ReferenceBase};
pub use schema::{DimensionSelection, JoinDescriptor, Slicer, SlicerRequest};
