//! Errors raised while building, compiling and materializing slicer requests.

use crate::database::DatabaseError;
use crate::sql::Dialect;
use thiserror::Error;

/// Everything that can stop a request.
///
/// All variants except `Database` and `MissingColumn` are detected before any
/// query is sent.
#[derive(Debug, Error)]
pub enum SlicerError {
    #[error("Unique dimension '{key}' declares no id fields")]
    MissingIdFields { key: String },

    #[error("Bucket parameter does not fit dimension '{key}'")]
    InvalidBucket { key: String },

    #[error("Unknown reference '{key}' (expected wow, mom, qoq or yoy with optional _d or _p)")]
    UnknownReference { key: String },

    #[error("Reference '{reference}' targets dimension '{dimension}', which is not in the request")]
    UnknownReferenceDimension { reference: String, dimension: String },

    #[error("Rollup dimension '{key}' is not in the request")]
    UnknownRollupDimension { key: String },

    #[error("At least one metric is required")]
    EmptyMetrics,

    #[error("At least one dimension is required")]
    EmptyDimensions,

    #[error("Dialect '{dialect}' does not support ROLLUP")]
    RollupNotSupported { dialect: Dialect },

    #[error("Cannot order by '{key}': not an output column")]
    UnknownOrderKey { key: String },

    #[error("Result set has no column '{key}'")]
    MissingColumn { key: String },

    #[error("Invalid key '{key}': keys must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidKey { key: String },

    #[error("Key '{key}' is used more than once")]
    DuplicateKey { key: String },

    #[error("Unknown metric '{key}'")]
    UnknownMetric { key: String },

    #[error("Unknown dimension '{key}'")]
    UnknownDimension { key: String },

    #[error("Filter references unknown key '{key}'")]
    UnknownFilterKey { key: String },

    #[error("'{descriptor}' requires undeclared join '{join}'")]
    UnknownJoin { descriptor: String, join: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(#[from] toml::de::Error),

    #[error("Failed to read schema {path}: {source}")]
    SchemaIo {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type SlicerResult<T> = Result<T, SlicerError>;
