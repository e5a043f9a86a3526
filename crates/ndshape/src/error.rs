//! Error types for ndshape.

use thiserror::Error;

/// Errors raised while resolving or validating a tensor shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Target shape has no entries.
    #[error("target shape must not be empty")]
    EmptySpec,

    /// Negative entry other than the `-1` inference marker.
    #[error(
        "invalid dimension {value} at position {index}: each entry must be positive, 0 or -1"
    )]
    InvalidDimension { index: usize, value: i64 },

    /// A `0` copy marker points past the rank of the input.
    #[error("copy marker at position {index} is out of range for input of rank {rank}")]
    IndexOutOfRange { index: usize, rank: usize },

    /// More than one `-1` inference marker.
    #[error("only one dimension can be inferred, found -1 at positions {first} and {second}")]
    MultipleInferredDims { first: usize, second: usize },

    /// Element counts of input and output disagree.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// `-1` cannot be inferred because another extent is zero.
    #[error("cannot infer dimension at position {index}: the other extents multiply to 0")]
    UndeterminedInferredDim { index: usize },

    /// Extent arithmetic does not fit the integer type.
    #[error("dimension extent overflows")]
    ExtentOverflow,

    /// Gradient shape requested without the forward input shape.
    #[error("forward input shape was not recorded")]
    MissingForwardShape,

    /// Operation requires a specific tensor rank.
    #[error("expected tensor of rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Channel count not divisible by the square of the upscale factor.
    #[error("channel count {channels} is not divisible by {factor}^2")]
    IndivisibleChannels { channels: usize, factor: usize },

    /// Spatial extent not divisible by the upscale factor.
    #[error("spatial dimension {extent} is not divisible by upscale factor {factor}")]
    IndivisibleSpatial { extent: usize, factor: usize },

    /// Upscale factor must be at least one.
    #[error("upscale factor must be positive, got {factor}")]
    InvalidUpscaleFactor { factor: i64 },
}

/// Errors raised by the operator framework surface.
#[derive(Debug, Error)]
pub enum OpError {
    /// No operator registered under this type name.
    #[error("operator `{0}` is not registered")]
    UnknownOp(String),

    /// Operator type registered twice.
    #[error("operator `{0}` is already registered")]
    DuplicateOp(String),

    /// Required input slot is absent from the op description.
    #[error("input `{slot}` of operator `{op}` should not be null")]
    MissingInput { op: String, slot: String },

    /// Required output slot is absent from the op description.
    #[error("output `{slot}` of operator `{op}` should not be null")]
    MissingOutput { op: String, slot: String },

    /// Variable referenced by an op is not declared in the block.
    #[error("variable `{name}` is not declared in the block")]
    MissingVar { name: String },

    /// Input variable has no concrete shape at graph construction.
    #[error("shape of variable `{name}` is not known")]
    UnknownShape { name: String },

    /// Required attribute is absent.
    #[error("attribute `{name}` is required by operator `{op}`")]
    MissingAttribute { op: String, name: String },

    /// Attribute has the wrong type.
    #[error("attribute `{name}` has type {actual}, expected {expected}")]
    AttributeType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Attribute value fails a checker.
    #[error("attribute `{name}` is invalid: {message}")]
    InvalidAttribute { name: String, message: String },

    /// Op description could not be decoded.
    #[error("invalid op description: {0}")]
    Json(#[from] serde_json::Error),

    /// Shape resolution failed.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}
