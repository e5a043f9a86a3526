//! ndshape - shape inference for reshape-family tensor operators
//!
//! This crate computes and validates output shapes of reshape-like operators
//! during graph construction, before any kernel runs. No tensor data is
//! touched.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Operator surface (framework, ops)
//!     → OpRegistry, OpDesc, Block, InferShapeContext
//!     → reshape, reshape_grad, pixel_shuffle, pixel_shuffle_grad
//!
//! Level 2: Shape resolution (resolve)
//!     → resolve, resolve_runtime, resolve_gradient
//!     → DeferredShape::finalize
//!
//! Level 3: Spec validation (shape_spec, dims)
//!     → ShapeSpec::parse, checked_numel
//! ```
//!
//! # Example
//!
//! ```
//! use ndshape::{Resolution, ShapeError, resolve};
//!
//! // [2, 4, 6] into [6, 8]
//! let r = resolve(&[6, 8], &[2, 4, 6]).unwrap();
//! assert_eq!(r, Resolution::Static(vec![6, 8]));
//!
//! // -1 is inferred from the element count
//! let r = resolve(&[2, 3, -1, 2], &[2, 4, 6]).unwrap();
//! assert_eq!(r.static_dims(), Some(&[2, 3, 4, 2][..]));
//!
//! // only one -1 is allowed
//! assert!(matches!(
//!     resolve(&[-1, -1], &[2, 4, 6]),
//!     Err(ShapeError::MultipleInferredDims { .. })
//! ));
//! ```

pub mod dims;
pub mod error;
pub mod framework;
pub mod lod;
pub mod ops;
pub mod resolve;
pub mod shape_spec;

pub use error::{OpError, ShapeError};
pub use lod::Lod;
pub use resolve::{DeferredShape, Resolution, resolve, resolve_gradient, resolve_runtime};
pub use shape_spec::{DimSpec, ShapeSpec};
