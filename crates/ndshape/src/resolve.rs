//! Reshape shape resolution.
//!
//! Following the two-phase flow of a graph compiler:
//!
//! ```text
//! resolve(spec, input_dims)              # graph construction
//!     → validate spec (ShapeSpec::parse)
//!     → no `0`: substitute `-1`, check element count → Resolution::Static
//!     → any `0`: keep markers                        → Resolution::Deferred
//!
//! DeferredShape::finalize(input_dims)    # execution, real input known
//!     → substitute every `0` from the input
//!     → then substitute `-1` from the substituted shape
//!     → check element count
//! ```

use crate::dims::{checked_numel, numel};
use crate::error::ShapeError;
use crate::shape_spec::{DimSpec, ShapeSpec};
use tracing::{debug, trace};

/// Outcome of resolving a target shape at graph construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// All extents are known.
    Static(Vec<usize>),
    /// The spec copies extents from the input; finish with
    /// [`DeferredShape::finalize`] once the runtime input is known.
    Deferred(DeferredShape),
}

impl Resolution {
    /// Whether the shape must be completed at execution time.
    #[inline]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Resolution::Deferred(_))
    }

    /// Concrete dims for a static resolution.
    pub fn static_dims(&self) -> Option<&[usize]> {
        match self {
            Resolution::Static(dims) => Some(dims),
            Resolution::Deferred(_) => None,
        }
    }

    /// Output shape as raw integers.
    ///
    /// A deferred resolution keeps its `0` and `-1` markers.
    ///
    /// # Errors
    ///
    /// [`ShapeError::ExtentOverflow`] if a static extent exceeds `i64::MAX`.
    pub fn output(&self) -> Result<Vec<i64>, ShapeError> {
        match self {
            Resolution::Static(dims) => dims
                .iter()
                .map(|&d| i64::try_from(d).map_err(|_| ShapeError::ExtentOverflow))
                .collect(),
            Resolution::Deferred(deferred) => Ok(deferred.spec().to_raw()),
        }
    }

    /// Concrete dims, finalizing against `input` when deferred.
    pub fn into_dims(self, input: &[usize]) -> Result<Vec<usize>, ShapeError> {
        match self {
            Resolution::Static(dims) => Ok(dims),
            Resolution::Deferred(deferred) => deferred.finalize(input),
        }
    }
}

/// A target shape whose extents depend on the runtime input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredShape {
    spec: ShapeSpec,
}

impl DeferredShape {
    /// Defer a validated spec until the runtime input is known.
    ///
    /// Used when the input itself is only known at execution time, so even a
    /// spec without `0` cannot be checked yet.
    pub fn new(spec: ShapeSpec) -> Self {
        Self { spec }
    }

    /// The validated spec, placeholders intact.
    #[inline]
    pub fn spec(&self) -> &ShapeSpec {
        &self.spec
    }

    /// Rank of the eventual output.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.spec.len()
    }

    /// Complete the shape against the runtime input.
    ///
    /// Every `0` is substituted before the `-1` is computed.
    ///
    /// # Errors
    ///
    /// - [`ShapeError::IndexOutOfRange`] if a `0` points past the runtime rank
    /// - [`ShapeError::ShapeMismatch`] if the element counts disagree
    /// - [`ShapeError::UndeterminedInferredDim`] if a copied zero extent
    ///   leaves the `-1` undetermined
    ///
    /// # Examples
    ///
    /// ```
    /// use ndshape::resolve::{Resolution, resolve};
    ///
    /// let Resolution::Deferred(deferred) = resolve(&[-1, 0, 3, 2], &[2, 4, 6]).unwrap() else {
    ///     unreachable!()
    /// };
    /// assert_eq!(deferred.finalize(&[2, 4, 6]).unwrap(), vec![2, 4, 3, 2]);
    /// ```
    pub fn finalize(&self, input: &[usize]) -> Result<Vec<usize>, ShapeError> {
        self.spec.check_rank(input.len())?;
        let dims = complete(&self.spec, input)?;
        debug!(input = ?input, output = ?dims, "finalized deferred shape");
        Ok(dims)
    }
}

/// Resolve a raw target shape against the input dims.
///
/// # Errors
///
/// Returns the validation errors of [`ShapeSpec::parse`], or
/// [`ShapeError::ShapeMismatch`] when the element counts cannot agree.
///
/// # Examples
///
/// ```
/// use ndshape::resolve::resolve;
///
/// // [2, 4, 6] has 48 elements; 48 / (2 * 3 * 2) = 4
/// let r = resolve(&[2, 3, -1, 2], &[2, 4, 6]).unwrap();
/// assert_eq!(r.static_dims(), Some(&[2, 3, 4, 2][..]));
/// assert!(!r.is_deferred());
///
/// // 0 copies from the input, so the result waits for runtime
/// let r = resolve(&[-1, 0, 3, 2], &[2, 4, 6]).unwrap();
/// assert!(r.is_deferred());
/// assert_eq!(r.output().unwrap(), vec![-1, 0, 3, 2]);
/// ```
pub fn resolve(spec: &[i64], input: &[usize]) -> Result<Resolution, ShapeError> {
    trace!(spec = ?spec, input = ?input, "resolving target shape");
    let spec = ShapeSpec::parse(spec, input.len())?;
    resolve_spec(spec, input)
}

/// Resolve an already validated spec.
pub fn resolve_spec(spec: ShapeSpec, input: &[usize]) -> Result<Resolution, ShapeError> {
    if spec.has_copy() {
        debug!(spec = ?spec.to_raw(), "target shape deferred to runtime");
        return Ok(Resolution::Deferred(DeferredShape { spec }));
    }

    let dims = complete(&spec, input)?;
    debug!(input = ?input, output = ?dims, "resolved target shape");
    Ok(Resolution::Static(dims))
}

/// Resolve and, when deferred, finalize in one step.
///
/// Use this when the input dims are the runtime dims.
pub fn resolve_runtime(spec: &[i64], input: &[usize]) -> Result<Vec<usize>, ShapeError> {
    resolve(spec, input)?.into_dims(input)
}

/// Shape of the input gradient of a reshape.
///
/// The gradient is reshaped back to exactly the recorded forward input.
///
/// # Errors
///
/// Returns [`ShapeError::MissingForwardShape`] if no input shape was recorded.
pub fn resolve_gradient(recorded_input: Option<&[usize]>) -> Result<Vec<usize>, ShapeError> {
    recorded_input
        .map(<[usize]>::to_vec)
        .ok_or(ShapeError::MissingForwardShape)
}

/// Substitute every placeholder and check the element count.
fn complete(spec: &ShapeSpec, input: &[usize]) -> Result<Vec<usize>, ShapeError> {
    let mut dims: Vec<usize> = spec
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| match *entry {
            DimSpec::Fixed(d) => d,
            DimSpec::CopyInput => input[i],
            DimSpec::Infer => 1,
        })
        .collect();

    let in_size = checked_numel(input).ok_or_else(|| ShapeError::ShapeMismatch {
        expected: usize::MAX,
        actual: numel(&dims),
    })?;
    let capacity = checked_numel(&dims).ok_or(ShapeError::ShapeMismatch {
        expected: in_size,
        actual: usize::MAX,
    })?;

    match spec.infer_index() {
        Some(index) => {
            if capacity == 0 {
                return Err(ShapeError::UndeterminedInferredDim { index });
            }
            let inferred = in_size / capacity;
            if inferred * capacity != in_size {
                return Err(ShapeError::ShapeMismatch {
                    expected: in_size,
                    actual: inferred * capacity,
                });
            }
            dims[index] = inferred;
        }
        None if capacity != in_size => {
            return Err(ShapeError::ShapeMismatch {
                expected: in_size,
                actual: capacity,
            });
        }
        None => {}
    }

    Ok(dims)
}
