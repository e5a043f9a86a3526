//! `reshape` and `reshape_grad`.
//!
//! Reshape keeps the data of `X` and gives it the shape described by the
//! `shape` attribute:
//!
//! 1. `X` of shape `[2, 4, 6]` with `shape = [6, 8]` gives `[6, 8]`.
//! 2. With `shape = [2, 3, -1, 2]` the `-1` is inferred: `[2, 3, 4, 2]`.
//! 3. With `shape = [-1, 0, 3, 2]` the `0` copies `X`'s dimension 1 and the
//!    result `[2, 4, 3, 2]` is only known at execution time.
//!
//! At most one entry may be `-1`. Any number may be `0`, but a `0` may not
//! sit at a position past the rank of `X`: `[2, 3, 2, 0]` is invalid for a
//! `[2, 3, 4]` input.
//!
//! When `X` itself is only known at execution time, the output stays pending
//! as well. The entries are still validated against the rank of `X`.
//!
//! The output always shares the LoD of `X`.

use crate::dims::{checked_numel, numel};
use crate::error::{OpError, ShapeError};
use crate::framework::{AttributeMap, InferShapeContext, VarShape, grad_var_name};
use crate::resolve::{DeferredShape, Resolution, resolve, resolve_gradient, resolve_runtime};
use crate::shape_spec::ShapeSpec;
use serde::Deserialize;
use tracing::debug;

pub const OP_TYPE: &str = "reshape";
pub const GRAD_OP_TYPE: &str = "reshape_grad";

/// Attributes of `reshape`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReshapeAttrs {
    /// Target shape, with optional `0` and `-1` markers.
    pub shape: Vec<i64>,
    /// Alias the output storage to the input instead of copying.
    /// Defaults to `false`.
    #[serde(default)]
    pub inplace: bool,
}

impl ReshapeAttrs {
    /// Attributes with a target shape and `inplace = false`.
    pub fn new(shape: Vec<i64>) -> Self {
        Self {
            shape,
            inplace: false,
        }
    }

    /// Read and validate attributes from an attribute map.
    ///
    /// # Errors
    ///
    /// - [`OpError::MissingAttribute`] if `shape` is absent
    /// - [`ShapeError::EmptySpec`] if `shape` is empty
    /// - [`OpError::AttributeType`] if an attribute has the wrong type
    pub fn from_attrs(attrs: &AttributeMap) -> Result<Self, OpError> {
        let shape = attrs
            .ints("shape")?
            .ok_or_else(|| OpError::MissingAttribute {
                op: OP_TYPE.to_string(),
                name: "shape".to_string(),
            })?
            .to_vec();
        if shape.is_empty() {
            return Err(ShapeError::EmptySpec.into());
        }
        let inplace = attrs.bool("inplace")?.unwrap_or(false);
        Ok(Self { shape, inplace })
    }

    /// Attribute map form, for building op descriptions.
    pub fn to_attrs(&self) -> AttributeMap {
        AttributeMap::new()
            .with("shape", self.shape.clone())
            .with("inplace", self.inplace)
    }
}

/// Shape function of `reshape`.
///
/// A static result sets `Out` to known dims; a result that needs the runtime
/// input leaves `Out` pending. A pending `X` also leaves `Out` pending.
pub fn infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<(), OpError> {
    ctx.require_input("X")?;
    ctx.require_output("Out")?;

    let attrs = ReshapeAttrs::from_attrs(ctx.attrs())?;
    let shape = match ctx.input_shape("X")? {
        VarShape::Pending(input) => {
            let spec = ShapeSpec::parse(&attrs.shape, input.ndim())?;
            debug!(op = ctx.op_type(), spec = ?attrs.shape, "input pending, output deferred");
            VarShape::Pending(DeferredShape::new(spec))
        }
        _ => match resolve(&attrs.shape, ctx.input_dims("X")?)? {
            Resolution::Static(dims) => VarShape::Known(dims),
            Resolution::Deferred(deferred) => VarShape::Pending(deferred),
        },
    };
    ctx.set_output_shape("Out", shape)?;

    // A reshape cannot change the number of time steps of a sequence batch,
    // so the output keeps the input's LoD.
    ctx.share_lod("X", "Out")
}

/// Shape function of `reshape_grad`: `X@GRAD` takes the shape of `X`.
///
/// A pending `X` gives a pending `X@GRAD` with the same deferred shape.
pub fn infer_grad_shape(ctx: &mut InferShapeContext<'_>) -> Result<(), OpError> {
    let out_grad = grad_var_name("Out");
    let x_grad = grad_var_name("X");
    ctx.require_input("X")?;
    ctx.require_input(&out_grad)?;
    ctx.require_output(&x_grad)?;

    let shape = match ctx.input_shape("X")? {
        VarShape::Pending(deferred) => VarShape::Pending(deferred.clone()),
        known => VarShape::Known(resolve_gradient(known.dims())?),
    };
    ctx.set_output_shape(&x_grad, shape)
}

/// What a reshape kernel must do for one concrete input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReshapePlan {
    pub input_dims: Vec<usize>,
    pub output_dims: Vec<usize>,
    /// Output shares storage with the input.
    pub aliases_input: bool,
}

/// Plan a reshape once the runtime input dims are known.
///
/// # Examples
///
/// ```
/// use ndshape::ops::reshape::{ReshapeAttrs, plan_reshape};
///
/// let plan = plan_reshape(&ReshapeAttrs::new(vec![-1, 0, 3, 2]), &[2, 4, 6]).unwrap();
/// assert_eq!(plan.output_dims, vec![2, 4, 3, 2]);
/// assert!(!plan.aliases_input);
/// ```
pub fn plan_reshape(attrs: &ReshapeAttrs, input_dims: &[usize]) -> Result<ReshapePlan, ShapeError> {
    let output_dims = resolve_runtime(&attrs.shape, input_dims)?;
    debug!(input = ?input_dims, output = ?output_dims, inplace = attrs.inplace, "planned reshape");
    Ok(ReshapePlan {
        input_dims: input_dims.to_vec(),
        output_dims,
        aliases_input: attrs.inplace,
    })
}

/// Plan the gradient copy back into a buffer shaped like `X`.
///
/// # Errors
///
/// [`ShapeError::ShapeMismatch`] if the gradient does not hold as many
/// elements as `X`, or if either element count overflows.
pub fn plan_reshape_grad(
    x_dims: &[usize],
    out_grad_dims: &[usize],
) -> Result<ReshapePlan, ShapeError> {
    let output_dims = resolve_gradient(Some(x_dims))?;
    let (Some(expected), Some(actual)) = (checked_numel(x_dims), checked_numel(out_grad_dims))
    else {
        // Overflowing counts saturate to usize::MAX in the error.
        return Err(ShapeError::ShapeMismatch {
            expected: numel(x_dims),
            actual: numel(out_grad_dims),
        });
    };
    if expected != actual {
        return Err(ShapeError::ShapeMismatch { expected, actual });
    }
    Ok(ReshapePlan {
        input_dims: out_grad_dims.to_vec(),
        output_dims,
        aliases_input: false,
    })
}
