//! Built-in operators.
//!
//! Each operator is a variant of [`OpKind`]; forward and gradient operators
//! are separate variants sharing nothing but the dispatch `match`.

pub mod pixel_shuffle;
pub mod reshape;

use crate::error::OpError;
use crate::framework::{InferShapeContext, OpRegistryBuilder};

/// Shape function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Reshape,
    ReshapeGrad,
    PixelShuffle,
    PixelShuffleGrad,
}

impl OpKind {
    /// Run the shape function of this operator.
    pub fn infer_shape(self, ctx: &mut InferShapeContext<'_>) -> Result<(), OpError> {
        match self {
            OpKind::Reshape => reshape::infer_shape(ctx),
            OpKind::ReshapeGrad => reshape::infer_grad_shape(ctx),
            OpKind::PixelShuffle => pixel_shuffle::infer_shape(ctx),
            OpKind::PixelShuffleGrad => pixel_shuffle::infer_grad_shape(ctx),
        }
    }
}

/// Register every built-in operator.
pub fn register_builtin(builder: &mut OpRegistryBuilder) -> Result<(), OpError> {
    builder
        .register(reshape::OP_TYPE, OpKind::Reshape, Some(reshape::GRAD_OP_TYPE))?
        .register(reshape::GRAD_OP_TYPE, OpKind::ReshapeGrad, None)?
        .register(
            pixel_shuffle::OP_TYPE,
            OpKind::PixelShuffle,
            Some(pixel_shuffle::GRAD_OP_TYPE),
        )?
        .register(pixel_shuffle::GRAD_OP_TYPE, OpKind::PixelShuffleGrad, None)?;
    Ok(())
}
