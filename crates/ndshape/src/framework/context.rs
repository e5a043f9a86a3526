//! Shape-inference context handed to operator shape functions.

use super::attribute::AttributeMap;
use super::op_desc::OpDesc;
use super::var::{Block, VarDesc, VarShape};
use crate::error::OpError;

/// View of one operator and the block it lives in.
///
/// Shape functions read input variables through slot names and write output
/// variables the same way. They never see variable names directly.
pub struct InferShapeContext<'a> {
    op: &'a OpDesc,
    block: &'a mut Block,
}

impl<'a> InferShapeContext<'a> {
    pub fn new(op: &'a OpDesc, block: &'a mut Block) -> Self {
        Self { op, block }
    }

    #[inline]
    pub fn op_type(&self) -> &str {
        &self.op.op_type
    }

    #[inline]
    pub fn attrs(&self) -> &AttributeMap {
        &self.op.attrs
    }

    /// Whether the slot is bound to a declared variable.
    pub fn has_input(&self, slot: &str) -> bool {
        self.op
            .input_var(slot)
            .is_some_and(|name| self.block.contains(name))
    }

    /// Whether the output slot is bound.
    pub fn has_output(&self, slot: &str) -> bool {
        self.op.output_var(slot).is_some()
    }

    /// Fail with [`OpError::MissingInput`] unless the slot is bound.
    pub fn require_input(&self, slot: &str) -> Result<(), OpError> {
        self.input_desc(slot).map(|_| ())
    }

    /// Fail with [`OpError::MissingOutput`] unless the slot is bound.
    pub fn require_output(&self, slot: &str) -> Result<(), OpError> {
        self.output_name(slot).map(|_| ())
    }

    /// Graph-time shape of an input.
    pub fn input_shape(&self, slot: &str) -> Result<&VarShape, OpError> {
        Ok(&self.input_desc(slot)?.shape)
    }

    /// Concrete dims of an input.
    ///
    /// # Errors
    ///
    /// [`OpError::UnknownShape`] if the input is unset or pending.
    pub fn input_dims(&self, slot: &str) -> Result<&[usize], OpError> {
        let name = self.input_name(slot)?;
        self.input_desc(slot)?
            .shape
            .dims()
            .ok_or_else(|| OpError::UnknownShape {
                name: name.to_string(),
            })
    }

    /// Set the graph-time shape of an output.
    pub fn set_output_shape(&mut self, slot: &str, shape: VarShape) -> Result<(), OpError> {
        let name = self.output_name(slot)?;
        self.block.var_mut(name).shape = shape;
        Ok(())
    }

    /// Set concrete output dims.
    pub fn set_output_dims(&mut self, slot: &str, dims: Vec<usize>) -> Result<(), OpError> {
        self.set_output_shape(slot, VarShape::Known(dims))
    }

    /// Forward the input's LoD handle to the output.
    ///
    /// An input without LoD clears the output's LoD.
    pub fn share_lod(&mut self, in_slot: &str, out_slot: &str) -> Result<(), OpError> {
        let lod = self.input_desc(in_slot)?.lod.clone();
        let name = self.output_name(out_slot)?;
        self.block.var_mut(name).lod = lod;
        Ok(())
    }

    fn input_name(&self, slot: &str) -> Result<&'a str, OpError> {
        self.op.input_var(slot).ok_or_else(|| OpError::MissingInput {
            op: self.op.op_type.clone(),
            slot: slot.to_string(),
        })
    }

    fn output_name(&self, slot: &str) -> Result<&'a str, OpError> {
        self.op.output_var(slot).ok_or_else(|| OpError::MissingOutput {
            op: self.op.op_type.clone(),
            slot: slot.to_string(),
        })
    }

    fn input_desc(&self, slot: &str) -> Result<&VarDesc, OpError> {
        let name = self.input_name(slot)?;
        self.block.var(name).ok_or_else(|| OpError::MissingVar {
            name: name.to_string(),
        })
    }
}
