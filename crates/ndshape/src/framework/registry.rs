//! Operator registry.
//!
//! The process-wide registry is built on first use and never mutated
//! afterwards, so lookups from any number of graph-building threads need no
//! locking. Private registries go through [`OpRegistryBuilder`].

use super::context::InferShapeContext;
use super::op_desc::{OpDesc, default_grad_op};
use super::var::Block;
use crate::error::OpError;
use crate::ops::{self, OpKind};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

static GLOBAL: OnceLock<OpRegistry> = OnceLock::new();

/// Registration record of one operator type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub kind: OpKind,
    /// Type of the gradient operator, if the operator has one.
    pub grad_op: Option<&'static str>,
}

/// Frozen map from operator type to its registration.
#[derive(Debug, Clone)]
pub struct OpRegistry {
    ops: HashMap<&'static str, OpInfo>,
}

/// Collects registrations before freezing them into an [`OpRegistry`].
#[derive(Debug, Default)]
pub struct OpRegistryBuilder {
    ops: HashMap<&'static str, OpInfo>,
}

impl OpRegistryBuilder {
    /// Register an operator type.
    ///
    /// # Errors
    ///
    /// [`OpError::DuplicateOp`] if the type is already registered.
    pub fn register(
        &mut self,
        op_type: &'static str,
        kind: OpKind,
        grad_op: Option<&'static str>,
    ) -> Result<&mut Self, OpError> {
        if self.ops.contains_key(op_type) {
            return Err(OpError::DuplicateOp(op_type.to_string()));
        }
        self.ops.insert(op_type, OpInfo { kind, grad_op });
        Ok(self)
    }

    /// Freeze the registrations.
    pub fn build(self) -> OpRegistry {
        OpRegistry { ops: self.ops }
    }
}

impl OpRegistry {
    pub fn builder() -> OpRegistryBuilder {
        OpRegistryBuilder::default()
    }

    /// A registry holding every built-in operator.
    pub fn with_builtin_ops() -> Result<Self, OpError> {
        let mut builder = Self::builder();
        ops::register_builtin(&mut builder)?;
        Ok(builder.build())
    }

    /// The process-wide registry of built-in operators.
    ///
    /// # Example
    ///
    /// ```
    /// use ndshape::framework::OpRegistry;
    ///
    /// let registry = OpRegistry::global();
    /// assert!(registry.contains("reshape"));
    /// assert_eq!(registry.get("reshape").unwrap().grad_op, Some("reshape_grad"));
    /// ```
    pub fn global() -> &'static OpRegistry {
        GLOBAL.get_or_init(|| {
            // Built-in operator types are distinct constants.
            Self::with_builtin_ops().expect("built-in operators register without conflict")
        })
    }

    pub fn get(&self, op_type: &str) -> Option<&OpInfo> {
        self.ops.get(op_type)
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.ops.contains_key(op_type)
    }

    /// Registered operator types, sorted.
    pub fn op_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.ops.keys().copied().collect();
        types.sort_unstable();
        types
    }

    fn lookup(&self, op_type: &str) -> Result<&OpInfo, OpError> {
        self.get(op_type)
            .ok_or_else(|| OpError::UnknownOp(op_type.to_string()))
    }

    /// Run the shape function of `op` against `block`.
    ///
    /// On error no partial output shape is written.
    pub fn infer_shape(&self, op: &OpDesc, block: &mut Block) -> Result<(), OpError> {
        let info = self.lookup(&op.op_type)?;
        debug!(op = %op.op_type, "inferring shape");
        info.kind.infer_shape(&mut InferShapeContext::new(op, block))
    }

    /// Build the gradient operator of `forward`, if it has one.
    pub fn make_grad_op(&self, forward: &OpDesc) -> Result<Option<OpDesc>, OpError> {
        let info = self.lookup(&forward.op_type)?;
        Ok(info
            .grad_op
            .map(|grad_type| default_grad_op(forward, grad_type)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{AttributeMap, VarDesc};

    #[test]
    fn test_builtin_ops() {
        let registry = OpRegistry::with_builtin_ops().unwrap();
        assert_eq!(
            registry.op_types(),
            vec![
                "pixel_shuffle",
                "pixel_shuffle_grad",
                "reshape",
                "reshape_grad"
            ]
        );
        assert_eq!(registry.get("reshape_grad").unwrap().grad_op, None);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut builder = OpRegistry::builder();
        builder.register("reshape", OpKind::Reshape, None).unwrap();
        let err = builder.register("reshape", OpKind::Reshape, None).unwrap_err();
        assert!(matches!(err, OpError::DuplicateOp(name) if name == "reshape"));
    }

    #[test]
    fn test_unknown_op() {
        let registry = OpRegistry::global();
        let mut block = Block::new();
        let err = registry
            .infer_shape(&OpDesc::new("conv2d"), &mut block)
            .unwrap_err();
        assert!(matches!(err, OpError::UnknownOp(name) if name == "conv2d"));
    }

    #[test]
    fn test_infer_through_registry() {
        let op = OpDesc::new("reshape")
            .input("X", "x")
            .output("Out", "y")
            .attrs(AttributeMap::new().with("shape", vec![6i64, 8]));
        let mut block = Block::new();
        block.declare("x", VarDesc::with_dims(&[2, 4, 6]));

        OpRegistry::global().infer_shape(&op, &mut block).unwrap();
        assert_eq!(block.var("y").unwrap().shape.dims(), Some(&[6, 8][..]));
    }

    #[test]
    fn test_make_grad_op() {
        let registry = OpRegistry::global();
        let forward = OpDesc::new("reshape").input("X", "x").output("Out", "y");
        let grad = registry.make_grad_op(&forward).unwrap().unwrap();
        assert_eq!(grad.op_type, "reshape_grad");

        let grad_of_grad = registry.make_grad_op(&grad).unwrap();
        assert!(grad_of_grad.is_none());
    }
}
