//! Variables and blocks seen by shape inference.

use crate::lod::Lod;
use crate::resolve::DeferredShape;
use std::collections::BTreeMap;

/// Graph-time shape of a variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VarShape {
    /// No operator has set the shape yet.
    #[default]
    Unset,
    /// Concrete dims.
    Known(Vec<usize>),
    /// Dims that depend on the runtime input of a reshape.
    Pending(DeferredShape),
}

impl VarShape {
    /// Concrete dims, if known.
    pub fn dims(&self) -> Option<&[usize]> {
        match self {
            VarShape::Known(dims) => Some(dims),
            _ => None,
        }
    }

    /// Rank, if known or pending.
    pub fn ndim(&self) -> Option<usize> {
        match self {
            VarShape::Unset => None,
            VarShape::Known(dims) => Some(dims.len()),
            VarShape::Pending(deferred) => Some(deferred.ndim()),
        }
    }
}

/// A named tensor variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarDesc {
    pub shape: VarShape,
    pub lod: Option<Lod>,
}

impl VarDesc {
    /// Variable with known dims and no LoD.
    pub fn with_dims(dims: &[usize]) -> Self {
        Self {
            shape: VarShape::Known(dims.to_vec()),
            lod: None,
        }
    }

    /// Attach a LoD.
    pub fn lod(mut self, lod: Lod) -> Self {
        self.lod = Some(lod);
        self
    }
}

/// Variables of one graph block, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Block {
    vars: BTreeMap<String, VarDesc>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or replace) a variable.
    pub fn declare(&mut self, name: &str, var: VarDesc) -> &mut VarDesc {
        let slot = self.vars.entry(name.to_string()).or_default();
        *slot = var;
        slot
    }

    pub fn var(&self, name: &str) -> Option<&VarDesc> {
        self.vars.get(name)
    }

    /// Mutable access, declaring an unset variable if absent.
    pub fn var_mut(&mut self, name: &str) -> &mut VarDesc {
        self.vars.entry(name.to_string()).or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{Resolution, resolve};

    #[test]
    fn test_var_shape_dims() {
        assert_eq!(VarShape::Unset.dims(), None);
        assert_eq!(VarShape::Known(vec![2, 3]).dims(), Some(&[2, 3][..]));
        assert_eq!(VarShape::Known(vec![2, 3]).ndim(), Some(2));

        let Resolution::Deferred(deferred) = resolve(&[0, -1, 1], &[4, 5]).unwrap() else {
            panic!("expected deferred");
        };
        let pending = VarShape::Pending(deferred);
        assert_eq!(pending.dims(), None);
        assert_eq!(pending.ndim(), Some(3));
    }

    #[test]
    fn test_block_declare_and_lookup() {
        let mut block = Block::new();
        block.declare("x", VarDesc::with_dims(&[2, 4, 6]));
        assert!(block.contains("x"));
        assert_eq!(block.var("x").unwrap().shape.dims(), Some(&[2, 4, 6][..]));

        let y = block.var_mut("y");
        assert_eq!(y.shape, VarShape::Unset);
        assert_eq!(block.len(), 2);
    }
}
