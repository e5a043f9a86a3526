//! Level-of-detail (LoD) descriptors.
//!
//! A LoD describes how the rows of a tensor group into variable-length
//! sequences. Shape operators never look inside one; they forward the handle
//! from input to output.

use std::sync::Arc;

/// Shared, immutable LoD handle.
///
/// Each level is a list of offsets. Cloning copies the handle, not the
/// offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lod(Arc<Vec<Vec<usize>>>);

impl Lod {
    /// Wrap the given offset levels.
    pub fn new(levels: Vec<Vec<usize>>) -> Self {
        Self(Arc::new(levels))
    }

    /// Offset levels.
    #[inline]
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.0
    }

    /// Number of levels.
    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Whether both handles refer to the same descriptor.
    #[inline]
    pub fn ptr_eq(&self, other: &Lod) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
