//! Target-shape specification for reshape.
//!
//! A raw specification is a list of signed integers where each entry is one of
//!
//! - a positive extent, kept as is
//! - `0`, copy the extent at the same position of the input
//! - `-1`, infer the extent from the remaining element count
//!
//! [`ShapeSpec::parse`] validates the raw list once and keeps it in typed form.

use crate::error::ShapeError;
use smallvec::SmallVec;
use std::ops::Index;

/// Raw marker for a dimension copied from the input.
pub const COPY_DIM: i64 = 0;

/// Raw marker for the inferred dimension.
pub const INFER_DIM: i64 = -1;

/// One entry of a validated target shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimSpec {
    /// Explicit positive extent.
    Fixed(usize),
    /// Extent copied from the input at the same position.
    CopyInput,
    /// Extent inferred from the total element count.
    Infer,
}

impl DimSpec {
    /// The raw integer this entry was parsed from.
    ///
    /// Parsed extents come from positive `i64` values, so they convert back
    /// losslessly.
    pub fn to_raw(self) -> i64 {
        match self {
            DimSpec::Fixed(d) => d as i64,
            DimSpec::CopyInput => COPY_DIM,
            DimSpec::Infer => INFER_DIM,
        }
    }
}

/// A validated target shape.
///
/// Uses `SmallVec<[DimSpec; 8]>` so that typical ranks stay on the stack.
///
/// # Example
/// ```
/// use ndshape::shape_spec::{DimSpec, ShapeSpec};
///
/// let spec = ShapeSpec::parse(&[-1, 0, 3, 2], 3).unwrap();
/// assert_eq!(spec.len(), 4);
/// assert_eq!(spec[0], DimSpec::Infer);
/// assert_eq!(spec[1], DimSpec::CopyInput);
/// assert_eq!(spec.infer_index(), Some(0));
/// assert!(spec.has_copy());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSpec {
    entries: SmallVec<[DimSpec; 8]>,
    infer_index: Option<usize>,
    has_copy: bool,
}

impl ShapeSpec {
    /// Validate a raw target shape against the rank of its input.
    ///
    /// Entries are checked left to right. A negative value other than `-1`
    /// and a `0` at a position not below `input_rank` fail at the entry
    /// where they occur. The count of `-1` markers is checked after the scan.
    ///
    /// # Errors
    ///
    /// - [`ShapeError::EmptySpec`] if `raw` is empty
    /// - [`ShapeError::InvalidDimension`] for a negative value other than `-1`
    /// - [`ShapeError::IndexOutOfRange`] for a `0` at position `>= input_rank`
    /// - [`ShapeError::MultipleInferredDims`] for two or more `-1`
    pub fn parse(raw: &[i64], input_rank: usize) -> Result<Self, ShapeError> {
        if raw.is_empty() {
            return Err(ShapeError::EmptySpec);
        }

        let mut entries = SmallVec::with_capacity(raw.len());
        let mut infer_positions: SmallVec<[usize; 2]> = SmallVec::new();
        let mut has_copy = false;

        for (index, &value) in raw.iter().enumerate() {
            let entry = match value {
                INFER_DIM => {
                    infer_positions.push(index);
                    DimSpec::Infer
                }
                COPY_DIM => {
                    if index >= input_rank {
                        return Err(ShapeError::IndexOutOfRange {
                            index,
                            rank: input_rank,
                        });
                    }
                    has_copy = true;
                    DimSpec::CopyInput
                }
                v if v > 0 => DimSpec::Fixed(
                    usize::try_from(v)
                        .map_err(|_| ShapeError::InvalidDimension { index, value })?,
                ),
                _ => return Err(ShapeError::InvalidDimension { index, value }),
            };
            entries.push(entry);
        }

        if let &[first, second, ..] = infer_positions.as_slice() {
            return Err(ShapeError::MultipleInferredDims { first, second });
        }

        Ok(Self {
            entries,
            infer_index: infer_positions.first().copied(),
            has_copy,
        })
    }

    /// Number of output dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the spec has no entries. Never true once parsed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Typed entries.
    #[inline]
    pub fn entries(&self) -> &[DimSpec] {
        &self.entries
    }

    /// Position of the `-1` entry, if any.
    #[inline]
    pub fn infer_index(&self) -> Option<usize> {
        self.infer_index
    }

    /// Whether any entry copies its extent from the input.
    #[inline]
    pub fn has_copy(&self) -> bool {
        self.has_copy
    }

    /// Positions of `0` entries.
    pub fn copy_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, DimSpec::CopyInput))
            .map(|(i, _)| i)
    }

    /// Re-check the copy markers against another input rank.
    pub fn check_rank(&self, rank: usize) -> Result<(), ShapeError> {
        match self.copy_indices().find(|&i| i >= rank) {
            Some(index) => Err(ShapeError::IndexOutOfRange { index, rank }),
            None => Ok(()),
        }
    }

    /// Product of the explicit extents, or `None` on overflow.
    ///
    /// Placeholders count as 1.
    pub fn fixed_product(&self) -> Option<usize> {
        self.entries.iter().try_fold(1usize, |acc, e| match e {
            DimSpec::Fixed(d) => acc.checked_mul(*d),
            _ => Some(acc),
        })
    }

    /// The spec as raw integers, placeholders kept as `0` and `-1`.
    pub fn to_raw(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.to_raw()).collect()
    }
}

impl Index<usize> for ShapeSpec {
    type Output = DimSpec;

    fn index(&self, i: usize) -> &Self::Output {
        &self.entries[i]
    }
}
