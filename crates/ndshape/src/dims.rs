//! Element-count helpers for dimension lists.
//!
//! Shapes are plain `&[usize]` slices. An empty slice is a scalar and holds
//! one element.

/// Number of elements described by `dims`, or `None` on overflow.
///
/// # Examples
///
/// ```
/// use ndshape::dims::checked_numel;
///
/// assert_eq!(checked_numel(&[2, 4, 6]), Some(48));
/// assert_eq!(checked_numel(&[]), Some(1));
/// assert_eq!(checked_numel(&[usize::MAX, 2]), None);
/// ```
pub fn checked_numel(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Number of elements described by `dims`, saturating at `usize::MAX`.
///
/// # Examples
///
/// ```
/// use ndshape::dims::numel;
///
/// assert_eq!(numel(&[3, 4, 5]), 60);
/// assert_eq!(numel(&[3, 0, 5]), 0);
/// ```
#[inline]
pub fn numel(dims: &[usize]) -> usize {
    checked_numel(dims).unwrap_or(usize::MAX)
}
