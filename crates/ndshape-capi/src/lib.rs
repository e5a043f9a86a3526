//! C API for ndshape
//!
//! This crate exposes reshape and pixel-shuffle shape resolution through a
//! C-compatible interface, so graph compilers written in other languages can
//! call it.
//!
//! All extern "C" functions are inherently unsafe as they work with raw pointers
//! from foreign code. The `#[unsafe(no_mangle)]` attribute marks the entire
//! function signature as unsafe at the FFI boundary.

#![allow(clippy::not_unsafe_ptr_arg_deref)]

use libc::{c_int, c_long, size_t};
use ndshape::ops::pixel_shuffle::pixel_shuffle_dims;
use ndshape::{Resolution, ShapeError, resolve, resolve_runtime};
use std::panic::{AssertUnwindSafe, catch_unwind};

// Status codes
pub type StatusCode = c_int;

pub const NDS_SUCCESS: StatusCode = 0;
pub const NDS_INVALID_ARGUMENT: StatusCode = -1;
pub const NDS_EMPTY_SPEC: StatusCode = -2;
pub const NDS_INVALID_DIMENSION: StatusCode = -3;
pub const NDS_INDEX_OUT_OF_RANGE: StatusCode = -4;
pub const NDS_MULTIPLE_INFERRED: StatusCode = -5;
pub const NDS_SHAPE_MISMATCH: StatusCode = -6;
pub const NDS_BUFFER_TOO_SMALL: StatusCode = -7;
pub const NDS_INTERNAL_ERROR: StatusCode = -8;

fn status_of(err: &ShapeError) -> StatusCode {
    match err {
        ShapeError::EmptySpec => NDS_EMPTY_SPEC,
        ShapeError::InvalidDimension { .. } => NDS_INVALID_DIMENSION,
        ShapeError::IndexOutOfRange { .. } => NDS_INDEX_OUT_OF_RANGE,
        ShapeError::MultipleInferredDims { .. } => NDS_MULTIPLE_INFERRED,
        ShapeError::ShapeMismatch { .. }
        | ShapeError::UndeterminedInferredDim { .. }
        | ShapeError::RankMismatch { .. }
        | ShapeError::IndivisibleChannels { .. }
        | ShapeError::IndivisibleSpatial { .. } => NDS_SHAPE_MISMATCH,
        ShapeError::MissingForwardShape
        | ShapeError::InvalidUpscaleFactor { .. }
        | ShapeError::ExtentOverflow => NDS_INVALID_ARGUMENT,
    }
}

/// View a (pointer, length) pair as a slice; a null pointer is only valid
/// for length 0.
unsafe fn slice_or_empty<'a, T>(ptr: *const T, len: size_t) -> Option<&'a [T]> {
    if len == 0 {
        Some(&[])
    } else if ptr.is_null() {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts(ptr, len) })
    }
}

/// Copy `values` into a caller buffer of `cap` elements.
unsafe fn write_out<T: Copy>(
    values: &[T],
    out: *mut T,
    cap: size_t,
    out_len: *mut size_t,
) -> StatusCode {
    unsafe {
        *out_len = values.len();
    }
    if values.len() > cap {
        return NDS_BUFFER_TOO_SMALL;
    }
    if !values.is_empty() {
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), out, values.len());
        }
    }
    NDS_SUCCESS
}

fn guarded(f: impl FnOnce() -> StatusCode) -> StatusCode {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or(NDS_INTERNAL_ERROR)
}

// ============================================================================
// Reshape
// ============================================================================

/// Resolve a reshape target shape at graph construction.
///
/// # Arguments
/// * `spec` - Target shape entries (positive, `0` or `-1`)
/// * `spec_len` - Number of target shape entries
/// * `input` - Input dimensions
/// * `rank` - Number of input dimensions
/// * `out` - Output buffer for the resolved shape
/// * `out_cap` - Capacity of `out`
/// * `out_len` - Receives the number of output dimensions
/// * `deferred` - Receives 1 if the shape keeps `0`/`-1` markers, else 0
///
/// # Returns
/// Status code. On `NDS_BUFFER_TOO_SMALL`, `out_len` holds the needed size.
#[unsafe(no_mangle)]
pub extern "C" fn nds_resolve_shape(
    spec: *const c_long,
    spec_len: size_t,
    input: *const size_t,
    rank: size_t,
    out: *mut c_long,
    out_cap: size_t,
    out_len: *mut size_t,
    deferred: *mut c_int,
) -> StatusCode {
    if out_len.is_null() || deferred.is_null() || (out.is_null() && out_cap > 0) {
        return NDS_INVALID_ARGUMENT;
    }

    guarded(|| {
        let (Some(spec), Some(input)) = (unsafe { slice_or_empty(spec, spec_len) }, unsafe {
            slice_or_empty(input, rank)
        }) else {
            return NDS_INVALID_ARGUMENT;
        };
        let spec: Vec<i64> = spec.iter().map(|&v| i64::from(v)).collect();

        let resolution = match resolve(&spec, input) {
            Ok(resolution) => resolution,
            Err(err) => return status_of(&err),
        };
        let raw = match resolution.output() {
            Ok(raw) => raw,
            Err(err) => return status_of(&err),
        };
        // c_long is 32 bits on LLP64 targets.
        let Ok(raw) = raw
            .into_iter()
            .map(c_long::try_from)
            .collect::<Result<Vec<c_long>, _>>()
        else {
            return NDS_INVALID_ARGUMENT;
        };
        unsafe {
            *deferred = c_int::from(matches!(resolution, Resolution::Deferred(_)));
            write_out(&raw, out, out_cap, out_len)
        }
    })
}

/// Resolve a reshape target shape against the runtime input.
///
/// Copies every `0` from `input` before inferring `-1`.
///
/// # Returns
/// Status code. On `NDS_BUFFER_TOO_SMALL`, `out_len` holds the needed size.
#[unsafe(no_mangle)]
pub extern "C" fn nds_resolve_shape_runtime(
    spec: *const c_long,
    spec_len: size_t,
    input: *const size_t,
    rank: size_t,
    out: *mut size_t,
    out_cap: size_t,
    out_len: *mut size_t,
) -> StatusCode {
    if out_len.is_null() || (out.is_null() && out_cap > 0) {
        return NDS_INVALID_ARGUMENT;
    }

    guarded(|| {
        let (Some(spec), Some(input)) = (unsafe { slice_or_empty(spec, spec_len) }, unsafe {
            slice_or_empty(input, rank)
        }) else {
            return NDS_INVALID_ARGUMENT;
        };
        let spec: Vec<i64> = spec.iter().map(|&v| i64::from(v)).collect();

        match resolve_runtime(&spec, input) {
            Ok(dims) => unsafe { write_out(&dims, out, out_cap, out_len) },
            Err(err) => status_of(&err),
        }
    })
}

// ============================================================================
// Pixel shuffle
// ============================================================================

/// Output shape of a pixel shuffle.
///
/// # Arguments
/// * `input` - Input dimensions `[N, C, H, W]`
/// * `rank` - Must be 4
/// * `factor` - Upscale factor
/// * `out` - Output array for 4 dimensions
#[unsafe(no_mangle)]
pub extern "C" fn nds_pixel_shuffle_shape(
    input: *const size_t,
    rank: size_t,
    factor: size_t,
    out: *mut size_t,
) -> StatusCode {
    if input.is_null() || out.is_null() {
        return NDS_INVALID_ARGUMENT;
    }

    guarded(|| {
        let input = unsafe { std::slice::from_raw_parts(input, rank) };
        match pixel_shuffle_dims(input, factor) {
            Ok(dims) => {
                unsafe {
                    std::ptr::copy_nonoverlapping(dims.as_ptr(), out, dims.len());
                }
                NDS_SUCCESS
            }
            Err(err) => status_of(&err),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn resolve_c(spec: &[c_long], input: &[size_t]) -> (StatusCode, Vec<c_long>, c_int) {
        let mut out = [0 as c_long; 8];
        let mut out_len: size_t = 0;
        let mut deferred: c_int = -1;
        let status = nds_resolve_shape(
            spec.as_ptr(),
            spec.len(),
            input.as_ptr(),
            input.len(),
            out.as_mut_ptr(),
            out.len(),
            &mut out_len,
            &mut deferred,
        );
        let len = out_len.min(out.len());
        (status, out[..len].to_vec(), deferred)
    }

    #[test]
    fn test_resolve_static() {
        let (status, out, deferred) = resolve_c(&[2, 3, -1, 2], &[2, 4, 6]);
        assert_eq!(status, NDS_SUCCESS);
        assert_eq!(out, vec![2, 3, 4, 2]);
        assert_eq!(deferred, 0);
    }

    #[test]
    fn test_resolve_deferred() {
        let (status, out, deferred) = resolve_c(&[-1, 0, 3, 2], &[2, 4, 6]);
        assert_eq!(status, NDS_SUCCESS);
        assert_eq!(out, vec![-1, 0, 3, 2]);
        assert_eq!(deferred, 1);
    }

    #[test]
    fn test_resolve_error_codes() {
        assert_eq!(resolve_c(&[], &[2, 4, 6]).0, NDS_EMPTY_SPEC);
        assert_eq!(resolve_c(&[-2], &[2, 4, 6]).0, NDS_INVALID_DIMENSION);
        assert_eq!(resolve_c(&[2, 3, 2, 0], &[2, 3, 4]).0, NDS_INDEX_OUT_OF_RANGE);
        assert_eq!(resolve_c(&[-1, -1], &[2, 4, 6]).0, NDS_MULTIPLE_INFERRED);
        assert_eq!(resolve_c(&[5, 5], &[2, 4, 6]).0, NDS_SHAPE_MISMATCH);
        assert_eq!(resolve_c(&[-1], &[usize::MAX, 2]).0, NDS_SHAPE_MISMATCH);
    }

    #[test]
    fn test_resolve_extent_beyond_c_long() {
        let (status, _, _) = resolve_c(&[-1], &[usize::MAX]);
        assert_eq!(status, NDS_INVALID_ARGUMENT);
    }

    #[test]
    fn test_resolve_null_arguments() {
        let spec = [6 as c_long, 8];
        let input = [2 as size_t, 4, 6];
        let mut deferred: c_int = 0;
        let status = nds_resolve_shape(
            spec.as_ptr(),
            2,
            input.as_ptr(),
            3,
            ptr::null_mut(),
            0,
            ptr::null_mut(),
            &mut deferred,
        );
        assert_eq!(status, NDS_INVALID_ARGUMENT);

        let mut out_len: size_t = 0;
        let status = nds_resolve_shape(
            ptr::null(),
            2,
            input.as_ptr(),
            3,
            ptr::null_mut(),
            0,
            &mut out_len,
            &mut deferred,
        );
        assert_eq!(status, NDS_INVALID_ARGUMENT);
    }

    #[test]
    fn test_resolve_buffer_too_small() {
        let spec = [2 as c_long, 3, -1, 2];
        let input = [2 as size_t, 4, 6];
        let mut out = [0 as c_long; 2];
        let mut out_len: size_t = 0;
        let mut deferred: c_int = 0;
        let status = nds_resolve_shape(
            spec.as_ptr(),
            spec.len(),
            input.as_ptr(),
            input.len(),
            out.as_mut_ptr(),
            out.len(),
            &mut out_len,
            &mut deferred,
        );
        assert_eq!(status, NDS_BUFFER_TOO_SMALL);
        assert_eq!(out_len, 4);
    }

    #[test]
    fn test_resolve_runtime() {
        let spec = [-1 as c_long, 0, 3, 2];
        let input = [2 as size_t, 4, 6];
        let mut out = [0 as size_t; 4];
        let mut out_len: size_t = 0;
        let status = nds_resolve_shape_runtime(
            spec.as_ptr(),
            spec.len(),
            input.as_ptr(),
            input.len(),
            out.as_mut_ptr(),
            out.len(),
            &mut out_len,
        );
        assert_eq!(status, NDS_SUCCESS);
        assert_eq!(out_len, 4);
        assert_eq!(out, [2, 4, 3, 2]);
    }

    #[test]
    fn test_pixel_shuffle_shape() {
        let input = [1 as size_t, 8, 3, 3];
        let mut out = [0 as size_t; 4];
        assert_eq!(
            nds_pixel_shuffle_shape(input.as_ptr(), 4, 2, out.as_mut_ptr()),
            NDS_SUCCESS
        );
        assert_eq!(out, [1, 2, 6, 6]);

        assert_eq!(
            nds_pixel_shuffle_shape(input.as_ptr(), 3, 2, out.as_mut_ptr()),
            NDS_SHAPE_MISMATCH
        );
        assert_eq!(
            nds_pixel_shuffle_shape(ptr::null(), 4, 2, out.as_mut_ptr()),
            NDS_INVALID_ARGUMENT
        );
        assert_eq!(
            nds_pixel_shuffle_shape(input.as_ptr(), 4, 1 << 33, out.as_mut_ptr()),
            NDS_INVALID_ARGUMENT
        );
    }
}
