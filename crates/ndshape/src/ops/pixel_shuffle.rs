//! `pixel_shuffle` and `pixel_shuffle_grad`.
//!
//! Rearranges an `[N, C, H, W]` tensor into `[N, C / r², H * r, W * r]`
//! for an upscale factor `r`.

use crate::error::{OpError, ShapeError};
use crate::framework::{AttributeMap, InferShapeContext, grad_var_name};
use serde::Deserialize;

pub const OP_TYPE: &str = "pixel_shuffle";
pub const GRAD_OP_TYPE: &str = "pixel_shuffle_grad";

/// Attributes of `pixel_shuffle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PixelShuffleAttrs {
    /// Spatial upscale factor `r`. Defaults to 1.
    pub upscale_factor: usize,
}

impl Default for PixelShuffleAttrs {
    fn default() -> Self {
        Self { upscale_factor: 1 }
    }
}

impl PixelShuffleAttrs {
    /// Read and validate attributes from an attribute map.
    ///
    /// # Errors
    ///
    /// [`ShapeError::InvalidUpscaleFactor`] if the factor is below 1.
    pub fn from_attrs(attrs: &AttributeMap) -> Result<Self, OpError> {
        let Some(factor) = attrs.int("upscale_factor")? else {
            return Ok(Self::default());
        };
        match usize::try_from(factor) {
            Ok(upscale_factor) if upscale_factor >= 1 => Ok(Self { upscale_factor }),
            _ => Err(ShapeError::InvalidUpscaleFactor { factor }.into()),
        }
    }
}

/// Output dims of a pixel shuffle.
///
/// # Examples
///
/// ```
/// use ndshape::ops::pixel_shuffle::pixel_shuffle_dims;
///
/// assert_eq!(pixel_shuffle_dims(&[1, 8, 3, 3], 2).unwrap(), vec![1, 2, 6, 6]);
/// ```
pub fn pixel_shuffle_dims(input: &[usize], factor: usize) -> Result<Vec<usize>, ShapeError> {
    let [n, c, h, w] = nchw(input)?;
    check_factor(factor)?;
    let area = mul(factor, factor)?;
    if c % area != 0 {
        return Err(ShapeError::IndivisibleChannels {
            channels: c,
            factor,
        });
    }
    Ok(vec![n, c / area, mul(h, factor)?, mul(w, factor)?])
}

/// Input dims recovered from the output dims of a pixel shuffle.
pub fn pixel_unshuffle_dims(output: &[usize], factor: usize) -> Result<Vec<usize>, ShapeError> {
    let [n, c, h, w] = nchw(output)?;
    check_factor(factor)?;
    for extent in [h, w] {
        if extent % factor != 0 {
            return Err(ShapeError::IndivisibleSpatial { extent, factor });
        }
    }
    Ok(vec![n, mul(mul(c, factor)?, factor)?, h / factor, w / factor])
}

fn mul(a: usize, b: usize) -> Result<usize, ShapeError> {
    a.checked_mul(b).ok_or(ShapeError::ExtentOverflow)
}

fn nchw(dims: &[usize]) -> Result<[usize; 4], ShapeError> {
    dims.try_into().map_err(|_| ShapeError::RankMismatch {
        expected: 4,
        actual: dims.len(),
    })
}

fn check_factor(factor: usize) -> Result<(), ShapeError> {
    if factor == 0 {
        return Err(ShapeError::InvalidUpscaleFactor { factor: 0 });
    }
    Ok(())
}

/// Shape function of `pixel_shuffle`.
pub fn infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<(), OpError> {
    ctx.require_input("X")?;
    ctx.require_output("Out")?;

    let attrs = PixelShuffleAttrs::from_attrs(ctx.attrs())?;
    let dims = pixel_shuffle_dims(ctx.input_dims("X")?, attrs.upscale_factor)?;
    ctx.set_output_dims("Out", dims)?;
    ctx.share_lod("X", "Out")
}

/// Shape function of `pixel_shuffle_grad`.
pub fn infer_grad_shape(ctx: &mut InferShapeContext<'_>) -> Result<(), OpError> {
    let out_grad = grad_var_name("Out");
    let x_grad = grad_var_name("X");
    ctx.require_input(&out_grad)?;
    ctx.require_output(&x_grad)?;

    let attrs = PixelShuffleAttrs::from_attrs(ctx.attrs())?;
    let dims = pixel_unshuffle_dims(ctx.input_dims(&out_grad)?, attrs.upscale_factor)?;
    ctx.set_output_dims(&x_grad, dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{Block, OpDesc, VarDesc};

    #[test]
    fn test_dims() {
        assert_eq!(pixel_shuffle_dims(&[2, 9, 4, 5], 3).unwrap(), vec![2, 1, 12, 15]);
        assert_eq!(pixel_shuffle_dims(&[2, 9, 4, 5], 1).unwrap(), vec![2, 9, 4, 5]);
    }

    #[test]
    fn test_dims_wrong_rank() {
        assert_eq!(
            pixel_shuffle_dims(&[8, 3, 3], 2),
            Err(ShapeError::RankMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_dims_indivisible_channels() {
        assert_eq!(
            pixel_shuffle_dims(&[1, 6, 3, 3], 2),
            Err(ShapeError::IndivisibleChannels {
                channels: 6,
                factor: 2
            })
        );
    }

    #[test]
    fn test_dims_overflowing_factor() {
        let factor = 1usize << 33;
        assert_eq!(
            pixel_shuffle_dims(&[1, 8, 3, 3], factor),
            Err(ShapeError::ExtentOverflow)
        );
        assert_eq!(
            pixel_shuffle_dims(&[1, 4, usize::MAX, 1], 2),
            Err(ShapeError::ExtentOverflow)
        );
        assert_eq!(
            pixel_unshuffle_dims(&[1, usize::MAX, 2, 2], 2),
            Err(ShapeError::ExtentOverflow)
        );
    }

    #[test]
    fn test_infer_overflowing_factor() {
        let op = OpDesc::new(OP_TYPE)
            .input("X", "x")
            .output("Out", "y")
            .attrs(AttributeMap::new().with("upscale_factor", 1i64 << 33));
        let mut block = Block::new();
        block.declare("x", VarDesc::with_dims(&[1, 8, 3, 3]));
        let err = infer_shape(&mut InferShapeContext::new(&op, &mut block)).unwrap_err();
        assert!(matches!(err, OpError::Shape(ShapeError::ExtentOverflow)));
        assert!(!block.contains("y"));
    }

    #[test]
    fn test_unshuffle_roundtrip() {
        let out = pixel_shuffle_dims(&[1, 8, 3, 3], 2).unwrap();
        assert_eq!(pixel_unshuffle_dims(&out, 2).unwrap(), vec![1, 8, 3, 3]);
        assert_eq!(
            pixel_unshuffle_dims(&[1, 2, 6, 5], 2),
            Err(ShapeError::IndivisibleSpatial {
                extent: 5,
                factor: 2
            })
        );
    }

    #[test]
    fn test_attrs() {
        assert_eq!(
            PixelShuffleAttrs::from_attrs(&AttributeMap::new()).unwrap(),
            PixelShuffleAttrs::default()
        );
        let err = PixelShuffleAttrs::from_attrs(&AttributeMap::new().with("upscale_factor", 0i64))
            .unwrap_err();
        assert!(matches!(
            err,
            OpError::Shape(ShapeError::InvalidUpscaleFactor { factor: 0 })
        ));

        let attrs: PixelShuffleAttrs = serde_json::from_str("{}").unwrap();
        assert_eq!(attrs.upscale_factor, 1);
    }

    #[test]
    fn test_infer_and_grad() {
        let attrs = AttributeMap::new().with("upscale_factor", 2i64);
        let forward = OpDesc::new(OP_TYPE)
            .input("X", "x")
            .output("Out", "y")
            .attrs(attrs.clone());
        let mut block = Block::new();
        block.declare("x", VarDesc::with_dims(&[1, 8, 3, 3]));
        infer_shape(&mut InferShapeContext::new(&forward, &mut block)).unwrap();
        assert_eq!(block.var("y").unwrap().shape.dims(), Some(&[1, 2, 6, 6][..]));

        let grad = OpDesc::new(GRAD_OP_TYPE)
            .input("Out@GRAD", "y@GRAD")
            .output("X@GRAD", "x@GRAD")
            .attrs(attrs);
        block.declare("y@GRAD", VarDesc::with_dims(&[1, 2, 6, 6]));
        infer_grad_shape(&mut InferShapeContext::new(&grad, &mut block)).unwrap();
        assert_eq!(
            block.var("x@GRAD").unwrap().shape.dims(),
            Some(&[1, 8, 3, 3][..])
        );
    }
}
