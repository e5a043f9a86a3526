//! Operator framework surface used by graph construction.
//!
//! ```text
//! OpDesc (JSON or builder) ──► OpRegistry::infer_shape
//!                                   │ lookup OpInfo
//!                                   ▼
//!                              OpKind::infer_shape(InferShapeContext)
//!                                   │ reads/writes
//!                                   ▼
//!                              Block { name → VarDesc { VarShape, Lod } }
//! ```

mod attribute;
mod context;
mod op_desc;
mod registry;
mod var;

pub use attribute::{Attribute, AttributeMap};
pub use context::InferShapeContext;
pub use op_desc::{GRAD_SUFFIX, OpDesc, grad_var_name};
pub use registry::{OpInfo, OpRegistry, OpRegistryBuilder};
pub use var::{Block, VarDesc, VarShape};
