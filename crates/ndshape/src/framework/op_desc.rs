//! Operator descriptions.

use super::attribute::AttributeMap;
use crate::error::OpError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix appended to a variable name to name its gradient.
pub const GRAD_SUFFIX: &str = "@GRAD";

/// Gradient name of a variable or slot: `x` → `x@GRAD`.
///
/// # Examples
///
/// ```
/// use ndshape::framework::grad_var_name;
///
/// assert_eq!(grad_var_name("Out"), "Out@GRAD");
/// ```
pub fn grad_var_name(name: &str) -> String {
    format!("{name}{GRAD_SUFFIX}")
}

/// One operator instance in a graph.
///
/// `inputs` and `outputs` map slot names (`"X"`, `"Out"`) to variable names.
///
/// ```json
/// {
///   "type": "reshape",
///   "inputs": { "X": ["x"] },
///   "outputs": { "Out": ["y"] },
///   "attrs": { "shape": [-1, 0, 3, 2] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDesc {
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub attrs: AttributeMap,
}

impl OpDesc {
    /// Create a description with no slots or attributes.
    pub fn new(op_type: &str) -> Self {
        Self {
            op_type: op_type.to_string(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            attrs: AttributeMap::new(),
        }
    }

    /// Decode a description from JSON.
    pub fn from_json(json: &str) -> Result<Self, OpError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Bind an input slot to one variable.
    pub fn input(mut self, slot: &str, var: &str) -> Self {
        self.inputs.insert(slot.to_string(), vec![var.to_string()]);
        self
    }

    /// Bind an output slot to one variable.
    pub fn output(mut self, slot: &str, var: &str) -> Self {
        self.outputs.insert(slot.to_string(), vec![var.to_string()]);
        self
    }

    /// Replace the attributes.
    pub fn attrs(mut self, attrs: AttributeMap) -> Self {
        self.attrs = attrs;
        self
    }

    /// First variable bound to an input slot.
    pub fn input_var(&self, slot: &str) -> Option<&str> {
        first_var(&self.inputs, slot)
    }

    /// First variable bound to an output slot.
    pub fn output_var(&self, slot: &str) -> Option<&str> {
        first_var(&self.outputs, slot)
    }
}

fn first_var<'a>(slots: &'a BTreeMap<String, Vec<String>>, slot: &str) -> Option<&'a str> {
    slots
        .get(slot)
        .and_then(|vars| vars.first())
        .map(String::as_str)
}

/// Build the default gradient description for `forward`.
///
/// The gradient op receives every forward input and the gradient of every
/// forward output, and produces the gradient of every forward input.
/// Attributes are copied.
pub(crate) fn default_grad_op(forward: &OpDesc, grad_type: &str) -> OpDesc {
    let mut inputs = forward.inputs.clone();
    for (slot, vars) in &forward.outputs {
        inputs.insert(
            grad_var_name(slot),
            vars.iter().map(|v| grad_var_name(v)).collect(),
        );
    }

    let outputs = forward
        .inputs
        .iter()
        .map(|(slot, vars)| {
            (
                grad_var_name(slot),
                vars.iter().map(|v| grad_var_name(v)).collect(),
            )
        })
        .collect();

    OpDesc {
        op_type: grad_type.to_string(),
        inputs,
        outputs,
        attrs: forward.attrs.clone(),
    }
}
