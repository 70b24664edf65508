use std::sync::Arc;

use ndarray::Zip;

use crate::{
    error::GraphError,
    function::{Function, FunctionFlags},
    node::unary_operand,
    variable::Variable,
};

/// Elementwise negation.
///
/// Does not implement saved-variable retrieval; tracing it where backward
/// capture is required fails with a missing-capture error naming this node.
pub struct Negation {
    flags: FunctionFlags,
}

impl Negation {
    pub fn new(inputs: &[Variable]) -> Arc<Self> {
        Arc::new(Self {
            flags: FunctionFlags::from_inputs(inputs),
        })
    }
}

impl Function for Negation {
    fn name(&self) -> &'static str {
        "Negation"
    }

    fn flags(&self) -> &FunctionFlags {
        &self.flags
    }

    fn apply(self: Arc<Self>, inputs: &[Variable]) -> Result<Vec<Variable>, GraphError> {
        let operand = unary_operand(self.name(), inputs)?;

        let mut data = operand.clone();
        Zip::from(&mut data).for_each(|v| *v = -*v);

        Ok(vec![Variable::from_op(data, self, 0)])
    }
}

#[cfg(test)]
mod test;
