use std::sync::Arc;

use ndarray::{ArrayD, Zip};

use crate::{
    error::GraphError,
    function::{Function, FunctionFlags, SavedVariable},
    node::binary_operands,
    variable::Variable,
};

/// Elementwise addition.
///
/// Saves nothing for its backward pass: the gradient of a sum is passed
/// through unchanged, so `saved_variables` reports an empty set rather than
/// an unimplemented contract.
pub struct Addition {
    flags: FunctionFlags,
}

impl Addition {
    pub fn new(inputs: &[Variable]) -> Arc<Self> {
        Arc::new(Self {
            flags: FunctionFlags::from_inputs(inputs),
        })
    }
}

impl Function for Addition {
    fn name(&self) -> &'static str {
        "Addition"
    }

    fn flags(&self) -> &FunctionFlags {
        &self.flags
    }

    fn apply(self: Arc<Self>, inputs: &[Variable]) -> Result<Vec<Variable>, GraphError> {
        let (left, right) = binary_operands(self.name(), inputs)?;

        let mut data = ArrayD::zeros(left.raw_dim());
        Zip::from(&mut data)
            .and(left)
            .and(right)
            .for_each(|v, &l, &r| *v = l + r);

        Ok(vec![Variable::from_op(data, self, 0)])
    }

    fn saved_variables(&self) -> Option<Vec<SavedVariable>> {
        Some(Vec::new())
    }
}

#[cfg(test)]
mod test;
