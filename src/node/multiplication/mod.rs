use std::sync::Arc;

use ndarray::{ArrayD, Zip};

use crate::{
    error::GraphError,
    function::{Function, FunctionFlags, SavedVariable},
    node::binary_operands,
    variable::Variable,
};

/// Elementwise multiplication.
///
/// The backward pass needs both operands, so they are saved at construction
/// time.
pub struct Multiplication {
    flags: FunctionFlags,
    saved: Vec<SavedVariable>,
}

impl Multiplication {
    pub fn new(inputs: &[Variable]) -> Arc<Self> {
        Arc::new(Self {
            flags: FunctionFlags::from_inputs(inputs),
            saved: inputs.iter().map(SavedVariable::new).collect(),
        })
    }
}

impl Function for Multiplication {
    fn name(&self) -> &'static str {
        "Multiplication"
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
            .for_each(|v, &l, &r| *v = l * r);

        Ok(vec![Variable::from_op(data, self, 0)])
    }

    fn saved_variables(&self) -> Option<Vec<SavedVariable>> {
        Some(self.saved.clone())
    }
}

#[cfg(test)]
mod test;
