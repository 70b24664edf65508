mod addition;
mod multiplication;
mod negation;

pub use addition::Addition;
pub use multiplication::Multiplication;
pub use negation::Negation;

use ndarray::ArrayD;

use crate::{error::GraphError, variable::Variable};

/// Checks arity and definedness of a binary node's operands.
pub(crate) fn binary_operands<'a>(
    op: &'static str,
    inputs: &'a [Variable],
) -> Result<(&'a ArrayD<f32>, &'a ArrayD<f32>), GraphError> {
    if inputs.len() != 2 {
        return Err(GraphError::Arity {
            op,
            expected: 2,
            actual: inputs.len(),
        });
    }
    for (position, input) in inputs.iter().enumerate() {
        if !input.defined() {
            return Err(GraphError::UndefinedOperand { op, position });
        }
    }

    let (left, right) = (inputs[0].data(), inputs[1].data());
    if left.shape() != right.shape() {
        return Err(GraphError::ShapeMismatch {
            left: left.shape().to_vec(),
            right: right.shape().to_vec(),
        });
    }

    Ok((left, right))
}

/// Checks arity and definedness of a unary node's operand.
pub(crate) fn unary_operand<'a>(
    op: &'static str,
    inputs: &'a [Variable],
) -> Result<&'a ArrayD<f32>, GraphError> {
    if inputs.len() != 1 {
        return Err(GraphError::Arity {
            op,
            expected: 1,
            actual: inputs.len(),
        });
    }
    if !inputs[0].defined() {
        return Err(GraphError::UndefinedOperand { op, position: 0 });
    }

    Ok(inputs[0].data())
}
