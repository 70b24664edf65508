use ndarray::Array;

use super::Addition;
use crate::{error::GraphError, function::Function, variable::Variable};

#[test]
fn base_case() {
    let left = Variable::leaf(Array::linspace(1., 4., 4).into_dyn());
    let right = crate::ones(&[4]);
    let inputs = [left, right];

    let outputs = Addition::new(&inputs).apply(&inputs).unwrap();

    assert_eq!(
        *outputs[0].data(),
        Array::linspace(2., 5., 4).into_dyn()
    );
}

#[test]
fn reports_an_empty_saved_set() {
    let inputs = [crate::ones(&[2]), crate::ones(&[2])];
    let node = Addition::new(&inputs);

    assert_eq!(node.saved_variables().unwrap().len(), 0);
}

#[test]
fn mismatched_shapes_are_rejected() {
    let inputs = [crate::ones(&[2]), crate::ones(&[3])];

    let result = Addition::new(&inputs).apply(&inputs);

    assert!(matches!(result, Err(GraphError::ShapeMismatch { .. })));
}

#[test]
fn undefined_operands_are_rejected() {
    let inputs = [crate::ones(&[2]), Variable::undefined()];

    let result = Addition::new(&inputs).apply(&inputs);

    assert!(matches!(
        result,
        Err(GraphError::UndefinedOperand { position: 1, .. })
    ));
}

#[test]
fn wrong_arity_is_rejected() {
    let inputs = [crate::ones(&[2])];

    let result = Addition::new(&inputs).apply(&inputs);

    assert!(matches!(
        result,
        Err(GraphError::Arity { expected: 2, actual: 1, .. })
    ));
}
