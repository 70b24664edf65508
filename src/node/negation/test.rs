use ndarray::Array;

use super::Negation;
use crate::{function::Function, variable::Variable};

#[test]
fn base_case() {
    let operand = Variable::leaf(Array::linspace(1., 3., 3).into_dyn());
    let inputs = [operand];

    let outputs = Negation::new(&inputs).apply(&inputs).unwrap();

    assert_eq!(
        *outputs[0].data(),
        Array::linspace(-1., -3., 3).into_dyn()
    );
}

#[test]
fn does_not_implement_saved_variables() {
    let inputs = [crate::ones(&[2]).differentiable()];
    let node = Negation::new(&inputs);

    assert!(node.saved_variables().is_none());
}
