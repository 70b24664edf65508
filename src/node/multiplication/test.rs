use ndarray::Array;

use super::Multiplication;
use crate::{function::Function, variable::Variable};

#[test]
fn base_case() {
    let left = Variable::leaf(Array::linspace(1., 3., 3).into_dyn());
    let right = Variable::leaf(Array::from_elem(ndarray::IxDyn(&[3]), 2.));
    let inputs = [left, right];

    let outputs = Multiplication::new(&inputs).apply(&inputs).unwrap();

    assert_eq!(
        *outputs[0].data(),
        Array::linspace(2., 6., 3).into_dyn()
    );
}

#[test]
fn saves_both_operands() {
    let inputs = [crate::ones(&[2]).differentiable(), crate::ones(&[2])];
    let node = Multiplication::new(&inputs);

    let saved = node.saved_variables().unwrap();

    assert_eq!(saved.len(), 2);
    for (saved, input) in saved.iter().zip(&inputs) {
        assert_eq!(saved.unpack().key(), input.key());
    }
}

#[test]
fn executable_with_one_differentiable_operand() {
    let inputs = [crate::ones(&[2]).differentiable(), crate::ones(&[2])];
    let node = Multiplication::new(&inputs);

    assert!(node.flags().is_executable);
    assert_eq!(node.flags().edges.len(), 2);
}
