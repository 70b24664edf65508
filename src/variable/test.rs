use std::sync::Arc;

use super::Variable;
use crate::{node::Addition, Function};

#[test]
fn undefined_variables_are_inert() {
    let variable = Variable::undefined();

    assert!(!variable.defined());
    assert!(!variable.requires_grad());
    assert!(!variable.is_volatile());
    assert!(variable.grad_fn().is_none());
    assert_eq!(variable.output_nr(), 0);
}

#[test]
fn leaves_have_no_producing_node() {
    let leaf = crate::ones(&[2, 2]).differentiable();

    assert!(leaf.defined());
    assert!(leaf.requires_grad());
    assert!(leaf.grad_fn().is_none());
}

#[test]
fn volatile_leaves_never_require_gradients() {
    let leaf = crate::ones(&[2]).volatile();

    assert!(leaf.is_volatile());
    assert!(!leaf.requires_grad());
}

#[test]
fn the_accumulator_is_created_once() {
    let leaf = crate::ones(&[3]).differentiable();

    let first = leaf.grad_accumulator();
    let second = leaf.grad_accumulator();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn clones_share_the_underlying_value() {
    let leaf = crate::ones(&[3]).differentiable();
    let alias = leaf.clone();

    assert_eq!(leaf.key(), alias.key());
    assert!(Arc::ptr_eq(&leaf.grad_accumulator(), &alias.grad_accumulator()));
}

#[test]
fn produced_variables_inherit_the_node_flags() {
    let inputs = [crate::ones(&[2]).differentiable(), crate::ones(&[2])];
    let node = Addition::new(&inputs);

    let outputs = node.clone().apply(&inputs).unwrap();
    let output = &outputs[0];

    assert!(output.requires_grad());
    assert!(!output.is_volatile());
    assert_eq!(output.output_nr(), 0);

    let grad_fn = output.grad_fn().unwrap();
    let node: Arc<dyn Function> = node;
    assert!(Arc::ptr_eq(&grad_fn, &node));
}

#[test]
fn volatile_inputs_produce_volatile_outputs() {
    let inputs = [crate::ones(&[2]).differentiable(), crate::ones(&[2]).volatile()];
    let node = Addition::new(&inputs);

    let outputs = node.apply(&inputs).unwrap();

    assert!(outputs[0].is_volatile());
    assert!(!outputs[0].requires_grad());
}
