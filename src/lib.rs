//! Reverse-mode automatic-differentiation graph construction.
//!
//! Every computation that touches a differentiable [`Variable`] produces a
//! graph node, a [`Function`], that records how to propagate gradients
//! backward to its inputs. This crate builds that graph: it stamps each
//! node's executability and volatility flags from its inputs, wires the node
//! to its producers (or to gradient-accumulation leaves) through an edge
//! table, and transparently mirrors forward execution into a separate trace
//! graph through [`traced_apply`], without the node implementations having to
//! know that tracing exists.
//!
//! The numerical backward pass itself is left to an external scheduler that
//! walks the edge tables built here.

mod accumulator;
mod checkpoint;
mod error;
mod function;
mod node;
mod trace;
mod variable;

use ndarray::ArrayD;

pub use crate::{
    accumulator::GradAccumulator,
    checkpoint::{Checkpoint, ContextSlot},
    error::GraphError,
    function::{Edge, EdgeTarget, Function, FunctionFlags, SavedVariable},
    node::{Addition, Multiplication, Negation},
    trace::{
        traced_apply, BackwardSubgraph, TraceGraph, TraceInner, TraceNode, TraceNodeId, TraceOp,
        TraceState, TraceType,
    },
    variable::Variable,
};

/// Creates a leaf variable from a **[ndarray]** array that owns its data.
///
/// The leaf does not require gradients; promote it with
/// [`Variable::differentiable`].
///
/// # Examples
///
/// ```
/// use ndarray::array;
///
/// let a = array![[1., 2.], [3., 4.]].into_dyn();
/// let v = revgrad::from_ndarray(a.clone());
///
/// assert_eq!(*v.data(), a);
/// ```
pub fn from_ndarray(array: ArrayD<f32>) -> Variable {
    Variable::leaf(array)
}

/// Creates a leaf variable with zeroed data.
///
/// # Examples
///
/// ```
/// let v = revgrad::zeros(&[2, 3]);
///
/// assert_eq!(v.data().shape(), &[2, 3]);
/// ```
pub fn zeros(shape: &[usize]) -> Variable {
    Variable::leaf(ArrayD::zeros(ndarray::IxDyn(shape)))
}

/// Creates a leaf variable with data filled with ones.
///
/// # Examples
///
/// ```
/// let v = revgrad::ones(&[4]);
///
/// assert!(v.data().iter().all(|el| (el - 1.).abs() <= f32::EPSILON));
/// ```
pub fn ones(shape: &[usize]) -> Variable {
    Variable::leaf(ArrayD::from_elem(ndarray::IxDyn(shape), 1.))
}
