use std::sync::{Arc, OnceLock, Weak};

use ndarray::ArrayD;

use parking_lot::Mutex;

use crate::{accumulator::GradAccumulator, function::Function, trace::TraceState};

struct Inner {
    data: ArrayD<f32>,
    requires_grad: bool,
    is_volatile: bool,
    grad_fn: Option<(Arc<dyn Function>, usize)>,
    accumulator: OnceLock<Arc<GradAccumulator>>,
    tracing_state: Mutex<Option<Weak<TraceState>>>,
}

/// A handle to a differentiable value.
///
/// A variable either is *undefined*, an empty handle occupying a positional
/// slot in a node's input list, or carries a tensor together with its
/// gradient metadata. Cloning is cheap and shares the underlying value.
///
/// A defined variable is a *leaf* when it has no producing node; gradients
/// reach it through its [`GradAccumulator`]. Otherwise it records the
/// [`Function`] that produced it and the index of the output it came from.
#[derive(Clone, Default)]
pub struct Variable {
    inner: Option<Arc<Inner>>,
}

impl Variable {
    /// Creates an undefined variable.
    pub fn undefined() -> Self {
        Self { inner: None }
    }

    /// Creates a leaf variable that does not require gradients.
    pub fn leaf(data: ArrayD<f32>) -> Self {
        Self::with_meta(data, false, false)
    }

    fn with_meta(data: ArrayD<f32>, requires_grad: bool, is_volatile: bool) -> Self {
        Self {
            inner: Some(Arc::new(Inner {
                data,
                requires_grad,
                is_volatile,
                grad_fn: None,
                accumulator: OnceLock::new(),
                tracing_state: Mutex::new(None),
            })),
        }
    }

    /// Promotes `self` to a leaf that requires gradients.
    ///
    /// Promotion happens at construction time, before the variable takes part
    /// in any computation; the returned handle is a fresh leaf.
    ///
    /// # Panics
    ///
    /// If the variable is undefined.
    pub fn differentiable(self) -> Self {
        let inner = self.inner.expect("cannot require gradients on an undefined variable");
        Self::with_meta(inner.data.clone(), true, false)
    }

    /// Marks `self` as volatile.
    ///
    /// Volatile values are never differentiable: a single volatile input
    /// poisons the executability of every node it reaches.
    ///
    /// # Panics
    ///
    /// If the variable is undefined.
    pub fn volatile(self) -> Self {
        let inner = self.inner.expect("cannot mark an undefined variable as volatile");
        Self::with_meta(inner.data.clone(), false, true)
    }

    /// Creates a variable produced by `grad_fn` as its `output_nr`-th output.
    ///
    /// The gradient requirement and volatility are inherited from the
    /// producing node's stamped flags.
    pub fn from_op(data: ArrayD<f32>, grad_fn: Arc<dyn Function>, output_nr: usize) -> Self {
        let flags = grad_fn.flags();
        let (requires_grad, is_volatile) = (flags.is_executable, flags.is_volatile);

        Self {
            inner: Some(Arc::new(Inner {
                data,
                requires_grad,
                is_volatile,
                grad_fn: Some((grad_fn, output_nr)),
                accumulator: OnceLock::new(),
                tracing_state: Mutex::new(None),
            })),
        }
    }

    /// Returns `true` if the variable carries a value.
    pub fn defined(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns `true` if the variable requires gradients.
    ///
    /// Undefined variables never do.
    pub fn requires_grad(&self) -> bool {
        self.inner.as_ref().map_or(false, |inner| inner.requires_grad)
    }

    /// Returns `true` if the variable is volatile.
    pub fn is_volatile(&self) -> bool {
        self.inner.as_ref().map_or(false, |inner| inner.is_volatile)
    }

    /// Returns the node that produced this variable, if any.
    pub fn grad_fn(&self) -> Option<Arc<dyn Function>> {
        self.inner
            .as_ref()
            .and_then(|inner| inner.grad_fn.as_ref())
            .map(|(function, _)| Arc::clone(function))
    }

    /// Returns the index of the producing node's output this variable came
    /// from. Zero for leaves.
    pub fn output_nr(&self) -> usize {
        self.inner
            .as_ref()
            .and_then(|inner| inner.grad_fn.as_ref())
            .map_or(0, |(_, output_nr)| *output_nr)
    }

    /// Returns the gradient accumulator of this leaf, creating it on first
    /// access.
    ///
    /// The accumulator is created once and then reused, so repeated flag
    /// resolution over the same inputs yields identical edge targets.
    ///
    /// # Panics
    ///
    /// If the variable is undefined.
    pub fn grad_accumulator(&self) -> Arc<GradAccumulator> {
        let inner = self
            .inner
            .as_ref()
            .expect("undefined variables have no gradient accumulator");

        Arc::clone(
            inner
                .accumulator
                .get_or_init(|| Arc::new(GradAccumulator::new(inner.data.shape()))),
        )
    }

    /// Returns the tensor held by this variable.
    ///
    /// # Panics
    ///
    /// If the variable is undefined.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.inner.as_ref().expect("undefined variables hold no data").data
    }

    /// Identity of the underlying value, used to key trace-side bookkeeping.
    pub(crate) fn key(&self) -> Option<usize> {
        self.inner
            .as_ref()
            .map(|inner| Arc::as_ptr(inner) as *const () as usize)
    }

    pub(crate) fn attach_tracing_state(&self, state: &Arc<TraceState>) {
        if let Some(inner) = self.inner.as_ref() {
            *inner.tracing_state.lock() = Some(Arc::downgrade(state));
        }
    }

    pub(crate) fn tracing_state(&self) -> Option<Arc<TraceState>> {
        self.inner
            .as_ref()
            .and_then(|inner| inner.tracing_state.lock().as_ref().and_then(Weak::upgrade))
    }
}

#[cfg(test)]
mod test;
