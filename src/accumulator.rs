use ndarray::ArrayD;
use parking_lot::Mutex;

/// Gradient sink of a leaf variable.
///
/// Leaves have no producing node; the backward pass deposits their gradients
/// here instead. Edges in a downstream node's table point at the accumulator
/// at slot 0.
pub struct GradAccumulator {
    gradient: Mutex<ArrayD<f32>>,
}

impl GradAccumulator {
    pub(crate) fn new(shape: &[usize]) -> Self {
        Self {
            gradient: Mutex::new(ArrayD::zeros(ndarray::IxDyn(shape))),
        }
    }

    /// Adds `gradient` to the accumulated value.
    ///
    /// # Panics
    ///
    /// If `gradient` cannot be broadcast to the leaf's shape.
    pub fn accumulate(&self, gradient: &ArrayD<f32>) {
        *self.gradient.lock() += gradient;
    }

    /// Returns a copy of the accumulated gradient.
    pub fn grad(&self) -> ArrayD<f32> {
        self.gradient.lock().clone()
    }

    /// Resets the accumulated gradient to zero.
    pub fn zero_grad(&self) {
        self.gradient.lock().fill(0.);
    }
}
