//! The payload capability required from registered simulation data.

use std::any::Any;

/// Type-erased access to a concrete payload.
///
/// Blanket-implemented for every `'static` type; it exists so that a
/// `dyn SimulationData` can be checked and downcast to its concrete type.
pub trait AsAny: Any {
    /// Shared access as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Exclusive access as [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Concrete type name, used in mismatch diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A unit of externally owned simulation state that can be brought up
/// to date on demand.
///
/// The registry borrows implementors; it never owns them.
///
/// # Examples
///
/// ```
/// use tessera_core::SimulationData;
///
/// struct DensityField {
///     host: Vec<f32>,
///     device: Vec<f32>,
/// }
///
/// impl SimulationData for DensityField {
///     fn synchronize(&mut self) {
///         self.host.copy_from_slice(&self.device);
///     }
/// }
///
/// let mut field = DensityField { host: vec![0.0; 2], device: vec![1.0, 2.0] };
/// field.synchronize();
/// assert_eq!(field.host, [1.0, 2.0]);
/// ```
pub trait SimulationData: AsAny {
    /// Bring the payload up to date with its canonical (possibly remote
    /// or device-resident) state.
    ///
    /// Must be idempotent.
    fn synchronize(&mut self);
}
