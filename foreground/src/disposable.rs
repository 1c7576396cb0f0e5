/// Something that can be cancelled or torn down exactly once.
///
/// Implemented by [`TaskHandle`](crate::TaskHandle) and
/// [`Worker`](crate::Worker), so owners can keep heterogeneous resources in
/// one collection and release them together.
pub trait Disposable {
    /// Cancels or tears down the resource. Calling it again has no effect.
    fn dispose(&self);

    /// Returns `true` once the resource has been disposed.
    fn is_disposed(&self) -> bool;
}
