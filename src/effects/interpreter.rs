//! Effect interpreter trait.
//!
//! The server owns one interpreter and feeds it every effect a handler
//! returns. Production uses [`LeadNotifier`](crate::notify::LeadNotifier);
//! tests can record effects instead of executing them.

use std::future::Future;

use super::Effect;

/// Executes effects.
///
/// Interpretation is best-effort: failures are logged by the implementation
/// and never reach the webhook caller.
///
/// # Example (recording interpreter for testing)
///
/// ```ignore
/// struct Recorder(Mutex<Vec<Effect>>);
///
/// impl EffectInterpreter for Recorder {
///     async fn interpret(&self, effect: Effect) {
///         self.0.lock().unwrap().push(effect);
///     }
/// }
/// ```
pub trait EffectInterpreter: Send + Sync {
    /// Execute one effect.
    fn interpret(&self, effect: Effect) -> impl Future<Output = ()> + Send;
}
