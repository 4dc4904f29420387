//! Logger that forwards to `tracing`

use super::traits::Logger;

/// Bridges the [`Logger`] trait onto `tracing` events
///
/// Every event is emitted under the `tooluse` target with the component
/// name as a field, so `RUST_LOG=tooluse=debug` selects all of it.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("core")
    }
}

impl TracingLogger {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "tooluse", component = self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "tooluse", component = self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "tooluse", component = self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "tooluse", component = self.component, "{}", message);
    }
}
