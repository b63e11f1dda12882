/// A log target handed to each component at construction.
///
/// Components log through the `log` facade with `target: logger.target()`,
/// so output can be filtered per component (`RUST_LOG=coin_ledger::engine::accounts=debug`)
/// without any process-wide logger state in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    target: String,
}

impl Logger {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Child logger whose target is `parent::name`.
    pub fn scoped(&self, name: &str) -> Self {
        Self {
            target: format!("{}::{name}", self.target),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("coin_ledger::engine")
    }
}
