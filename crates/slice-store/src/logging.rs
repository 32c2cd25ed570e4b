//! Action logging for stores built in debug mode

use crate::action::Action;

/// Host logging collaborator receiving every dispatched action
///
/// Only called when the store was built with its debug flag set.
pub trait ActionLogger {
    fn log_action(&self, store: &str, action: &Action);
}

/// Logs actions through the `log` facade at debug level
#[derive(Debug, Clone)]
pub struct LogActionLogger {
    target: String,
}

impl LogActionLogger {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogActionLogger {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LOG_TARGET)
    }
}

impl ActionLogger for LogActionLogger {
    fn log_action(&self, store: &str, action: &Action) {
        log::debug!(target: &self.target, "[{}] Action: {:?}", store, action);
    }
}

impl<F> ActionLogger for F
where
    F: Fn(&str, &Action),
{
    fn log_action(&self, store: &str, action: &Action) {
        self(store, action)
    }
}
