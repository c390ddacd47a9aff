//! Navigator for terminal sessions.

use tracing::warn;

use crate::domain::ports::Navigator;

/// Logs redirects instead of changing a browser location.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        warn!(route, "session ended; sign in again with `ledgerctl login`");
    }
}
