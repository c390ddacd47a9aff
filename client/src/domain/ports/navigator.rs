//! Driven port for leaving the current page after a forced logout.

use std::sync::{Mutex, PoisonError};

/// Route the console shows when the session has ended.
pub const LOGIN_ROUTE: &str = "/login";

/// Port for changing the user's location.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Move the user to `route`.
    fn navigate(&self, route: &str);
}

/// Navigator that records every requested route instead of moving.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes requested so far, oldest first.
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_routes_in_order() {
        let navigator = RecordingNavigator::new();
        navigator.navigate(LOGIN_ROUTE);
        navigator.navigate("/dashboard");
        assert_eq!(navigator.routes(), ["/login", "/dashboard"]);
    }
}
