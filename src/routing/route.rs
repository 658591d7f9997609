//! The outcome of route resolution.

use std::sync::Arc;

use crate::pattern::PathVariables;
use crate::settings::RouteSettings;

/// A matched route for one request.
#[derive(Debug, Clone)]
pub struct Route {
    pub settings: Arc<RouteSettings>,
    /// Values captured by the route pattern.
    pub variables: PathVariables,
    /// Part of the path the pattern did not consume, appended upstream.
    pub path_suffix: String,
}

impl Route {
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name)
    }
}
