//! Gateway and route settings.

use std::sync::Arc;

use crate::expression::{ExpressionContext, ExpressionEvaluator};
use crate::pattern::CompiledPattern;
use crate::settings::proxy::ProxySettings;

/// One immutable snapshot of the whole configuration.
#[derive(Debug, Default)]
pub struct GatewaySettings {
    pub system: SystemSettings,
    /// Routes in configuration order.
    pub routes: Vec<Arc<RouteSettings>>,
}

#[derive(Debug, Clone)]
pub struct SystemSettings {
    pub route_cache_max_count: usize,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            route_cache_max_count: 10_000,
        }
    }
}

/// A validated route: its compiled pattern, an evaluator that knows the
/// pattern's variables, and what to do with matching requests.
#[derive(Debug)]
pub struct RouteSettings {
    route: String,
    pattern: Arc<CompiledPattern>,
    evaluator: ExpressionEvaluator,
    proxy: Option<Arc<ProxySettings>>,
}

impl RouteSettings {
    pub fn new(route: impl Into<String>, pattern: Arc<CompiledPattern>, proxy: Option<ProxySettings>) -> Self {
        let evaluator = ExpressionEvaluator::with_route_variables(pattern.variables());
        Self {
            route: route.into(),
            pattern,
            evaluator,
            proxy: proxy.map(Arc::new),
        }
    }

    /// The route pattern as written in configuration.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn proxy(&self) -> Option<&Arc<ProxySettings>> {
        self.proxy.as_ref()
    }

    pub fn evaluator(&self) -> &ExpressionEvaluator {
        &self.evaluator
    }

    /// Evaluate an expression in the scope of this route.
    pub fn evaluate<C: ExpressionContext + ?Sized>(&self, context: &C, expression: &str) -> String {
        self.evaluator.evaluate(context, expression)
    }
}
