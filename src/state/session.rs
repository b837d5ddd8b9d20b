//! Session state
//!
//! One struct holding what the user has entered: the function, the domain
//! and whether the graph needs redrawing. Playback position lives in the
//! playback controller, not here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::expr::FunctionSpec;
use crate::sampling::Domain;

/// User-editable state for one graphing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub spec: FunctionSpec,
    pub domain: Domain,
    #[serde(skip)]
    render_requested: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(FunctionSpec::default(), Domain::default())
    }
}

impl Session {
    pub fn new(spec: FunctionSpec, domain: Domain) -> Self {
        Self {
            spec,
            domain,
            render_requested: false,
        }
    }

    /// Replace the function definition.
    ///
    /// Entering `collatz` also moves the domain to `[0, 100]`.
    pub fn set_expression(&mut self, text: impl Into<String>) {
        self.spec = FunctionSpec::new(text);
        if self.spec.is_collatz() {
            self.domain = Domain::collatz();
            debug!("Collatz selected, domain reset to [0, 100]");
        }
    }

    pub fn set_lower(&mut self, lower: f64) {
        self.domain.lower = lower;
    }

    pub fn set_upper(&mut self, upper: f64) {
        self.domain.upper = upper;
    }

    /// Back to `Math.sin(x)` over `[-10, 10]`
    pub fn restore_defaults(&mut self) {
        self.spec = FunctionSpec::default();
        self.domain = Domain::default();
    }

    /// Ask the host to redraw the graph
    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// True if a redraw was requested since the last call
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session() {
        let session = Session::default();
        assert_eq!(session.spec.expression_text(), "Math.sin(x)");
        assert_eq!(session.domain, Domain::new(-10.0, 10.0));
    }

    #[test]
    fn test_collatz_resets_domain() {
        let mut session = Session::default();
        session.set_lower(-500.0);
        session.set_expression("COLLATZ");
        assert_eq!(session.domain, Domain::new(0.0, 100.0));
    }

    #[test]
    fn test_other_expressions_keep_domain() {
        let mut session = Session::default();
        session.set_upper(42.0);
        session.set_expression("x * x");
        assert_eq!(session.domain, Domain::new(-10.0, 42.0));
        assert_eq!(session.spec.expression_text(), "x * x");
    }

    #[test]
    fn test_render_request_is_taken_once() {
        let mut session = Session::default();
        assert!(!session.take_render_request());
        session.request_render();
        assert!(session.take_render_request());
        assert!(!session.take_render_request());
    }

    #[test]
    fn test_serde() {
        let session = Session::new(FunctionSpec::new("x * x"), Domain::new(-1.0, 1.0));
        let json = serde_json::to_string(&session).unwrap();
        assert_eq!(json, r#"{"spec":"x * x","domain":{"lower":-1.0,"upper":1.0}}"#);
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
