//! Navigation Seam
//!
//! Route changes the flow issues: back to plan selection when nothing is
//! resolved, and to the dashboard after a completed purchase.

/// Route shown after a completed purchase
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Route for picking a plan when checkout has nothing to work with
pub const PLAN_SELECTION_ROUTE: &str = "/pricing";

/// Navigation capability of the host application
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}
