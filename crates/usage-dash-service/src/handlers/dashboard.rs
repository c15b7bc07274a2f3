//! Dashboard page and root redirect.

use axum::response::{Html, Redirect};

/// Path the dashboard is served under.
pub const DASHBOARD_PATH: &str = "/dashboard/";

const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");

/// Redirect `/` and `/dashboard` to the dashboard page.
pub async fn redirect_to_dashboard() -> Redirect {
    Redirect::temporary(DASHBOARD_PATH)
}

/// Serve the dashboard page.
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
