//! Admin activity logging middleware.
//!
//! Runs after `session_auth` on the `/api/admin` tree. Once the handler has
//! produced a successful response (status below 400), the request is
//! classified by method and matched route and written to
//! `admin_activities`. Unclassified routes (dashboards, health, template
//! download) are not recorded.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{Method, header::USER_AGENT},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::DbPool,
    middleware::auth::AuthContext,
    models::admin_activity::{ActivityTarget, NewActivity},
    services::activity_service,
};

const ADMIN_PREFIX: &str = "/api/admin";

/// Action name and target type for an admin route, if it is audited.
///
/// `path` is the matched route template, with or without the `/api/admin`
/// prefix (e.g. `/users/{id}/status`).
pub fn classify(method: &Method, path: &str) -> Option<(&'static str, ActivityTarget)> {
    use ActivityTarget::*;

    let path = path.strip_prefix(ADMIN_PREFIX).unwrap_or(path);
    let entry = match (method.as_str(), path) {
        ("GET", "/users") => ("view_users", User),
        ("GET", "/users/export") => ("export_users", Data),
        ("GET", "/users/{id}") => ("view_user_details", User),
        ("PATCH", "/users/{id}/status") => ("update_user_status", User),

        ("GET", "/subscriptions") => ("view_subscriptions", Subscription),
        ("GET", "/subscriptions/export") => ("export_subscriptions", Data),
        ("PATCH", "/subscriptions/{id}") => ("update_subscription", Subscription),
        ("GET", "/revenue/analytics") => ("view_revenue_analytics", Data),

        ("GET", "/investors") => ("view_investors", Investor),
        ("POST", "/investors") => ("create_investor", Investor),
        ("PATCH", "/investors/{id}") => ("update_investor", Investor),
        ("DELETE", "/investors/{id}") => ("delete_investor", Investor),
        ("POST", "/investors/bulk-delete") => ("bulk_delete_investors", Investor),
        ("GET", "/investors/export") => ("export_investors", Data),
        ("POST", "/investors/upload-excel") => ("upload_investors_excel", Investor),
        ("POST", "/investors/upload-workbook") => ("upload_investors_workbook", Investor),

        ("GET", "/potential-investors") => ("view_potential_investors", Investor),
        ("GET", "/potential-investors/{id}") => ("view_potential_investor", Investor),
        ("PUT", "/potential-investors/{id}") => ("update_potential_investor", Investor),
        ("POST", "/potential-investors/{id}/verify") => ("verify_potential_investor", Investor),
        ("POST", "/potential-investors/{id}/approve") => ("approve_potential_investor", Investor),
        ("POST", "/potential-investors/{id}/reject") => ("reject_potential_investor", Investor),
        ("POST", "/potential-investors/{id}/reopen") => ("reopen_potential_investor", Investor),
        ("POST", "/potential-investors/upload") => ("upload_potential_investors", Investor),

        _ => return None,
    };
    Some(entry)
}

/// First path segment that is a UUID, taken as the target record.
pub fn target_id(path: &str) -> Option<Uuid> {
    path.split('/').find_map(|segment| Uuid::parse_str(segment).ok())
}

pub async fn record_admin_activity(
    State(pool): State<DbPool>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let matched = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());
    let classified = matched.as_deref().and_then(|path| classify(&method, path));
    let admin_id = request.extensions().get::<AuthContext>().map(|ctx| ctx.user_id);

    let (Some((action, target_type)), Some(admin_id)) = (classified, admin_id) else {
        return next.run(request).await;
    };

    let uri = request.uri().clone();
    let ip_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    if response.status().as_u16() < 400 {
        let activity = NewActivity {
            admin_id,
            action,
            target_type,
            target_id: target_id(uri.path()),
            metadata: json!({
                "method": method.as_str(),
                "path": uri.path(),
                "query": uri.query().unwrap_or_default(),
            }),
            ip_address,
            user_agent,
        };

        if let Err(err) = activity_service::record(&pool, &activity).await {
            tracing::warn!(error = %err, action, "failed to record admin activity");
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_admin_routes() {
        assert_eq!(
            classify(&Method::PATCH, "/api/admin/users/{id}/status"),
            Some(("update_user_status", ActivityTarget::User))
        );
        assert_eq!(
            classify(&Method::GET, "/investors/export"),
            Some(("export_investors", ActivityTarget::Data))
        );
        assert_eq!(
            classify(&Method::POST, "/api/admin/potential-investors/{id}/approve"),
            Some(("approve_potential_investor", ActivityTarget::Investor))
        );
    }

    #[test]
    fn dashboards_and_templates_are_not_audited() {
        assert_eq!(classify(&Method::GET, "/api/admin/dashboard/stats"), None);
        assert_eq!(classify(&Method::GET, "/api/admin/investors/template"), None);
        assert_eq!(classify(&Method::DELETE, "/api/admin/users/{id}"), None);
    }

    #[test]
    fn target_is_first_uuid_segment() {
        let id = Uuid::new_v4();
        assert_eq!(target_id(&format!("/api/admin/users/{id}/status")), Some(id));
        assert_eq!(target_id("/api/admin/users"), None);
    }
}
