//! Policy enforcement on the matched route.

use authcore_core::{AuthcoreError, RequestContext, Subject};
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Allow or deny the request by `(subject, route path, method)`.
///
/// Denied guests get Unauthenticated so they know to sign in; denied
/// authenticated subjects get PermissionDenied. Matcher failures are
/// surfaced as errors, never treated as allow.
pub async fn authorize(
    State(state): State<AppState>,
    matched: MatchedPath,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = req
        .extensions()
        .get::<Subject>()
        .cloned()
        .unwrap_or(Subject::Guest);
    let ctx = req
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| RequestContext::new().with_timeout(state.request_timeout));
    let object = matched.as_str();
    let action = req.method().as_str();

    let decision = state.enforcer.decide(&ctx, &subject, object, action).await?;
    if !decision.allowed {
        warn!(
            sub = %subject,
            obj = object,
            act = action,
            roles = ?decision.roles,
            "permission denied"
        );
        let err = if subject.is_guest() {
            AuthcoreError::unauthenticated("authentication is required")
        } else {
            AuthcoreError::permission_denied("")
        };
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
