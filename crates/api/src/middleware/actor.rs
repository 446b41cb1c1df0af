//! Gateway identity extraction.
//!
//! The service sits behind an authenticating gateway that forwards the
//! caller's identity in headers. This middleware turns those headers into
//! an [`Actor`] extension; it does not authenticate anything itself.

use std::net::IpAddr;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;
use domain::models::{Actor, ActorRole};

/// Client IP taken from `X-Forwarded-For`, stored in request extensions.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

/// Middleware that requires gateway identity headers.
///
/// Reads `X-Actor-Id` (UUID) and `X-Actor-Name`; both are required.
/// `X-Actor-Role` defaults to `user` when absent or unrecognized. The
/// resulting [`Actor`] and [`ClientIp`] are stored in request extensions.
pub async fn require_actor(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&req)?;
    let client_ip = client_ip_from_headers(&req);

    req.extensions_mut().insert(actor);
    req.extensions_mut().insert(client_ip);

    Ok(next.run(req).await)
}

/// Middleware that rejects non-admin actors. Must run after [`require_actor`].
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| ApiError::Unauthorized("Missing caller identity".into()))?;

    if !actor.is_admin() {
        return Err(ApiError::Forbidden("Admin role required".into()));
    }

    Ok(next.run(req).await)
}

fn actor_from_headers(req: &Request<Body>) -> Result<Actor, ApiError> {
    let id = header_str(req, "X-Actor-Id")
        .ok_or_else(|| ApiError::Unauthorized("Missing X-Actor-Id header".into()))?;
    let id = Uuid::parse_str(id)
        .map_err(|_| ApiError::Unauthorized("X-Actor-Id is not a valid UUID".into()))?;

    let username = header_str(req, "X-Actor-Name")
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-Actor-Name header".into()))?
        .to_string();

    // Unknown or absent role degrades to the least-privileged one.
    let role = ActorRole::parse(header_str(req, "X-Actor-Role").unwrap_or(""));

    Ok(Actor { id, username, role })
}

fn client_ip_from_headers(req: &Request<Body>) -> ClientIp {
    // First hop in X-Forwarded-For is the original client.
    let ip = header_str(req, "X-Forwarded-For")
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    ClientIp(ip)
}

fn header_str<'a>(req: &'a Request<Body>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}
