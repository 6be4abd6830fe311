//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use reelvote_core::SessionToken;

/// Authenticated participant extractor.
#[derive(Debug, Clone)]
pub struct AuthParticipant(pub SessionToken);

impl<S> FromRequestParts<S> for AuthParticipant
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware when the bearer token resolves
        parts
            .extensions
            .get::<SessionToken>()
            .cloned()
            .map(AuthParticipant)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Optional authenticated participant extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthParticipant(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for MaybeAuthParticipant
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionToken>().cloned()))
    }
}
