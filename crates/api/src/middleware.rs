//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use reelvote_core::{
    GenreVoteService, GroupStore, NominationService, RegistryService, SelectorService,
    SessionService, SharedCatalog, SwipeService, VetoService,
};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub registry_service: RegistryService,
    pub nomination_service: NominationService,
    pub genre_vote_service: GenreVoteService,
    pub selector_service: SelectorService,
    pub swipe_service: SwipeService,
    pub veto_service: VetoService,
    pub session_service: SessionService,
    pub store: Arc<GroupStore>,
}

impl AppState {
    /// Wire up all services over a shared store and catalog.
    #[must_use]
    pub fn new(store: Arc<GroupStore>, catalog: SharedCatalog) -> Self {
        Self {
            registry_service: RegistryService::new(Arc::clone(&store)),
            nomination_service: NominationService::new(Arc::clone(&store)),
            genre_vote_service: GenreVoteService::new(Arc::clone(&store)),
            selector_service: SelectorService::new(Arc::clone(&store), Arc::clone(&catalog)),
            swipe_service: SwipeService::new(Arc::clone(&store), catalog),
            veto_service: VetoService::new(Arc::clone(&store)),
            session_service: SessionService::new(Arc::clone(&store)),
            store,
        }
    }
}

/// Authentication middleware.
///
/// Resolves the bearer token into a participant session and stores it in
/// request extensions for the extractors to pick up. Unknown or missing
/// tokens are not an error here; endpoints that require a session reject
/// via the extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Some(session) = state.store.resolve_token(token).await
    {
        req.extensions_mut().insert(session);
    }

    next.run(req).await
}
