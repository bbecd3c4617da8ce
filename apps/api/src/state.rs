use std::sync::Arc;

use crate::jobs::factory::JobFactory;
use crate::sheets::candidates::CandidateRowWriter;
use crate::store::JobStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every client is built once in `main` and handed in here.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub factory: Arc<JobFactory>,
    pub candidates: Arc<CandidateRowWriter>,
}
