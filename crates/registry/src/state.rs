//! Handler state injected into the router

use std::sync::Arc;

use axum::extract::FromRef;

use crate::lines::LineCatalog;
use crate::store::PositionStore;

/// Everything the handlers share.
///
/// Handlers extract only the part they need (`State<Arc<PositionStore>>`,
/// `State<Arc<LineCatalog>>`) through [`FromRef`].
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<PositionStore>,
    pub lines: Arc<LineCatalog>,
}

impl AppState {
    /// State with an empty line catalog
    pub fn new(store: Arc<PositionStore>) -> Self {
        Self {
            store,
            lines: Arc::new(LineCatalog::default()),
        }
    }

    pub fn with_lines(mut self, lines: Arc<LineCatalog>) -> Self {
        self.lines = lines;
        self
    }
}

impl FromRef<AppState> for Arc<PositionStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.store)
    }
}

impl FromRef<AppState> for Arc<LineCatalog> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.lines)
    }
}
