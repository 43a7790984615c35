use crate::session::SessionController;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one controller instance owned by the composition root
    pub controller: SessionController,
}

impl AppState {
    pub fn new(controller: SessionController) -> Self {
        Self { controller }
    }
}
