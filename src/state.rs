use std::sync::Arc;

use crate::modules::video::service::UploadOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub uploads: Arc<UploadOrchestrator>,
}

impl AppState {
    pub fn new(uploads: Arc<UploadOrchestrator>) -> Self {
        Self { uploads }
    }
}
