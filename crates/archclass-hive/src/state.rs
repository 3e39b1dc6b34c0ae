use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::store::ArtifactStore;

#[derive(Clone)]
pub struct AppState {
    pub store: ArtifactStore,
    /// Echoed into `meta.database`/`meta.backend` on every response.
    pub database_label: Arc<String>,
}

impl AppState {
    pub fn new(db: Pool<Postgres>, database_label: String) -> Self {
        Self {
            store: ArtifactStore::new(db),
            database_label: Arc::new(database_label),
        }
    }
}
