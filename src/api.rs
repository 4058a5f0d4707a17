//! HTTP API for the bot
//!
//! Platform adapters post every inbound message here and relay the reply.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::db::Database;
use crate::runtime::Router;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router<Database>>,
    pub db: Database,
}

impl AppState {
    pub fn new(router: Router<Database>) -> Self {
        let db = router.store().clone();
        Self {
            router: Arc::new(router),
            db,
        }
    }
}
