use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use meter_core::TickReport;

/// Shared state of the read-only API. Handlers open the store per request;
/// the scheduler publishes each finished tick into `last_tick`.
#[derive(Clone)]
pub struct HttpState {
    pub db_path: PathBuf,
    pub last_tick: Arc<RwLock<Option<TickReport>>>,
}

impl HttpState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            last_tick: Arc::new(RwLock::new(None)),
        }
    }
}
