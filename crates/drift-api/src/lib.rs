pub mod files;
pub mod messages;
pub mod password;
pub mod rooms;
pub mod sweep;

use std::sync::Arc;

use drift_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
}
