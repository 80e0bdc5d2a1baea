pub mod contracts;
pub mod estimates;
pub mod health;
pub mod listings;

use crate::config::Config;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}
