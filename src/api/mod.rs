pub mod routes;

pub use routes::{create_router, AppState, MAX_HISTORY_LIMIT};
