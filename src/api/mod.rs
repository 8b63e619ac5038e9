pub mod handlers;
pub mod routes;

pub use handlers::{AppContext, AppState};
pub use routes::create_router;
