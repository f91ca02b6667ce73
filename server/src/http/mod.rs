mod dto;
mod error;
mod handlers;
mod server;
mod state;


pub use dto::{ErrorResponse, InfoResponse};
pub use handlers::LIVENESS_PATH;
pub use server::{router, start_server, with_request_timeout};
pub use state::AppState;
