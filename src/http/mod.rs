mod error;
mod handlers;
mod router;
mod transport;
mod types;

pub use transport::serve;
pub use types::AppState;
