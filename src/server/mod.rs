pub mod builder;
pub mod error;
pub mod handler;
pub mod listener;

pub use builder::ServerBuilder;
pub use error::ApiError;
pub use handler::RequestHandler;
