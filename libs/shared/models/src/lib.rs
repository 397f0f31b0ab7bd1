pub mod error;
pub mod extract;

pub use error::{AppError, ValidationError};
pub use extract::JsonBody;
