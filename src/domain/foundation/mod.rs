//! Foundation value objects and error types shared by every domain module.

mod errors;
mod phone;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use phone::PhoneNumber;
pub use timestamp::Timestamp;
