//! Request types crossing the facade boundary

mod requests;

pub use requests::{LoginRequest, RegisterRequest};
