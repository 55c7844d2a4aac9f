//! # classchat-session
//!
//! Session layer: owns the authenticated identity and its bindings into the
//! channel store, presence registry, and typing tracker. This is the facade
//! the (excluded) UI layer talks to.

pub mod dto;
pub mod services;

// Re-export commonly used types at crate root
pub use dto::{LoginRequest, RegisterRequest};
pub use services::{AuthService, ServiceContext, SessionManager, SessionState};
