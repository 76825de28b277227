//! API route modules.

pub mod assistant;
pub mod documents;
pub mod interviews;
pub mod session;
pub mod users;
