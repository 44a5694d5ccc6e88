//! Request handlers.

pub mod generations;
pub mod health;
pub mod signed_urls;

pub use generations::*;
pub use health::*;
pub use signed_urls::*;
