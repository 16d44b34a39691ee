pub mod client;
#[cfg(feature = "http")]
pub mod http;
pub mod prompt;
pub mod protocol;
pub mod retry;
pub mod voice;

pub use client::*;
pub use protocol::*;
pub use retry::*;
