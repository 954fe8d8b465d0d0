pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod retry;
pub mod server;

pub use error::{Error, Result};
