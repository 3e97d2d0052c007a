pub mod collect;
pub mod config;
pub mod engine;
pub mod error;
pub mod log;
pub mod naming;
pub mod runner;

pub use error::{Error, ErrorList, Result};
