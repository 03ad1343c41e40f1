pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod progress;
pub mod registry;
pub mod sequence;
pub mod sequences;
pub mod sim;
pub mod types;

pub use error::{ChainrunError, Result};
