//! GDB (GNU Debugger) console-mode driver

pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod parser;
pub mod queue;
pub mod session;
pub mod sink;
pub mod transport;
pub mod types;

pub use config::{GdbConfig, DEFAULT_PROMPT};
pub use driver::{Driver, DriverEvent};
pub use error::{DriverError, Result};
pub use session::Session;
pub use transport::{GdbProcess, Transport};
pub use types::*;
