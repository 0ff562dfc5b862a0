//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_submit_handler;
mod simulated_api_submit_handler;

pub use console_submit_handler::ConsoleSubmitHandler;
pub use simulated_api_submit_handler::{SIMULATED_FAILURE_MESSAGE, SimulatedApiSubmitHandler};
