//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: The exchange gateway interface
//! - **Use Cases**: Leverage, submission, reconciliation and the workflow
//!   that runs them in order
//! - **DTOs**: Workflow inputs and outputs

pub mod dto;
pub mod ports;
pub mod use_cases;

pub use dto::*;
pub use ports::*;
pub use use_cases::*;
