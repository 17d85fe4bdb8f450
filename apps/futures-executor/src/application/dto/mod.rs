//! Data Transfer Objects (DTOs)
//!
//! Use case inputs and outputs.

mod workflow_dto;

pub use workflow_dto::{WorkflowFailure, WorkflowParams, WorkflowReport};
