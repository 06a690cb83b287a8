//! Application layer - use cases and message orchestration

pub mod handlers;
pub mod usecases;
