//! Infrastructure layer - shared server state

pub mod matchmaking;
pub mod storage;
