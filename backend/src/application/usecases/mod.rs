//! Use cases - Business logic operations
pub mod matchmaking_usecase;
pub mod signaling_usecase;

pub use matchmaking_usecase::MatchmakingUseCase;
pub use signaling_usecase::SignalingUseCase;
