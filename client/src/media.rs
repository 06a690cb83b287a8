//! Local capture seam.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which tracks to request from the capture devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        MediaConstraints {
            audio: true,
            video: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media permission denied: {0}")]
    PermissionDenied(String),

    #[error("Media device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Owning handle to the local capture tracks
pub trait LocalMedia: Send {
    fn audio_enabled(&self) -> bool;
    fn set_audio_enabled(&mut self, enabled: bool);
    fn video_enabled(&self) -> bool;
    fn set_video_enabled(&mut self, enabled: bool);
    /// Stop every track; the handle is unusable afterwards
    fn stop(&mut self);
}

pub trait MediaDevices: Send {
    fn acquire(&mut self, constraints: &MediaConstraints) -> Result<Box<dyn LocalMedia>, MediaError>;
}
