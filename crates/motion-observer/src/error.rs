use thiserror::Error;

use crate::permission::Sensor;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Permission to read {sensor} events was denied")]
    PermissionDenied { sensor: Sensor },
    #[error("Permission can only be requested from a user gesture")]
    GestureRequired,
    #[error("Platform requires sensor permission but no permission gate is available")]
    PermissionUnavailable,
    #[error("Permission gate failed: {0}")]
    Gate(String),
    #[error("Unknown motion type `{0}`")]
    UnknownMotionType(String),
}
