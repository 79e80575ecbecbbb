use glam::{Quat, Vec3};
use motion_math::{quaternion_to_matrix, Matrix};
use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::MotionError;

/// Public granularity of observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MotionType {
    Orientation,
    Acceleration,
    AccelerationIncludingGravity,
}

impl MotionType {
    pub const ALL: [MotionType; 3] = [
        MotionType::Orientation,
        MotionType::Acceleration,
        MotionType::AccelerationIncludingGravity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MotionType::Orientation => "orientation",
            MotionType::Acceleration => "acceleration",
            MotionType::AccelerationIncludingGravity => "accelerationincludinggravity",
        }
    }
}

impl fmt::Display for MotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MotionType {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MotionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MotionError::UnknownMotionType(s.to_string()))
    }
}

/// Platform-level raw event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawStream {
    RelativeOrientation,
    AbsoluteOrientation,
    Motion,
}

/// Orientation reading as delivered by the platform. Angles are in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawOrientation {
    /// Monotonic arrival time.
    pub timestamp: Duration,
    /// Rotation about the device Z axis.
    pub alpha: Option<f32>,
    /// Rotation about the device X axis.
    pub beta: Option<f32>,
    /// Rotation about the device Y axis.
    pub gamma: Option<f32>,
    pub absolute: bool,
    pub compass_heading: Option<f32>,
    pub compass_accuracy: Option<f32>,
}

/// One three-axis reading where any axis may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawAxes {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl RawAxes {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// True when at least one present axis reads something other than zero.
    pub fn is_nonzero(&self) -> bool {
        [self.x, self.y, self.z]
            .into_iter()
            .any(|axis| axis.is_some_and(|v| v != 0.0))
    }
}

/// Motion reading as delivered by the platform (m/s^2).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMotion {
    pub timestamp: Duration,
    /// Reading with gravity removed, when the platform really provides it.
    pub acceleration: RawAxes,
    pub acceleration_including_gravity: RawAxes,
    /// Sampling interval in milliseconds.
    pub interval_ms: f32,
}

/// A raw event tagged with the stream that delivered it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    RelativeOrientation(RawOrientation),
    AbsoluteOrientation(RawOrientation),
    Motion(RawMotion),
}

impl RawEvent {
    pub fn stream(&self) -> RawStream {
        match self {
            RawEvent::RelativeOrientation(_) => RawStream::RelativeOrientation,
            RawEvent::AbsoluteOrientation(_) => RawStream::AbsoluteOrientation,
            RawEvent::Motion(_) => RawStream::Motion,
        }
    }

    pub fn timestamp(&self) -> Duration {
        match self {
            RawEvent::RelativeOrientation(o) | RawEvent::AbsoluteOrientation(o) => o.timestamp,
            RawEvent::Motion(m) => m.timestamp,
        }
    }
}

/// Normalized device orientation.
#[derive(Debug, Clone)]
pub struct OrientationEvent {
    /// Device-to-world rotation.
    pub quaternion: Quat,
    /// Euler angles in radians, as reported (Z, X, Y device axes).
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
    pub absolute: bool,
    /// Compass heading in radians, when the platform reports one.
    pub compass_heading: Option<f32>,
    /// Compass accuracy in radians.
    pub compass_accuracy: Option<f32>,
    matrix: OnceCell<Matrix>,
    propagation_stopped: bool,
}

impl OrientationEvent {
    pub(crate) fn new(quaternion: Quat, angles: Vec3, absolute: bool) -> Self {
        Self {
            quaternion,
            alpha: angles.x,
            beta: angles.y,
            gamma: angles.z,
            absolute,
            compass_heading: None,
            compass_accuracy: None,
            matrix: OnceCell::new(),
            propagation_stopped: false,
        }
    }

    /// Rotation matrix for `quaternion`, computed on first access.
    pub fn matrix(&self) -> &Matrix {
        self.matrix.get_or_init(|| quaternion_to_matrix(self.quaternion))
    }
}

/// Acceleration in the device frame (m/s^2).
#[derive(Debug, Clone, Copy)]
pub struct AccelerationEvent {
    pub acceleration: Vec3,
    /// Sampling interval in milliseconds.
    pub interval_ms: f32,
    /// Set when the value was derived from orientation rather than measured.
    pub inaccurate: bool,
    propagation_stopped: bool,
}

impl AccelerationEvent {
    pub(crate) fn new(acceleration: Vec3, interval_ms: f32, inaccurate: bool) -> Self {
        Self {
            acceleration,
            interval_ms,
            inaccurate,
            propagation_stopped: false,
        }
    }
}

/// Event handed to listeners, tagged by motion type.
#[derive(Debug, Clone)]
pub enum MotionEvent {
    Orientation(OrientationEvent),
    Acceleration(AccelerationEvent),
    AccelerationIncludingGravity(AccelerationEvent),
}

impl MotionEvent {
    pub fn motion_type(&self) -> MotionType {
        match self {
            MotionEvent::Orientation(_) => MotionType::Orientation,
            MotionEvent::Acceleration(_) => MotionType::Acceleration,
            MotionEvent::AccelerationIncludingGravity(_) => {
                MotionType::AccelerationIncludingGravity
            }
        }
    }

    /// Prevent any later listener in the current dispatch pass from running.
    pub fn stop_propagation(&mut self) {
        match self {
            MotionEvent::Orientation(e) => e.propagation_stopped = true,
            MotionEvent::Acceleration(e) | MotionEvent::AccelerationIncludingGravity(e) => {
                e.propagation_stopped = true
            }
        }
    }

    pub fn is_propagation_stopped(&self) -> bool {
        match self {
            MotionEvent::Orientation(e) => e.propagation_stopped,
            MotionEvent::Acceleration(e) | MotionEvent::AccelerationIncludingGravity(e) => {
                e.propagation_stopped
            }
        }
    }

    pub fn as_orientation(&self) -> Option<&OrientationEvent> {
        match self {
            MotionEvent::Orientation(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_acceleration(&self) -> Option<&AccelerationEvent> {
        match self {
            MotionEvent::Acceleration(e) | MotionEvent::AccelerationIncludingGravity(e) => Some(e),
            MotionEvent::Orientation(_) => None,
        }
    }
}
