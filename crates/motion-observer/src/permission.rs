use async_trait::async_trait;
use std::fmt;
use tracing::{info, warn};

use crate::error::MotionError;
use crate::platform::Platform;

/// Raw sensor families a permission prompt is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sensor {
    Orientation,
    Motion,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::Orientation => f.write_str("orientation"),
            Sensor::Motion => f.write_str("motion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

/// Host-provided permission prompt.
///
/// Only consulted on platforms whose `Platform::requires_permission` is set.
/// Implementations return `MotionError::GestureRequired` when the host cannot
/// prompt outside of a user gesture.
#[async_trait(?Send)]
pub trait PermissionGate {
    async fn request(&self, sensor: Sensor) -> Result<PermissionState, MotionError>;
}

/// Request every sensor in `sensors`, failing on the first refusal.
pub(crate) async fn request_sensors(
    platform: &Platform,
    gate: Option<&dyn PermissionGate>,
    sensors: &[Sensor],
) -> Result<(), MotionError> {
    if !platform.requires_permission {
        return Ok(());
    }
    let gate = gate.ok_or(MotionError::PermissionUnavailable)?;

    for &sensor in sensors {
        match gate.request(sensor).await {
            Ok(PermissionState::Granted) => info!(%sensor, "Sensor permission granted"),
            Ok(PermissionState::Denied) => {
                warn!(%sensor, "Sensor permission denied");
                return Err(MotionError::PermissionDenied { sensor });
            }
            Err(e) => {
                warn!(%sensor, ?e, "Sensor permission request failed");
                return Err(e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::AxisConvention;
    use std::cell::RefCell;

    struct ScriptedGate {
        motion: PermissionState,
        asked: RefCell<Vec<Sensor>>,
    }

    #[async_trait(?Send)]
    impl PermissionGate for ScriptedGate {
        async fn request(&self, sensor: Sensor) -> Result<PermissionState, MotionError> {
            self.asked.borrow_mut().push(sensor);
            Ok(match sensor {
                Sensor::Orientation => PermissionState::Granted,
                Sensor::Motion => self.motion,
            })
        }
    }

    const GATED: Platform = Platform {
        requires_permission: true,
        convention: AxisConvention::Inverted,
    };

    #[tokio::test]
    async fn ungated_platform_skips_the_gate() {
        let result = request_sensors(&Platform::STANDARD, None, &[Sensor::Motion]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn gated_platform_without_gate_fails() {
        let result = request_sensors(&GATED, None, &[Sensor::Orientation]).await;
        assert!(matches!(result, Err(MotionError::PermissionUnavailable)));
    }

    #[tokio::test]
    async fn denial_stops_at_first_refused_sensor() {
        let gate = ScriptedGate {
            motion: PermissionState::Denied,
            asked: RefCell::new(Vec::new()),
        };
        let sensors = [Sensor::Motion, Sensor::Orientation];
        let result = request_sensors(&GATED, Some(&gate), &sensors).await;
        assert!(matches!(
            result,
            Err(MotionError::PermissionDenied {
                sensor: Sensor::Motion
            })
        ));
        assert_eq!(*gate.asked.borrow(), vec![Sensor::Motion]);
    }

    #[tokio::test]
    async fn grants_every_requested_sensor() {
        let gate = ScriptedGate {
            motion: PermissionState::Granted,
            asked: RefCell::new(Vec::new()),
        };
        request_sensors(&GATED, Some(&gate), &[Sensor::Orientation, Sensor::Motion])
            .await
            .unwrap();
        assert_eq!(gate.asked.borrow().len(), 2);
    }
}
