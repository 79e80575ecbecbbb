use glam::Vec3;
use std::sync::OnceLock;

/// Sign convention the platform uses for acceleration axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisConvention {
    /// Device at rest, face up, reads +g on Z.
    Standard,
    /// Every axis is reported with the opposite sign.
    Inverted,
}

impl AxisConvention {
    /// Per-axis multipliers that bring a reading into the standard convention.
    pub fn signs(self) -> Vec3 {
        match self {
            AxisConvention::Standard => Vec3::ONE,
            AxisConvention::Inverted => Vec3::NEG_ONE,
        }
    }
}

/// Process-wide facts about the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Sensor events are gated behind a permission prompt.
    pub requires_permission: bool,
    pub convention: AxisConvention,
}

impl Platform {
    pub const STANDARD: Platform = Platform {
        requires_permission: false,
        convention: AxisConvention::Standard,
    };

    /// The build target's platform, detected once per process.
    pub fn current() -> Platform {
        static CURRENT: OnceLock<Platform> = OnceLock::new();
        *CURRENT.get_or_init(|| {
            let platform = if cfg!(target_os = "ios") {
                Platform {
                    requires_permission: true,
                    convention: AxisConvention::Inverted,
                }
            } else {
                Platform::STANDARD
            };
            tracing::debug!(?platform, "Detected platform");
            platform
        })
    }

    /// Apply explicit overrides on top of this platform.
    pub fn with_overrides(
        self,
        requires_permission: Option<bool>,
        inverted_axes: Option<bool>,
    ) -> Self {
        Platform {
            requires_permission: requires_permission.unwrap_or(self.requires_permission),
            convention: match inverted_axes {
                Some(true) => AxisConvention::Inverted,
                Some(false) => AxisConvention::Standard,
                None => self.convention,
            },
        }
    }
}
