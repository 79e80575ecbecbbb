use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Capability detection and wiring.
    pub observer: ObserverConfig,
    /// Overrides for the detected platform.
    pub platform: PlatformConfig,
    /// Synthetic sensor stream used by the demo binary.
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// How long to wait for the first evidence of a capability (milliseconds).
    pub grace_window_ms: u64,
    /// Keep sampling orientation while only acceleration is observed, so
    /// gravity can be subtracted on platforms that do not do it themselves.
    pub implicit_orientation_sampling: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            grace_window_ms: 20,
            implicit_orientation_sampling: true,
        }
    }
}

/// `None` keeps whatever was detected for the build target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Sensor access is gated behind a permission prompt.
    pub requires_permission: Option<bool>,
    /// The platform reports acceleration with every axis inverted.
    pub inverted_axes: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Time between synthetic samples (milliseconds).
    pub sample_interval_ms: u64,
    /// Number of samples to emit before exiting. 0 runs until Ctrl-C.
    pub samples: u32,
    /// Motion types to observe, by name. Empty observes everything.
    pub observe: Vec<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 16,
            samples: 300,
            observe: Vec::new(),
        }
    }
}
