//! Runtime detection of platform sensor quirks.
//!
//! Platforms do not reliably report whether they deliver absolute orientation
//! or true gravity-free acceleration. Both are inferred from the first events
//! of a session: positive evidence resolves a capability immediately, and a
//! short grace window bounds how long we wait before assuming it is absent.

use std::time::Duration;
use tracing::{info, trace};

/// Default length of the grace window.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_millis(20);

/// Tri-state capability flag.
///
/// Starts `Unknown`, picks up a deadline when measurement begins, and once
/// resolved to `True` or `False` never changes until the detector is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Unknown {
        deadline: Option<Duration>,
    },
    False,
    True,
}

impl Default for Capability {
    fn default() -> Self {
        Capability::Unknown { deadline: None }
    }
}

impl Capability {
    pub fn is_resolved(self) -> bool {
        !matches!(self, Capability::Unknown { .. })
    }

    /// `Some(available)` once resolved.
    pub fn resolved(self) -> Option<bool> {
        match self {
            Capability::Unknown { .. } => None,
            Capability::False => Some(false),
            Capability::True => Some(true),
        }
    }

    fn expired(self, now: Duration) -> bool {
        matches!(self, Capability::Unknown { deadline: Some(d) } if now >= d)
    }
}

/// What the session should do with an orientation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Synthesize (and possibly dispatch) this event.
    pub admit: bool,
    /// The capability resolved while handling this event.
    pub resolved: Option<bool>,
}

impl Verdict {
    const SUPPRESS: Verdict = Verdict {
        admit: false,
        resolved: None,
    };
    const ADMIT: Verdict = Verdict {
        admit: true,
        resolved: None,
    };
}

/// Which acceleration path a motion event takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravitySource {
    /// The platform's gravity-free reading is trusted.
    Measured,
    /// Gravity must be subtracted using the last known orientation.
    Derived,
}

/// Snapshot of both capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub absolute_orientation: Capability,
    pub gravity_exclusion: Capability,
}

pub struct CapabilityDetector {
    grace_window: Duration,
    absolute_orientation: Capability,
    gravity_exclusion: Capability,
}

impl CapabilityDetector {
    pub fn new(grace_window: Duration) -> Self {
        Self {
            grace_window,
            absolute_orientation: Capability::default(),
            gravity_exclusion: Capability::default(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            absolute_orientation: self.absolute_orientation,
            gravity_exclusion: self.gravity_exclusion,
        }
    }

    pub fn absolute_orientation(&self) -> Capability {
        self.absolute_orientation
    }

    /// Forget everything learned so far. Pending deadlines are dropped.
    pub fn reset(&mut self) {
        self.absolute_orientation = Capability::default();
        self.gravity_exclusion = Capability::default();
    }

    /// A relative orientation event arrived.
    pub fn on_relative_orientation(&mut self, now: Duration) -> Verdict {
        match self.absolute_orientation {
            Capability::True => Verdict::SUPPRESS,
            Capability::False => Verdict::ADMIT,
            Capability::Unknown { deadline: None } => {
                self.absolute_orientation = Capability::Unknown {
                    deadline: Some(now + self.grace_window),
                };
                trace!("Relative orientation held while waiting for absolute events");
                Verdict::SUPPRESS
            }
            c if c.expired(now) => {
                self.resolve_absolute(false);
                Verdict {
                    admit: true,
                    resolved: Some(false),
                }
            }
            Capability::Unknown { .. } => Verdict::SUPPRESS,
        }
    }

    /// An absolute orientation event arrived.
    pub fn on_absolute_orientation(&mut self, now: Duration) -> Verdict {
        match self.absolute_orientation {
            Capability::True => Verdict::ADMIT,
            Capability::False => Verdict::SUPPRESS,
            // The window already closed; a late absolute event does not reopen it.
            c if c.expired(now) => {
                self.resolve_absolute(false);
                Verdict {
                    admit: false,
                    resolved: Some(false),
                }
            }
            Capability::Unknown { .. } => {
                self.resolve_absolute(true);
                Verdict {
                    admit: true,
                    resolved: Some(true),
                }
            }
        }
    }

    /// A motion event arrived. `measured_nonzero` is whether its gravity-free
    /// reading is non-zero on any axis.
    pub fn on_motion(&mut self, now: Duration, measured_nonzero: bool) -> GravitySource {
        match self.gravity_exclusion {
            Capability::True | Capability::False => {}
            c if c.expired(now) => self.resolve_gravity(false),
            Capability::Unknown { .. } if measured_nonzero => self.resolve_gravity(true),
            Capability::Unknown { deadline: None } => {
                self.gravity_exclusion = Capability::Unknown {
                    deadline: Some(now + self.grace_window),
                };
            }
            Capability::Unknown { .. } => {}
        }

        match self.gravity_exclusion {
            Capability::True => GravitySource::Measured,
            _ => GravitySource::Derived,
        }
    }

    /// Resolve every capability whose grace window has elapsed by `now`.
    ///
    /// Returns `true` when absolute orientation resolved, since that changes
    /// which raw streams are needed.
    pub fn tick(&mut self, now: Duration) -> bool {
        if self.gravity_exclusion.expired(now) {
            self.resolve_gravity(false);
        }
        if self.absolute_orientation.expired(now) {
            self.resolve_absolute(false);
            return true;
        }
        false
    }

    fn resolve_absolute(&mut self, available: bool) {
        self.absolute_orientation = if available {
            Capability::True
        } else {
            Capability::False
        };
        info!(available, "Absolute orientation capability resolved");
    }

    fn resolve_gravity(&mut self, available: bool) {
        self.gravity_exclusion = if available {
            Capability::True
        } else {
            Capability::False
        };
        info!(available, "Gravity-free acceleration capability resolved");
    }
}

impl Default for CapabilityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn absolute_event_inside_window_resolves_true() {
        let mut d = CapabilityDetector::default();
        assert!(!d.on_relative_orientation(ms(0)).admit);
        assert!(!d.on_relative_orientation(ms(5)).admit);
        assert_eq!(
            d.absolute_orientation(),
            Capability::Unknown {
                deadline: Some(ms(20))
            }
        );

        let v = d.on_absolute_orientation(ms(10));
        assert!(v.admit);
        assert_eq!(v.resolved, Some(true));
        assert_eq!(d.absolute_orientation(), Capability::True);

        // Relative events are superseded from now on.
        assert_eq!(d.on_relative_orientation(ms(40)), Verdict::SUPPRESS);
    }

    #[test]
    fn window_elapsing_resolves_false_on_next_relative_event() {
        let mut d = CapabilityDetector::default();
        d.on_relative_orientation(ms(0));
        assert!(!d.on_relative_orientation(ms(19)).admit);

        let v = d.on_relative_orientation(ms(20));
        assert_eq!(
            v,
            Verdict {
                admit: true,
                resolved: Some(false)
            }
        );
        assert_eq!(d.on_relative_orientation(ms(30)), Verdict::ADMIT);
    }

    #[test]
    fn late_absolute_event_does_not_revert() {
        let mut d = CapabilityDetector::default();
        d.on_relative_orientation(ms(0));
        let v = d.on_absolute_orientation(ms(25));
        assert!(!v.admit);
        assert_eq!(d.absolute_orientation(), Capability::False);
        assert!(!d.on_absolute_orientation(ms(30)).admit);
        assert_eq!(d.absolute_orientation(), Capability::False);
    }

    #[test]
    fn absolute_before_any_relative_resolves_true() {
        let mut d = CapabilityDetector::default();
        assert_eq!(d.on_absolute_orientation(ms(0)).resolved, Some(true));
    }

    #[test]
    fn tick_resolves_expired_windows() {
        let mut d = CapabilityDetector::new(ms(50));
        d.on_relative_orientation(ms(0));
        d.on_motion(ms(0), false);
        assert!(!d.tick(ms(49)));
        assert!(d.tick(ms(50)));
        assert_eq!(d.absolute_orientation(), Capability::False);
        assert_eq!(d.capabilities().gravity_exclusion, Capability::False);
        // Already resolved: nothing left to do.
        assert!(!d.tick(ms(100)));
    }

    #[test]
    fn nonzero_measured_acceleration_resolves_true() {
        let mut d = CapabilityDetector::default();
        assert_eq!(d.on_motion(ms(0), false), GravitySource::Derived);
        assert_eq!(d.on_motion(ms(5), true), GravitySource::Measured);
        assert_eq!(d.capabilities().gravity_exclusion, Capability::True);
        // Zero readings afterwards are still trusted.
        assert_eq!(d.on_motion(ms(100), false), GravitySource::Measured);
    }

    #[test]
    fn zero_measured_acceleration_resolves_false_after_window() {
        let mut d = CapabilityDetector::default();
        d.on_motion(ms(0), false);
        assert!(!d.capabilities().gravity_exclusion.is_resolved());
        assert_eq!(d.on_motion(ms(20), true), GravitySource::Derived);
        assert_eq!(d.capabilities().gravity_exclusion, Capability::False);
    }

    #[test]
    fn reset_discards_pending_deadlines() {
        let mut d = CapabilityDetector::default();
        d.on_relative_orientation(ms(0));
        d.on_motion(ms(0), false);
        d.reset();
        assert!(!d.tick(ms(1000)));
        assert_eq!(d.capabilities(), Capabilities::default());
    }
}
