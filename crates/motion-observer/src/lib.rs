pub mod capability;
pub mod dispatch;
pub mod error;
pub mod permission;
pub mod platform;
pub mod synthesis;
pub mod types;
pub mod wiring;

use glam::Quat;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, trace};

pub use capability::{
    Capabilities, Capability, CapabilityDetector, GravitySource, DEFAULT_GRACE_WINDOW,
};
pub use dispatch::{DispatchRegistry, Listener, ListenerId};
pub use error::MotionError;
pub use permission::{PermissionGate, PermissionState, Sensor};
pub use platform::{AxisConvention, Platform};
pub use types::{
    AccelerationEvent, MotionEvent, MotionType, OrientationEvent, RawAxes, RawEvent, RawMotion,
    RawOrientation, RawStream,
};
pub use wiring::{ListenerWiring, RawEventSource};

/// Tunables for a `MotionObserver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverSettings {
    /// How long to wait for evidence before assuming a capability is absent.
    pub grace_window: Duration,
    /// Sample orientation while acceleration is observed, so the gravity
    /// fallback has an orientation to work with.
    pub implicit_orientation_sampling: bool,
}

impl Default for ObserverSettings {
    fn default() -> Self {
        Self {
            grace_window: DEFAULT_GRACE_WINDOW,
            implicit_orientation_sampling: true,
        }
    }
}

/// One observing session over a host's raw sensor streams.
///
/// The host pushes raw events through [`MotionObserver::handle_raw`] and
/// calls [`MotionObserver::tick`] when it wants elapsed grace windows to
/// resolve without waiting for the next event. Everything runs on the
/// caller's thread; listeners are invoked synchronously.
pub struct MotionObserver<S> {
    platform: Platform,
    settings: ObserverSettings,
    source: S,
    permission_gate: Option<Box<dyn PermissionGate>>,
    observed: BTreeSet<MotionType>,
    wiring: ListenerWiring,
    detector: CapabilityDetector,
    registry: DispatchRegistry,
    last_orientation: Option<Quat>,
}

impl<S: RawEventSource> MotionObserver<S> {
    pub fn new(source: S, platform: Platform, settings: ObserverSettings) -> Self {
        Self {
            platform,
            settings,
            source,
            permission_gate: None,
            observed: BTreeSet::new(),
            wiring: ListenerWiring::new(),
            detector: CapabilityDetector::new(settings.grace_window),
            registry: DispatchRegistry::new(),
            last_orientation: None,
        }
    }

    /// Use `gate` for permission prompts on platforms that need them.
    pub fn with_permission_gate(mut self, gate: impl PermissionGate + 'static) -> Self {
        self.permission_gate = Some(Box::new(gate));
        self
    }

    /// Start observing `filter` (every motion type when `None`).
    ///
    /// Fails if the platform refuses sensor access; the filter is then not
    /// added to the observed set.
    pub async fn observe(&mut self, filter: Option<&[MotionType]>) -> Result<(), MotionError> {
        let added: Vec<MotionType> = filter_types(filter)
            .filter(|t| self.observed.insert(*t))
            .collect();
        debug!(?added, observed = ?self.observed, "Observing");

        let required = self.required_streams();
        let sensors = wiring::sensors_for(&required);
        let gate = self.permission_gate.as_deref();
        if let Err(e) = permission::request_sensors(&self.platform, gate, &sensors).await {
            for t in &added {
                self.observed.remove(t);
            }
            return Err(e);
        }

        self.reconcile();
        Ok(())
    }

    /// Stop observing `filter` (every motion type when `None`).
    pub fn unobserve(&mut self, filter: Option<&[MotionType]>) {
        for t in filter_types(filter) {
            self.observed.remove(&t);
        }
        debug!(observed = ?self.observed, "Unobserved");
        self.reconcile();
    }

    /// Tear down every raw subscription, drop all listeners and forget
    /// everything learned about the platform.
    pub fn disconnect(&mut self) {
        self.wiring.teardown(&mut self.source);
        self.observed.clear();
        self.registry.clear();
        self.detector.reset();
        self.last_orientation = None;
        info!("Motion observer disconnected");
    }

    /// Ask the host for access to every sensor, independently of `observe`.
    pub async fn request_permissions(&self) -> Result<(), MotionError> {
        permission::request_sensors(
            &self.platform,
            self.permission_gate.as_deref(),
            &[Sensor::Orientation, Sensor::Motion],
        )
        .await
    }

    pub fn subscribe(
        &mut self,
        motion_type: MotionType,
        listener: impl FnMut(&mut MotionEvent) + 'static,
    ) -> ListenerId {
        self.registry.subscribe(motion_type, Box::new(listener))
    }

    pub fn subscribe_once(
        &mut self,
        motion_type: MotionType,
        listener: impl FnMut(&mut MotionEvent) + 'static,
    ) -> ListenerId {
        self.registry.subscribe_once(motion_type, Box::new(listener))
    }

    pub fn unsubscribe(&mut self, motion_type: MotionType, id: ListenerId) -> bool {
        self.registry.unsubscribe(motion_type, id)
    }

    /// Alias for [`MotionObserver::subscribe`].
    pub fn on(
        &mut self,
        motion_type: MotionType,
        listener: impl FnMut(&mut MotionEvent) + 'static,
    ) -> ListenerId {
        self.subscribe(motion_type, listener)
    }

    /// Alias for [`MotionObserver::subscribe_once`].
    pub fn once(
        &mut self,
        motion_type: MotionType,
        listener: impl FnMut(&mut MotionEvent) + 'static,
    ) -> ListenerId {
        self.subscribe_once(motion_type, listener)
    }

    /// Alias for [`MotionObserver::unsubscribe`].
    pub fn off(&mut self, motion_type: MotionType, id: ListenerId) -> bool {
        self.unsubscribe(motion_type, id)
    }

    /// Feed one raw event from the host.
    pub fn handle_raw(&mut self, event: RawEvent) {
        let stream = event.stream();
        if !self.wiring.is_active(stream) {
            trace!(?stream, timestamp = ?event.timestamp(), "Ignoring event from detached stream");
            return;
        }

        match event {
            RawEvent::RelativeOrientation(raw) => {
                let verdict = self.detector.on_relative_orientation(raw.timestamp);
                self.handle_orientation(&raw, verdict);
            }
            RawEvent::AbsoluteOrientation(raw) => {
                let verdict = self.detector.on_absolute_orientation(raw.timestamp);
                self.handle_orientation(&raw, verdict);
            }
            RawEvent::Motion(raw) => self.handle_motion(&raw),
        }
    }

    /// Resolve grace windows that have elapsed by `now`.
    pub fn tick(&mut self, now: Duration) {
        if self.detector.tick(now) {
            self.reconcile();
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.detector.capabilities()
    }

    pub fn observed(&self) -> &BTreeSet<MotionType> {
        &self.observed
    }

    pub fn active_streams(&self) -> &BTreeSet<RawStream> {
        self.wiring.active()
    }

    pub fn last_orientation(&self) -> Option<Quat> {
        self.last_orientation
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn handle_orientation(&mut self, raw: &RawOrientation, verdict: capability::Verdict) {
        if verdict.resolved.is_some() {
            self.reconcile();
        }
        if !verdict.admit {
            trace!("Orientation event suppressed");
            return;
        }

        let event = synthesis::orientation_event(raw);
        self.last_orientation = Some(event.quaternion);
        self.dispatch(MotionEvent::Orientation(event));
    }

    fn handle_motion(&mut self, raw: &RawMotion) {
        let convention = self.platform.convention;
        let source = self
            .detector
            .on_motion(raw.timestamp, raw.acceleration.is_nonzero());

        if self.observed.contains(&MotionType::Acceleration) {
            let event = match source {
                GravitySource::Measured => Some(synthesis::measured_acceleration(raw, convention)),
                GravitySource::Derived => {
                    synthesis::derived_acceleration(raw, convention, self.last_orientation)
                }
            };
            match event {
                Some(event) => self.dispatch(MotionEvent::Acceleration(event)),
                None => trace!("Derived acceleration withheld until orientation is known"),
            }
        }

        if self.observed.contains(&MotionType::AccelerationIncludingGravity) {
            let event = synthesis::including_gravity(raw, convention);
            self.dispatch(MotionEvent::AccelerationIncludingGravity(event));
        }
    }

    fn dispatch(&mut self, mut event: MotionEvent) {
        if self.observed.contains(&event.motion_type()) {
            self.registry.dispatch(&mut event);
        }
    }

    fn required_streams(&self) -> BTreeSet<RawStream> {
        wiring::required_streams(
            &self.observed,
            self.detector.absolute_orientation(),
            self.settings.implicit_orientation_sampling,
        )
    }

    fn reconcile(&mut self) {
        let required = self.required_streams();
        self.wiring.reconcile(required, &mut self.source);
    }
}

fn filter_types(filter: Option<&[MotionType]>) -> impl Iterator<Item = MotionType> + '_ {
    filter.unwrap_or(&MotionType::ALL).iter().copied()
}
