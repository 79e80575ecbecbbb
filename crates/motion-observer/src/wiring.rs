use std::collections::BTreeSet;
use tracing::debug;

use crate::capability::Capability;
use crate::permission::Sensor;
use crate::types::{MotionType, RawStream};

/// Host-side delivery of raw sensor events.
///
/// `attach` asks the host to start delivering a stream to the observer;
/// `detach` asks it to stop. The wiring never attaches a stream twice.
pub trait RawEventSource {
    fn attach(&mut self, stream: RawStream);
    fn detach(&mut self, stream: RawStream);
}

/// Raw streams needed to serve `observed`.
///
/// Orientation needs the relative stream until absolute orientation is
/// confirmed, and the absolute stream until it is ruled out. Acceleration
/// needs orientation too (when `implicit_orientation` is set) so the
/// gravity fallback always has a recent orientation to work with.
pub fn required_streams(
    observed: &BTreeSet<MotionType>,
    absolute_orientation: Capability,
    implicit_orientation: bool,
) -> BTreeSet<RawStream> {
    let mut streams = BTreeSet::new();

    let wants_orientation = observed.contains(&MotionType::Orientation)
        || (implicit_orientation && observed.contains(&MotionType::Acceleration));
    if wants_orientation {
        if absolute_orientation != Capability::True {
            streams.insert(RawStream::RelativeOrientation);
        }
        if absolute_orientation != Capability::False {
            streams.insert(RawStream::AbsoluteOrientation);
        }
    }

    if observed.contains(&MotionType::Acceleration)
        || observed.contains(&MotionType::AccelerationIncludingGravity)
    {
        streams.insert(RawStream::Motion);
    }

    streams
}

/// Sensor families behind a set of raw streams, for permission prompts.
pub fn sensors_for(streams: &BTreeSet<RawStream>) -> Vec<Sensor> {
    let mut sensors = Vec::with_capacity(2);
    if streams.contains(&RawStream::RelativeOrientation)
        || streams.contains(&RawStream::AbsoluteOrientation)
    {
        sensors.push(Sensor::Orientation);
    }
    if streams.contains(&RawStream::Motion) {
        sensors.push(Sensor::Motion);
    }
    sensors
}

/// Tracks which raw streams are currently attached.
#[derive(Debug, Default)]
pub struct ListenerWiring {
    active: BTreeSet<RawStream>,
}

impl ListenerWiring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &BTreeSet<RawStream> {
        &self.active
    }

    pub fn is_active(&self, stream: RawStream) -> bool {
        self.active.contains(&stream)
    }

    /// Detach streams no longer needed, then attach newly required ones.
    pub fn reconcile<S>(&mut self, required: BTreeSet<RawStream>, source: &mut S)
    where
        S: RawEventSource + ?Sized,
    {
        for &stream in self.active.difference(&required) {
            debug!(?stream, "Detaching raw stream");
            source.detach(stream);
        }
        for &stream in required.difference(&self.active) {
            debug!(?stream, "Attaching raw stream");
            source.attach(stream);
        }
        self.active = required;
    }

    /// Detach everything.
    pub fn teardown<S>(&mut self, source: &mut S)
    where
        S: RawEventSource + ?Sized,
    {
        self.reconcile(BTreeSet::new(), source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSource {
        calls: Vec<(bool, RawStream)>,
    }

    impl RawEventSource for RecordingSource {
        fn attach(&mut self, stream: RawStream) {
            self.calls.push((true, stream));
        }

        fn detach(&mut self, stream: RawStream) {
            self.calls.push((false, stream));
        }
    }

    fn observed(types: &[MotionType]) -> BTreeSet<MotionType> {
        types.iter().copied().collect()
    }

    fn streams(list: &[RawStream]) -> BTreeSet<RawStream> {
        list.iter().copied().collect()
    }

    const UNKNOWN: Capability = Capability::Unknown { deadline: None };

    #[test]
    fn orientation_uses_both_streams_while_unknown() {
        let required = required_streams(&observed(&[MotionType::Orientation]), UNKNOWN, true);
        assert_eq!(
            required,
            streams(&[RawStream::RelativeOrientation, RawStream::AbsoluteOrientation])
        );
    }

    #[test]
    fn resolved_capability_drops_the_losing_stream() {
        let o = observed(&[MotionType::Orientation]);
        assert_eq!(
            required_streams(&o, Capability::True, true),
            streams(&[RawStream::AbsoluteOrientation])
        );
        assert_eq!(
            required_streams(&o, Capability::False, true),
            streams(&[RawStream::RelativeOrientation])
        );
    }

    #[test]
    fn acceleration_pulls_in_orientation() {
        let o = observed(&[MotionType::Acceleration]);
        assert_eq!(
            required_streams(&o, Capability::False, true),
            streams(&[RawStream::RelativeOrientation, RawStream::Motion])
        );
        assert_eq!(
            required_streams(&o, Capability::False, false),
            streams(&[RawStream::Motion])
        );
    }

    #[test]
    fn gravity_inclusive_needs_only_motion() {
        let o = observed(&[MotionType::AccelerationIncludingGravity]);
        assert_eq!(required_streams(&o, UNKNOWN, true), streams(&[RawStream::Motion]));
        assert!(required_streams(&BTreeSet::new(), UNKNOWN, true).is_empty());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut source = RecordingSource::default();
        let mut wiring = ListenerWiring::new();
        let required = streams(&[RawStream::Motion, RawStream::RelativeOrientation]);

        wiring.reconcile(required.clone(), &mut source);
        assert_eq!(source.calls.len(), 2);

        wiring.reconcile(required, &mut source);
        assert_eq!(source.calls.len(), 2);
    }

    #[test]
    fn reconcile_swaps_changed_streams() {
        let mut source = RecordingSource::default();
        let mut wiring = ListenerWiring::new();
        wiring.reconcile(
            streams(&[RawStream::RelativeOrientation, RawStream::AbsoluteOrientation]),
            &mut source,
        );
        source.calls.clear();

        wiring.reconcile(streams(&[RawStream::AbsoluteOrientation]), &mut source);
        assert_eq!(source.calls, vec![(false, RawStream::RelativeOrientation)]);
        assert!(wiring.is_active(RawStream::AbsoluteOrientation));

        wiring.teardown(&mut source);
        assert!(wiring.active().is_empty());
    }

    #[test]
    fn sensors_follow_streams() {
        assert_eq!(
            sensors_for(&streams(&[RawStream::AbsoluteOrientation, RawStream::Motion])),
            vec![Sensor::Orientation, Sensor::Motion]
        );
        assert!(sensors_for(&BTreeSet::new()).is_empty());
    }
}
