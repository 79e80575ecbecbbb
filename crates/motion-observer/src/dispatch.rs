use std::collections::HashMap;
use std::mem;
use tracing::trace;

use crate::types::{MotionEvent, MotionType};

/// Callback invoked with each dispatched event.
pub type Listener = Box<dyn FnMut(&mut MotionEvent)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    persistent: Vec<(ListenerId, Listener)>,
    once: Vec<(ListenerId, Listener)>,
}

/// Per-motion-type listener registry.
///
/// Listeners run in registration order. Any listener may stop propagation,
/// which skips every listener after it in the same pass.
#[derive(Default)]
pub struct DispatchRegistry {
    next_id: u64,
    listeners: HashMap<MotionType, Listeners>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, motion_type: MotionType, listener: Listener) -> ListenerId {
        let id = self.allocate_id();
        self.listeners
            .entry(motion_type)
            .or_default()
            .persistent
            .push((id, listener));
        id
    }

    /// Register a listener that runs for at most one dispatch.
    pub fn subscribe_once(&mut self, motion_type: MotionType, listener: Listener) -> ListenerId {
        let id = self.allocate_id();
        self.listeners
            .entry(motion_type)
            .or_default()
            .once
            .push((id, listener));
        id
    }

    /// Remove a listener. Returns whether anything was removed.
    pub fn unsubscribe(&mut self, motion_type: MotionType, id: ListenerId) -> bool {
        let Some(entry) = self.listeners.get_mut(&motion_type) else {
            return false;
        };
        if let Some(pos) = entry.persistent.iter().position(|(l, _)| *l == id) {
            drop(entry.persistent.remove(pos));
            return true;
        }
        if let Some(pos) = entry.once.iter().position(|(l, _)| *l == id) {
            drop(entry.once.remove(pos));
            return true;
        }
        false
    }

    /// Hand `event` to every listener of its motion type.
    ///
    /// Persistent listeners run first, then one-shot listeners. Once the
    /// one-shot phase starts, all one-shot listeners are discarded whether or
    /// not they got to run.
    pub fn dispatch(&mut self, event: &mut MotionEvent) {
        let motion_type = event.motion_type();
        let Some(entry) = self.listeners.get_mut(&motion_type) else {
            return;
        };

        for (id, listener) in entry.persistent.iter_mut() {
            listener(event);
            if event.is_propagation_stopped() {
                trace!(%motion_type, ?id, "Propagation stopped");
                return;
            }
        }

        for (id, mut listener) in mem::take(&mut entry.once) {
            listener(event);
            if event.is_propagation_stopped() {
                trace!(%motion_type, ?id, "Propagation stopped by one-shot listener");
                return;
            }
        }
    }

    /// Number of persistent plus one-shot listeners for `motion_type`.
    pub fn listener_count(&self, motion_type: MotionType) -> usize {
        self.listeners
            .get(&motion_type)
            .map_or(0, |l| l.persistent.len() + l.once.len())
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    fn allocate_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }
}
