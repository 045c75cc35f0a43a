// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The notifier registry (component A): an ordered list of entry/exit callbacks that subsystems
//! register to observe CPU power-state transitions.
//!
//! Nodes are intrusive: a registering subsystem owns a `'static` [`Notifier`] and the registry
//! only ever holds a borrow of it, never drops it. This mirrors how static, compile-time-known
//! subsystems are wired together elsewhere in this kind of kernel, and avoids requiring an
//! allocator for what is, in practice, a handful of long-lived observers.

use crate::{descriptor::StateTag, error::NotifierError};
use core::ptr;
use spin::mutex::SpinMutex;

/// A registered observer of CPU power-state transitions.
///
/// Both callbacks are optional; a `None` callback is simply skipped during broadcast. Callbacks
/// run with interrupts masked and must not block, must not call back into this crate, and must
/// not register or unregister notifiers — the registry lock is not reentrant.
pub struct Notifier {
    on_entry: Option<fn(StateTag)>,
    on_exit: Option<fn(StateTag)>,
    next: SpinMutex<Option<&'static Notifier>>,
}

impl Notifier {
    /// Creates a new notifier with the given optional entry and exit callbacks.
    pub const fn new(on_entry: Option<fn(StateTag)>, on_exit: Option<fn(StateTag)>) -> Self {
        Self {
            on_entry,
            on_exit,
            next: SpinMutex::new(None),
        }
    }
}

/// The ordered registry of [`Notifier`]s, anchored at a single head pointer.
///
/// All mutation and traversal is serialised by a dedicated spin lock, so registrations from
/// thread context are safe against broadcasts driven from the idle path.
pub struct NotifierRegistry {
    head: SpinMutex<Option<&'static Notifier>>,
}

impl NotifierRegistry {
    /// Creates a new, empty registry.
    pub const fn new() -> Self {
        Self {
            head: SpinMutex::new(None),
        }
    }

    /// Links `notifier` at the tail of the registry, behind any previously registered notifiers,
    /// so that `broadcast` visits notifiers in insertion order. Registering the same notifier
    /// twice links it twice, which would corrupt the list on unregister; callers must not do
    /// this.
    pub fn register(&self, notifier: &'static Notifier) {
        let mut head = self.head.lock();
        *notifier.next.lock() = None;

        let Some(mut current) = *head else {
            *head = Some(notifier);
            return;
        };

        loop {
            let mut next = current.next.lock();
            match *next {
                Some(node) => {
                    drop(next);
                    current = node;
                }
                None => {
                    *next = Some(notifier);
                    return;
                }
            }
        }
    }

    /// Unlinks `notifier` from the registry.
    ///
    /// Returns [`NotifierError::NotFound`] if it is not currently linked.
    pub fn unregister(&self, notifier: &'static Notifier) -> Result<(), NotifierError> {
        let mut head = self.head.lock();

        match *head {
            Some(first) if ptr::eq(first, notifier) => {
                *head = *notifier.next.lock();
                return Ok(());
            }
            _ => {}
        }

        let mut current = *head;
        while let Some(node) = current {
            let next = *node.next.lock();
            if let Some(candidate) = next
                && ptr::eq(candidate, notifier)
            {
                *node.next.lock() = *candidate.next.lock();
                return Ok(());
            }
            current = next;
        }

        Err(NotifierError::NotFound)
    }

    /// Walks the registry in insertion order and invokes the on-entry or on-exit callback of
    /// every notifier that has one, in the order they are linked.
    ///
    /// `entering` selects which half of each notifier runs: `true` for the on-entry callback
    /// (called before the SoC sleep hook), `false` for the on-exit callback (called after
    /// post-ops, before the scheduler lock is released).
    pub fn broadcast(&self, entering: bool, state: StateTag) {
        let head = self.head.lock();
        let mut current = *head;
        drop(head);

        while let Some(node) = current {
            let callback = if entering { node.on_entry } else { node.on_exit };
            if let Some(callback) = callback {
                callback(state);
            }
            current = *node.next.lock();
        }
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static ENTRY_HITS: AtomicU32 = AtomicU32::new(0);
    static EXIT_HITS: AtomicU32 = AtomicU32::new(0);
    static LAST_STATE: SpinMutex<Option<StateTag>> = SpinMutex::new(None);

    fn on_entry(state: StateTag) {
        ENTRY_HITS.fetch_add(1, Ordering::Relaxed);
        *LAST_STATE.lock() = Some(state);
    }

    fn on_exit(_state: StateTag) {
        EXIT_HITS.fetch_add(1, Ordering::Relaxed);
    }

    fn reset() {
        ENTRY_HITS.store(0, Ordering::Relaxed);
        EXIT_HITS.store(0, Ordering::Relaxed);
        *LAST_STATE.lock() = None;
    }

    static N1: Notifier = Notifier::new(Some(on_entry), Some(on_exit));
    static N2: Notifier = Notifier::new(None, Some(on_exit));

    // These statics are shared across the assertions below by design, so the scenarios are
    // exercised in a single test rather than split into parallel-running #[test] functions that
    // would otherwise race on the same notifier nodes.
    #[test]
    fn registry_lifecycle() {
        reset();
        let registry = NotifierRegistry::new();

        assert_eq!(registry.unregister(&N1), Err(NotifierError::NotFound));

        registry.register(&N1);
        registry.broadcast(true, StateTag::SuspendToRam);
        assert_eq!(ENTRY_HITS.load(Ordering::Relaxed), 1);
        assert_eq!(*LAST_STATE.lock(), Some(StateTag::SuspendToRam));

        registry.broadcast(false, StateTag::SuspendToRam);
        assert_eq!(EXIT_HITS.load(Ordering::Relaxed), 1);

        // N2 has no on_entry callback, so broadcasting entry should not panic or record a hit.
        registry.register(&N2);
        registry.broadcast(true, StateTag::Standby);
        assert_eq!(ENTRY_HITS.load(Ordering::Relaxed), 1);

        registry.broadcast(false, StateTag::Standby);
        assert_eq!(EXIT_HITS.load(Ordering::Relaxed), 3);

        registry.unregister(&N1).unwrap();
        registry.broadcast(true, StateTag::Standby);
        assert_eq!(ENTRY_HITS.load(Ordering::Relaxed), 1);

        registry.unregister(&N2).unwrap();
    }

    static ORDER: SpinMutex<[i32; 2]> = SpinMutex::new([-1; 2]);
    static ORDER_LEN: AtomicU32 = AtomicU32::new(0);

    fn record(tag: i32) {
        let mut order = ORDER.lock();
        let i = ORDER_LEN.fetch_add(1, Ordering::Relaxed) as usize;
        order[i] = tag;
    }

    fn on_entry_a(_state: StateTag) {
        record(0);
    }

    fn on_entry_b(_state: StateTag) {
        record(1);
    }

    static A: Notifier = Notifier::new(Some(on_entry_a), None);
    static B: Notifier = Notifier::new(Some(on_entry_b), None);

    #[test]
    fn broadcast_visits_in_registration_order() {
        *ORDER.lock() = [-1; 2];
        ORDER_LEN.store(0, Ordering::Relaxed);
        let registry = NotifierRegistry::new();

        registry.register(&A);
        registry.register(&B);
        registry.broadcast(true, StateTag::Standby);

        assert_eq!(*ORDER.lock(), [0, 1]);

        registry.unregister(&A).unwrap();
        registry.unregister(&B).unwrap();
    }
}
