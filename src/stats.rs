// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The per-CPU, per-state statistics recorder (component B).
//!
//! Each CPU only ever touches its own row of counters, from its own idle path or ISR, so state
//! is held in the `percore` crate's `PerCore<[T; CORE_COUNT], Cores>` pattern rather than behind
//! a shared lock — the same storage shape this codebase uses for per-core CPU context.
//!
//! When the `stats` feature is disabled, every public function in this module becomes an
//! `#[inline]` empty body, so call sites in the suspension engine never need `#[cfg(feature =
//! "stats")]` of their own.

/// Three 32-bit counters recorded for one (CPU, state) pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerCpuPerStateStats {
    /// Number of times this CPU has entered this state.
    pub state_count: u32,
    /// Cycle count of the most recent residency in this state.
    pub state_last_cycles: u32,
    /// Cumulative cycle count spent in this state, summed across every entry.
    pub state_total_cycles: u32,
}

#[cfg(feature = "stats")]
mod enabled {
    use super::PerCpuPerStateStats;
    use crate::descriptor::StateTag;
    use core::cell::RefCell;
    use percore::{ExceptionLock, PerCore, exception_free};

    /// The CPU-wide cycle-counter sample taken by [`super::start_timer`], consumed by
    /// [`super::stop_timer`].
    type Timings<Cores, const CORE_COUNT: usize> = PerCore<[ExceptionLock<RefCell<u32>>; CORE_COUNT], Cores>;

    /// The per-CPU, per-state counter table.
    type StatsTable<Cores, const CORE_COUNT: usize> =
        PerCore<[ExceptionLock<RefCell<[PerCpuPerStateStats; StateTag::COUNT]>>; CORE_COUNT], Cores>;

    /// Storage for the statistics recorder, generic over the platform's core count and `Cores`
    /// implementation.
    ///
    /// A platform instantiates one `const` of this type and holds it in a `static`; there is
    /// exactly one per running system, mirroring `CurrentTransition`.
    pub struct StatsStorage<C: percore::Cores, const CORE_COUNT: usize> {
        timings: Timings<C, CORE_COUNT>,
        table: StatsTable<C, CORE_COUNT>,
    }

    impl<C: percore::Cores, const CORE_COUNT: usize> StatsStorage<C, CORE_COUNT> {
        /// Creates a new, zeroed statistics storage block.
        pub const fn new() -> Self {
            Self {
                timings: PerCore::new([const { ExceptionLock::new(RefCell::new(0)) }; CORE_COUNT]),
                table: PerCore::new(
                    [const {
                        ExceptionLock::new(RefCell::new(
                            [PerCpuPerStateStats {
                                state_count: 0,
                                state_last_cycles: 0,
                                state_total_cycles: 0,
                            }; StateTag::COUNT],
                        ))
                    }; CORE_COUNT],
                ),
            }
        }

        /// Samples `cycle_now` into the current CPU's start-of-residency slot.
        pub fn start_timer(&self, cycle_now: u32) {
            exception_free(|token| {
                *self.timings.get().borrow_mut(token) = cycle_now;
            });
        }

        /// Samples `cycle_now`, computes the residency delta against the value recorded by
        /// [`Self::start_timer`], and applies it to `state`'s counters: increments the entry
        /// count, sets `state_last_cycles` to the delta, and adds the delta to
        /// `state_total_cycles`.
        ///
        /// The subtraction wraps modulo 2^32, which is sound because residencies on targeted
        /// hardware are always far smaller than the counter's full period.
        pub fn stop_timer(&self, cycle_now: u32, state: StateTag) {
            exception_free(|token| {
                let start = *self.timings.get().borrow(token);
                let delta = cycle_now.wrapping_sub(start);
                let mut table = self.table.get().borrow_mut(token);
                let row = &mut table[state.index()];
                row.state_count = row.state_count.wrapping_add(1);
                row.state_last_cycles = delta;
                row.state_total_cycles = row.state_total_cycles.wrapping_add(delta);
            });
        }

        /// Returns a snapshot of the current CPU's counters for `state`.
        pub fn get(&self, state: StateTag) -> PerCpuPerStateStats {
            exception_free(|token| self.table.get().borrow(token)[state.index()])
        }
    }
}

/// Per-CPU residency statistics storage; a no-op stand-in when the `stats` feature is disabled.
#[cfg(feature = "stats")]
pub use enabled::StatsStorage;

#[cfg(not(feature = "stats"))]
mod disabled {
    use super::PerCpuPerStateStats;
    use crate::descriptor::StateTag;
    use core::marker::PhantomData;

    /// Zero-sized stand-in for [`enabled::StatsStorage`] used when the `stats` feature is off;
    /// every method is a no-op so call sites never need a `#[cfg]` of their own.
    pub struct StatsStorage<C, const CORE_COUNT: usize>(PhantomData<C>);

    impl<C, const CORE_COUNT: usize> StatsStorage<C, CORE_COUNT> {
        /// Creates a new, no-op statistics storage block.
        pub const fn new() -> Self {
            Self(PhantomData)
        }

        /// No-op.
        #[inline]
        pub fn start_timer(&self, _cycle_now: u32) {}

        /// No-op.
        #[inline]
        pub fn stop_timer(&self, _cycle_now: u32, _state: StateTag) {}

        /// Always returns a zeroed snapshot.
        #[inline]
        pub fn get(&self, _state: StateTag) -> PerCpuPerStateStats {
            PerCpuPerStateStats::default()
        }
    }
}

/// Per-CPU residency statistics storage; a no-op stand-in when the `stats` feature is disabled.
#[cfg(not(feature = "stats"))]
pub use disabled::StatsStorage;

#[cfg(all(test, feature = "stats"))]
mod tests {
    use super::*;
    use percore::Cores;

    struct SingleCore;

    // SAFETY: tests run single-threaded on the host, so the only core index is 0.
    unsafe impl Cores for SingleCore {
        fn core_index() -> usize {
            0
        }
    }

    #[test]
    fn start_stop_records_delta() {
        let storage: StatsStorage<SingleCore, 1> = StatsStorage::new();
        storage.start_timer(1_000);
        storage.stop_timer(1_250, StateTag::Standby);

        let row = storage.get(StateTag::Standby);
        assert_eq!(row.state_count, 1);
        assert_eq!(row.state_last_cycles, 250);
        assert_eq!(row.state_total_cycles, 250);
    }

    #[test]
    fn accumulates_across_multiple_entries() {
        let storage: StatsStorage<SingleCore, 1> = StatsStorage::new();
        storage.start_timer(0);
        storage.stop_timer(100, StateTag::SuspendToRam);
        storage.start_timer(500);
        storage.stop_timer(580, StateTag::SuspendToRam);

        let row = storage.get(StateTag::SuspendToRam);
        assert_eq!(row.state_count, 2);
        assert_eq!(row.state_last_cycles, 80);
        assert_eq!(row.state_total_cycles, 180);
    }

    #[test]
    fn wraps_on_counter_overflow() {
        let storage: StatsStorage<SingleCore, 1> = StatsStorage::new();
        storage.start_timer(u32::MAX - 10);
        storage.stop_timer(9, StateTag::RuntimeIdle);

        let row = storage.get(StateTag::RuntimeIdle);
        assert_eq!(row.state_last_cycles, 20);
    }

    #[test]
    fn different_states_are_independent() {
        let storage: StatsStorage<SingleCore, 1> = StatsStorage::new();
        storage.start_timer(0);
        storage.stop_timer(10, StateTag::Standby);
        assert_eq!(storage.get(StateTag::SuspendToRam).state_count, 0);
        assert_eq!(storage.get(StateTag::Standby).state_count, 1);
    }
}
