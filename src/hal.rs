// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The collaborator interface consumed by the CPU suspension engine.
//!
//! Every external system the engine talks to — the policy, the architecture layer, the
//! scheduler, the tick timer, the cycle counter, the device table, and the SoC sleep hooks — is
//! bundled behind a single [`PmPlatform`] trait, the same shape this codebase uses for its
//! top-level `Platform` trait: one type parameter carries every platform-specific collaborator,
//! so the engine itself stays generic and allocation-free. The two SoC sleep hooks carry default
//! bodies, exactly as this codebase's optional `PsciPlatformInterface` methods carry defaults for
//! platforms that don't implement an optional PSCI feature — except our defaults are real
//! fallback behaviour, not `unimplemented!()`, because weak binding here means "supply a
//! default", not "platform choice".

use crate::{descriptor::PowerStateDescriptor, device::DevicePm};
use percore::Cores;

/// Number of kernel ticks to wait for, or the sentinel meaning "no known deadline" (sleep until
/// an event other than a scheduled tick wakes the CPU).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticks {
    /// Sleep until the given number of ticks from now.
    Count(u32),
    /// No scheduled deadline; sleep until an external event wakes the CPU.
    Forever,
}

/// An opaque token representing the saved interrupt mask state, returned by
/// [`PmPlatform::irq_lock`] and consumed by [`PmPlatform::irq_unlock`].
#[derive(Debug, Clone, Copy)]
pub struct IrqKey(pub(crate) u64);

/// Bundles every collaborator the CPU suspension engine needs.
///
/// # Safety
///
/// `Cores::core_index()` must return a distinct index less than `CORE_COUNT` for each CPU core,
/// and the same index every time it is called from the same core — the engine uses it to index
/// per-core statistics and timing slots without further synchronisation.
pub unsafe trait PmPlatform {
    /// The number of CPU cores in the system, used to size per-core statistics tables.
    const CORE_COUNT: usize;

    /// The `percore::Cores` implementation identifying the current CPU core.
    type Cores: Cores;

    /// Asks the policy collaborator for the deepest sleep state judged safe to enter given
    /// `ticks`, or [`PowerStateDescriptor::ACTIVE`] if nothing is worth entering. Pure decision
    /// function; the engine treats it as opaque.
    fn next_state(&self, ticks: Ticks) -> PowerStateDescriptor;

    /// Masks interrupts on the current CPU, returning a key that restores the previous mask
    /// state when passed to [`Self::irq_unlock`].
    fn irq_lock(&self) -> IrqKey;

    /// Restores the interrupt mask state captured by a prior [`Self::irq_lock`] call.
    fn irq_unlock(&self, key: IrqKey);

    /// Unconditionally unmasks interrupts on the current CPU. This is the default behaviour of
    /// [`Self::power_state_exit_post_ops`] when no platform-specific hook is bound.
    fn irq_unmask_all(&self);

    /// Prevents this CPU from being rescheduled onto another thread. Held across the sleep
    /// window so no other runnable thread is scheduled onto this CPU between the entry broadcast
    /// and the exit notification.
    fn sched_lock(&self);

    /// Releases the barrier taken by [`Self::sched_lock`].
    fn sched_unlock(&self);

    /// Programs the next tick interrupt. `idle_hint` tells the timer driver that the CPU is
    /// about to enter an idle/sleep state, which some timer drivers use to pick a more efficient
    /// programming mode.
    fn set_expiry(&self, ticks: Ticks, idle_hint: bool);

    /// Returns the current value of a 32-bit monotonic cycle counter. Wraps modulo 2^32;
    /// residency deltas are computed with wrapping subtraction.
    fn cycle_get32(&self) -> u32;

    /// Returns all registered devices, in registration order. The device suspension scheduler
    /// walks this in reverse.
    fn devices(&self) -> &'static [&'static DevicePm];

    /// Places the current CPU into the hardware sleep state described by `descriptor`. On
    /// hardware where this returns normally, control resumes right after this call; on hardware
    /// where wake continues only in the ISR, this function may not return at all, in which case
    /// [`Self::power_state_exit_post_ops`] runs from `system_resume` instead.
    fn power_state_set(&self, _descriptor: &PowerStateDescriptor) {
        // Weakly bound: no SoC-specific sleep instruction is available. The core proceeds as
        // though the hardware returned immediately; the engine logs this as a misconfiguration.
    }

    /// Performs SoC-specific bookkeeping that must run after the sleep instruction returns:
    /// register restore, cache/TLB maintenance, and — at minimum — unmasking interrupts.
    fn power_state_exit_post_ops(&self, _descriptor: &PowerStateDescriptor) {
        self.irq_unmask_all();
    }

    /// Returns whether a platform-specific `power_state_set` hook is bound, purely so the engine
    /// can log a misconfiguration when it isn't. Platforms that override `power_state_set`
    /// should also override this to return `true`.
    fn has_power_state_set_hook(&self) -> bool {
        false
    }
}
