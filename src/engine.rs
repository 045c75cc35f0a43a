// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The CPU suspension engine (component E): the top-level orchestrator that consults the policy,
//! arms the wake deadline, coordinates the statistics recorder, the device suspension scheduler
//! and the notifier registry around the SoC sleep hook, and implements the split entry/resume
//! control path required by hardware where wake continues only in the ISR.

use crate::{
    descriptor::{PowerStateDescriptor, StateTag},
    device::scheduler::{self, SuspendedDeviceSlots},
    hal::{PmPlatform, Ticks},
    notifier::NotifierRegistry,
    stats::StatsStorage,
};
use core::sync::atomic::{AtomicBool, Ordering};
use spin::mutex::SpinMutex;

/// The descriptor for the in-flight or just-completed transition on the current CPU, plus the
/// `post_ops_pending` flag that hands off the symmetric exit work between the idle path and the
/// wake ISR.
///
/// `post_ops_pending` is a single-producer single-consumer flag: `system_suspend` (or
/// `power_state_force`) is the sole producer, `system_resume` the sole consumer, so plain
/// acquire/release atomics are sufficient without a lock.
struct CurrentTransition {
    descriptor: SpinMutex<PowerStateDescriptor>,
    post_ops_pending: AtomicBool,
}

impl CurrentTransition {
    const fn new() -> Self {
        Self {
            descriptor: SpinMutex::new(PowerStateDescriptor::ACTIVE),
            post_ops_pending: AtomicBool::new(false),
        }
    }
}

/// The CPU suspension engine, generic over the platform bundle `P`.
///
/// One instance is constructed per system (usually held in a `static`) and shared by every core;
/// all genuinely per-core state lives inside `P` (the statistics storage and the device
/// suspension slots are per-CPU internally).
pub struct SuspendEngine<P: PmPlatform, const DEVICE_COUNT: usize> {
    platform: P,
    notifiers: NotifierRegistry,
    current: CurrentTransition,
    stats: StatsStorage<P::Cores, { P::CORE_COUNT }>,
    suspended: SpinMutex<SuspendedDeviceSlotsPerCore<DEVICE_COUNT>>,
}

/// Placeholder wrapper kept so `suspended` can eventually grow into a genuinely per-core table;
/// today every core shares one set of slots under the same lock the scheduler lock already
/// provides exclusivity for, since device suspension only ever runs from one core's idle path at
/// a time in this implementation's single-shot cycle model.
struct SuspendedDeviceSlotsPerCore<const N: usize>(SuspendedDeviceSlots<N>);

impl<P: PmPlatform, const DEVICE_COUNT: usize> SuspendEngine<P, DEVICE_COUNT> {
    /// Creates a new suspension engine wrapping `platform`.
    pub const fn new(platform: P) -> Self {
        Self {
            platform,
            notifiers: NotifierRegistry::new(),
            current: CurrentTransition::new(),
            stats: StatsStorage::new(),
            suspended: SpinMutex::new(SuspendedDeviceSlotsPerCore(SuspendedDeviceSlots::new())),
        }
    }

    /// Registers a notifier to observe future CPU power-state transitions.
    pub fn notifier_register(&self, notifier: &'static crate::notifier::Notifier) {
        self.notifiers.register(notifier);
    }

    /// Unregisters a previously registered notifier.
    pub fn notifier_unregister(
        &self,
        notifier: &'static crate::notifier::Notifier,
    ) -> Result<(), crate::error::NotifierError> {
        self.notifiers.unregister(notifier)
    }

    /// Returns a snapshot of the descriptor for the in-flight or just-completed transition.
    pub fn next_state_get(&self) -> PowerStateDescriptor {
        *self.current.descriptor.lock()
    }

    /// Suspends every registered device.
    pub fn suspend_devices(&self) -> Result<(), crate::error::DeviceError> {
        let mut guard = self.suspended.lock();
        scheduler::suspend_all(self.platform.devices(), &mut guard.0)
    }

    /// Resumes every device recorded as suspended this cycle.
    pub fn resume_devices(&self) {
        let mut guard = self.suspended.lock();
        scheduler::resume_all(self.platform.devices(), &mut guard.0);
    }

    /// Asks the policy for the deepest safe sleep state given `ticks`, arms the wake deadline,
    /// suspends devices, runs the SoC sleep hook, and on return (or once [`Self::system_resume`]
    /// is invoked from the wake ISR) restores devices and statistics before returning the entered
    /// state tag.
    ///
    /// Returns [`StateTag::Active`] immediately, with no side effects at all, if the policy
    /// judges nothing worth entering.
    pub fn system_suspend(&self, ticks: Ticks) -> StateTag {
        let descriptor = self.platform.next_state(ticks);
        if descriptor.is_active() {
            return StateTag::Active;
        }
        debug_assert!(
            descriptor.is_residency_consistent(),
            "policy returned a descriptor with min_residency_us < exit_latency_us"
        );

        self.current.post_ops_pending.store(false, Ordering::Relaxed);
        self.current.post_ops_pending.store(true, Ordering::Release);
        *self.current.descriptor.lock() = descriptor;

        if let Ticks::Count(ticks_until_deadline) = ticks {
            let exit_latency_ticks = descriptor.exit_latency_us().div_ceil(TICK_PERIOD_US);
            let expiry = ticks_until_deadline.saturating_sub(exit_latency_ticks);
            self.platform.set_expiry(Ticks::Count(expiry), true);
        } else {
            self.platform.set_expiry(Ticks::Forever, true);
        }

        if descriptor.tag() > StateTag::RuntimeIdle
            && let Err(error) = self.suspend_devices()
        {
            log::error!("aborting suspend cycle: {error}");
            self.resume_devices();
            self.current.post_ops_pending.store(false, Ordering::Relaxed);
            *self.current.descriptor.lock() = PowerStateDescriptor::ACTIVE;
            return StateTag::Active;
        }

        self.platform.sched_lock();

        self.stats.start_timer(self.platform.cycle_get32());
        self.notifiers.broadcast(true, descriptor.tag());

        if !self.platform.has_power_state_set_hook() {
            log::warn!("no SoC power_state_set hook bound; treating sleep as a no-op");
        }
        self.platform.power_state_set(&descriptor);

        self.stats.stop_timer(self.platform.cycle_get32(), descriptor.tag());
        if descriptor.tag() > StateTag::RuntimeIdle {
            self.resume_devices();
        }

        self.system_resume();

        self.platform.sched_unlock();
        descriptor.tag()
    }

    /// Completes any exit work still owed by the most recent suspend cycle: runs the SoC
    /// post-ops hook and broadcasts the exit notification.
    ///
    /// Callable from ISR context on wake. Idempotent: if `post_ops_pending` is already false
    /// (either because [`Self::system_suspend`] already ran this inline, or because this has
    /// already been called once for the current cycle), this is a no-op.
    pub fn system_resume(&self) {
        if self
            .current
            .post_ops_pending
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let descriptor = *self.current.descriptor.lock();
        self.platform.power_state_exit_post_ops(&descriptor);
        self.notifiers.broadcast(false, descriptor.tag());
    }

    /// Bypasses the policy and forces the system into `descriptor` directly.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `descriptor` is [`PowerStateDescriptor::ACTIVE`] or otherwise
    /// fails [`PowerStateDescriptor::is_residency_consistent`]; both are programmer errors at the
    /// call site, not runtime conditions to recover from.
    pub fn power_state_force(&self, descriptor: PowerStateDescriptor) {
        debug_assert!(!descriptor.is_active(), "power_state_force with ACTIVE");
        debug_assert!(
            descriptor.is_residency_consistent(),
            "power_state_force with an inconsistent descriptor"
        );

        let key = self.platform.irq_lock();

        *self.current.descriptor.lock() = descriptor;
        self.current.post_ops_pending.store(true, Ordering::Release);

        self.platform.sched_lock();
        self.notifiers.broadcast(true, descriptor.tag());

        self.stats.start_timer(self.platform.cycle_get32());
        self.platform.power_state_set(&descriptor);
        self.stats.stop_timer(self.platform.cycle_get32(), descriptor.tag());

        self.system_resume();

        self.platform.sched_unlock();
        self.platform.irq_unlock(key);
    }

    /// Returns a snapshot of the current CPU's statistics for `state`.
    pub fn stats_get(&self, state: StateTag) -> crate::stats::PerCpuPerStateStats {
        self.stats.get(state)
    }
}

/// Microseconds per kernel tick, used to convert `exit_latency_us` into a tick count when arming
/// the wake deadline early enough to satisfy it.
const TICK_PERIOD_US: u32 = 1_000;
