// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The device suspension scheduler (component C): orchestrates suspending and resuming every
//! registered device around a CPU sleep cycle.
//!
//! Devices are suspended in reverse registration order and resumed in reverse suspend order, so
//! that a device is never suspended while something it depends on is still running, and never
//! resumed before its dependencies are active again — provided registration order itself respects
//! the dependency graph, which is a contract on the caller, not something this module can check.

use super::{DevicePm, DeviceStateTag};
use crate::error::DeviceError;
use arrayvec::ArrayVec;

/// A fixed-capacity record of which devices were suspended during the current cycle, in the
/// order they were suspended.
///
/// `N` is the build-time device count. Built on [`ArrayVec`] rather than a heap-allocated
/// collection, the same "fixed capacity, no allocator" pattern this codebase uses for bounded
/// per-domain state.
pub struct SuspendedDeviceSlots<const N: usize> {
    slots: ArrayVec<usize, N>,
}

impl<const N: usize> SuspendedDeviceSlots<N> {
    /// Creates a new, empty slot table.
    pub const fn new() -> Self {
        Self {
            slots: ArrayVec::new_const(),
        }
    }

    /// The number of devices currently recorded as suspended this cycle.
    pub fn num_suspended(&self) -> usize {
        self.slots.len()
    }

    /// Records that the device at `index` in the device table was just suspended.
    ///
    /// # Panics
    ///
    /// Panics if already at capacity `N`. The device table passed to [`suspend_all`] is expected
    /// to have at most `N` entries, so this can only happen if the caller mismatches `N` against
    /// its device table.
    fn push(&mut self, index: usize) {
        self.slots.push(index);
    }

    /// Drains every recorded index in reverse (tail-to-head) order, which is the order devices
    /// must be resumed in.
    fn drain_reverse(&mut self) -> impl Iterator<Item = usize> + '_ {
        core::iter::from_fn(|| self.slots.pop())
    }
}

impl<const N: usize> Default for SuspendedDeviceSlots<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Suspends every device in `devices`, walked in reverse registration order, recording each
/// successfully suspended device into `slots`.
///
/// Devices that are busy, or currently enabled as a wake source, are left running so they can
/// still signal a wake event during the sleep window. `NotImplemented`, `Unsupported`, and
/// `Already` are treated as benign and skipped silently; any other error stops iteration
/// immediately and is returned to the caller, which is expected to call [`resume_all`] to roll
/// back whatever was already suspended.
pub fn suspend_all<const N: usize>(
    devices: &'static [&'static DevicePm],
    slots: &mut SuspendedDeviceSlots<N>,
) -> Result<(), DeviceError> {
    for (index, device) in devices.iter().enumerate().rev() {
        if device.is_busy() || device.wakeup_is_enabled() {
            continue;
        }

        device.transitioning_set();
        let result = device.state_set(DeviceStateTag::Suspended);
        device.transitioning_clear();

        match result {
            Ok(()) => slots.push(index),
            Err(error) if error.is_benign_skip() => {}
            Err(error) => {
                log::error!("device {index} refused suspend: {error}");
                return Err(error);
            }
        }
    }
    Ok(())
}

/// Resumes every device recorded in `slots`, from tail to head (the reverse of suspend order),
/// ignoring any errors a device's resume transition reports, and leaving `slots` empty.
pub fn resume_all<const N: usize>(
    devices: &'static [&'static DevicePm],
    slots: &mut SuspendedDeviceSlots<N>,
) {
    for index in slots.drain_reverse() {
        let device = devices[index];
        device.transitioning_set();
        let _ = device.state_set(DeviceStateTag::Active);
        device.transitioning_clear();
    }
}
