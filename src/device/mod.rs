// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The device PM object (component D): a per-device state machine with action dispatch, busy and
//! wake-source flags.
//!
//! All mutable state lives in atomics so interrupt handlers and thread context can share a
//! [`DevicePm`] control block without an additional lock: every flag mutation is a single-word
//! atomic operation.

/// The device suspension scheduler: suspends and resumes every registered device around a CPU
/// sleep cycle.
pub mod scheduler;

use crate::error::DeviceError;
use bitflags::bitflags;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// The three states a device can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceStateTag {
    /// Fully operational.
    Active = 0,
    /// Suspended; device context may or may not be retained, depending on the driver.
    Suspended = 1,
    /// Off; device context is not retained.
    Off = 2,
}

impl DeviceStateTag {
    /// Returns the string used by `pm_device_state_str`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Off => "off",
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Suspended,
            _ => Self::Off,
        }
    }
}

/// Returns the human-readable name of a device state, or `""` for an unknown state. Tolerates
/// `None` rather than panicking, so callers can pass through a state lookup that may miss.
pub fn pm_device_state_str(state: Option<DeviceStateTag>) -> &'static str {
    match state {
        Some(state) => state.as_str(),
        None => "",
    }
}

/// The action a [`DevicePm`] dispatches to its action callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    /// Transition from `ACTIVE` to `SUSPENDED`.
    Suspend,
    /// Transition from `SUSPENDED` (or `OFF`) to `ACTIVE`.
    Resume,
    /// Transition to `OFF` from any other state.
    TurnOff,
}

bitflags! {
    /// Atomic flag bits on a [`DevicePm`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct DeviceFlags: u32 {
        /// The device is busy and must not be suspended.
        const BUSY = 1 << 0;
        /// The device is capable of acting as a wake source.
        const WS_CAPABLE = 1 << 1;
        /// The device is currently enabled as a wake source; while set, the suspension
        /// scheduler leaves the device active so it can still raise a wake interrupt.
        const WS_ENABLED = 1 << 2;
        /// A state transition is in progress; callers use this to detect and reject
        /// re-entrant transitions.
        const TRANSITIONING = 1 << 3;
    }
}

/// A function pointer implementing the device-specific half of a PM transition.
///
/// Receives the action to perform and returns `Ok(())` on success. A `Failure` code aborts the
/// requesting suspend cycle; `NotImplemented`, `Unsupported` and `Already` are never returned
/// from here — those are produced by [`DevicePm::state_set`] itself before the callback is
/// invoked.
pub type ActionCallback = fn(action: DeviceAction) -> Result<(), DeviceError>;

/// Per-device control block: a state tag, an atomic flags word, and an action callback.
///
/// A `None` action callback marks a device that does not participate in power management at
/// all; every call to [`Self::state_set`] on such a device returns
/// [`DeviceError::NotImplemented`].
pub struct DevicePm {
    state: AtomicU8,
    flags: AtomicU32,
    action_cb: Option<ActionCallback>,
}

impl DevicePm {
    /// Creates a new device PM object, initially `ACTIVE`.
    pub const fn new(action_cb: Option<ActionCallback>, wake_capable: bool) -> Self {
        let flags = if wake_capable {
            DeviceFlags::WS_CAPABLE.bits()
        } else {
            0
        };
        Self {
            state: AtomicU8::new(DeviceStateTag::Active as u8),
            flags: AtomicU32::new(flags),
            action_cb,
        }
    }

    /// Returns the device's current state.
    pub fn state_get(&self) -> DeviceStateTag {
        DeviceStateTag::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Attempts to transition the device to `target`.
    ///
    /// Returns [`DeviceError::NotImplemented`] if the device has no action callback,
    /// [`DeviceError::Busy`] if a transition is already marked in progress via the
    /// `TRANSITIONING` flag, [`DeviceError::Already`] if `target` is the current state, and
    /// [`DeviceError::Unsupported`] for the `OFF → SUSPENDED` transition. Otherwise invokes the
    /// action callback; on success the new state is stored, on failure the state is left
    /// unchanged and the callback's error is propagated.
    ///
    /// Setting and clearing the `TRANSITIONING` flag around a call that may recurse (an action
    /// callback that itself suspends a child device) is the caller's responsibility; this
    /// function only reads the flag to reject re-entrant transitions, it does not set it.
    pub fn state_set(&self, target: DeviceStateTag) -> Result<(), DeviceError> {
        let Some(action_cb) = self.action_cb else {
            return Err(DeviceError::NotImplemented);
        };

        if self.is_transitioning() {
            return Err(DeviceError::Busy);
        }

        let current = self.state_get();
        let action = if target == current {
            return Err(DeviceError::Already);
        } else if target == DeviceStateTag::Off {
            DeviceAction::TurnOff
        } else if current == DeviceStateTag::Off && target == DeviceStateTag::Suspended {
            return Err(DeviceError::Unsupported);
        } else if current == DeviceStateTag::Active && target == DeviceStateTag::Suspended {
            DeviceAction::Suspend
        } else {
            // Either SUSPENDED → ACTIVE, or OFF → ACTIVE: both are driven by the same RESUME
            // action, since resuming from OFF is the device-callback-level symmetric
            // counterpart of the TURN_OFF action that put it there.
            DeviceAction::Resume
        };

        action_cb(action)?;
        self.state.store(target as u8, Ordering::Release);
        Ok(())
    }

    /// Marks the device busy; the device suspension scheduler skips busy devices.
    pub fn busy_set(&self) {
        self.flags.fetch_or(DeviceFlags::BUSY.bits(), Ordering::AcqRel);
    }

    /// Clears the busy flag.
    pub fn busy_clear(&self) {
        self.flags
            .fetch_and(!DeviceFlags::BUSY.bits(), Ordering::AcqRel);
    }

    /// Returns whether the device is currently marked busy.
    pub fn is_busy(&self) -> bool {
        self.flags.load(Ordering::Acquire) & DeviceFlags::BUSY.bits() != 0
    }

    fn is_transitioning(&self) -> bool {
        self.flags.load(Ordering::Acquire) & DeviceFlags::TRANSITIONING.bits() != 0
    }

    /// Sets the `TRANSITIONING` flag. Exposed so the device suspension scheduler can bracket a
    /// `state_set` call that may recurse.
    pub(crate) fn transitioning_set(&self) {
        self.flags
            .fetch_or(DeviceFlags::TRANSITIONING.bits(), Ordering::AcqRel);
    }

    /// Clears the `TRANSITIONING` flag.
    pub(crate) fn transitioning_clear(&self) {
        self.flags
            .fetch_and(!DeviceFlags::TRANSITIONING.bits(), Ordering::AcqRel);
    }

    /// Enables or disables this device as a wake source.
    ///
    /// Returns [`DeviceError::Unsupported`] if the device is not wake-capable.
    pub fn wakeup_enable(&self, enable: bool) -> Result<(), DeviceError> {
        if !self.wakeup_is_capable() {
            return Err(DeviceError::Unsupported);
        }

        if enable {
            self.flags
                .fetch_or(DeviceFlags::WS_ENABLED.bits(), Ordering::AcqRel);
        } else {
            self.flags
                .fetch_and(!DeviceFlags::WS_ENABLED.bits(), Ordering::AcqRel);
        }
        Ok(())
    }

    /// Returns whether the device is currently enabled as a wake source.
    pub fn wakeup_is_enabled(&self) -> bool {
        self.flags.load(Ordering::Acquire) & DeviceFlags::WS_ENABLED.bits() != 0
    }

    /// Returns whether the device is capable of acting as a wake source at all.
    pub fn wakeup_is_capable(&self) -> bool {
        self.flags.load(Ordering::Acquire) & DeviceFlags::WS_CAPABLE.bits() != 0
    }
}

/// Returns whether any device in `devices` is currently marked busy.
pub fn is_any_busy(devices: &[&DevicePm]) -> bool {
    devices.iter().any(|device| device.is_busy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU32 as TestCounter;

    static SUSPEND_CALLS: TestCounter = TestCounter::new(0);

    fn ok_cb(_action: DeviceAction) -> Result<(), DeviceError> {
        SUSPEND_CALLS.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn failing_cb(_action: DeviceAction) -> Result<(), DeviceError> {
        Err(DeviceError::Failure(-5))
    }

    #[test]
    fn null_action_cb_is_not_implemented() {
        let device = DevicePm::new(None, false);
        assert_eq!(
            device.state_set(DeviceStateTag::Suspended),
            Err(DeviceError::NotImplemented)
        );
    }

    #[test]
    fn already_same_state_leaves_state_untouched() {
        let device = DevicePm::new(Some(ok_cb), false);
        assert_eq!(device.state_get(), DeviceStateTag::Active);
        assert_eq!(
            device.state_set(DeviceStateTag::Active),
            Err(DeviceError::Already)
        );
        assert_eq!(device.state_get(), DeviceStateTag::Active);
    }

    #[test]
    fn off_to_suspended_is_unsupported() {
        let device = DevicePm::new(Some(ok_cb), false);
        device.state_set(DeviceStateTag::Off).unwrap();
        assert_eq!(
            device.state_set(DeviceStateTag::Suspended),
            Err(DeviceError::Unsupported)
        );
        assert_eq!(device.state_get(), DeviceStateTag::Off);
    }

    #[test]
    fn busy_device_rejects_transition() {
        let device = DevicePm::new(Some(ok_cb), false);
        device.transitioning_set();
        assert_eq!(
            device.state_set(DeviceStateTag::Suspended),
            Err(DeviceError::Busy)
        );
        device.transitioning_clear();
        assert!(device.state_set(DeviceStateTag::Suspended).is_ok());
    }

    #[test]
    fn failure_leaves_state_unchanged() {
        let device = DevicePm::new(Some(failing_cb), false);
        assert_eq!(
            device.state_set(DeviceStateTag::Suspended),
            Err(DeviceError::Failure(-5))
        );
        assert_eq!(device.state_get(), DeviceStateTag::Active);
    }

    #[test]
    fn wakeup_round_trip_is_idempotent() {
        let device = DevicePm::new(Some(ok_cb), true);
        let initial = device.flags.load(Ordering::Relaxed);

        device.wakeup_enable(true).unwrap();
        assert!(device.wakeup_is_enabled());
        device.wakeup_enable(false).unwrap();
        assert!(!device.wakeup_is_enabled());

        assert_eq!(device.flags.load(Ordering::Relaxed), initial);
    }

    #[test]
    fn wakeup_enable_requires_capability() {
        let device = DevicePm::new(Some(ok_cb), false);
        assert_eq!(device.wakeup_enable(true), Err(DeviceError::Unsupported));
    }

    #[test]
    fn busy_flags_independent_of_wake_flags() {
        let device = DevicePm::new(Some(ok_cb), true);
        device.busy_set();
        assert!(device.is_busy());
        assert!(!device.wakeup_is_enabled());
        device.busy_clear();
        assert!(!device.is_busy());
    }

    #[test]
    fn is_any_busy_over_a_table() {
        let a = DevicePm::new(Some(ok_cb), false);
        let b = DevicePm::new(Some(ok_cb), false);
        assert!(!is_any_busy(&[&a, &b]));
        b.busy_set();
        assert!(is_any_busy(&[&a, &b]));
    }

    #[test]
    fn pm_device_state_str_values() {
        assert_eq!(pm_device_state_str(Some(DeviceStateTag::Active)), "active");
        assert_eq!(
            pm_device_state_str(Some(DeviceStateTag::Suspended)),
            "suspended"
        );
        assert_eq!(pm_device_state_str(Some(DeviceStateTag::Off)), "off");
        assert_eq!(pm_device_state_str(None), "");
    }
}
