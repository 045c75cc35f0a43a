// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the power-management core.
//!
//! These are semantic taxonomies, not a single catch-all error type: a device action failure
//! (`DeviceError`) and a notifier-registry miss (`NotifierError`) are surfaced to different
//! callers and recovered from differently, so they are kept as distinct small enums rather than
//! unified behind one "PmError".

use core::fmt::{self, Display, Formatter};

/// The outcome of a device action callback, or of a call into the device PM state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// The device has no action callback registered (`action_cb` is null).
    NotImplemented,
    /// The device does not support the requested transition (e.g. `OFF → SUSPENDED`).
    Unsupported,
    /// The device is already in the requested state.
    Already,
    /// A transition is already in progress on this device (`TRANSITIONING` flag set).
    Busy,
    /// The device's action callback returned a non-benign negative code.
    Failure(i32),
}

impl DeviceError {
    /// Returns true for the three benign-skip codes the device suspension scheduler swallows
    /// silently: `NotImplemented`, `Unsupported`, `Already`.
    pub const fn is_benign_skip(self) -> bool {
        matches!(self, Self::NotImplemented | Self::Unsupported | Self::Already)
    }
}

impl Display for DeviceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotImplemented => write!(f, "device does not participate in power management"),
            Self::Unsupported => write!(f, "device does not support the requested transition"),
            Self::Already => write!(f, "device is already in the requested state"),
            Self::Busy => write!(f, "a transition is already in progress on this device"),
            Self::Failure(code) => write!(f, "device action callback failed with code {code}"),
        }
    }
}

/// The outcome of a notifier-registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierError {
    /// The notifier was not found linked in the registry.
    NotFound,
}

impl Display for NotifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "notifier is not registered"),
        }
    }
}
