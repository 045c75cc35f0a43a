// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The CPU sleep state descriptor and its ordered state tag.

use core::fmt::{self, Debug, Formatter};

/// An ordered enumeration of CPU sleep states, from fully running to fully off.
///
/// Variants are declared in ascending depth order so the derived [`Ord`] impl gives "deeper
/// variant ⇒ deeper sleep" for free; callers may compare tags directly (`a > b`) to ask which
/// state sleeps more deeply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum StateTag {
    /// The CPU is fully running; no power-saving transition has occurred.
    Active,
    /// A shallow idle state entered opportunistically between runnable threads.
    RuntimeIdle,
    /// CPU clock stopped, core state retained.
    Standby,
    /// Suspend-to-RAM: CPU and most peripherals powered down, RAM retains state.
    SuspendToRam,
    /// Suspend-to-disk: RAM contents saved to non-volatile storage before power-down.
    SuspendToDisk,
    /// Soft off: lowest state short of a full power cycle.
    SoftOff,
}

impl StateTag {
    /// All tags, in ascending depth order.
    pub const ALL: [Self; 6] = [
        Self::Active,
        Self::RuntimeIdle,
        Self::Standby,
        Self::SuspendToRam,
        Self::SuspendToDisk,
        Self::SoftOff,
    ];

    /// The number of distinct state tags, for sizing per-state tables.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the short string used in the statistics row naming convention
    /// (`pm_cpu_<cpu3d>_state_<state1d>_stats`).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the snake_case name of this state tag, as used in statistics row names.
    ///
    /// This is distinct from [`crate::device::DeviceStateTag`], which has its own, unrelated
    /// string rendering for device (not CPU) states.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::RuntimeIdle => "runtime_idle",
            Self::Standby => "standby",
            Self::SuspendToRam => "suspend_to_ram",
            Self::SuspendToDisk => "suspend_to_disk",
            Self::SoftOff => "soft_off",
        }
    }
}

/// A candidate CPU sleep state, as returned by the policy collaborator.
///
/// Immutable once constructed; `min_residency_us` must be greater than or equal to
/// `exit_latency_us`; a descriptor is validated against this constraint by the engine when it
/// isn't a sentinel [`StateTag::Active`] result.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PowerStateDescriptor {
    tag: StateTag,
    min_residency_us: u32,
    exit_latency_us: u32,
    substate: Option<u32>,
}

impl PowerStateDescriptor {
    /// The sentinel descriptor returned by the policy, and by the engine, when there is nothing
    /// to do.
    pub const ACTIVE: Self = Self {
        tag: StateTag::Active,
        min_residency_us: 0,
        exit_latency_us: 0,
        substate: None,
    };

    /// Creates a new descriptor.
    pub const fn new(
        tag: StateTag,
        min_residency_us: u32,
        exit_latency_us: u32,
        substate: Option<u32>,
    ) -> Self {
        Self {
            tag,
            min_residency_us,
            exit_latency_us,
            substate,
        }
    }

    /// The state tag this descriptor describes.
    pub const fn tag(&self) -> StateTag {
        self.tag
    }

    /// The minimum time the CPU must remain in this state to make entering it worthwhile.
    pub const fn min_residency_us(&self) -> u32 {
        self.min_residency_us
    }

    /// The worst-case delay between a wake signal and resumed full-speed execution.
    pub const fn exit_latency_us(&self) -> u32 {
        self.exit_latency_us
    }

    /// An optional SoC-specific sub-state identifier, for disambiguating among multiple hardware
    /// states that share a [`StateTag`].
    pub const fn substate(&self) -> Option<u32> {
        self.substate
    }

    /// Returns whether this descriptor is the `ACTIVE` sentinel, i.e. "nothing to do".
    pub const fn is_active(&self) -> bool {
        matches!(self.tag, StateTag::Active)
    }

    /// Checks that `min_residency_us` is at least `exit_latency_us`. Callers assert on this in
    /// debug builds; it is not itself an error type because an engine that receives a malformed
    /// descriptor from its policy has no sensible recovery beyond aborting the cycle.
    pub const fn is_residency_consistent(&self) -> bool {
        self.min_residency_us >= self.exit_latency_us
    }
}

impl Debug for PowerStateDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerStateDescriptor")
            .field("tag", &self.tag)
            .field("min_residency_us", &self.min_residency_us)
            .field("exit_latency_us", &self.exit_latency_us)
            .field("substate", &self.substate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_depth_ascending() {
        assert!(StateTag::Active < StateTag::RuntimeIdle);
        assert!(StateTag::RuntimeIdle < StateTag::Standby);
        assert!(StateTag::Standby < StateTag::SuspendToRam);
        assert!(StateTag::SuspendToRam < StateTag::SuspendToDisk);
        assert!(StateTag::SuspendToDisk < StateTag::SoftOff);
    }

    #[test]
    fn active_sentinel_is_active() {
        assert!(PowerStateDescriptor::ACTIVE.is_active());
        let deep = PowerStateDescriptor::new(StateTag::SuspendToRam, 1000, 100, None);
        assert!(!deep.is_active());
    }

    #[test]
    fn residency_consistency() {
        let ok = PowerStateDescriptor::new(StateTag::Standby, 1000, 100, None);
        assert!(ok.is_residency_consistent());
        let bad = PowerStateDescriptor::new(StateTag::Standby, 50, 100, None);
        assert!(!bad.is_residency_consistent());
    }
}
