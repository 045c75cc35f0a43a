// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Power-management core for a preemptive, SMP-capable real-time operating system kernel.
//!
//! This crate places a CPU, and transitively the peripheral devices attached to it, into the
//! deepest energy-saving state that is safe to enter given the next scheduled wake-up, then
//! returns the system to full operation on an interrupt-driven wake event without losing
//! correctness of kernel timing or device state.
//!
//! The crate is organised around five collaborating components:
//!
//! - [`notifier`]: an ordered registry of entry/exit callbacks observing CPU state transitions.
//! - [`stats`]: per-CPU, per-state residency counters.
//! - [`device`]: the device suspension scheduler ([`device::scheduler`]) and the per-device state
//!   machine ([`device::DevicePm`]).
//! - [`engine`]: the top-level orchestrator, [`engine::SuspendEngine`].
//!
//! Every collaborator the orchestrator needs from the host system — the sleep-state policy, the
//! architectural interrupt control, the scheduler re-entry barrier, the tick timer, the cycle
//! counter, the device table, and the SoC sleep hooks — is bundled behind the [`hal::PmPlatform`]
//! trait, so the engine itself stays generic and allocation-free.

#![cfg_attr(not(test), no_std)]

/// The CPU sleep state descriptor and its ordered state tag.
pub mod descriptor;
/// The device suspension scheduler and the per-device state machine.
pub mod device;
/// The top-level CPU suspension orchestrator.
pub mod engine;
/// Error types for the power-management core.
pub mod error;
/// The collaborator interface consumed by the CPU suspension engine.
pub mod hal;
/// Ambient logging infrastructure.
pub mod logger;
/// The notifier registry.
pub mod notifier;
/// The per-CPU, per-state statistics recorder.
pub mod stats;
