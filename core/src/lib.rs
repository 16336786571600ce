#![cfg_attr(not(feature = "std"), no_std)]

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod cycle;
pub mod ranging;
pub mod units;

pub use aggregate::{DisplayGate, LotSummary};
pub use classify::{SlotMonitor, SlotState};
pub use cycle::{run_cycle, SonarChannels, TriggerPolicy};
pub use ranging::{EchoBank, PulseWindow};
pub use units::Distance;
