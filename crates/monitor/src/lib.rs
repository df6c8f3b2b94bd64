//! Gateway-health watchdog.
//!
//! A single long-running loop that polls the gateway session inside the
//! business-hours window, classifies its health, and emits rate-limited
//! operator alerts. Schedule arithmetic and the cooldown are plain data,
//! unit-testable without real time passing.

pub mod cooldown;
pub mod schedule;
pub mod watchdog;
