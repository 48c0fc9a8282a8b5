#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
//!# CCS811 - Driver for the ams CCS811 Indoor Air Quality Sensor
//! This crate provides a driver for the CCS811 gas sensor, which reports an equivalent
//! CO2 concentration (ppm) and a total volatile organic compound concentration (ppb).
//! It handles the boot-to-application firmware transition, drive mode configuration,
//! data-ready polling, environmental compensation and baseline save/restore.
//!
//! All operations are synchronous and block on the underlying bus; a single sensor
//! handle must be serialized externally if shared between threads.
mod address;
mod core;
mod error;
mod register;

pub use address::SlaveAddress;
pub use error::Error;
pub use register::{AlgResult, Baseline, DriveMode, Status};
pub use self::core::{Ccs811, Ccs811Builder, OperatingState};
