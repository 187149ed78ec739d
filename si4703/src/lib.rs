//! Si4703 FM tuner driver.
//!
//! The Si4703 is controlled entirely through its 16-word register file: every
//! operation reads all sixteen registers, modifies the six writable control
//! registers (0x02..=0x07) and writes them back in one transaction.
//!
//! The crate is split into:
//!
//! - [`registers`]: register addresses, bit fields and channel unit transforms,
//! - [`bus`]: the [`RegisterBus`] transport trait and its I2C implementation,
//! - [`tuner`]: the [`Si4703`] device with the tune/seek completion protocol,
//! - [`rds`]: the [`RdsDecoder`] reassembling station name, radio text and
//!   alternate frequencies from RDS groups.

#![cfg_attr(not(test), no_std)]

use core::fmt;

pub mod bus;
pub mod config;
pub mod rds;
pub mod registers;
pub mod tuner;

pub use bus::{I2cRegisterBus, RegisterBus};
pub use config::{Config, DeEmphasis, PollLimit};
pub use rds::{RdsDecoder, RdsInfo, RdsPoll};
pub use registers::{RegisterFile, channel_to_native, native_to_channel};
pub use tuner::{SeekDirection, Si4703, TuneResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// I2C communication error
    I2c(embedded_hal::i2c::ErrorKind),
    /// The chip never produced the expected seek/tune complete transition
    NoResponse,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(kind) => write!(f, "i2c transfer failed: {kind}"),
            Error::NoResponse => f.write_str("tuner did not complete the operation"),
        }
    }
}

impl core::error::Error for Error {}
