//! Tune/seek control.
//!
//! Tune and seek share one completion handshake:
//!
//! ```text
//! Idle -> RequestSent -(poll STC=1)-> ChipAcked -> RequestCleared -(poll STC=0)-> ChipCleared -> Idle
//! ```
//!
//! The request bit (TUNE or SEEK) has to be lowered before the chip lowers
//! STC. Skipping the second poll leaves a stale STC behind for the next
//! operation.

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::Error;
use crate::bus::RegisterBus;
use crate::config::{Config, DeEmphasis};
use crate::rds::{RdsDecoder, RdsInfo, RdsPoll};
use crate::registers::{Bits, Reg, RegisterFile, channel_to_native, native_to_channel};

/// Highest value of the 4-bit volume field.
pub const VOLUME_MAX: u8 = 15;

// XOSCEN plus the reset value of the reserved TEST1 bits
const OSCILLATOR_ENABLE: u16 = 0x8100;
const OSCILLATOR_SETTLE_MS: u32 = 500;
const POWER_UP_MS: u32 = 110;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SeekDirection {
    Up,
    Down,
}

/// Outcome of a seek.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TuneResult {
    /// Tuned, channel in tenths of MHz.
    Success(u16),
    /// Seek hit the band limit or found no station.
    Failed,
}

/// Si4703 device driver.
#[derive(Debug)]
pub struct Si4703<B: RegisterBus> {
    bus: B,
    rds: RdsDecoder,
    config: Config,
}

impl<B: RegisterBus> Si4703<B> {
    /// Create a driver over an already reset chip. Nothing is sent until
    /// [`power_up`](Self::power_up).
    pub fn new(bus: B, config: Config) -> Self {
        Self {
            bus,
            rds: RdsDecoder::new(),
            config,
        }
    }

    /// Give back the register bus.
    pub fn release(self) -> B {
        self.bus
    }

    /// Direct access to the register bus.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start the crystal oscillator and enable the receiver with RDS on.
    ///
    /// The chip must be in 2-wire mode: SDIO held low while RST rises.
    pub fn power_up<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        let mut regs = self.bus.read_all()?;
        regs.set(Reg::TEST1, OSCILLATOR_ENABLE);
        self.commit(&regs)?;
        delay.delay_ms(OSCILLATOR_SETTLE_MS);

        let mut regs = self.bus.read_all()?;
        regs.set(Reg::POWERCFG, Bits::DMUTE | Bits::ENABLE);
        regs.set_bits(Reg::SYSCONFIG1, Bits::RDS);
        match self.config.de_emphasis {
            DeEmphasis::Us50 => regs.set_bits(Reg::SYSCONFIG1, Bits::DE),
            DeEmphasis::Us75 => regs.clear_bits(Reg::SYSCONFIG1, Bits::DE),
        }
        // 100 kHz spacing; channel_to_native assumes it
        regs.update(Reg::SYSCONFIG2, Bits::SPACE1 | Bits::SPACE0, Bits::SPACE0);
        regs.update(
            Reg::SYSCONFIG2,
            Bits::VOLUME_MASK,
            u16::from(self.config.volume.min(VOLUME_MAX)),
        );
        self.commit(&regs)?;
        delay.delay_ms(POWER_UP_MS);

        debug!(
            "Si4703 powered up, device id {:04X} chip id {:04X}",
            regs.get(Reg::DEVICEID),
            regs.get(Reg::CHIPID)
        );
        Ok(())
    }

    /// Tune to `channel` in tenths of MHz (973 = 97.3 MHz).
    ///
    /// The chip accepts any channel, so range checking is up to the caller.
    /// On [`Error::NoResponse`] the TUNE bit is lowered again, so a later
    /// call can succeed once the chip answers.
    pub fn tune_to_channel(&mut self, channel: u16) -> Result<(), Error> {
        let mut regs = self.bus.read_all()?;
        regs.update(Reg::CHANNEL, Bits::CHAN_MASK, channel_to_native(channel));
        regs.set_bits(Reg::CHANNEL, Bits::TUNE);
        self.commit(&regs)?;
        debug!("Tuning to {}", channel);

        let mut regs = self
            .wait_seek_tune_complete(true)
            .map_err(|e| self.abandon_request(e, Reg::CHANNEL, Bits::TUNE))?;
        regs.clear_bits(Reg::CHANNEL, Bits::TUNE);
        self.commit(&regs)?;
        self.wait_seek_tune_complete(false)?;

        self.rds.reset();
        Ok(())
    }

    /// Seek to the next station in `direction`, wrapping at the band edges.
    pub fn seek(&mut self, direction: SeekDirection) -> Result<TuneResult, Error> {
        let mut regs = self.bus.read_all()?;
        regs.set_bits(Reg::POWERCFG, Bits::SKMODE);
        match direction {
            SeekDirection::Up => regs.set_bits(Reg::POWERCFG, Bits::SEEKUP),
            SeekDirection::Down => regs.clear_bits(Reg::POWERCFG, Bits::SEEKUP),
        }
        regs.set_bits(Reg::POWERCFG, Bits::SEEK);
        self.commit(&regs)?;
        debug!("Seeking {:?}", direction);

        let mut regs = self
            .wait_seek_tune_complete(true)
            .map_err(|e| self.abandon_request(e, Reg::POWERCFG, Bits::SEEK))?;
        // SFBL drops together with SEEK, so it is only valid in the STC read
        let failed = regs.seek_failed();
        regs.clear_bits(Reg::POWERCFG, Bits::SEEK);
        self.commit(&regs)?;
        self.wait_seek_tune_complete(false)?;

        self.rds.reset();

        if failed {
            debug!("Seek {:?} found no station", direction);
            return Ok(TuneResult::Failed);
        }
        let channel = self.channel()?;
        debug!("Seek {:?} stopped at {}", direction, channel);
        Ok(TuneResult::Success(channel))
    }

    /// Current channel in tenths of MHz.
    pub fn channel(&mut self) -> Result<u16, Error> {
        let regs = self.bus.read_all()?;
        Ok(native_to_channel(regs.read_channel()))
    }

    /// Set the volume, clamped to 0..=15.
    pub fn set_volume(&mut self, volume: u8) -> Result<(), Error> {
        let volume = volume.min(VOLUME_MAX);
        let mut regs = self.bus.read_all()?;
        regs.update(Reg::SYSCONFIG2, Bits::VOLUME_MASK, u16::from(volume));
        self.commit(&regs)
    }

    pub fn volume(&mut self) -> Result<u8, Error> {
        Ok(self.bus.read_all()?.volume())
    }

    /// Flip the mute state. Returns `true` if the output is now muted.
    pub fn toggle_mute(&mut self) -> Result<bool, Error> {
        let mut regs = self.bus.read_all()?;
        regs.set(Reg::POWERCFG, regs.get(Reg::POWERCFG) ^ Bits::DMUTE);
        self.commit(&regs)?;
        Ok(regs.muted())
    }

    pub fn is_stereo(&mut self) -> Result<bool, Error> {
        Ok(self.bus.read_all()?.stereo())
    }

    /// Received signal strength in dBµV.
    pub fn signal_strength(&mut self) -> Result<u8, Error> {
        Ok(self.bus.read_all()?.rssi())
    }

    /// Decode the pending RDS group, if any. Call at the pace given by
    /// [`RdsPoll::pacing_ms`].
    pub fn poll_rds(&mut self) -> Result<RdsPoll, Error> {
        self.rds.ingest_one_group(&mut self.bus)
    }

    pub fn rds_info(&self) -> &RdsInfo {
        self.rds.info()
    }

    fn commit(&mut self, regs: &RegisterFile) -> Result<(), Error> {
        self.bus.write_control_block(&regs.control_block())
    }

    /// After a timed out first poll, lower the request bit so the next
    /// request is a fresh rising edge, and drop RDS state since the chip may
    /// have moved. Best effort: the returned error is always `error`.
    fn abandon_request(&mut self, error: Error, reg: usize, request: u16) -> Error {
        if error != Error::NoResponse {
            return error;
        }
        self.rds.reset();
        let cleared = self.bus.read_all().and_then(|mut regs| {
            regs.clear_bits(reg, request);
            self.commit(&regs)
        });
        if let Err(e) = cleared {
            warn!("Could not clear request bit: {}", e);
        }
        error
    }

    /// Read until STC equals `set`. Returns the read that showed it.
    fn wait_seek_tune_complete(&mut self, set: bool) -> Result<RegisterFile, Error> {
        let mut reads = 0u32;
        loop {
            let regs = self.bus.read_all()?;
            reads = reads.saturating_add(1);
            if regs.seek_tune_complete() == set {
                trace!("STC={} after {} reads", set, reads);
                return Ok(regs);
            }
            if self.config.poll_limit.exhausted(reads) {
                warn!("STC stuck at {} after {} reads", !set, reads);
                return Err(Error::NoResponse);
            }
        }
    }
}
