//! Simulated Si4703 for exercising the tune/seek handshake

#![allow(dead_code)]

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use si4703::Error;
use si4703::RegisterBus;
use si4703::RegisterFile;
use si4703::registers::{Bits, CONTROL_BLOCK_LEN, Reg};

/// What a seek started on the simulated chip ends with.
#[derive(Debug, Copy, Clone)]
pub enum SeekOutcome {
    /// Stop on this READCHAN value
    Station(u16),
    /// Raise SFBL together with STC
    BandLimit,
}

/// Models the STC handshake: STC rises `latency` reads after TUNE or SEEK is
/// written, and falls `latency` reads after the request bit is lowered again.
/// SFBL is only visible in the read that first shows STC.
pub struct SimulatedChip {
    pub regs: RegisterFile,
    pub latency: u32,
    pub seek_outcome: SeekOutcome,
    pub reads: u32,
    pub writes: Vec<[u16; CONTROL_BLOCK_LEN]>,
    /// Reads left until STC changes, if a change is pending.
    countdown: Option<u32>,
    sfbl_pending: bool,
    /// Never raise STC.
    pub stuck: bool,
    /// NAK the control block write with this 1-based index.
    pub fail_write: Option<usize>,
}

impl SimulatedChip {
    pub fn new(latency: u32) -> Self {
        Self {
            regs: RegisterFile::default(),
            latency,
            seek_outcome: SeekOutcome::Station(0),
            reads: 0,
            writes: Vec::new(),
            countdown: None,
            sfbl_pending: false,
            stuck: false,
            fail_write: None,
        }
    }

    /// Latch an RDS group and raise RDSR.
    pub fn latch_rds_group(&mut self, blocks: [u16; 4]) {
        self.regs.set(Reg::RDSA, blocks[0]);
        self.regs.set(Reg::RDSB, blocks[1]);
        self.regs.set(Reg::RDSC, blocks[2]);
        self.regs.set(Reg::RDSD, blocks[3]);
        self.regs.set_bits(Reg::STATUSRSSI, Bits::RDSR);
    }

    fn request_active(&self) -> bool {
        self.regs.get(Reg::CHANNEL) & Bits::TUNE != 0 || self.regs.get(Reg::POWERCFG) & Bits::SEEK != 0
    }

    fn stc(&self) -> bool {
        self.regs.seek_tune_complete()
    }
}

impl RegisterBus for SimulatedChip {
    fn read_all(&mut self) -> Result<RegisterFile, Error> {
        self.reads += 1;
        // SFBL from the previous read is gone already
        self.regs.clear_bits(Reg::STATUSRSSI, Bits::SFBL);

        if let Some(left) = self.countdown {
            if left <= 1 {
                self.countdown = None;
                if self.stc() {
                    self.regs.clear_bits(Reg::STATUSRSSI, Bits::STC);
                } else {
                    self.regs.set_bits(Reg::STATUSRSSI, Bits::STC);
                    if self.sfbl_pending {
                        self.regs.set_bits(Reg::STATUSRSSI, Bits::SFBL);
                        self.sfbl_pending = false;
                    }
                }
            } else {
                self.countdown = Some(left - 1);
            }
        }
        Ok(self.regs)
    }

    fn write_control_block(&mut self, block: &[u16; CONTROL_BLOCK_LEN]) -> Result<(), Error> {
        if self.fail_write == Some(self.writes.len() + 1) {
            self.fail_write = None;
            return Err(Error::I2c(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)));
        }
        let was_active = self.request_active();
        for (i, word) in block.iter().enumerate() {
            self.regs.set(Reg::CONTROL_START + i, *word);
        }
        self.writes.push(*block);
        let active = self.request_active();

        if !was_active && active && !self.stuck {
            if self.regs.get(Reg::POWERCFG) & Bits::SEEK != 0 {
                match self.seek_outcome {
                    SeekOutcome::Station(native) => self.regs.set(Reg::READCHAN, native),
                    SeekOutcome::BandLimit => self.sfbl_pending = true,
                }
            } else {
                let native = self.regs.get(Reg::CHANNEL) & Bits::CHAN_MASK;
                self.regs.set(Reg::READCHAN, native);
            }
            self.countdown = Some(self.latency);
        } else if was_active && !active && self.stc() {
            self.countdown = Some(self.latency);
        }
        Ok(())
    }
}
