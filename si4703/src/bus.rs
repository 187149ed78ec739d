//! Register transport.
//!
//! The Si4703 has no register pointer. A read always starts at 0x0A, runs to
//! 0x0F and wraps around to 0x00; a write always starts at 0x02.

use embedded_hal::i2c::{Error as I2cErrorTrait, I2c};

use crate::Error;
use crate::registers::{CONTROL_BLOCK_LEN, REGISTER_COUNT, Reg, RegisterFile};

/// Access to the chip's register file.
///
/// The tuner and the RDS decoder only ever see transient copies returned by
/// [`read_all`](RegisterBus::read_all).
pub trait RegisterBus {
    /// Read all sixteen registers, returned in address order.
    fn read_all(&mut self) -> Result<RegisterFile, Error>;
    /// Write registers 0x02..=0x07 in one transaction.
    fn write_control_block(&mut self, block: &[u16; CONTROL_BLOCK_LEN]) -> Result<(), Error>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn read_all(&mut self) -> Result<RegisterFile, Error> {
        (**self).read_all()
    }

    fn write_control_block(&mut self, block: &[u16; CONTROL_BLOCK_LEN]) -> Result<(), Error> {
        (**self).write_control_block(block)
    }
}

/// [`RegisterBus`] over a blocking I2C peripheral.
#[derive(Debug)]
pub struct I2cRegisterBus<T: I2c, const A: u8 = 0x10> {
    i2c: T,
}

impl<T: I2c, const A: u8> I2cRegisterBus<T, A> {
    const I2C_ADDRESS: u8 = A;

    pub fn new(i2c: T) -> Self {
        Self { i2c }
    }

    /// Give back the I2C peripheral.
    pub fn release(self) -> T {
        self.i2c
    }
}

impl<T: I2c, const A: u8> RegisterBus for I2cRegisterBus<T, A> {
    fn read_all(&mut self) -> Result<RegisterFile, Error> {
        let mut raw = [0u8; REGISTER_COUNT * 2];
        self.i2c
            .read(Self::I2C_ADDRESS, &mut raw)
            .map_err(|e| Error::I2c(e.kind()))?;

        let mut regs = RegisterFile::default();
        for (i, word) in raw.chunks_exact(2).enumerate() {
            let reg = (Reg::STATUSRSSI + i) % REGISTER_COUNT;
            regs.set(reg, u16::from_be_bytes([word[0], word[1]]));
        }
        Ok(regs)
    }

    fn write_control_block(&mut self, block: &[u16; CONTROL_BLOCK_LEN]) -> Result<(), Error> {
        let mut raw = [0u8; CONTROL_BLOCK_LEN * 2];
        for (bytes, word) in raw.chunks_exact_mut(2).zip(block.iter()) {
            bytes.copy_from_slice(&word.to_be_bytes());
        }
        self.i2c
            .write(Self::I2C_ADDRESS, &raw)
            .map_err(|e| Error::I2c(e.kind()))
    }
}
