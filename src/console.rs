//! Blocking UARTE console shared by the logger and the command line.

use core::cell::RefCell;
use critical_section::Mutex;

use embassy_nrf::uarte;

static TX: Mutex<RefCell<Option<uarte::UarteTx<'static>>>> = Mutex::new(RefCell::new(None));

pub fn init(tx: uarte::UarteTx<'static>) {
    critical_section::with(|cs| {
        TX.borrow_ref_mut(cs).replace(tx);
    });
}

/// Handle to the console. Output written before [`init`] is dropped.
pub struct Console;

impl Console {
    fn write_blocking(buf: &[u8]) -> Result<(), uarte::Error> {
        critical_section::with(|cs| match TX.borrow_ref_mut(cs).as_mut() {
            Some(tx) => tx.blocking_write(buf),
            None => Ok(()),
        })
    }
}

impl embedded_io::ErrorType for Console {
    type Error = uarte::Error;
}

impl embedded_io::Write for Console {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Self::write_blocking(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl core::fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        Self::write_blocking(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}
