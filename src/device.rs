use crate::error::Result;

/// Anything the bus can read a byte from. Addresses are already rectified to
/// be relative to the start of the device's mapped range.
pub trait Readable {
    fn read(&self, addr: usize) -> Result<u8>;
}

/// Anything the bus can write a byte into, with device-relative addresses.
pub trait Writable {
    fn write(&mut self, addr: usize, value: u8) -> Result<()>;
}
