use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Everything that can go wrong inside the machine. None of these are fatal;
/// the host decides whether to stop or carry on.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("no device mapped at address 0x{address:04x}")]
    AddressUnmapped { address: usize },
    #[error("address 0x{address:04x} is out of range for a device of size 0x{size:04x}")]
    OutOfRange { address: usize, size: usize },
    #[error("address range 0x{lower:04x}..0x{upper:04x} conflicts with an existing device")]
    RangeConflict { lower: usize, upper: usize },
    #[error("invalid register index {0}")]
    InvalidRegisterIndex(usize),
    #[error("invalid key 0x{0:02x}")]
    InvalidKey(u8),
    #[error("unknown opcode 0x{opcode:04x} at 0x{address:04x}")]
    UnknownOpcode { opcode: u16, address: u16 },
    #[error("device mapped at address 0x{address:04x} has been dropped")]
    DeviceDetached { address: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
