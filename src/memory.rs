use crate::device::{Readable, Writable};
use crate::error::{Chip8Error, Result};
use log::debug;
use std::io::{self, Read};

// NB. addresses are usize inside the device; the interpreter hands us u16s
//     widened, so nothing here ever has to worry about overflow

/// Defines the CHIP-8 memory map
///
///   0x0000-0x004f  font glyphs
///   0x0050-0x01ff  reserved; the call stack grows down from 0x0200
///   0x0200-        program and work area
///
/// the size is fixed at construction; 4K is conventional, 64K also works
pub struct Memory {
    bytes: Box<[u8]>,
}

/// how much RAM we have by default
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where programs are loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// where the call stack starts; it grows downward into the reserved area
pub const CHIP8_STACK_ADDR: u16 = 0x0200;

pub const CHIP8_FONT_ADDR: u16 = 0x000;
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;
pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

impl Memory {
    /// zeroed memory of the given size
    pub fn new(size: usize) -> Self {
        Memory {
            bytes: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// memory of the given size with the hex font baked in
    pub fn with_font(size: usize) -> Result<Self> {
        let mut m = Memory::new(size);
        m.write_slice(CHIP8_FONT_ADDR as usize, &CHIP8_FONT)?;
        Ok(m)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn check(&self, addr: usize, len: usize) -> Result<()> {
        let size = self.bytes.len();
        match addr.checked_add(len) {
            Some(end) if end <= size => Ok(()),
            _ => Err(Chip8Error::OutOfRange {
                address: addr.saturating_add(len.saturating_sub(1)),
                size,
            }),
        }
    }

    /// write a chunk of bytes into RAM
    pub fn write_slice(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        self.check(addr, data.len())?;
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// get a r/o slice of the underlying memory
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8]> {
        self.check(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    /// get a big-endian two-byte word
    pub fn word(&self, addr: usize) -> Result<u16> {
        let word = self.slice(addr, 2)?;
        Ok(((word[0] as u16) << 8) | (word[1] as u16))
    }

    /// write unknown len of data into memory at a particular address,
    /// returning how many bytes were copied
    pub fn load(&mut self, reader: &mut impl io::Read, addr: usize) -> Result<usize> {
        // one byte past the room left is enough to know it doesn't fit
        let room = self.len().saturating_sub(addr) as u64;
        let mut buf = Vec::new();
        let len = reader.by_ref().take(room + 1).read_to_end(&mut buf)?;
        self.write_slice(addr, &buf)?;
        debug!("loaded {} bytes at 0x{:04x}", len, addr);
        Ok(len)
    }
}

impl Readable for Memory {
    fn read(&self, addr: usize) -> Result<u8> {
        self.bytes.get(addr).copied().ok_or(Chip8Error::OutOfRange {
            address: addr,
            size: self.bytes.len(),
        })
    }
}

impl Writable for Memory {
    fn write(&mut self, addr: usize, value: u8) -> Result<()> {
        let size = self.bytes.len();
        let slot = self.bytes.get_mut(addr).ok_or(Chip8Error::OutOfRange {
            address: addr,
            size,
        })?;
        *slot = value;
        Ok(())
    }
}
