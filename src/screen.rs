use crate::device::{Readable, Writable};
use crate::error::{Chip8Error, Result};

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const PIXELS_PER_BYTE: usize = 8;
pub const SCREEN_BYTES: usize = SCREEN_WIDTH * SCREEN_HEIGHT / PIXELS_PER_BYTE;

const BYTES_PER_ROW: usize = SCREEN_WIDTH / PIXELS_PER_BYTE;

/// The 64 x 32 monochrome screen.
///
/// Pixels are packed eight to a byte, row-major, MSB leftmost; so (row, col)
/// lives at byte `row * 8 + col / 8`, bit `7 - col % 8`. This is the same
/// layout the display renderers consume, so `as_bytes` can be drawn directly.
///
/// Bus writes XOR into the stored byte rather than replacing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    bytes: [u8; SCREEN_BYTES],
}

impl Default for Screen {
    fn default() -> Self {
        Screen {
            bytes: [0; SCREEN_BYTES],
        }
    }
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    fn locate(row: usize, col: usize) -> Result<(usize, u8)> {
        if row >= SCREEN_HEIGHT || col >= SCREEN_WIDTH {
            return Err(Chip8Error::OutOfRange {
                address: row * SCREEN_WIDTH + col,
                size: SCREEN_WIDTH * SCREEN_HEIGHT,
            });
        }
        let mask = 0x80 >> (col % PIXELS_PER_BYTE);
        Ok((row * BYTES_PER_ROW + col / PIXELS_PER_BYTE, mask))
    }

    pub fn pixel(&self, row: usize, col: usize) -> Result<bool> {
        let (byte, mask) = Self::locate(row, col)?;
        Ok(self.bytes[byte] & mask != 0)
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, lit: bool) -> Result<()> {
        let (byte, mask) = Self::locate(row, col)?;
        if lit {
            self.bytes[byte] |= mask;
        } else {
            self.bytes[byte] &= !mask;
        }
        Ok(())
    }

    /// flip one pixel; true if it was lit beforehand (i.e. a collision)
    pub fn xor_pixel(&mut self, row: usize, col: usize) -> Result<bool> {
        let (byte, mask) = Self::locate(row, col)?;
        let was_lit = self.bytes[byte] & mask != 0;
        self.bytes[byte] ^= mask;
        Ok(was_lit)
    }

    pub fn clear(&mut self) {
        self.bytes = [0; SCREEN_BYTES];
    }

    /// the packed framebuffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn lit_count(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }
}

impl Readable for Screen {
    fn read(&self, addr: usize) -> Result<u8> {
        self.bytes.get(addr).copied().ok_or(Chip8Error::OutOfRange {
            address: addr,
            size: SCREEN_BYTES,
        })
    }
}

impl Writable for Screen {
    fn write(&mut self, addr: usize, value: u8) -> Result<()> {
        let slot = self.bytes.get_mut(addr).ok_or(Chip8Error::OutOfRange {
            address: addr,
            size: SCREEN_BYTES,
        })?;
        *slot ^= value;
        Ok(())
    }
}
