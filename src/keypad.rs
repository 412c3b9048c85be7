use crate::device::{Readable, Writable};
use crate::error::{Chip8Error, Result};

pub const KEY_COUNT: usize = 16;

/// bytes of memory-mapped key state; eight keys per byte
pub const KEYPAD_BYTES: usize = KEY_COUNT / 8;

/// The hex keypad: sixteen keys 0x0 - 0xF and a latch for FX0A.
///
/// Arming the latch makes the next press (not-pressed -> pressed) get
/// remembered; holding or releasing keys never resolves it. Which register
/// the key ends up in is the interpreter's business, not ours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
    waiting: bool,
    pressed_key: Option<u8>,
}

fn check_key(key: u8) -> Result<usize> {
    if (key as usize) < KEY_COUNT {
        Ok(key as usize)
    } else {
        Err(Chip8Error::InvalidKey(key))
    }
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_key_pressed(&self, key: u8) -> Result<bool> {
        Ok(self.keys[check_key(key)?])
    }

    pub fn set_key_pressed(&mut self, key: u8, pressed: bool) -> Result<()> {
        let idx = check_key(key)?;
        let edge = pressed && !self.keys[idx];
        self.keys[idx] = pressed;
        if edge && self.waiting {
            self.waiting = false;
            self.pressed_key = Some(key);
        }
        Ok(())
    }

    /// arm the latch; re-arming forgets any earlier wait
    pub fn wait_for_key_press(&mut self) {
        self.waiting = true;
        self.pressed_key = None;
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// hand over the key that resolved the last wait, if any
    pub fn take_pressed_key(&mut self) -> Option<u8> {
        self.pressed_key.take()
    }
}

// memory-mapped view: byte 0 holds keys 0-7, byte 1 keys 8-F, MSB first

impl Readable for Keypad {
    fn read(&self, addr: usize) -> Result<u8> {
        if addr >= KEYPAD_BYTES {
            return Err(Chip8Error::OutOfRange {
                address: addr,
                size: KEYPAD_BYTES,
            });
        }
        Ok(self.keys[addr * 8..addr * 8 + 8]
            .iter()
            .fold(0u8, |acc, &k| (acc << 1) | k as u8))
    }
}

impl Writable for Keypad {
    fn write(&mut self, addr: usize, value: u8) -> Result<()> {
        if addr >= KEYPAD_BYTES {
            return Err(Chip8Error::OutOfRange {
                address: addr,
                size: KEYPAD_BYTES,
            });
        }
        for bit in 0..8 {
            let key = (addr * 8 + bit) as u8;
            self.set_key_pressed(key, value & (0x80 >> bit) != 0)?;
        }
        Ok(())
    }
}
