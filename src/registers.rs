use crate::error::{Chip8Error, Result};

/// how many general purpose registers there are
pub const REGISTER_COUNT: usize = 16;

/// V[F] doubles as carry, borrow and sprite collision flag
pub const FLAG_REGISTER: usize = 0xf;

/// The CHIP-8 register file. Everything is sized to the real machine so
/// arithmetic on these fields wraps naturally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    pub(crate) v: [u8; REGISTER_COUNT],
    pub(crate) i: u16,
    pub(crate) pc: u16,
    pub(crate) sp: u16,
    pub(crate) dt: u8,
    pub(crate) st: u8,
}

impl Registers {
    pub fn new(pc: u16, sp: u16) -> Self {
        Registers {
            pc,
            sp,
            ..Default::default()
        }
    }

    pub fn v(&self, register: usize) -> Result<u8> {
        self.v
            .get(register)
            .copied()
            .ok_or(Chip8Error::InvalidRegisterIndex(register))
    }

    pub fn set_v(&mut self, register: usize, value: u8) -> Result<()> {
        let slot = self
            .v
            .get_mut(register)
            .ok_or(Chip8Error::InvalidRegisterIndex(register))?;
        *slot = value;
        Ok(())
    }

    /// all sixteen V registers
    pub fn v_all(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn set_i(&mut self, value: u16) {
        self.i = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    pub fn delay_timer(&self) -> u8 {
        self.dt
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.dt = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.st
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.st = value;
    }

    /// count both timers down by one, stopping at zero
    pub fn tick_timers(&mut self) {
        self.dt = self.dt.saturating_sub(1);
        self.st = self.st.saturating_sub(1);
    }
}
