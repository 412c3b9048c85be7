use crate::memory::{CHIP8_PROGRAM_ADDR, CHIP8_RAM_SIZE_BYTES, CHIP8_STACK_ADDR};
use std::time::Duration;

/// What to do with a word that isn't in the instruction set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownOpcodePolicy {
    /// stop and hand `UnknownOpcode` to the host
    Error,
    /// log it and carry on as if it were a no-op
    Ignore,
}

/// Knobs for building an interpreter and driving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// memory capacity; also the modulus for PC arithmetic
    pub memory_size: usize,
    pub program_addr: u16,
    pub stack_addr: u16,
    /// instructions per second
    pub cpu_hz: u32,
    /// timer decrements (and frames) per second
    pub timer_hz: u32,
    pub unknown_opcode: UnknownOpcodePolicy,
    /// fixed seed for CXKK; entropy when None
    pub rng_seed: Option<u64>,
    /// terminals don't report key releases, so a press is held this long
    pub key_hold: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory_size: CHIP8_RAM_SIZE_BYTES,
            program_addr: CHIP8_PROGRAM_ADDR,
            stack_addr: CHIP8_STACK_ADDR,
            cpu_hz: 500,
            timer_hz: 60,
            unknown_opcode: UnknownOpcodePolicy::Error,
            rng_seed: None,
            key_hold: Duration::from_millis(100),
        }
    }
}

impl Config {
    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs(1) / self.cpu_hz.max(1)
    }

    pub fn timer_period(&self) -> Duration {
        Duration::from_secs(1) / self.timer_hz.max(1)
    }
}
