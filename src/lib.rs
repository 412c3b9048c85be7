//!
//! ## Design
//!
//! * one `tick()` is one CHIP-8 instruction; no attempt at COSMAC VIP
//!   machine-cycle timing
//! * CHIP-8 instructions run as fast as possible then sleep, to match
//!   timings; so not quite authentic
//! * abstract display, input and sound so alternatives can be plugged in;
//!   starting with TUI in-console
//! * devices are plain structs that can also be hung off an address `Bus`,
//!   so more of them (ROM, DMA, ...) can share one address space later
//!
//! Model
//!
//! Host (main.rs)
//!  |-- config, display, input, sound
//!  |-- interpreter(config)
//!  |    |-- registers, memory(config), screen, keypad
//!  |    `-- decode table -> execute
//!  `-- runner(interpreter, display, input, sound)
//!       |-- input events -> keypad
//!       |-- cpu_hz / timer_hz ticks, skipped while halted on FX0A
//!       |-- tick_timers(); redraw if the screen changed; beep while ST > 0
//!       `-- sleep out the rest of the frame
//!
//! Bus
//!  |-- readable registry: [lower, upper) -> Weak<RefCell<dyn Readable>>
//!  `-- writable registry: [lower, upper) -> Weak<RefCell<dyn Writable>>
//!
//! NB. the bus is a standalone component. The interpreter owns its memory,
//! screen and keypad by value and never fetches through a `Bus`, so devices
//! hung off a bus are the host's own instances, not the ones the CPU drives.

pub mod bus;
pub mod config;
pub mod device;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod registers;
pub mod runner;
pub mod screen;
pub mod sound;

pub use bus::{AddressRange, Bus};
pub use config::{Config, UnknownOpcodePolicy};
pub use device::{Readable, Writable};
pub use error::{Chip8Error, Result};
pub use instruction::{disassemble, Instruction, Operation};
pub use interpreter::{Chip8Interpreter, PendingKeyWait, Tick};
pub use keypad::Keypad;
pub use memory::Memory;
pub use registers::Registers;
pub use runner::{Runner, StopReason};
pub use screen::Screen;
