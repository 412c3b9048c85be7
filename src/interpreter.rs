//! # interpreter
//!
//! The machine state the CHIP-8 program can see:
//!  V0-VF  8bit general registers; VF is clobbered as a flag by arithmetic,
//!         shifts and sprite collisions
//!  I      16bit address register
//!  PC     program counter                     -- 0x200
//!  SP     stack pointer                       -- 0x200; the stack grows
//!                                                downward into the reserved
//!                                                area below the program
//!  DT/ST  delay and sound timers, counted down at 60Hz by the host
//!
//! `tick()` runs exactly one instruction. After FX0A the interpreter sits in
//! a halted state until the keypad sees a fresh key press; ticking while
//! halted is harmless and just reports `Tick::Halted`.

use crate::config::{Config, UnknownOpcodePolicy};
use crate::device::{Readable, Writable};
use crate::error::{Chip8Error, Result};
use crate::instruction::{Instruction, Operation};
use crate::keypad::Keypad;
use crate::memory::{Memory, CHIP8_FONT_ADDR, CHIP8_FONT_GLYPH_BYTES};
use crate::registers::{Registers, FLAG_REGISTER};
use crate::screen::{Screen, SCREEN_HEIGHT, SCREEN_WIDTH};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;

/// FX1E always wraps I at 4K, whatever the memory size
const I_WRAP: u32 = 0x1000;

/// PC is a u16 so it can never address beyond 64K
const MAX_ADDRESS_SPACE: usize = 0x10000;

/// FX0A is outstanding; the pressed key goes into `target_register`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingKeyWait {
    pub target_register: usize,
}

/// what a call to `tick()` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Executed(Instruction),
    /// unknown opcode skipped under `UnknownOpcodePolicy::Ignore`
    Ignored(u16),
    /// waiting on FX0A; nothing was fetched
    Halted,
}

pub struct Chip8Interpreter {
    config: Config,
    address_space: usize,
    registers: Registers,
    memory: Memory,
    screen: Screen,
    keypad: Keypad,
    key_wait: Option<PendingKeyWait>,
    rng: StdRng,
}

impl Chip8Interpreter {
    pub fn new(config: Config) -> Result<Chip8Interpreter> {
        let memory = Memory::with_font(config.memory_size)?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Chip8Interpreter {
            address_space: config.memory_size.min(MAX_ADDRESS_SPACE),
            registers: Registers::new(config.program_addr, config.stack_addr),
            memory,
            screen: Screen::new(),
            keypad: Keypad::new(),
            key_wait: None,
            rng,
            config,
        })
    }

    /// load a chip8 program at the configured program address
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        self.memory
            .load(reader, self.config.program_addr as usize)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    pub fn pending_key_wait(&self) -> Option<PendingKeyWait> {
        self.key_wait
    }

    /// true from FX0A until a key press arrives
    pub fn has_execution_halted(&self) -> bool {
        self.key_wait.is_some()
    }

    /// the buzzer should sound while ST is non-zero
    pub fn is_sound_active(&self) -> bool {
        self.registers.st > 0
    }

    /// press or release a key, resolving any FX0A straight away
    pub fn set_key_pressed(&mut self, key: u8, pressed: bool) -> Result<()> {
        // make sure the latch is armed before the press reaches the keypad
        self.resolve_key_wait();
        self.keypad.set_key_pressed(key, pressed)?;
        self.resolve_key_wait();
        Ok(())
    }

    /// 60Hz
    pub fn tick_timers(&mut self) {
        self.registers.tick_timers();
    }

    /// fetch, decode and execute one instruction
    pub fn tick(&mut self) -> Result<Tick> {
        if self.key_wait.is_some() {
            self.resolve_key_wait();
            if self.key_wait.is_some() {
                return Ok(Tick::Halted);
            }
        }

        let pc = self.registers.pc;
        let hi = self.memory.read(pc as usize)? as u16;
        let lo = self.memory.read(self.wrap(pc as usize + 1) as usize)? as u16;
        let opcode = (hi << 8) | lo;
        self.registers.pc = self.wrap(pc as usize + 2);

        match Instruction::decode(opcode) {
            Some(instr) => {
                trace!("0x{:04x}: {:04x}  {}", pc, opcode, instr);
                self.execute(instr)?;
                Ok(Tick::Executed(instr))
            }
            None => match self.config.unknown_opcode {
                UnknownOpcodePolicy::Error => Err(Chip8Error::UnknownOpcode {
                    opcode,
                    address: pc,
                }),
                UnknownOpcodePolicy::Ignore => {
                    warn!("ignoring unknown opcode 0x{:04x} at 0x{:04x}", opcode, pc);
                    Ok(Tick::Ignored(opcode))
                }
            },
        }
    }

    fn wrap(&self, addr: usize) -> u16 {
        (addr % self.address_space) as u16
    }

    /// Finish FX0A if the keypad has latched a key. The keypad is reachable
    /// through `keypad_mut()`, so its latch may have been drained or
    /// replaced; while a wait is pending it gets re-armed.
    fn resolve_key_wait(&mut self) {
        if let Some(wait) = self.key_wait {
            if let Some(key) = self.keypad.take_pressed_key() {
                debug!("key 0x{:x} resolved wait on V{:X}", key, wait.target_register);
                self.registers.v[wait.target_register] = key;
                self.key_wait = None;
            } else if !self.keypad.is_waiting() {
                debug!("re-arming keypad for wait on V{:X}", wait.target_register);
                self.keypad.wait_for_key_press();
            }
        }
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.registers.pc = self.wrap(self.registers.pc as usize + 2);
        }
    }

    fn execute(&mut self, instr: Instruction) -> Result<()> {
        let (x, y, kk) = (instr.x(), instr.y(), instr.kk());
        let vx = self.registers.v[x];
        let vy = self.registers.v[y];
        let i = self.registers.i as usize;
        let r = &mut self.registers;

        match instr.op {
            Operation::Sys => {}
            Operation::Cls => self.screen.clear(),
            Operation::Ret => {
                let sp = r.sp as usize;
                let hi = self.memory.read(sp)? as u16;
                let lo = self.memory.read(sp + 1)? as u16;
                r.pc = (hi << 8) | lo;
                r.sp = r.sp.wrapping_add(2);
            }
            Operation::Jump => r.pc = instr.addr(),
            Operation::Call => {
                let sp = r.sp.wrapping_sub(2);
                let pc = r.pc;
                self.memory.write(sp as usize, (pc >> 8) as u8)?;
                self.memory.write(sp as usize + 1, pc as u8)?;
                r.sp = sp;
                r.pc = instr.addr();
            }
            Operation::SkipEqImm => self.skip_if(vx == kk),
            Operation::SkipNeImm => self.skip_if(vx != kk),
            Operation::SkipEqReg => self.skip_if(vx == vy),
            Operation::LoadImm => r.v[x] = kk,
            Operation::AddImm => r.v[x] = vx.wrapping_add(kk),
            Operation::Copy => r.v[x] = vy,
            Operation::Or => r.v[x] = vx | vy,
            Operation::And => r.v[x] = vx & vy,
            Operation::Xor => r.v[x] = vx ^ vy,
            Operation::Add => {
                let (sum, carry) = vx.overflowing_add(vy);
                r.v[x] = sum;
                r.v[FLAG_REGISTER] = carry as u8;
            }
            Operation::Sub => {
                r.v[x] = vx.wrapping_sub(vy);
                r.v[FLAG_REGISTER] = (vx >= vy) as u8;
            }
            Operation::ShiftRight => {
                r.v[FLAG_REGISTER] = vy & 0x01;
                r.v[x] = vy >> 1;
            }
            Operation::SubReverse => {
                r.v[x] = vy.wrapping_sub(vx);
                r.v[FLAG_REGISTER] = (vy >= vx) as u8;
            }
            Operation::ShiftLeft => {
                r.v[FLAG_REGISTER] = (vy >> 7) & 0x01;
                r.v[x] = vy << 1;
            }
            Operation::SkipNeReg => self.skip_if(vx != vy),
            Operation::LoadI => r.i = instr.addr(),
            Operation::JumpOffset => {
                let target = instr.addr() as usize + r.v[0] as usize;
                self.registers.pc = self.wrap(target);
            }
            Operation::Random => r.v[x] = self.rng.gen::<u8>() & kk,
            Operation::Draw => self.draw(vx as usize, vy as usize, instr.n())?,
            Operation::SkipKeyPressed => {
                let pressed = self.keypad.is_key_pressed(vx & 0x0f)?;
                self.skip_if(pressed);
            }
            Operation::SkipKeyNotPressed => {
                let pressed = self.keypad.is_key_pressed(vx & 0x0f)?;
                self.skip_if(!pressed);
            }
            Operation::LoadDelay => r.v[x] = r.dt,
            Operation::WaitKey => {
                self.keypad.wait_for_key_press();
                self.key_wait = Some(PendingKeyWait { target_register: x });
            }
            Operation::SetDelay => r.dt = vx,
            Operation::SetSound => r.st = vx,
            Operation::AddI => r.i = ((r.i as u32 + vx as u32) % I_WRAP) as u16,
            Operation::LoadFont => {
                r.i = CHIP8_FONT_ADDR + (vx % 16) as u16 * CHIP8_FONT_GLYPH_BYTES;
            }
            Operation::Bcd => {
                self.memory.write(i, vx / 100)?;
                self.memory.write(i + 1, (vx / 10) % 10)?;
                self.memory.write(i + 2, vx % 10)?;
            }
            Operation::Store => {
                for reg in 0..=x {
                    self.memory.write(i + reg, self.registers.v[reg])?;
                }
            }
            Operation::Load => {
                for reg in 0..=x {
                    self.registers.v[reg] = self.memory.read(i + reg)?;
                }
            }
        }
        Ok(())
    }

    /// DXYN: XOR an n-byte sprite from [I] with its top-left corner at
    /// (row V[x], column V[y]). Every pixel wraps on its own. VF ends up 1
    /// iff some lit pixel went dark.
    fn draw(&mut self, row: usize, col: usize, n: u8) -> Result<()> {
        let i = self.registers.i as usize;
        let sprite = self.memory.slice(i, n as usize)?.to_vec();
        let mut collision = false;
        for (line, bits) in sprite.iter().enumerate() {
            for bit in 0..8 {
                if bits & (0x80 >> bit) != 0 {
                    let r = (row + line) % SCREEN_HEIGHT;
                    let c = (col + bit) % SCREEN_WIDTH;
                    collision |= self.screen.xor_pixel(r, c)?;
                }
            }
        }
        self.registers.v[FLAG_REGISTER] = collision as u8;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter_with(program: &[u16]) -> Chip8Interpreter {
        interpreter_with_config(program, Config::default())
    }

    fn interpreter_with_config(program: &[u16], config: Config) -> Chip8Interpreter {
        let mut i = Chip8Interpreter::new(config).unwrap();
        let bytes: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
        i.load_program(&mut bytes.as_slice()).unwrap();
        i
    }

    fn run(i: &mut Chip8Interpreter, ticks: usize) -> Result<()> {
        for _ in 0..ticks {
            i.tick()?;
        }
        Ok(())
    }

    fn v(i: &Chip8Interpreter, reg: usize) -> u8 {
        i.registers().v(reg).unwrap()
    }

    #[test]
    fn test_program_load_ok() -> Result<()> {
        let mut i = Chip8Interpreter::new(Config::default())?;
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(i.load_program(&mut prog)?, 2);
        assert_eq!(i.memory().slice(0x200, 2)?, &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_too_big() {
        let mut i = Chip8Interpreter::new(Config::default()).unwrap();
        let big = vec![0u8; 4096 - 0x200 + 1];
        assert!(matches!(
            i.load_program(&mut big.as_slice()),
            Err(Chip8Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_initial_state() -> Result<()> {
        let i = Chip8Interpreter::new(Config::default())?;
        assert_eq!(i.registers().pc(), 0x200);
        assert_eq!(i.registers().sp(), 0x200);
        assert_eq!(i.registers().v_all(), &[0; 16]);
        assert!(!i.has_execution_halted());
        assert_eq!(i.memory().slice(0, 5)?, &[0xf0, 0x90, 0x90, 0x90, 0xf0]);
        Ok(())
    }

    #[test]
    fn test_load_then_add() -> Result<()> {
        let mut i = interpreter_with(&[0x6105, 0x7103]);
        run(&mut i, 2)?;
        assert_eq!(v(&i, 1), 8);
        assert_eq!(i.registers().pc(), 0x204);
        Ok(())
    }

    #[test]
    fn test_add_immediate_wraps_without_flag() -> Result<()> {
        let mut i = interpreter_with(&[0x61ff, 0x7102]);
        run(&mut i, 2)?;
        assert_eq!(v(&i, 1), 1);
        assert_eq!(v(&i, 0xf), 0);
        Ok(())
    }

    #[test]
    fn test_sys_is_ignored() -> Result<()> {
        let mut i = interpreter_with(&[0x0123]);
        let before = i.registers().clone();
        assert!(matches!(i.tick()?, Tick::Executed(_)));
        assert_eq!(i.registers().pc(), 0x202);
        assert_eq!(i.registers().v_all(), before.v_all());
        Ok(())
    }

    #[test]
    fn test_cls() -> Result<()> {
        let mut i = interpreter_with(&[0x00e0]);
        i.screen_mut().set_pixel(4, 4, true)?;
        i.tick()?;
        assert_eq!(i.screen().lit_count(), 0);
        Ok(())
    }

    #[test]
    fn test_jump() -> Result<()> {
        let mut i = interpreter_with(&[0x1abc]);
        i.tick()?;
        assert_eq!(i.registers().pc(), 0xabc);
        Ok(())
    }

    #[test]
    fn test_call_and_return() -> Result<()> {
        // 0x200 call 0x206; 0x202 V0 = 1; 0x204 loop; 0x206 return
        let mut i = interpreter_with(&[0x2206, 0x6001, 0x1204, 0x00ee]);
        i.tick()?;
        assert_eq!(i.registers().pc(), 0x206);
        assert_eq!(i.registers().sp(), 0x1fe);
        assert_eq!(i.memory().slice(0x1fe, 2)?, &[0x02, 0x02]);
        i.tick()?;
        assert_eq!(i.registers().pc(), 0x202);
        assert_eq!(i.registers().sp(), 0x200);
        i.tick()?;
        assert_eq!(v(&i, 0), 1);
        Ok(())
    }

    #[test]
    fn test_skips() -> Result<()> {
        let cases: Vec<(Vec<u16>, u16)> = vec![
            (vec![0x6142, 0x3142], 0x206),
            (vec![0x6142, 0x3143], 0x204),
            (vec![0x6142, 0x4142], 0x204),
            (vec![0x6142, 0x4143], 0x206),
            (vec![0x6142, 0x6242, 0x5120], 0x208),
            (vec![0x6142, 0x6243, 0x5120], 0x206),
            (vec![0x6142, 0x6242, 0x9120], 0x206),
            (vec![0x6142, 0x6243, 0x9120], 0x208),
        ];
        for (program, expected) in cases.iter() {
            let mut i = interpreter_with(&program);
            run(&mut i, program.len())?;
            assert_eq!(i.registers().pc(), *expected, "{:04x?}", program);
        }
        Ok(())
    }

    #[test]
    fn test_logic() -> Result<()> {
        let cases = [
            (0x8120, 0x0f),
            (0x8121, 0xff),
            (0x8122, 0x00),
            (0x8123, 0xff),
        ];
        for (opcode, expected) in cases.iter() {
            let mut i = interpreter_with(&[0x61f0, 0x620f, *opcode]);
            run(&mut i, 3)?;
            assert_eq!(v(&i, 1), *expected, "{:04x}", opcode);
        }
        Ok(())
    }

    #[test]
    fn test_add_with_carry() -> Result<()> {
        let mut i = interpreter_with(&[0x61ff, 0x6202, 0x8124]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (0x01, 1));

        let mut i = interpreter_with(&[0x6110, 0x6220, 0x8124]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (0x30, 0));
        Ok(())
    }

    #[test]
    fn test_flag_written_after_result() -> Result<()> {
        // VF as the destination: the flag wins
        let mut i = interpreter_with(&[0x6fff, 0x6201, 0x8f24]);
        run(&mut i, 3)?;
        assert_eq!(v(&i, 0xf), 1);
        Ok(())
    }

    #[test]
    fn test_sub() -> Result<()> {
        let mut i = interpreter_with(&[0x6105, 0x6203, 0x8125]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (2, 1));

        let mut i = interpreter_with(&[0x6103, 0x6205, 0x8125]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (0xfe, 0));

        let mut i = interpreter_with(&[0x6107, 0x6207, 0x8125]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (0, 1));
        Ok(())
    }

    #[test]
    fn test_sub_reverse() -> Result<()> {
        let mut i = interpreter_with(&[0x6103, 0x6205, 0x8127]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (2, 1));

        let mut i = interpreter_with(&[0x6105, 0x6203, 0x8127]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (0xfe, 0));
        Ok(())
    }

    #[test]
    fn test_shifts_use_vy() -> Result<()> {
        let mut i = interpreter_with(&[0x61aa, 0x6205, 0x8126]);
        run(&mut i, 3)?;
        assert_eq!((v(&i, 1), v(&i, 2), v(&i, 0xf)), (0x02, 0x05, 1));

        let mut i = interpreter_with(&[0x6281, 0x812e]);
        run(&mut i, 2)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (0x02, 1));

        let mut i = interpreter_with(&[0x6241, 0x812e]);
        run(&mut i, 2)?;
        assert_eq!((v(&i, 1), v(&i, 0xf)), (0x82, 0));
        Ok(())
    }

    #[test]
    fn test_load_i_and_jump_offset() -> Result<()> {
        let mut i = interpreter_with(&[0xa005]);
        i.tick()?;
        assert_eq!(i.registers().i(), 0x005);

        let mut i = interpreter_with(&[0x6004, 0xb300]);
        run(&mut i, 2)?;
        assert_eq!(i.registers().pc(), 0x304);

        let mut i = interpreter_with(&[0x60ff, 0xbfff]);
        run(&mut i, 2)?;
        assert_eq!(i.registers().pc(), 0x0fe);
        Ok(())
    }

    #[test]
    fn test_random_is_masked_and_seeded() -> Result<()> {
        let mut i = interpreter_with(&[0x61ff, 0xc100]);
        run(&mut i, 2)?;
        assert_eq!(v(&i, 1), 0);

        let seeded = Config {
            rng_seed: Some(8),
            ..Config::default()
        };
        let mut a = interpreter_with_config(&[0xc10f, 0xc2ff], seeded.clone());
        let mut b = interpreter_with_config(&[0xc10f, 0xc2ff], seeded);
        run(&mut a, 2)?;
        run(&mut b, 2)?;
        assert_eq!(v(&a, 1), v(&b, 1));
        assert_eq!(v(&a, 2), v(&b, 2));
        assert_eq!(v(&a, 1) & 0xf0, 0);
        Ok(())
    }

    #[test]
    fn test_draw_and_undraw() -> Result<()> {
        // glyph "0" at the top-left, twice
        let mut i = interpreter_with(&[0xa000, 0x6000, 0x6100, 0xd015, 0xd015]);
        run(&mut i, 4)?;
        assert_eq!(v(&i, 0xf), 0);
        for col in 0..4 {
            assert!(i.screen().pixel(0, col)?);
        }
        assert!(!i.screen().pixel(0, 4)?);
        assert!(i.screen().pixel(1, 0)?);
        assert!(!i.screen().pixel(1, 1)?);
        assert_eq!(i.screen().lit_count(), 14);
        i.tick()?;
        assert_eq!(v(&i, 0xf), 1);
        assert_eq!(i.screen().lit_count(), 0);
        Ok(())
    }

    #[test]
    fn test_draw_uses_vx_as_row() -> Result<()> {
        let mut i = interpreter_with(&[0xa000, 0x6000, 0x6108, 0xd011]);
        run(&mut i, 4)?;
        for col in 8..12 {
            assert!(i.screen().pixel(0, col)?);
        }
        assert!(!i.screen().pixel(8, 0)?);
        assert_eq!(i.screen().lit_count(), 4);
        Ok(())
    }

    #[test]
    fn test_draw_wraps_each_pixel() -> Result<()> {
        // 0xf0 then 0x90 at row 31, column 62
        let mut i = interpreter_with(&[0xa000, 0x601f, 0x613e, 0xd012]);
        run(&mut i, 4)?;
        for col in [62, 63, 0, 1] {
            assert!(i.screen().pixel(31, col)?, "row 31 col {}", col);
        }
        assert!(i.screen().pixel(0, 62)?);
        assert!(i.screen().pixel(0, 1)?);
        assert!(!i.screen().pixel(0, 63)?);
        assert_eq!(i.screen().lit_count(), 6);
        Ok(())
    }

    #[test]
    fn test_draw_collision_only_on_overlap() -> Result<()> {
        // two 0xf0 rows side by side share no pixel
        let mut i = interpreter_with(&[0xa000, 0x6000, 0x6100, 0xd011, 0x6104, 0xd011]);
        run(&mut i, 6)?;
        assert_eq!(v(&i, 0xf), 0);
        assert_eq!(i.screen().lit_count(), 8);
        Ok(())
    }

    #[test]
    fn test_key_skips() -> Result<()> {
        let mut i = interpreter_with(&[0x6125, 0xe19e]);
        i.set_key_pressed(5, true)?;
        run(&mut i, 2)?;
        assert_eq!(i.registers().pc(), 0x206);

        let mut i = interpreter_with(&[0x6105, 0xe1a1]);
        i.set_key_pressed(5, true)?;
        run(&mut i, 2)?;
        assert_eq!(i.registers().pc(), 0x204);

        let mut i = interpreter_with(&[0x6106, 0xe1a1]);
        i.set_key_pressed(5, true)?;
        run(&mut i, 2)?;
        assert_eq!(i.registers().pc(), 0x206);
        Ok(())
    }

    #[test]
    fn test_timers() -> Result<()> {
        let mut i = interpreter_with(&[0x6120, 0xf115, 0xf118, 0xf207]);
        run(&mut i, 4)?;
        assert_eq!(i.registers().delay_timer(), 0x20);
        assert_eq!(i.registers().sound_timer(), 0x20);
        assert_eq!(v(&i, 2), 0x20);
        assert!(i.is_sound_active());
        i.tick_timers();
        assert_eq!(i.registers().delay_timer(), 0x1f);
        assert_eq!(i.registers().sound_timer(), 0x1f);
        Ok(())
    }

    #[test]
    fn test_wait_for_key() -> Result<()> {
        let mut i = interpreter_with(&[0xf30a, 0x6001]);
        i.tick()?;
        assert!(i.has_execution_halted());
        assert_eq!(
            i.pending_key_wait(),
            Some(PendingKeyWait { target_register: 3 })
        );
        assert_eq!(i.tick()?, Tick::Halted);
        assert_eq!(i.registers().pc(), 0x202);

        i.set_key_pressed(0xc, true)?;
        assert!(!i.has_execution_halted());
        assert_eq!(v(&i, 3), 0xc);
        i.tick()?;
        assert_eq!(v(&i, 0), 1);
        Ok(())
    }

    #[test]
    fn test_wait_needs_a_fresh_press() -> Result<()> {
        let mut i = interpreter_with(&[0xf30a]);
        i.set_key_pressed(2, true)?;
        i.tick()?;
        i.set_key_pressed(2, true)?;
        assert!(i.has_execution_halted());
        i.set_key_pressed(2, false)?;
        assert!(i.has_execution_halted());
        i.set_key_pressed(2, true)?;
        assert!(!i.has_execution_halted());
        assert_eq!(v(&i, 3), 2);
        Ok(())
    }

    #[test]
    fn test_wait_resolved_through_keypad_on_next_tick() -> Result<()> {
        let mut i = interpreter_with(&[0xf40a, 0x6001]);
        i.tick()?;
        i.keypad_mut().set_key_pressed(9, true)?;
        // latched, but not seen until the next tick
        assert!(i.has_execution_halted());
        assert!(matches!(i.tick()?, Tick::Executed(_)));
        assert!(!i.has_execution_halted());
        assert_eq!(v(&i, 4), 9);
        assert_eq!(v(&i, 0), 1);
        Ok(())
    }

    #[test]
    fn test_wait_survives_drained_keypad_latch() -> Result<()> {
        let mut i = interpreter_with(&[0xf30a, 0x6001]);
        i.tick()?;
        i.keypad_mut().set_key_pressed(1, true)?;
        assert_eq!(i.keypad_mut().take_pressed_key(), Some(1));

        assert!(i.has_execution_halted());
        for _ in 0..10 {
            assert_eq!(i.tick()?, Tick::Halted);
        }
        assert!(i.keypad().is_waiting());

        i.keypad_mut().set_key_pressed(1, false)?;
        i.set_key_pressed(2, true)?;
        assert!(!i.has_execution_halted());
        assert_eq!(v(&i, 3), 2);
        i.tick()?;
        assert_eq!(v(&i, 0), 1);
        Ok(())
    }

    #[test]
    fn test_wait_survives_replaced_keypad() -> Result<()> {
        let mut i = interpreter_with(&[0xf50a]);
        i.tick()?;
        *i.keypad_mut() = Keypad::new();
        assert!(i.has_execution_halted());
        // the first press after the swap still counts
        i.set_key_pressed(0xa, true)?;
        assert!(!i.has_execution_halted());
        assert_eq!(v(&i, 5), 0xa);
        Ok(())
    }

    #[test]
    fn test_skip_wraps_at_end_of_memory() -> Result<()> {
        let mut i = interpreter_with(&[]);
        i.memory_mut().write_slice(0xffe, &[0x30, 0x00])?;
        i.registers_mut().set_pc(0xffe);
        i.tick()?;
        assert_eq!(i.registers().pc(), 0x002);
        Ok(())
    }

    #[test]
    fn test_call_with_stack_exhausted() {
        let mut i = interpreter_with(&[0x2300]);
        i.registers_mut().set_sp(0);
        assert!(matches!(
            i.tick(),
            Err(Chip8Error::OutOfRange { address: 0xfffe, .. })
        ));
        assert_eq!(i.registers().sp(), 0);
    }

    #[test]
    fn test_return_off_the_top_of_memory() {
        let mut i = interpreter_with(&[0x00ee]);
        i.registers_mut().set_sp(0xfff);
        assert!(matches!(
            i.tick(),
            Err(Chip8Error::OutOfRange { address: 0x1000, .. })
        ));
        assert_eq!(i.registers().sp(), 0xfff);
        assert_eq!(i.registers().pc(), 0x202);
    }

    #[test]
    fn test_i_arithmetic() -> Result<()> {
        let mut i = interpreter_with(&[0xafff, 0x6102, 0xf11e]);
        run(&mut i, 3)?;
        assert_eq!(i.registers().i(), 0x001);

        let mut i = interpreter_with(&[0x610b, 0xf129]);
        run(&mut i, 2)?;
        assert_eq!(i.registers().i(), 55);

        let mut i = interpreter_with(&[0xa005, 0xf129]);
        run(&mut i, 2)?;
        assert_eq!(i.registers().i(), 0);
        Ok(())
    }

    #[test]
    fn test_bcd() -> Result<()> {
        let mut i = interpreter_with(&[0x627b, 0xa300, 0xf233]);
        run(&mut i, 3)?;
        assert_eq!(i.memory().slice(0x300, 3)?, &[1, 2, 3]);

        let mut i = interpreter_with(&[0x6209, 0xa300, 0xf233]);
        run(&mut i, 3)?;
        assert_eq!(i.memory().slice(0x300, 3)?, &[0, 0, 9]);
        Ok(())
    }

    #[test]
    fn test_store_and_load_registers() -> Result<()> {
        let mut i = interpreter_with(&[
            0x6011, 0x6122, 0x6233, 0x6344, 0x6455, 0xa400, 0xf355, // store V0-V3
            0x6000, 0x6100, 0x6200, 0x6300, 0xf365, // clobber and reload
        ]);
        run(&mut i, 7)?;
        assert_eq!(i.memory().slice(0x400, 5)?, &[0x11, 0x22, 0x33, 0x44, 0x00]);
        assert_eq!(i.registers().i(), 0x400);
        run(&mut i, 5)?;
        assert_eq!(&i.registers().v_all()[..5], &[0x11, 0x22, 0x33, 0x44, 0x55]);
        Ok(())
    }

    #[test]
    fn test_unknown_opcode_errors_by_default() {
        let mut i = interpreter_with(&[0x5121]);
        assert!(matches!(
            i.tick(),
            Err(Chip8Error::UnknownOpcode {
                opcode: 0x5121,
                address: 0x200
            })
        ));
    }

    #[test]
    fn test_unknown_opcode_can_be_ignored() -> Result<()> {
        let config = Config {
            unknown_opcode: UnknownOpcodePolicy::Ignore,
            ..Config::default()
        };
        let mut i = interpreter_with_config(&[0x812f, 0x6001], config);
        assert_eq!(i.tick()?, Tick::Ignored(0x812f));
        i.tick()?;
        assert_eq!(v(&i, 0), 1);
        Ok(())
    }

    #[test]
    fn test_pc_wraps_at_end_of_memory() -> Result<()> {
        let mut i = interpreter_with(&[]);
        i.memory_mut().write_slice(0xffe, &[0x60, 0x01])?;
        i.registers_mut().set_pc(0xffe);
        i.tick()?;
        assert_eq!(i.registers().pc(), 0x000);
        Ok(())
    }

    #[test]
    fn test_memory_errors_propagate() {
        let mut i = interpreter_with(&[0xafff, 0xf155]);
        i.tick().unwrap();
        assert!(matches!(
            i.tick(),
            Err(Chip8Error::OutOfRange { address: 0x1000, .. })
        ));
    }

    #[test]
    fn test_large_memory() -> Result<()> {
        let config = Config {
            memory_size: 0x10000,
            ..Config::default()
        };
        let mut i = interpreter_with_config(&[0x6001], config);
        i.memory_mut().write_slice(0xfffe, &[0x61, 0x02])?;
        i.registers_mut().set_pc(0xfffe);
        i.tick()?;
        assert_eq!(i.registers().pc(), 0);
        assert_eq!(v(&i, 1), 2);
        Ok(())
    }
}
