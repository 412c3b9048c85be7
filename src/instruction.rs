use std::fmt;

/// Every operation in the CHIP-8 instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Sys,               // 0nnn
    Cls,               // 00E0
    Ret,               // 00EE
    Jump,              // 1nnn
    Call,              // 2nnn
    SkipEqImm,         // 3xkk
    SkipNeImm,         // 4xkk
    SkipEqReg,         // 5xy0
    LoadImm,           // 6xkk
    AddImm,            // 7xkk
    Copy,              // 8xy0
    Or,                // 8xy1
    And,               // 8xy2
    Xor,               // 8xy3
    Add,               // 8xy4
    Sub,               // 8xy5
    ShiftRight,        // 8xy6
    SubReverse,        // 8xy7
    ShiftLeft,         // 8xyE
    SkipNeReg,         // 9xy0
    LoadI,             // Annn
    JumpOffset,        // Bnnn
    Random,            // Cxkk
    Draw,              // Dxyn
    SkipKeyPressed,    // Ex9E
    SkipKeyNotPressed, // ExA1
    LoadDelay,         // Fx07
    WaitKey,           // Fx0A
    SetDelay,          // Fx15
    SetSound,          // Fx18
    AddI,              // Fx1E
    LoadFont,          // Fx29
    Bcd,               // Fx33
    Store,             // Fx55
    Load,              // Fx65
}

/// (mask, value, operation): an opcode matches when `opcode & mask == value`.
/// Checked top to bottom, so the exact 00E0/00EE entries must stay ahead of
/// the 0nnn catch-all.
#[rustfmt::skip]
pub const DECODE_TABLE: [(u16, u16, Operation); 35] = [
    (0xffff, 0x00e0, Operation::Cls),
    (0xffff, 0x00ee, Operation::Ret),
    (0xf000, 0x0000, Operation::Sys),
    (0xf000, 0x1000, Operation::Jump),
    (0xf000, 0x2000, Operation::Call),
    (0xf000, 0x3000, Operation::SkipEqImm),
    (0xf000, 0x4000, Operation::SkipNeImm),
    (0xf00f, 0x5000, Operation::SkipEqReg),
    (0xf000, 0x6000, Operation::LoadImm),
    (0xf000, 0x7000, Operation::AddImm),
    (0xf00f, 0x8000, Operation::Copy),
    (0xf00f, 0x8001, Operation::Or),
    (0xf00f, 0x8002, Operation::And),
    (0xf00f, 0x8003, Operation::Xor),
    (0xf00f, 0x8004, Operation::Add),
    (0xf00f, 0x8005, Operation::Sub),
    (0xf00f, 0x8006, Operation::ShiftRight),
    (0xf00f, 0x8007, Operation::SubReverse),
    (0xf00f, 0x800e, Operation::ShiftLeft),
    (0xf00f, 0x9000, Operation::SkipNeReg),
    (0xf000, 0xa000, Operation::LoadI),
    (0xf000, 0xb000, Operation::JumpOffset),
    (0xf000, 0xc000, Operation::Random),
    (0xf000, 0xd000, Operation::Draw),
    (0xf0ff, 0xe09e, Operation::SkipKeyPressed),
    (0xf0ff, 0xe0a1, Operation::SkipKeyNotPressed),
    (0xf0ff, 0xf007, Operation::LoadDelay),
    (0xf0ff, 0xf00a, Operation::WaitKey),
    (0xf0ff, 0xf015, Operation::SetDelay),
    (0xf0ff, 0xf018, Operation::SetSound),
    (0xf0ff, 0xf01e, Operation::AddI),
    (0xf0ff, 0xf029, Operation::LoadFont),
    (0xf0ff, 0xf033, Operation::Bcd),
    (0xf0ff, 0xf055, Operation::Store),
    (0xf0ff, 0xf065, Operation::Load),
];

/// A decoded opcode; the operand fields are sliced out of the raw word on
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Operation,
    pub opcode: u16,
}

impl Instruction {
    /// None when the word is not in the instruction set
    pub fn decode(opcode: u16) -> Option<Instruction> {
        DECODE_TABLE
            .iter()
            .find(|(mask, value, _)| opcode & mask == *value)
            .map(|&(_, _, op)| Instruction { op, opcode })
    }

    pub fn x(&self) -> usize {
        ((self.opcode & 0x0f00) >> 8) as usize
    }

    pub fn y(&self) -> usize {
        ((self.opcode & 0x00f0) >> 4) as usize
    }

    pub fn n(&self) -> u8 {
        (self.opcode & 0x000f) as u8
    }

    pub fn kk(&self) -> u8 {
        (self.opcode & 0x00ff) as u8
    }

    pub fn addr(&self) -> u16 {
        self.opcode & 0x0fff
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Operation::*;
        let (x, y, kk, addr) = (self.x(), self.y(), self.kk(), self.addr());
        match self.op {
            Sys => write!(f, "SYS 0x{:03x}", addr),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jump => write!(f, "JP 0x{:03x}", addr),
            Call => write!(f, "CALL 0x{:03x}", addr),
            SkipEqImm => write!(f, "SE V{:X}, 0x{:02x}", x, kk),
            SkipNeImm => write!(f, "SNE V{:X}, 0x{:02x}", x, kk),
            SkipEqReg => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadImm => write!(f, "LD V{:X}, 0x{:02x}", x, kk),
            AddImm => write!(f, "ADD V{:X}, 0x{:02x}", x, kk),
            Copy => write!(f, "LD V{:X}, V{:X}", x, y),
            Or => write!(f, "OR V{:X}, V{:X}", x, y),
            And => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor => write!(f, "XOR V{:X}, V{:X}", x, y),
            Add => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubReverse => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipNeReg => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadI => write!(f, "LD I, 0x{:03x}", addr),
            JumpOffset => write!(f, "JP V0, 0x{:03x}", addr),
            Random => write!(f, "RND V{:X}, 0x{:02x}", x, kk),
            Draw => write!(f, "DRW V{:X}, V{:X}, {}", x, y, self.n()),
            SkipKeyPressed => write!(f, "SKP V{:X}", x),
            SkipKeyNotPressed => write!(f, "SKNP V{:X}", x),
            LoadDelay => write!(f, "LD V{:X}, DT", x),
            WaitKey => write!(f, "LD V{:X}, K", x),
            SetDelay => write!(f, "LD DT, V{:X}", x),
            SetSound => write!(f, "LD ST, V{:X}", x),
            AddI => write!(f, "ADD I, V{:X}", x),
            LoadFont => write!(f, "LD F, V{:X}", x),
            Bcd => write!(f, "LD B, V{:X}", x),
            Store => write!(f, "LD [I], V{:X}", x),
            Load => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

/// one line per opcode, e.g. `0x0200: 6105  LD V1, 0x05`; a trailing odd
/// byte is ignored
pub fn disassemble(program: &[u8], base: u16) -> Vec<String> {
    program
        .chunks_exact(2)
        .enumerate()
        .map(|(idx, word)| {
            let opcode = ((word[0] as u16) << 8) | word[1] as u16;
            let addr = base.wrapping_add((idx * 2) as u16);
            match Instruction::decode(opcode) {
                Some(instr) => format!("0x{:04x}: {:04x}  {}", addr, opcode, instr),
                None => format!("0x{:04x}: {:04x}  ???", addr, opcode),
            }
        })
        .collect()
}
