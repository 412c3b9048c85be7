use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use chip8_vm::config::{Config, UnknownOpcodePolicy};
use chip8_vm::display::MonoTermDisplay;
use chip8_vm::input::TerminalInput;
use chip8_vm::instruction::disassemble;
use chip8_vm::interpreter::Chip8Interpreter;
use chip8_vm::runner::{Runner, StopReason};
use chip8_vm::sound::{Mute, SimpleBeep, Sound};

#[derive(Parser, Debug)]
#[command(name = "chip8_vm", about = "Run a CHIP-8 program in the terminal")]
struct Args {
    /// program image, loaded at 0x200
    rom: PathBuf,

    /// instructions per second
    #[arg(long, default_value_t = 500)]
    cpu_hz: u32,

    /// memory size in bytes (4096 or up to 65536)
    #[arg(long, default_value_t = 4096)]
    memory_size: usize,

    /// treat unknown opcodes as no-ops instead of stopping
    #[arg(long)]
    ignore_unknown_opcodes: bool,

    /// seed for CXKK so runs are repeatable
    #[arg(long)]
    seed: Option<u64>,

    /// stop after this many instruction slots
    #[arg(long)]
    cycles: Option<u64>,

    /// no PC speaker
    #[arg(long)]
    mute: bool,

    /// print the program as mnemonics and exit
    #[arg(long)]
    disassemble: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            memory_size: self.memory_size,
            cpu_hz: self.cpu_hz,
            unknown_opcode: if self.ignore_unknown_opcodes {
                UnknownOpcodePolicy::Ignore
            } else {
                UnknownOpcodePolicy::Error
            },
            rng_seed: self.seed,
            ..Config::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config();

    if args.disassemble {
        let program = std::fs::read(&args.rom)?;
        for line in disassemble(&program, config.program_addr) {
            println!("{}", line);
        }
        return Ok(());
    }

    let key_hold = config.key_hold;
    let mut interpreter = Chip8Interpreter::new(config)?;
    let mut f = File::open(&args.rom)?;
    let loaded = interpreter.load_program(&mut f)?;
    info!("loaded {} bytes from {}", loaded, args.rom.display());

    let title = format!("CHIP-8: {}", args.rom.display());
    let mut display = MonoTermDisplay::new(&title)?;
    let mut input = TerminalInput::new(key_hold)?;
    let mut sound: Box<dyn Sound> = if args.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let stopped = {
        let mut runner = Runner::new(interpreter, &mut display, &mut input, sound.as_mut());
        runner.run(args.cycles)
    };
    // make sure the buzzer doesn't outlive us
    let _ = sound.stop();
    match stopped? {
        StopReason::Quit => info!("quit"),
        StopReason::CycleLimit => info!("cycle limit reached"),
    }
    Ok(())
}
