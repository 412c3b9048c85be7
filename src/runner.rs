use crate::display::Display;
use crate::error::Result;
use crate::input::{Input, InputEvent};
use crate::interpreter::Chip8Interpreter;
use crate::sound::Sound;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// why `Runner::run` came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Quit,
    CycleLimit,
}

/// The host side main loop.
///
/// Time is cut into frames at the timer rate. Each frame:
///  - drain the input and feed the keypad
///  - run a frame's worth of instructions, unless halted on FX0A
///  - tick the timers, redraw if the screen changed, start/stop the buzzer
///  - sleep off whatever is left of the frame
///
/// so instructions run as fast as possible and then wait, which keeps the
/// wall-clock rate right without being cycle-accurate.
pub struct Runner<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    paced: bool,
    beeping: bool,
    last_frame: Option<Vec<u8>>,
}

impl<'a> Runner<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        Runner {
            interpreter,
            display,
            input,
            sound,
            paced: true,
            beeping: false,
            last_frame: None,
        }
    }

    /// run flat out with no sleeping; for tests and benchmarks
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    fn cycles_per_frame(&self) -> u64 {
        let config = self.interpreter.config();
        (config.cpu_hz / config.timer_hz.max(1)).max(1) as u64
    }

    /// run until the user quits, `max_cycles` instruction slots have passed,
    /// or the interpreter errors
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<StopReason> {
        let frame_period = self.interpreter.config().timer_period();
        let per_frame = self.cycles_per_frame();
        let mut cycles: u64 = 0;
        info!(
            "running at {} cycles per frame, {:?} per frame",
            per_frame, frame_period
        );

        loop {
            let frame_start = Instant::now();

            if self.handle_input()? {
                return Ok(StopReason::Quit);
            }

            for _ in 0..per_frame {
                if max_cycles.map_or(false, |max| cycles >= max) {
                    return Ok(StopReason::CycleLimit);
                }
                cycles += 1;
                if self.interpreter.has_execution_halted() {
                    // the rest of this frame's slots are spent waiting
                    continue;
                }
                self.interpreter.tick()?;
            }

            self.interpreter.tick_timers();
            self.refresh_display()?;
            self.update_sound();

            if self.paced {
                pace(frame_start, frame_period);
            }
        }
    }

    /// true when quit was asked for
    fn handle_input(&mut self) -> Result<bool> {
        for event in self.input.poll_events()? {
            match event {
                InputEvent::Key { key, pressed } => {
                    self.interpreter.set_key_pressed(key, pressed)?
                }
                InputEvent::Quit => {
                    debug!("quit requested");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn refresh_display(&mut self) -> Result<()> {
        let frame = self.interpreter.screen().as_bytes();
        if self.last_frame.as_deref() != Some(frame) {
            self.display.draw(frame)?;
            self.last_frame = Some(frame.to_vec());
        }
        Ok(())
    }

    fn update_sound(&mut self) {
        let want = self.interpreter.is_sound_active();
        if want == self.beeping {
            return;
        }
        let result = if want {
            self.sound.beep()
        } else {
            self.sound.stop()
        };
        if let Err(e) = result {
            // no retry; carry on silently
            warn!("sound failed: {}", e);
        }
        self.beeping = want;
    }
}

fn pace(frame_start: Instant, frame_period: Duration) {
    if let Some(remaining) = frame_period.checked_sub(frame_start.elapsed()) {
        spin_sleep::sleep(remaining);
    }
}
