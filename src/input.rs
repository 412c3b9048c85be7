use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use log::warn;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

use crate::keypad::KEY_COUNT;

/// the COSMAC hex keypad laid over the left-hand side of a qwerty keyboard
///
///   1 2 3 C        1 2 3 4
///   4 5 6 D   <-   q w e r
///   7 8 9 E        a s d f
///   A 0 B F        z x c v
pub const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// something the host needs to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { key: u8, pressed: bool },
    Quit,
}

/// reads keypresses and turns them into keypad transitions
pub trait Input {
    /// everything that happened since the last poll; never blocks
    fn poll_events(&mut self) -> io::Result<Vec<InputEvent>>;
}

/// Keyboard input from a raw-mode terminal.
///
/// Terminals only report presses, so each press is held for `hold` and then
/// released; repeats while held just extend the hold.
pub struct TerminalInput {
    keymap: HashMap<char, u8>,
    hold: Duration,
    held_until: [Option<Instant>; KEY_COUNT],
}

impl TerminalInput {
    pub fn new(hold: Duration) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(TerminalInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            hold,
            held_until: [None; KEY_COUNT],
        })
    }

    fn press(&mut self, key: u8, now: Instant, events: &mut Vec<InputEvent>) {
        let slot = &mut self.held_until[key as usize];
        if slot.is_none() {
            events.push(InputEvent::Key { key, pressed: true });
        }
        *slot = Some(now + self.hold);
    }

    fn expire(&mut self, now: Instant, events: &mut Vec<InputEvent>) {
        for (key, slot) in self.held_until.iter_mut().enumerate() {
            if matches!(slot, Some(deadline) if *deadline <= now) {
                *slot = None;
                events.push(InputEvent::Key {
                    key: key as u8,
                    pressed: false,
                });
            }
        }
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TerminalInput {
    fn poll_events(&mut self) -> io::Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        let now = Instant::now();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        events.push(InputEvent::Quit)
                    }
                    KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                        Some(&key) => self.press(key, now, &mut events),
                        None => warn!("can't map {:?} to a COSMAC key", c),
                    },
                    KeyCode::Esc => events.push(InputEvent::Quit),
                    other => warn!("unhandled key event {:?}", other),
                }
            }
        }
        self.expire(now, &mut events);
        Ok(events)
    }
}

/// scripted Input for testing; each poll hands out the next batch
#[derive(Default)]
pub struct DummyInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<InputEvent>>) -> Self {
        DummyInput {
            batches: batches.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> io::Result<Vec<InputEvent>> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}
