use crate::screen::{SCREEN_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::{Backend, CrosstermBackend};
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the host to put the screen somewhere a human can see
/// it. It only ever gets the packed framebuffer, so a variety of kinds of
/// screen would work.
pub trait Display {
    /// draw packed 1bpp data, MSB leftmost, rows top to bottom
    fn draw(&mut self, data: &[u8]) -> io::Result<()>;

    /// how big the display data should be
    fn get_display_size_bytes(&self) -> usize;
}

// width, height, bitplanes
struct Resolution(usize, usize, usize);

impl Resolution {
    fn byte_count(&self) -> usize {
        self.0 * self.1 * self.2 / 8
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every lit pixel; y is negated so row 0 is at
    /// the top of the canvas
    fn lit_points(&self, data: &[u8]) -> Vec<(f64, f64)> {
        let w = self.0;
        (0..self.0 * self.1)
            .filter(|count| data[count / 8] & (0x80 >> (count % 8)) != 0)
            .map(|count| ((count % w) as f64, -1.0 * (count / w) as f64))
            .collect()
    }
}

/// paint packed 1bpp data as a bordered canvas, one terminal cell per pixel
fn render<B: Backend>(
    terminal: &mut Terminal<B>,
    resolution: &Resolution,
    title: &str,
    data: &[u8],
) -> io::Result<()> {
    let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);
    let points = resolution.lit_points(data);
    let x_bounds = resolution.x_bounds();
    let y_bounds = resolution.y_bounds();
    terminal.draw(|f| {
        let canvas = Canvas::default()
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::Black)),
            )
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .marker(Marker::Block)
            .paint(|ctx| {
                ctx.draw(&Points {
                    coords: &points,
                    color: Color::White,
                });
            });
        f.render_widget(canvas, size);
    })?;
    Ok(())
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    title: String,
}

impl MonoTermDisplay {
    pub fn new(title: &str) -> io::Result<MonoTermDisplay> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(SCREEN_WIDTH, SCREEN_HEIGHT, 1),
            title: title.to_string(),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, data: &[u8]) -> io::Result<()> {
        if data.len() != self.resolution.byte_count() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "MonoTermDisplay wants {} bytes, got {}",
                    self.resolution.byte_count(),
                    data.len()
                ),
            ));
        }

        render(&mut self.terminal, &self.resolution, &self.title, data)
    }

    fn get_display_size_bytes(&self) -> usize {
        self.resolution.byte_count()
    }
}

/// useful for testing non-display routines; remembers the last frame
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub last_frame: Vec<u8>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, data: &[u8]) -> io::Result<()> {
        self.frames += 1;
        self.last_frame = data.to_vec();
        Ok(())
    }

    fn get_display_size_bytes(&self) -> usize {
        SCREEN_BYTES
    }
}
