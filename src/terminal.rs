// Copyright (c) 2026 rezky_nightky

use std::io::{self, stdout, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::{cursor, execute, queue, terminal, QueueableCommand};
use unicode_width::UnicodeWidthChar;

use crate::cell::Cell;
use crate::frame::Frame;

/// What is on screen right now, cell for cell.
struct Shown {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Shown {
    fn blank(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(None); usize::from(width) * usize::from(height)],
        }
    }

    fn matches(&self, frame: &Frame) -> bool {
        self.width == frame.width && self.height == frame.height
    }
}

/// What the terminal currently has selected, so repeated attributes are not
/// re-sent. `pos` is `None` when the cursor location is unknown.
#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
    pos: Option<(u16, u16)>,
}

fn columns_of(ch: char) -> u16 {
    ch.width().unwrap_or(1) as u16
}

fn advance(x: u16, y: u16, cols: u16, width: u16) -> Option<(u16, u16)> {
    let next = x.saturating_add(cols);
    (cols > 0 && next < width).then_some((next, y))
}

pub struct Terminal {
    stdout: Stdout,
    shown: Option<Shown>,
    run_buf: String,
    rows: Vec<Vec<usize>>,
    touched: Vec<u16>,
}

/// Puts the terminal back in cooked mode on the main screen.
fn leave(out: &mut impl Write) {
    let _ = execute!(
        out,
        SetAttribute(Attribute::Reset),
        ResetColor,
        cursor::Show,
        terminal::EnableLineWrap,
        terminal::LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

impl Terminal {
    pub fn new() -> io::Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let entered = execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
            SetAttribute(Attribute::Reset),
            ResetColor,
            terminal::Clear(terminal::ClearType::All)
        );
        if let Err(e) = entered {
            leave(&mut out);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            shown: None,
            run_buf: String::with_capacity(64),
            rows: Vec::new(),
            touched: Vec::new(),
        })
    }

    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> io::Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> io::Result<Event> {
        event::read()
    }

    fn queue_style(out: &mut Stdout, pen: &mut Pen, cell: &Cell) -> io::Result<()> {
        if cell.fg != pen.fg {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            pen.fg = cell.fg;
        }
        if cell.bg != pen.bg {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            pen.bg = cell.bg;
        }
        if cell.bold != pen.bold {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            pen.bold = cell.bold;
        }
        Ok(())
    }

    fn finish(&mut self, frame: &mut Frame) -> io::Result<()> {
        queue!(self.stdout, SetAttribute(Attribute::Reset), ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    /// Writes `frame` to the screen. Small updates only touch dirty cells,
    /// batching neighbours that share a style into one print.
    pub fn draw(&mut self, frame: &mut Frame) -> io::Result<()> {
        let stale = !self.shown.as_ref().is_some_and(|s| s.matches(frame));
        if stale {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.shown = Some(Shown::blank(frame.width, frame.height));
        }

        let width = usize::from(frame.width);
        let area = width * usize::from(frame.height);
        let repaint = stale
            || frame.is_dirty_all()
            || (area > 0 && frame.dirty_indices().len() >= area / 3);

        if repaint {
            self.repaint(frame)?;
        } else {
            self.patch(frame)?;
        }
        self.finish(frame)
    }

    fn repaint(&mut self, frame: &Frame) -> io::Result<()> {
        let Some(shown) = self.shown.as_mut() else {
            return Ok(());
        };
        let width = usize::from(frame.width);
        let mut pen = Pen::default();
        for (idx, slot) in shown.cells.iter_mut().enumerate() {
            let cell = frame.cell_at_index(idx);
            *slot = cell;
            if cell.is_continuation() {
                continue;
            }
            let at = ((idx % width) as u16, (idx / width) as u16);
            if pen.pos != Some(at) {
                self.stdout.queue(cursor::MoveTo(at.0, at.1))?;
            }
            Self::queue_style(&mut self.stdout, &mut pen, &cell)?;
            self.stdout.queue(Print(cell.ch))?;
            pen.pos = advance(at.0, at.1, columns_of(cell.ch), frame.width);
        }
        Ok(())
    }

    fn patch(&mut self, frame: &Frame) -> io::Result<()> {
        let Some(shown) = self.shown.as_mut() else {
            return Ok(());
        };
        let width = usize::from(frame.width);
        let height = usize::from(frame.height);
        if self.rows.len() != height {
            self.rows = vec![Vec::new(); height];
        }
        self.touched.clear();

        for &idx in frame.dirty_indices() {
            let row = idx / width;
            let Some(bucket) = self.rows.get_mut(row) else {
                continue;
            };
            if bucket.is_empty() {
                self.touched.push(row as u16);
            }
            bucket.push(idx);
        }
        self.touched.sort_unstable();

        let mut pen = Pen::default();
        for &y in &self.touched {
            let bucket = &mut self.rows[usize::from(y)];
            bucket.sort_unstable();
            let mut i = 0usize;
            while i < bucket.len() {
                let start = bucket[i];
                let lead = frame.cell_at_index(start);
                let unchanged = shown.cells[start] == lead;
                shown.cells[start] = lead;
                // a lone continuation is still covered by its unchanged lead
                if unchanged || lead.is_continuation() {
                    i += 1;
                    continue;
                }

                let x = (start % width) as u16;
                self.run_buf.clear();
                self.run_buf.push(lead.ch);
                let mut run_cols = columns_of(lead.ch);
                let mut exact = run_cols > 0;
                let mut covered = run_cols.saturating_sub(1);
                let mut prev = start;
                let mut j = i + 1;

                while let Some(&next) = bucket.get(j) {
                    if next != prev + 1 {
                        break;
                    }
                    let cell = frame.cell_at_index(next);
                    if cell.is_continuation() {
                        if covered == 0 {
                            break;
                        }
                        covered -= 1;
                    } else {
                        let same_style =
                            cell.fg == lead.fg && cell.bg == lead.bg && cell.bold == lead.bold;
                        if covered > 0 || shown.cells[next] == cell || !same_style {
                            break;
                        }
                        self.run_buf.push(cell.ch);
                        let cols = columns_of(cell.ch);
                        exact &= cols > 0;
                        run_cols = run_cols.saturating_add(cols);
                        covered = cols.saturating_sub(1);
                    }
                    shown.cells[next] = cell;
                    prev = next;
                    j += 1;
                }

                if pen.pos != Some((x, y)) {
                    self.stdout.queue(cursor::MoveTo(x, y))?;
                }
                Self::queue_style(&mut self.stdout, &mut pen, &lead)?;
                self.stdout.queue(Print(self.run_buf.as_str()))?;
                pen.pos = if exact {
                    advance(x, y, run_cols, frame.width)
                } else {
                    None
                };
                i = j;
            }
            bucket.clear();
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        leave(&mut self.stdout);
    }
}

/// Restores the terminal without a [`Terminal`] handle, for panic and
/// signal paths.
pub fn restore_terminal_best_effort() {
    leave(&mut stdout());
}
