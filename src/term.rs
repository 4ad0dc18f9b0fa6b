use crate::error::GameError;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use std::time::Duration;

pub const RESET: &str = "\x1b[0m";

pub struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    pub fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide, EnableMouseCapture)?;
        Ok(Self { stdout })
    }

    /// Replaces the whole screen with `lines`.
    pub fn present(&mut self, lines: &[String]) -> Result<(), GameError>
    {
        let output = format!("{}\r\n", lines.join("\r\n"));
        queue!(self.stdout, MoveTo(0, 0), Clear(ClearType::All))?;
        self.stdout.write_all(output.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    pub fn bell(&mut self) -> Result<(), GameError>
    {
        self.stdout.write_all(b"\x07")?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, DisableMouseCapture, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb
{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb
{
    pub const fn new(r: u8, g: u8, b: u8) -> Self
    {
        Self { r, g, b }
    }
}

pub fn fg(color: Rgb) -> String
{
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

pub fn bg(color: Rgb) -> String
{
    format!("\x1b[48;2;{};{};{}m", color.r, color.g, color.b)
}

pub fn paint(text: &str, color: Rgb) -> String
{
    format!("{}{}{}", fg(color), text, RESET)
}

/// What the games care about from the raw event stream.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Input
{
    Quit,
    Key(KeyCode),
    Click { column: u16, row: u16 },
}

pub fn translate(event: Event) -> Option<Input>
{
    match event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) => {
            if kind == KeyEventKind::Release {
                return None;
            }
            match code {
                KeyCode::Esc => Some(Input::Quit),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Input::Quit)
                }
                KeyCode::Char(ch) => Some(Input::Key(KeyCode::Char(ch.to_ascii_lowercase()))),
                other => Some(Input::Key(other)),
            }
        }
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) => Some(Input::Click { column, row }),
        _ => None,
    }
}

/// Waits up to `timeout` for one meaningful input.
pub fn poll_input(timeout: Duration) -> Result<Option<Input>, GameError>
{
    if !event::poll(timeout)? {
        return Ok(None);
    }
    Ok(translate(event::read()?))
}
