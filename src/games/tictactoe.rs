use crate::error::GameError;
use crate::term::{self, Input, Rgb, TerminalGuard};
use crossterm::event::KeyCode;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];
const CELL_WIDTH: usize = 6;
const BOARD_TOP: usize = 3;
const POLL_MS: u64 = 100;

const X_COLOR: Rgb = Rgb::new(80, 140, 255);
const O_COLOR: Rgb = Rgb::new(255, 140, 0);
const WIN_COLOR: Rgb = Rgb::new(0, 255, 0);
const CURSOR: Rgb = Rgb::new(255, 215, 0);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mark
{
    X,
    O,
}

impl Mark
{
    fn other(self) -> Self
    {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome
{
    InProgress,
    Won { mark: Mark, line: [usize; 3] },
    Draw,
}

pub struct TicTacToe
{
    cells: [Option<Mark>; 9],
    turn: Mark,
    outcome: Outcome,
}

impl TicTacToe
{
    pub fn new() -> Self
    {
        Self {
            cells: [None; 9],
            turn: Mark::X,
            outcome: Outcome::InProgress,
        }
    }

    pub fn reset(&mut self)
    {
        *self = Self::new();
    }

    /// Places the current player's mark. Returns false if the move is not allowed.
    pub fn play(&mut self, index: usize) -> bool
    {
        if self.outcome != Outcome::InProgress {
            return false;
        }
        match self.cells.get(index) {
            Some(None) => {}
            _ => return false,
        }
        self.cells[index] = Some(self.turn);
        self.outcome = evaluate(&self.cells);
        self.turn = self.turn.other();
        true
    }

    pub fn cell(&self, index: usize) -> Option<Mark>
    {
        self.cells.get(index).copied().flatten()
    }

    pub fn turn(&self) -> Mark
    {
        self.turn
    }

    pub fn outcome(&self) -> Outcome
    {
        self.outcome
    }
}

impl Default for TicTacToe
{
    fn default() -> Self
    {
        Self::new()
    }
}

fn evaluate(cells: &[Option<Mark>; 9]) -> Outcome
{
    for line in LINES {
        if let Some(mark) = cells[line[0]] {
            if cells[line[1]] == Some(mark) && cells[line[2]] == Some(mark) {
                return Outcome::Won { mark, line };
            }
        }
    }
    if cells.iter().all(Option::is_some) {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

/// Maps a screen position to the square drawn there.
pub fn cell_at(column: u16, row: u16) -> Option<usize>
{
    let row = (row as usize).checked_sub(BOARD_TOP)?;
    // board rows are separated by a divider line
    if row % 2 == 1 || row / 2 >= 3 {
        return None;
    }
    let col = column as usize / CELL_WIDTH;
    (col < 3).then_some(row / 2 * 3 + col)
}

fn cell_for_key(ch: char) -> Option<usize>
{
    let digit = ch.to_digit(10)? as usize;
    (1..=9).contains(&digit).then(|| digit - 1)
}

fn move_cursor(cursor: usize, code: KeyCode) -> usize
{
    let (row, col) = (cursor / 3, cursor % 3);
    let (row, col) = match code {
        KeyCode::Left => (row, (col + 2) % 3),
        KeyCode::Right => (row, (col + 1) % 3),
        KeyCode::Up => ((row + 2) % 3, col),
        KeyCode::Down => ((row + 1) % 3, col),
        _ => (row, col),
    };
    row * 3 + col
}

pub fn run() -> Result<(), GameError>
{
    let mut game = TicTacToe::new();
    let mut term = TerminalGuard::enter()?;
    let mut cursor = 4usize;
    info!("tic-tac-toe started");

    draw_ui(&mut term, &game, cursor)?;
    loop {
        let Some(input) = term::poll_input(Duration::from_millis(POLL_MS))? else {
            continue;
        };
        let target = match input {
            Input::Quit | Input::Key(KeyCode::Char('q')) => break,
            Input::Key(KeyCode::Char('r')) => {
                game.reset();
                info!("tic-tac-toe reset");
                None
            }
            Input::Key(KeyCode::Enter | KeyCode::Char(' ')) => Some(cursor),
            Input::Key(KeyCode::Char(ch)) => cell_for_key(ch),
            Input::Key(code) => {
                cursor = move_cursor(cursor, code);
                None
            }
            Input::Click { column, row } => cell_at(column, row),
        };
        if let Some(index) = target {
            cursor = index;
            let player = game.turn();
            if game.play(index) {
                debug!(index, %player, "mark placed");
                if game.outcome() != Outcome::InProgress {
                    info!(outcome = ?game.outcome(), "tic-tac-toe finished");
                }
            }
        }
        draw_ui(&mut term, &game, cursor)?;
    }

    Ok(())
}

fn draw_ui(term: &mut TerminalGuard, game: &TicTacToe, cursor: usize) -> Result<(), GameError>
{
    let mut lines = Vec::new();
    lines.push("Arcade Minis - Tic-tac-toe".to_string());
    lines.push(match game.outcome() {
        Outcome::InProgress => format!("Turn: {}", game.turn()),
        Outcome::Won { mark, .. } => format!("{mark} wins!"),
        Outcome::Draw => "Draw!".to_string(),
    });
    lines.push(String::new());

    let winning = match game.outcome() {
        Outcome::Won { line, .. } => Some(line),
        _ => None,
    };
    for row in 0..3 {
        let mut line = String::new();
        for col in 0..3 {
            let index = row * 3 + col;
            let glyph = match game.cell(index) {
                Some(mark) => {
                    let color = if winning.is_some_and(|line| line.contains(&index)) {
                        WIN_COLOR
                    } else if mark == Mark::X {
                        X_COLOR
                    } else {
                        O_COLOR
                    };
                    term::paint(&mark.to_string(), color)
                }
                None => (index + 1).to_string(),
            };
            if index == cursor {
                line.push_str(&format!(" {}{glyph}{} ", term::paint("[", CURSOR), term::paint("]", CURSOR)));
            } else {
                line.push_str(&format!("  {glyph}  "));
            }
            line.push(if col < 2 { '|' } else { ' ' });
        }
        lines.push(line);
        if row < 2 {
            lines.push("-----+-----+-----".to_string());
        }
    }

    lines.push(String::new());
    lines.push("Keys 1-9, arrows + Enter, or click to play. R resets, Esc quits.".to_string());
    term.present(&lines)
}
