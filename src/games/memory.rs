use crate::error::GameError;
use crate::term::{self, Input, Rgb, TerminalGuard, bg, RESET};
use crossterm::event::KeyCode;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

pub const SYMBOLS: [&str; 18] = [
    "🤖", "👽", "👻", "🤡", "🐧", "🦚", "😄", "🚀", "🦊", "😂", "😩", "👀", "😛", "👿", "🍐",
    "🐙", "🌵", "🎃",
];
pub const COLUMNS: usize = 6;
const CELL_WIDTH: usize = 6;
const BOARD_TOP: usize = 3;
const POLL_MS: u64 = 100;

const CARD_BACK: Rgb = Rgb::new(60, 70, 110);
const CARD_FACE: Rgb = Rgb::new(200, 200, 210);
const CARD_MATCHED: Rgb = Rgb::new(0, 150, 70);
const CURSOR: Rgb = Rgb::new(255, 215, 0);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlipOutcome
{
    Ignored,
    First,
    Matched,
    Mismatched,
}

pub struct MemoryGame
{
    board: Vec<&'static str>,
    flipped: Vec<usize>,
    matched: BTreeSet<usize>,
    moves: u32,
    game_over: bool,
}

impl MemoryGame
{
    pub fn new(rng: &mut impl Rng) -> Self
    {
        let mut game = Self {
            board: Vec::new(),
            flipped: Vec::new(),
            matched: BTreeSet::new(),
            moves: 0,
            game_over: false,
        };
        game.initialize(rng);
        game
    }

    /// Reshuffles the board and clears every counter and flag.
    pub fn initialize(&mut self, rng: &mut impl Rng)
    {
        let mut board: Vec<&'static str> = SYMBOLS.iter().chain(SYMBOLS.iter()).copied().collect();
        board.shuffle(rng);
        self.board = board;
        self.flipped.clear();
        self.matched.clear();
        self.moves = 0;
        self.game_over = false;
    }

    pub fn flip(&mut self, index: usize) -> FlipOutcome
    {
        if self.game_over
            || index >= self.board.len()
            || self.flipped.contains(&index)
            || self.matched.contains(&index)
        {
            return FlipOutcome::Ignored;
        }

        if self.flipped.len() == 2 {
            self.flipped.clear();
        }
        self.flipped.push(index);
        self.moves += 1;

        if self.flipped.len() < 2 {
            return FlipOutcome::First;
        }

        let (first, second) = (self.flipped[0], self.flipped[1]);
        if self.board[first] != self.board[second] {
            return FlipOutcome::Mismatched;
        }
        self.matched.insert(first);
        self.matched.insert(second);
        if self.matched.len() == self.board.len() {
            self.game_over = true;
        }
        FlipOutcome::Matched
    }

    pub fn board(&self) -> &[&'static str]
    {
        &self.board
    }

    pub fn is_face_up(&self, index: usize) -> bool
    {
        self.flipped.contains(&index) || self.matched.contains(&index)
    }

    pub fn is_matched(&self, index: usize) -> bool
    {
        self.matched.contains(&index)
    }

    pub fn moves(&self) -> u32
    {
        self.moves
    }

    pub fn pairs_found(&self) -> usize
    {
        self.matched.len() / 2
    }

    pub fn is_game_over(&self) -> bool
    {
        self.game_over
    }

    fn rows(&self) -> usize
    {
        self.board.len().div_ceil(COLUMNS)
    }
}

/// Maps a screen position to the card drawn there.
pub fn cell_at(column: u16, row: u16, cards: usize) -> Option<usize>
{
    let row = (row as usize).checked_sub(BOARD_TOP)?;
    let col = column as usize / CELL_WIDTH;
    if col >= COLUMNS {
        return None;
    }
    let index = row * COLUMNS + col;
    (index < cards).then_some(index)
}

fn move_cursor(cursor: usize, code: KeyCode, cards: usize) -> usize
{
    let rows = cards.div_ceil(COLUMNS);
    let (row, col) = (cursor / COLUMNS, cursor % COLUMNS);
    let (row, col) = match code {
        KeyCode::Left => (row, (col + COLUMNS - 1) % COLUMNS),
        KeyCode::Right => (row, (col + 1) % COLUMNS),
        KeyCode::Up => ((row + rows - 1) % rows, col),
        KeyCode::Down => ((row + 1) % rows, col),
        _ => (row, col),
    };
    (row * COLUMNS + col).min(cards.saturating_sub(1))
}

pub fn run() -> Result<(), GameError>
{
    let mut rng = rand::thread_rng();
    let mut game = MemoryGame::new(&mut rng);
    let mut term = TerminalGuard::enter()?;
    let mut cursor = 0usize;
    info!("memory game started");

    draw_ui(&mut term, &game, cursor)?;
    loop {
        let Some(input) = term::poll_input(Duration::from_millis(POLL_MS))? else {
            continue;
        };
        match input {
            Input::Quit | Input::Key(KeyCode::Char('q')) => break,
            Input::Key(KeyCode::Char('r')) => {
                game.initialize(&mut rng);
                cursor = 0;
                info!("memory board reset");
            }
            Input::Key(KeyCode::Enter | KeyCode::Char(' ')) => {
                flip_and_log(&mut game, cursor);
            }
            Input::Key(code) => {
                cursor = move_cursor(cursor, code, game.board().len());
            }
            Input::Click { column, row } => {
                if let Some(index) = cell_at(column, row, game.board().len()) {
                    cursor = index;
                    flip_and_log(&mut game, index);
                }
            }
        }
        draw_ui(&mut term, &game, cursor)?;
    }

    Ok(())
}

fn flip_and_log(game: &mut MemoryGame, index: usize)
{
    let outcome = game.flip(index);
    debug!(index, ?outcome, moves = game.moves(), "card flipped");
    if outcome == FlipOutcome::Matched && game.is_game_over() {
        info!(moves = game.moves(), "memory game solved");
    }
}

fn draw_ui(term: &mut TerminalGuard, game: &MemoryGame, cursor: usize) -> Result<(), GameError>
{
    let mut lines = Vec::new();
    lines.push("Arcade Minis - Memory Game".to_string());
    lines.push(format!(
        "Moves - {}   Pairs: {}/{}",
        game.moves(),
        game.pairs_found(),
        SYMBOLS.len()
    ));
    lines.push(String::new());

    for row in 0..game.rows() {
        let mut line = String::new();
        for col in 0..COLUMNS {
            let index = row * COLUMNS + col;
            if index >= game.board().len() {
                break;
            }
            line.push_str(&render_card(game, index, index == cursor));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(format!("GameOver - {}", game.is_game_over()));
    lines.push("Arrows move, Enter/Space or click flips, R resets, Esc quits.".to_string());
    term.present(&lines)
}

fn render_card(game: &MemoryGame, index: usize, selected: bool) -> String
{
    let (face, color) = if game.is_matched(index) {
        (game.board()[index], CARD_MATCHED)
    } else if game.is_face_up(index) {
        (game.board()[index], CARD_FACE)
    } else {
        ("  ", CARD_BACK)
    };
    let (open, close) = if selected {
        (term::paint("[", CURSOR), term::paint("]", CURSOR))
    } else {
        (" ".to_string(), " ".to_string())
    };
    format!("{open}{} {face} {RESET}{close}", bg(color))
}

#[cfg(test)]
mod tests
{
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded(seed: u64) -> MemoryGame
    {
        MemoryGame::new(&mut StdRng::seed_from_u64(seed))
    }

    fn partner(game: &MemoryGame, index: usize) -> usize
    {
        game.board()
            .iter()
            .enumerate()
            .position(|(other, symbol)| other != index && *symbol == game.board()[index])
            .unwrap()
    }

    fn solve(game: &mut MemoryGame)
    {
        for index in 0..game.board().len() {
            if game.is_matched(index) {
                continue;
            }
            let other = partner(game, index);
            game.flip(index);
            game.flip(other);
        }
    }

    #[test]
    fn mismatch_stays_flippable()
    {
        let mut game = seeded(1);
        let first = 0;
        let stranger = (1..game.board().len())
            .find(|&i| game.board()[i] != game.board()[first])
            .unwrap();

        assert_eq!(game.flip(first), FlipOutcome::First);
        assert_eq!(game.flip(stranger), FlipOutcome::Mismatched);
        assert!(!game.is_matched(first));
        assert!(game.is_face_up(stranger));

        let third = (1..game.board().len()).find(|&i| i != stranger).unwrap();
        assert_eq!(game.flip(third), FlipOutcome::First);
        assert!(!game.is_face_up(first));
        assert!(!game.is_face_up(stranger));
        assert_eq!(game.moves(), 3);
    }

    #[test]
    fn match_is_permanent()
    {
        let mut game = seeded(2);
        let other = partner(&game, 0);
        game.flip(0);
        assert_eq!(game.flip(other), FlipOutcome::Matched);
        assert_eq!(game.flip(0), FlipOutcome::Ignored);
        assert_eq!(game.flip(other), FlipOutcome::Ignored);
        assert!(game.is_matched(0) && game.is_matched(other));
        assert_eq!(game.pairs_found(), 1);
    }

    #[test]
    fn clicking_the_open_card_again_does_nothing()
    {
        let mut game = seeded(3);
        game.flip(5);
        assert_eq!(game.flip(5), FlipOutcome::Ignored);
        assert_eq!(game.flip(99), FlipOutcome::Ignored);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn solving_every_pair_ends_the_game()
    {
        let mut game = seeded(4);
        solve(&mut game);
        assert!(game.is_game_over());
        assert_eq!(game.pairs_found(), SYMBOLS.len());
        assert_eq!(game.moves() as usize, game.board().len());
        assert_eq!(game.flip(0), FlipOutcome::Ignored);
    }

    #[test]
    fn initialize_resets_everything()
    {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = MemoryGame::new(&mut rng);
        solve(&mut game);
        game.initialize(&mut rng);
        assert!(!game.is_game_over());
        assert_eq!(game.moves(), 0);
        assert_eq!(game.pairs_found(), 0);
        assert!((0..game.board().len()).all(|i| !game.is_face_up(i)));
    }

    #[test]
    fn clicks_map_to_cells()
    {
        let cards = SYMBOLS.len() * 2;
        assert_eq!(cell_at(0, 3, cards), Some(0));
        assert_eq!(cell_at(7, 3, cards), Some(1));
        assert_eq!(cell_at(35, 8, cards), Some(35));
        assert_eq!(cell_at(36, 3, cards), None);
        assert_eq!(cell_at(3, 2, cards), None);
        assert_eq!(cell_at(3, 9, cards), None);
    }

    #[test]
    fn cursor_wraps_around_the_grid()
    {
        let cards = SYMBOLS.len() * 2;
        assert_eq!(move_cursor(0, KeyCode::Left, cards), 5);
        assert_eq!(move_cursor(0, KeyCode::Up, cards), 30);
        assert_eq!(move_cursor(35, KeyCode::Down, cards), 5);
        assert_eq!(move_cursor(7, KeyCode::Right, cards), 8);
    }

    proptest! {
        #[test]
        fn every_symbol_appears_twice(seed in any::<u64>())
        {
            let game = seeded(seed);
            prop_assert_eq!(game.board().len(), SYMBOLS.len() * 2);
            for symbol in SYMBOLS {
                prop_assert_eq!(game.board().iter().filter(|s| **s == symbol).count(), 2);
            }
        }

        #[test]
        fn moves_count_accepted_clicks(seed in any::<u64>(), clicks in prop::collection::vec(0usize..40, 0..120))
        {
            let mut game = seeded(seed);
            let mut accepted = 0u32;
            for index in clicks {
                if game.flip(index) != FlipOutcome::Ignored {
                    accepted += 1;
                }
                prop_assert_eq!(game.is_game_over(), game.pairs_found() == SYMBOLS.len());
            }
            prop_assert_eq!(game.moves(), accepted);
        }
    }
}
