use crate::error::{GameError, StorageError};
use crate::storage::{FileStore, KeyValueStore, PersistentScore};
use crate::term::{self, Input, Rgb, TerminalGuard};
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const TIME_LIMIT: Duration = Duration::from_secs(30);
pub const TIMER_INTERVAL: Duration = Duration::from_secs(1);
pub const HIGH_SCORE_KEY: &str = "whac-a-mole-hi";
pub const NUMBER_OF_MOLES: usize = 5;
pub const MOLE_SCORE: u32 = 100;
pub const POINTS_MIN: u32 = 10;
const POINTS_MULTIPLIER: f64 = 0.9;
const TIME_MULTIPLIER: f32 = 1.25;
const HIT_DURATION: Duration = Duration::from_millis(100);
const SPEED_RANGE: (f32, f32) = (0.5, 1.0);
const DELAY_RANGE: (f32, f32) = (0.5, 4.0);
const REST_RANGE: (f32, f32) = (1.0, 3.0);
const TICK_MS: u64 = 33;
// moles stop speeding up once a rise would take less than two ticks
const MIN_TRAVEL: Duration = Duration::from_millis(TICK_MS * 2);

const HOLE_WIDTH: usize = 11;
const HOLE_DEPTH: usize = 3;
const FIELD_TOP: usize = 5;

const MOLE_COLOR: Rgb = Rgb::new(170, 110, 60);
const HIT_COLOR: Rgb = Rgb::new(255, 80, 80);
const DIRT_COLOR: Rgb = Rgb::new(90, 60, 30);
const GLOW: Rgb = Rgb::new(255, 215, 0);

#[derive(Clone, Copy, PartialEq, Debug)]
enum MolePhase
{
    Waiting { until: Duration },
    Rising { since: Duration },
    Up { until: Duration },
    Sinking { since: Duration },
    Hit { since: Duration, from: f32 },
    Resting { until: Duration },
}

/// One bobbing target. Times are offsets from the start of the session.
#[derive(Clone, Debug)]
pub struct Mole
{
    speed: Duration,
    delay: Duration,
    time_scale: f32,
    points: u32,
    phase: MolePhase,
}

impl Mole
{
    pub fn new(speed: Duration, delay: Duration, now: Duration) -> Self
    {
        Self {
            speed,
            delay,
            time_scale: 1.0,
            points: MOLE_SCORE,
            phase: MolePhase::Waiting { until: now + delay },
        }
    }

    pub fn random(rng: &mut impl Rng, now: Duration) -> Self
    {
        let speed = rng.gen_range(SPEED_RANGE.0..SPEED_RANGE.1);
        let delay = rng.gen_range(DELAY_RANGE.0..DELAY_RANGE.1);
        Self::new(Duration::from_secs_f32(speed), Duration::from_secs_f32(delay), now)
    }

    fn travel(&self) -> Duration
    {
        self.speed.div_f32(self.time_scale)
    }

    fn pause(&self) -> Duration
    {
        self.delay.div_f32(self.time_scale)
    }

    #[cfg(test)]
    pub fn points(&self) -> u32
    {
        self.points
    }

    #[cfg(test)]
    pub fn time_scale(&self) -> f32
    {
        self.time_scale
    }

    pub fn is_hit(&self) -> bool
    {
        matches!(self.phase, MolePhase::Hit { .. })
    }

    /// How far out of the hole the mole is, from 0.0 (hidden) to 1.0.
    pub fn height(&self, now: Duration) -> f32
    {
        match self.phase {
            MolePhase::Waiting { .. } | MolePhase::Resting { .. } => 0.0,
            MolePhase::Up { .. } => 1.0,
            MolePhase::Rising { since } => progress(now, since, self.travel()),
            MolePhase::Sinking { since } => 1.0 - progress(now, since, self.travel()),
            MolePhase::Hit { since, from } => from * (1.0 - progress(now, since, HIT_DURATION)),
        }
    }

    pub fn is_whackable(&self, now: Duration) -> bool
    {
        !self.is_hit() && self.height(now) > 0.0
    }

    /// Runs every phase change due at or before `now`.
    pub fn advance(&mut self, now: Duration, rng: &mut impl Rng)
    {
        loop {
            let phase = self.phase;
            let next = match phase {
                MolePhase::Waiting { until } if now >= until => MolePhase::Rising { since: until },
                MolePhase::Rising { since } if now >= since + self.travel() => {
                    self.decay();
                    MolePhase::Up {
                        until: since + self.travel() + self.pause(),
                    }
                }
                MolePhase::Up { until } if now >= until => MolePhase::Sinking { since: until },
                MolePhase::Sinking { since } if now >= since + self.travel() => {
                    self.decay();
                    MolePhase::Waiting {
                        until: since + self.travel() + self.pause(),
                    }
                }
                MolePhase::Hit { since, .. } if now >= since + HIT_DURATION => {
                    let rest = rng.gen_range(REST_RANGE.0..REST_RANGE.1);
                    MolePhase::Resting {
                        until: since + HIT_DURATION + Duration::from_secs_f32(rest),
                    }
                }
                MolePhase::Resting { until } if now >= until => {
                    let faster = self.time_scale * TIME_MULTIPLIER;
                    if self.speed.div_f32(faster) >= MIN_TRAVEL {
                        self.time_scale = faster;
                    }
                    MolePhase::Rising { since: until }
                }
                _ => break,
            };
            self.phase = next;
        }
    }

    /// Awards the pending points if the mole can be hit right now.
    pub fn whack(&mut self, now: Duration) -> Option<u32>
    {
        if !self.is_whackable(now) {
            return None;
        }
        let awarded = self.points;
        self.points = MOLE_SCORE;
        self.phase = MolePhase::Hit {
            since: now,
            from: self.height(now),
        };
        Some(awarded)
    }

    fn decay(&mut self)
    {
        let reduced = (f64::from(self.points) * POINTS_MULTIPLIER).max(f64::from(POINTS_MIN));
        self.points = reduced.floor() as u32;
    }
}

fn progress(now: Duration, since: Duration, span: Duration) -> f32
{
    if span.is_zero() {
        return 1.0;
    }
    (now.saturating_sub(since).as_secs_f32() / span.as_secs_f32()).clamp(0.0, 1.0)
}

pub fn generate_moles(rng: &mut impl Rng, amount: usize, now: Duration) -> Vec<Mole>
{
    (0..amount).map(|_| Mole::random(&mut *rng, now)).collect()
}

/// Interval countdown that reaches zero exactly once the budget is spent.
#[derive(Clone, Copy, Debug)]
pub struct Countdown
{
    remaining: Duration,
    interval: Duration,
    next_tick: Duration,
}

impl Countdown
{
    pub fn new(budget: Duration, interval: Duration, now: Duration) -> Self
    {
        Self {
            remaining: budget,
            interval,
            next_tick: now + interval,
        }
    }

    /// Returns true once nothing is left.
    pub fn tick(&mut self, now: Duration) -> bool
    {
        while !self.remaining.is_zero() && now >= self.next_tick {
            self.remaining = self.remaining.saturating_sub(self.interval);
            self.next_tick += self.interval;
        }
        self.remaining.is_zero()
    }

    pub fn remaining(&self) -> Duration
    {
        self.remaining
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase
{
    Idle,
    Playing,
    Finished,
}

pub struct WhackGame<S: KeyValueStore>
{
    phase: Phase,
    score: u32,
    high_score: PersistentScore<S>,
    new_high_score: bool,
    moles: Vec<Mole>,
    countdown: Countdown,
    time_limit: Duration,
}

impl<S: KeyValueStore> WhackGame<S>
{
    pub fn new(store: S, time_limit: Duration) -> Self
    {
        let high_score = PersistentScore::load(store, HIGH_SCORE_KEY, 0);
        Self {
            phase: Phase::Idle,
            score: 0,
            high_score,
            new_high_score: false,
            moles: Vec::new(),
            countdown: Countdown::new(time_limit, TIMER_INTERVAL, Duration::ZERO),
            time_limit,
        }
    }

    pub fn start(&mut self, now: Duration, rng: &mut impl Rng)
    {
        self.score = 0;
        self.new_high_score = false;
        self.moles = generate_moles(rng, NUMBER_OF_MOLES, now);
        self.countdown = Countdown::new(self.time_limit, TIMER_INTERVAL, now);
        self.phase = Phase::Playing;
        info!(high_score = self.high_score.get(), "whac-a-mole session started");
    }

    pub fn tick(&mut self, now: Duration, rng: &mut impl Rng) -> Result<(), StorageError>
    {
        if self.phase != Phase::Playing {
            return Ok(());
        }
        for mole in &mut self.moles {
            mole.advance(now, rng);
        }
        if self.countdown.tick(now) {
            self.end()?;
        }
        Ok(())
    }

    /// Brings the mole up to `now` before checking the hit.
    pub fn whack(&mut self, index: usize, now: Duration, rng: &mut impl Rng) -> Option<u32>
    {
        if self.phase != Phase::Playing {
            return None;
        }
        let mole = self.moles.get_mut(index)?;
        mole.advance(now, rng);
        let points = mole.whack(now)?;
        self.score += points;
        debug!(mole = index, points, score = self.score, "mole whacked");
        Some(points)
    }

    pub fn end(&mut self) -> Result<(), StorageError>
    {
        if self.phase != Phase::Playing {
            return Ok(());
        }
        self.phase = Phase::Finished;
        info!(score = self.score, "whac-a-mole session finished");
        if self.score > self.high_score.get() {
            self.new_high_score = true;
            info!(score = self.score, previous = self.high_score.get(), "new high score");
            self.high_score.set(self.score)?;
        }
        Ok(())
    }

    pub fn phase(&self) -> Phase
    {
        self.phase
    }

    pub fn score(&self) -> u32
    {
        self.score
    }

    pub fn high_score(&self) -> u32
    {
        self.high_score.get()
    }

    pub fn is_new_high_score(&self) -> bool
    {
        self.new_high_score
    }

    pub fn moles(&self) -> &[Mole]
    {
        &self.moles
    }

    pub fn time_left(&self) -> Duration
    {
        self.countdown.remaining()
    }

    #[cfg(test)]
    fn stored_high_score(&self) -> Option<String>
    {
        self.high_score.store().get_item(HIGH_SCORE_KEY)
    }
}

pub struct WhackConfig
{
    pub time_limit: Duration,
    pub mute: bool,
}

impl WhackConfig
{
    pub fn new(seconds: Option<u64>, mute: bool) -> Result<Self, GameError>
    {
        let time_limit = match seconds {
            None => TIME_LIMIT,
            Some(0) => return Err(GameError::usage("Time limit must be positive")),
            Some(seconds) => Duration::from_secs(seconds),
        };
        Ok(Self { time_limit, mute })
    }
}

impl Default for WhackConfig
{
    fn default() -> Self
    {
        Self {
            time_limit: TIME_LIMIT,
            mute: false,
        }
    }
}

/// Maps a screen position to the hole drawn there.
pub fn hole_at(column: u16, row: u16) -> Option<usize>
{
    let row = row as usize;
    if row < FIELD_TOP || row > FIELD_TOP + HOLE_DEPTH {
        return None;
    }
    let index = column as usize / HOLE_WIDTH;
    (index < NUMBER_OF_MOLES).then_some(index)
}

fn hole_for_key(ch: char) -> Option<usize>
{
    let digit = ch.to_digit(10)? as usize;
    (1..=NUMBER_OF_MOLES).contains(&digit).then(|| digit - 1)
}

pub fn run(store: FileStore, config: WhackConfig) -> Result<(), GameError>
{
    info!(storage = %store.path().display(), "loading whac-a-mole high score");
    let mut game = WhackGame::new(store, config.time_limit);
    let mut rng = rand::thread_rng();
    let mut term = TerminalGuard::enter()?;
    let start = Instant::now();

    loop {
        let input = term::poll_input(Duration::from_millis(TICK_MS))?;
        let now = start.elapsed();
        if let Err(err) = game.tick(now, &mut rng) {
            warn!(error = %err, "could not save high score");
            return Err(err.into());
        }

        if let Some(input) = input {
            match (input, game.phase()) {
                (Input::Quit, _) => break,
                (Input::Key(KeyCode::Enter), Phase::Idle | Phase::Finished) => {
                    game.start(now, &mut rng);
                }
                (Input::Key(KeyCode::Char('e')), Phase::Playing) => game.end()?,
                (Input::Key(KeyCode::Char(ch)), Phase::Playing) => {
                    if let Some(index) = hole_for_key(ch) {
                        squeak(&mut term, &config, game.whack(index, now, &mut rng))?;
                    }
                }
                (Input::Click { column, row }, Phase::Playing) => {
                    if let Some(index) = hole_at(column, row) {
                        squeak(&mut term, &config, game.whack(index, now, &mut rng))?;
                    }
                }
                _ => {}
            }
        }

        draw_ui(&mut term, &game, now)?;
    }

    Ok(())
}

fn squeak(
    term: &mut TerminalGuard,
    config: &WhackConfig,
    awarded: Option<u32>,
) -> Result<(), GameError>
{
    if awarded.is_some() && !config.mute {
        term.bell()?;
    }
    Ok(())
}

fn draw_ui<S: KeyValueStore>(
    term: &mut TerminalGuard,
    game: &WhackGame<S>,
    now: Duration,
) -> Result<(), GameError>
{
    let mut lines = Vec::new();
    lines.push("Arcade Minis - Whac a Mole".to_string());
    match game.phase() {
        Phase::Idle => {
            lines.push(String::new());
            lines.push(format!("High score: {}", game.high_score()));
            lines.push(String::new());
            lines.push("Press ENTER to start. Esc quits.".to_string());
        }
        Phase::Playing => {
            lines.push(format!(
                "Score: {}   Time: {}s   High score: {}",
                game.score(),
                game.time_left().as_secs(),
                game.high_score()
            ));
            lines.push("Keys 1-5 or click to whack. E ends the game. Esc quits.".to_string());
            while lines.len() < FIELD_TOP {
                lines.push(String::new());
            }
            lines.extend(render_field(game.moles(), now));
        }
        Phase::Finished => {
            lines.push(String::new());
            if game.is_new_high_score() {
                lines.push(term::paint("NEW High Score!", GLOW));
            }
            lines.push(format!("Score: {}", game.score()));
            lines.push(format!("High score: {}", game.high_score()));
            lines.push(String::new());
            lines.push("Press ENTER to play again. Esc quits.".to_string());
        }
    }
    term.present(&lines)
}

fn render_field(moles: &[Mole], now: Duration) -> Vec<String>
{
    let mut rows = vec![String::new(); HOLE_DEPTH + 2];
    for (index, mole) in moles.iter().enumerate() {
        let shown = (mole.height(now) * HOLE_DEPTH as f32).ceil() as usize;
        let (face, color) = if mole.is_hit() {
            ("(x_x)", HIT_COLOR)
        } else {
            ("(o.o)", MOLE_COLOR)
        };
        let visible_from = HOLE_DEPTH - shown.min(HOLE_DEPTH);
        for depth in 0..HOLE_DEPTH {
            let cell = if depth < visible_from {
                " ".repeat(HOLE_WIDTH)
            } else if depth == visible_from {
                format!("   {}   ", term::paint(face, color))
            } else {
                format!("   {}   ", term::paint("|   |", color))
            };
            rows[depth].push_str(&cell);
        }
        rows[HOLE_DEPTH].push_str(&format!(" {} ", term::paint("\\_______/", DIRT_COLOR)));
        rows[HOLE_DEPTH + 1].push_str(&format!("    [{}]    ", index + 1));
    }
    rows
}
