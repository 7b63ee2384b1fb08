use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::events::lock_signal;
use crate::ticker::Ticker;
use crate::*;

/// Interval between elapsed-time notifications.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Session lifecycle. `Stopped` is terminal, reached by explosion, win, or an
/// explicit [`Game::stop`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Created,
    Running,
    Stopped,
}

impl SessionState {
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// A single game from construction to win, loss, or explicit stop.
///
/// The session exclusively owns its grids; the only mutation paths are the
/// public operations, and each mutation is pushed to the subscribers held in
/// [`GameEvents`].
pub struct Game {
    minefield: Minefield,
    opened: Array2<bool>,
    flagged: Array2<bool>,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    events: GameEvents,
    ticker: Option<Ticker>,
}

impl Game {
    /// Fresh game with bombs placed from an entropy seed.
    pub fn new(config: GameConfig) -> Self {
        Self::with_generator(config, RandomGenerator::from_entropy())
    }

    pub fn with_generator(config: GameConfig, generator: impl MinefieldGenerator) -> Self {
        Self::from_minefield(generator.generate(config))
    }

    /// Game over an explicit bomb layout.
    pub fn from_minefield(minefield: Minefield) -> Self {
        let dim = minefield.mask().raw_dim();
        Self {
            opened: Array2::default(dim),
            flagged: Array2::default(dim),
            minefield,
            state: SessionState::Created,
            started_at: None,
            ended_at: None,
            events: GameEvents::default(),
            ticker: None,
        }
    }

    pub fn config(&self) -> GameConfig {
        self.minefield.config()
    }

    pub fn size(&self) -> Coord2 {
        self.minefield.size()
    }

    pub fn mine_count(&self) -> CellCount {
        self.minefield.mine_count()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn events(&self) -> &GameEvents {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut GameEvents {
        &mut self.events
    }

    /// Bomb count minus flags placed; negative when over-flagged.
    pub fn mines_left(&self) -> i32 {
        let flagged = self.flagged.iter().filter(|&&flag| flag).count() as i32;
        i32::from(self.minefield.mine_count()) - flagged
    }

    /// Player-visible state of one cell.
    pub fn tile_at(&self, coords: Coord2) -> Result<Tile> {
        let coords = self.minefield.validate_coords(coords)?;
        Ok(if self.flagged[coords.grid()] {
            Tile::Flagged
        } else if !self.opened[coords.grid()] {
            Tile::Hidden
        } else if self.minefield.is_mine(coords) {
            Tile::Mine
        } else {
            Tile::Open(self.minefield.adjacent_mines(coords))
        })
    }

    /// Play time so far: `ended_at - started_at`, the current wall clock
    /// standing in for the end while the session runs. Zero before start.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => {
                let end = self.ended_at.unwrap_or_else(Utc::now);
                (end - started).to_std().unwrap_or_default()
            }
            None => Duration::ZERO,
        }
    }

    /// Win condition: every cell is opened or a bomb. Flags are irrelevant.
    pub fn is_won(&self) -> bool {
        self.opened
            .iter()
            .zip(self.minefield.mask().iter())
            .all(|(&opened, &mine)| opened || mine)
    }

    /// Begins timing and the periodic tick. Only the first call on a fresh
    /// session has an effect.
    pub fn start(&mut self) {
        if !matches!(self.state, SessionState::Created) {
            return;
        }
        let started = Utc::now();
        self.started_at = Some(started);
        self.state = SessionState::Running;

        // The ticker thread reads only `started` (fixed from here on) and the
        // shared tick signal.
        let tick = self.events.tick_signal();
        self.ticker = Some(Ticker::spawn(TICK_PERIOD, move || {
            let elapsed = (Utc::now() - started).to_std().unwrap_or_default();
            lock_signal(&tick).emit(&TickElapsed { elapsed });
        }));
        log::debug!("session started at {}", started);
    }

    /// Freezes the end time and tears the ticker down. Idempotent, safe
    /// before [`Game::start`], and once it returns no further tick is
    /// delivered.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        if self.state.is_stopped() {
            return;
        }
        self.ended_at = Some(Utc::now());
        self.state = SessionState::Stopped;
        log::debug!("session stopped after {:?}", self.elapsed());
    }

    /// Inverts the flag on a hidden cell and reports the new state. Opened
    /// cells are flag-immune.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        let coords = self.minefield.validate_coords(coords)?;
        self.check_not_finished()?;

        if self.opened[coords.grid()] {
            return Ok(FlagOutcome::NoChange);
        }

        let flagged = !self.flagged[coords.grid()];
        self.flagged[coords.grid()] = flagged;
        log::debug!("flag at {:?} now {}", coords, flagged);
        self.events.emit_flag_changed(FlagChanged { coords, flagged });
        self.finish_if_won();
        Ok(FlagOutcome::Changed)
    }

    /// Opens a hidden, unflagged cell. Opening a bomb ends the game; opening
    /// a zero-hint cell cascades through the connected zero region.
    pub fn open(&mut self, coords: Coord2) -> Result<OpenOutcome> {
        let coords = self.minefield.validate_coords(coords)?;
        self.check_not_finished()?;

        if self.flagged[coords.grid()] || self.opened[coords.grid()] {
            return Ok(OpenOutcome::NoChange);
        }
        Ok(self.open_cell(coords))
    }

    /// Opens every unopened neighbor of an already opened cell. Flagged
    /// neighbors stay shut; an unflagged bomb neighbor ends the game and
    /// cuts the sweep short.
    pub fn open_neighbors(&mut self, coords: Coord2) -> Result<OpenOutcome> {
        let coords = self.minefield.validate_coords(coords)?;
        self.check_not_finished()?;

        if !self.opened[coords.grid()] {
            return Ok(OpenOutcome::NoChange);
        }

        let mut outcome = OpenOutcome::NoChange;
        for pos in neighbors(coords, self.size()) {
            if self.state.is_stopped() {
                break;
            }
            if self.opened[pos.grid()] || self.flagged[pos.grid()] {
                continue;
            }
            outcome = outcome | self.open_cell(pos);
        }
        Ok(outcome)
    }

    fn open_cell(&mut self, coords: Coord2) -> OpenOutcome {
        self.opened[coords.grid()] = true;

        if self.minefield.is_mine(coords) {
            self.explode(coords);
            return OpenOutcome::Exploded;
        }

        let hint = self.minefield.adjacent_mines(coords);
        log::debug!("opened {:?}, hint {}", coords, hint);
        self.events.emit_block_opened(BlockOpened { coords, hint });

        if hint == 0 {
            self.flood_fill(coords);
        }

        if self.finish_if_won() {
            OpenOutcome::Won
        } else {
            OpenOutcome::Opened
        }
    }

    /// Iterative breadth-first expansion of a zero-hint region: every hidden,
    /// unflagged neighbor opens, and zero-hint cells enqueue their own
    /// neighbors in turn. Bombs are never reached, a zero-hint cell has none
    /// adjacent.
    fn flood_fill(&mut self, start: Coord2) {
        let size = self.size();
        let mut visited = BTreeSet::from([start]);
        let mut to_visit: VecDeque<Coord2> = neighbors(start, size).collect();

        while let Some(coords) = to_visit.pop_front() {
            if !visited.insert(coords) {
                continue;
            }
            if self.opened[coords.grid()] || self.flagged[coords.grid()] {
                continue;
            }

            self.opened[coords.grid()] = true;
            let hint = self.minefield.adjacent_mines(coords);
            log::trace!("flood opened {:?}, hint {}", coords, hint);
            self.events.emit_block_opened(BlockOpened { coords, hint });

            if hint == 0 {
                to_visit.extend(neighbors(coords, size).filter(|pos| !visited.contains(pos)));
            }
        }
    }

    fn explode(&mut self, coords: Coord2) {
        log::debug!("bomb opened at {:?}", coords);
        self.stop();
        let unflagged_mines: Vec<Coord2> = self
            .minefield
            .iter_mines()
            .filter(|&pos| !self.flagged[pos.grid()])
            .collect();
        self.events.emit_bomb_exploded(BombExploded {
            coords,
            unflagged_mines,
        });
    }

    /// Stops the session and emits `game-won` exactly once, on the
    /// Running-to-Stopped transition.
    fn finish_if_won(&mut self) -> bool {
        if self.state.is_stopped() || !self.is_won() {
            return false;
        }
        self.stop();
        let elapsed = self.elapsed();
        self.events.emit_game_won(GameWon { elapsed });
        true
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_stopped() {
            Err(GameError::AlreadyFinished)
        } else {
            Ok(())
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}
