use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use clap::Parser;
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use sapeur_core::{Game, GameConfig, GameError, RandomGenerator, Tile, cell_product};

use crate::screen::{Direction, Screen, format_clock};

mod screen;

/// Terminal minesweeper: arrow keys move, space flags, enter opens,
/// shift+enter opens the neighbours, escape quits.
#[derive(Debug, Parser)]
#[command(name = "sapeur", version, about)]
struct Args {
    /// Board width in cells
    #[arg(long, default_value_t = 25)]
    width: u8,

    /// Board height in cells
    #[arg(long, default_value_t = 12)]
    height: u8,

    /// Bomb count; defaults to 10% of the board
    #[arg(long)]
    mines: Option<u16>,

    /// Layout seed for a reproducible board
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    let mines = args
        .mines
        .unwrap_or_else(|| cell_product(args.width, args.height) / 10);
    let config = GameConfig::new(args.width, args.height, mines)?;

    let mut game = match args.seed {
        Some(seed) => Game::with_generator(config, RandomGenerator::new(seed)),
        None => Game::new(config),
    };

    let _guard = TerminalGuard::enter()?;
    let screen = Arc::new(Mutex::new(Screen::new(config.width(), config.height())));

    {
        let screen = lock_screen(&screen);
        let mut out = io::stdout();
        screen.draw_frame(&mut out)?;
        screen.sync_cursor(&mut out)?;
        out.flush()?;
    }

    wire_events(&mut game, &screen);
    game.start();
    run_input_loop(&mut game, &screen)?;
    game.stop();
    Ok(())
}

/// Raw mode plus the alternate screen, released on drop whatever the exit
/// path.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = terminal::disable_raw_mode();
    }
}

fn lock_screen(screen: &Arc<Mutex<Screen>>) -> MutexGuard<'_, Screen> {
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Subscribes the renderer to the five engine notifications; all drawing
/// happens in these callbacks.
fn wire_events(game: &mut Game, screen: &Arc<Mutex<Screen>>) {
    let events = game.events_mut();

    let view = Arc::clone(screen);
    events.on_block_opened(move |opened| {
        let screen = lock_screen(&view);
        let mut out = io::stdout();
        let _ = screen.draw_tile(&mut out, opened.coords, Tile::Open(opened.hint));
        let _ = screen.sync_cursor(&mut out);
        let _ = out.flush();
    });

    let view = Arc::clone(screen);
    events.on_flag_changed(move |flag| {
        let tile = if flag.flagged {
            Tile::Flagged
        } else {
            Tile::Hidden
        };
        let screen = lock_screen(&view);
        let mut out = io::stdout();
        let _ = screen.draw_tile(&mut out, flag.coords, tile);
        let _ = screen.sync_cursor(&mut out);
        let _ = out.flush();
    });

    let view = Arc::clone(screen);
    events.on_bomb_exploded(move |loss| {
        let screen = lock_screen(&view);
        let mut out = io::stdout();
        for &coords in &loss.unflagged_mines {
            let _ = screen.draw_tile(&mut out, coords, Tile::Mine);
        }
        let _ = screen.draw_status(&mut out, "BOOM! game over, press esc to quit");
        let _ = screen.sync_cursor(&mut out);
        let _ = out.flush();
    });

    let view = Arc::clone(screen);
    events.on_game_won(move |win| {
        let screen = lock_screen(&view);
        let mut out = io::stdout();
        let message = format!("cleared in {}, press esc to quit", format_clock(win.elapsed));
        let _ = screen.draw_status(&mut out, &message);
        let _ = screen.sync_cursor(&mut out);
        let _ = out.flush();
    });

    let view = Arc::clone(screen);
    events.on_tick_elapsed(move |tick| {
        let screen = lock_screen(&view);
        let mut out = io::stdout();
        let _ = screen.draw_clock(&mut out, tick.elapsed);
        let _ = screen.sync_cursor(&mut out);
        let _ = out.flush();
    });
}

fn run_input_loop(game: &mut Game, screen: &Arc<Mutex<Screen>>) -> Result<()> {
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        match key.code {
            KeyCode::Esc => break,
            KeyCode::Left => move_cursor(screen, Direction::Left)?,
            KeyCode::Right => move_cursor(screen, Direction::Right)?,
            KeyCode::Up => move_cursor(screen, Direction::Up)?,
            KeyCode::Down => move_cursor(screen, Direction::Down)?,
            KeyCode::Char(' ') => {
                let coords = lock_screen(screen).cursor();
                dispatch(game.toggle_flag(coords));
            }
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                let coords = lock_screen(screen).cursor();
                dispatch(game.open_neighbors(coords));
            }
            KeyCode::Enter => {
                let coords = lock_screen(screen).cursor();
                dispatch(game.open(coords));
            }
            _ => {}
        }
    }
    Ok(())
}

fn move_cursor(screen: &Arc<Mutex<Screen>>, direction: Direction) -> Result<()> {
    let mut screen = lock_screen(screen);
    if screen.step(direction) {
        let mut out = io::stdout();
        screen.sync_cursor(&mut out)?;
        out.flush()?;
    }
    Ok(())
}

fn dispatch<T>(result: sapeur_core::Result<T>) {
    match result {
        Ok(_) => {}
        Err(GameError::AlreadyFinished) => log::debug!("input after game end ignored"),
        Err(err) => log::warn!("engine rejected input: {err}"),
    }
}
