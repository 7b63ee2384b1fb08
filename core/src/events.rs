use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Coord2;

/// A safe cell was opened, by the player or by the flood fill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOpened {
    pub coords: Coord2,
    /// Bombs in the clamped 8-neighborhood, 0-8.
    pub hint: u8,
}

/// A bomb was opened and the game is over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BombExploded {
    pub coords: Coord2,
    /// Every bomb the player had not flagged when the game ended.
    pub unflagged_mines: Vec<Coord2>,
}

/// A hidden cell changed flag state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagChanged {
    pub coords: Coord2,
    pub flagged: bool,
}

/// Periodic elapsed-time report while the session is running.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickElapsed {
    pub elapsed: Duration,
}

/// Every safe cell is open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameWon {
    pub elapsed: Duration,
}

type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered subscriber list for one notification kind. Callbacks run
/// synchronously, in registration order, on the emitting thread.
pub struct Signal<E> {
    subscribers: Vec<Callback<E>>,
}

impl<E> Signal<E> {
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + Send + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn emit(&mut self, event: &E) {
        for callback in &mut self.subscribers {
            callback(event);
        }
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

pub(crate) type SharedSignal<E> = Arc<Mutex<Signal<E>>>;

/// Locks a shared signal, recovering the guard if a subscriber panicked.
pub(crate) fn lock_signal<E>(signal: &SharedSignal<E>) -> MutexGuard<'_, Signal<E>> {
    signal.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Subscription registry for the five game notifications.
///
/// The tick signal is shared with the ticker thread; every other signal is
/// only touched from the thread driving the game.
#[derive(Debug, Default)]
pub struct GameEvents {
    block_opened: Signal<BlockOpened>,
    bomb_exploded: Signal<BombExploded>,
    flag_changed: Signal<FlagChanged>,
    game_won: Signal<GameWon>,
    tick_elapsed: SharedSignal<TickElapsed>,
}

impl GameEvents {
    pub fn on_block_opened(&mut self, callback: impl FnMut(&BlockOpened) + Send + 'static) {
        self.block_opened.subscribe(callback);
    }

    pub fn on_bomb_exploded(&mut self, callback: impl FnMut(&BombExploded) + Send + 'static) {
        self.bomb_exploded.subscribe(callback);
    }

    pub fn on_flag_changed(&mut self, callback: impl FnMut(&FlagChanged) + Send + 'static) {
        self.flag_changed.subscribe(callback);
    }

    pub fn on_game_won(&mut self, callback: impl FnMut(&GameWon) + Send + 'static) {
        self.game_won.subscribe(callback);
    }

    pub fn on_tick_elapsed(&mut self, callback: impl FnMut(&TickElapsed) + Send + 'static) {
        lock_signal(&self.tick_elapsed).subscribe(callback);
    }

    pub(crate) fn emit_block_opened(&mut self, event: BlockOpened) {
        self.block_opened.emit(&event);
    }

    pub(crate) fn emit_bomb_exploded(&mut self, event: BombExploded) {
        self.bomb_exploded.emit(&event);
    }

    pub(crate) fn emit_flag_changed(&mut self, event: FlagChanged) {
        self.flag_changed.emit(&event);
    }

    pub(crate) fn emit_game_won(&mut self, event: GameWon) {
        self.game_won.emit(&event);
    }

    pub(crate) fn tick_signal(&self) -> SharedSignal<TickElapsed> {
        Arc::clone(&self.tick_elapsed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn subscribers_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut signal: Signal<FlagChanged> = Signal::default();

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            signal.subscribe(move |_| order.lock().unwrap().push(tag));
        }

        signal.emit(&FlagChanged {
            coords: (0, 0),
            flagged: true,
        });

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn every_subscriber_sees_every_emission() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut signal: Signal<BlockOpened> = Signal::default();

        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            signal.subscribe(move |event: &BlockOpened| seen.lock().unwrap().push(event.clone()));
        }

        let event = BlockOpened {
            coords: (2, 1),
            hint: 3,
        };
        signal.emit(&event);
        signal.emit(&event);

        assert_eq!(signal.subscriber_count(), 2);
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[test]
    fn registry_routes_each_kind_independently() {
        let mut events = GameEvents::default();
        let flags = Arc::new(Mutex::new(0));
        let opens = Arc::new(Mutex::new(0));

        let count = Arc::clone(&flags);
        events.on_flag_changed(move |_| *count.lock().unwrap() += 1);
        let count = Arc::clone(&opens);
        events.on_block_opened(move |_| *count.lock().unwrap() += 1);

        events.emit_flag_changed(FlagChanged {
            coords: (0, 0),
            flagged: true,
        });

        assert_eq!(*flags.lock().unwrap(), 1);
        assert_eq!(*opens.lock().unwrap(), 0);
    }

    #[test]
    fn payloads_round_trip_through_serde() {
        let event = BombExploded {
            coords: (3, 4),
            unflagged_mines: vec![(3, 4), (0, 1)],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: BombExploded = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
