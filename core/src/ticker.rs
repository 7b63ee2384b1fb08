use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Repeating background callback with a synchronous cancellation guarantee:
/// once [`Ticker::stop`] returns, the callback will not run again.
pub(crate) struct Ticker {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// `recv_timeout` doubles as the periodic sleep and the cancellation
    /// point; dropping the sender also ends the thread within one period.
    pub(crate) fn spawn(period: Duration, mut on_tick: impl FnMut() + Send + 'static) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => on_tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signals the thread and joins it before returning.
    pub(crate) fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;

    #[test]
    fn ticks_repeatedly_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::clone(&count);
        let ticker = Ticker::spawn(Duration::from_millis(5), move || {
            ticks.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(60));
        ticker.stop();

        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn no_tick_is_delivered_after_stop_returns() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::clone(&count);
        let ticker = Ticker::spawn(Duration::from_millis(5), move || {
            ticks.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(30));
        ticker.stop();
        let after_stop = count.load(Ordering::SeqCst);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn stop_interrupts_a_long_period() {
        let ticker = Ticker::spawn(Duration::from_secs(60), || {});
        let begun = Instant::now();
        ticker.stop();
        assert!(begun.elapsed() < Duration::from_secs(1));
    }
}
