use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, KeyEvent, KeyEventKind};
use tracing::{debug, error, warn};

/// Consecutive poll/read failures before the input thread gives up
const MAX_FAILURES: u32 = 50;

pub enum Event {
    Key(KeyEvent),
    /// Milliseconds since the previous tick
    Tick(u64),
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Warn,
    Quiet,
    GiveUp,
}

/// Counts back-to-back terminal errors so a broken terminal does not flood the log.
#[derive(Default)]
struct Failures {
    count: u32,
}

impl Failures {
    fn record(&mut self) -> Verdict {
        self.count += 1;
        if self.count >= MAX_FAILURES {
            Verdict::GiveUp
        } else if self.count.is_power_of_two() {
            Verdict::Warn
        } else {
            Verdict::Quiet
        }
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        let tick_rate = Duration::from_millis(tick_rate_ms.max(1));

        thread::spawn(move || {
            let mut last_tick = Instant::now();
            let mut failures = Failures::default();
            loop {
                let timeout = tick_rate.saturating_sub(last_tick.elapsed());
                let polled = event::poll(timeout).and_then(|ready| if ready { event::read().map(Some) } else { Ok(None) });
                match polled {
                    Ok(Some(crossterm::event::Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        failures.reset();
                        if tx.send(Event::Key(key)).is_err() {
                            return;
                        }
                    }
                    Ok(_) => failures.reset(),
                    Err(e) => {
                        match failures.record() {
                            Verdict::Warn => warn!(error = %e, failures = failures.count, "terminal input failing"),
                            Verdict::Quiet => {}
                            Verdict::GiveUp => {
                                error!(error = %e, "terminal input keeps failing, stopping input thread");
                                return;
                            }
                        }
                        thread::sleep(tick_rate);
                    }
                }
                let elapsed = last_tick.elapsed();
                if elapsed >= tick_rate {
                    last_tick = Instant::now();
                    if tx.send(Event::Tick(elapsed.as_millis() as u64)).is_err() {
                        debug!("event receiver dropped, stopping input thread");
                        return;
                    }
                }
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> io::Result<Event> {
        self.rx.recv().map_err(io::Error::other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_failures_warn_sparingly_then_give_up() {
        let mut f = Failures::default();
        let verdicts: Vec<Verdict> = (0..MAX_FAILURES).map(|_| f.record()).collect();
        let warns = verdicts.iter().filter(|v| **v == Verdict::Warn).count();
        // 1, 2, 4, 8, 16, 32
        assert_eq!(warns, 6);
        assert_eq!(verdicts.last(), Some(&Verdict::GiveUp));
        assert_eq!(verdicts.iter().filter(|v| **v == Verdict::GiveUp).count(), 1);
    }

    #[test]
    fn test_success_resets_the_count() {
        let mut f = Failures::default();
        for _ in 0..MAX_FAILURES - 1 {
            f.record();
        }
        f.reset();
        assert_eq!(f.record(), Verdict::Warn);
        assert_eq!(f.count, 1);
    }
}
