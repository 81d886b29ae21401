use rppal::gpio::Level;
use std::time::{Duration, Instant};

/// Accepted transition of a debounced button. Buttons are active-low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Per-button debounce state.
///
/// A raw level change only becomes an [`Edge`] once the new level has held
/// for the whole window; any bounce restarts the window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    current: Level,
    last_stable: Level,
    last_change: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            current: Level::High,
            last_stable: Level::High,
            last_change: None,
        }
    }

    pub fn sample(&mut self, level: Level, now: Instant) -> Option<Edge> {
        if level != self.current {
            self.current = level;
            self.last_change = Some(now);
            return None;
        }

        if self.current == self.last_stable {
            return None;
        }

        let settled = match self.last_change {
            Some(changed) => now.saturating_duration_since(changed) >= self.window,
            None => true,
        };
        if !settled {
            return None;
        }

        self.last_stable = self.current;
        if self.last_stable == Level::Low {
            Some(Edge::Pressed)
        } else {
            Some(Edge::Released)
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.last_stable == Level::Low
    }
}
