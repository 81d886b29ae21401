use log::debug;
use std::thread;
use std::time::{Duration, Instant};

use crate::buttons::ButtonInputs;
use crate::debounce::Edge;
use crate::leds::{self, LedOutputs};
use crate::link::Link;
use crate::reconciler::Reconciler;
use crate::remote::TimeTracker;

/// Single-threaded control loop. Network calls block the whole tick.
pub struct Controller<B, L, N, T> {
    reconciler: Reconciler,
    buttons: B,
    leds: L,
    link: N,
    tracker: T,
    link_down_since: Option<Instant>,
}

impl<B, L, N, T> Controller<B, L, N, T>
where
    B: ButtonInputs,
    L: LedOutputs,
    N: Link,
    T: TimeTracker,
{
    pub fn new(reconciler: Reconciler, buttons: B, leds: L, link: N, tracker: T) -> Self {
        Controller {
            reconciler,
            buttons,
            leds,
            link,
            tracker,
            link_down_since: None,
        }
    }

    /// Channels are handled in index order; a press is fully handled (LED
    /// included) before the next button is read.
    ///
    /// `now` moves forward by the wall time each toggle spent blocked, so
    /// later channels and the snapshot timer see the delay.
    pub fn tick(&mut self, mut now: Instant) {
        let count = self.buttons.count().min(self.reconciler.len());
        for index in 0..count {
            let level = self.buttons.read_level(index);
            if let Some(Edge::Pressed) = self.reconciler.sample(index, level, now) {
                if let Some(toggle) = self.reconciler.press(index, now) {
                    leds::render_channel(&self.reconciler, index, &mut self.leds);
                    let started = Instant::now();
                    if toggle.send(&mut self.link, &mut self.tracker).is_err() {
                        debug!("{} left for the next snapshot", toggle.project);
                    }
                    now += started.elapsed();
                }
            }
        }

        self.reconciler.poll_snapshot(now, &mut self.link, &mut self.tracker);

        if self.link.is_up() {
            self.link_down_since = None;
            leds::render(&self.reconciler, &mut self.leds);
        } else {
            let since = *self.link_down_since.get_or_insert(now);
            let down_for = now.saturating_duration_since(since);
            leds::render_link_down(&self.reconciler, &mut self.leds, down_for);
        }
    }

    pub fn run(&mut self, period: Duration) -> ! {
        loop {
            self.tick(Instant::now());
            thread::sleep(period);
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn buttons_mut(&mut self) -> &mut B {
        &mut self.buttons
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }
}
