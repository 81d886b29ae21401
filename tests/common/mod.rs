#![allow(dead_code)]

use rppal::gpio::Level;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use timer_box::buttons::ButtonInputs;
use timer_box::config::{ChannelConfig, Config, TimingConfig};
use timer_box::error::SyncError;
use timer_box::leds::LedOutputs;
use timer_box::link::Link;
use timer_box::remote::{RunningSet, TimeTracker};

pub fn config(projects: &[&str]) -> Config {
    Config {
        channels: projects
            .iter()
            .enumerate()
            .map(|(i, name)| ChannelConfig {
                project: name.to_string(),
                button_pin: 5 + i as u8,
                led_pin: 16 + i as u8,
            })
            .collect(),
        timing: TimingConfig::default(),
        ..Config::default()
    }
}

pub struct FakeButtons {
    pub levels: Vec<Level>,
}

impl FakeButtons {
    pub fn released(count: usize) -> Self {
        FakeButtons { levels: vec![Level::High; count] }
    }
}

impl ButtonInputs for FakeButtons {
    fn count(&self) -> usize {
        self.levels.len()
    }

    fn read_level(&mut self, index: usize) -> Level {
        self.levels[index]
    }
}

/// LED state shared with the test (and with the tracker, to look at the LEDs
/// while a request is in flight).
#[derive(Clone, Default)]
pub struct FakeLeds {
    pub lit: Rc<RefCell<Vec<bool>>>,
    pub writes: Rc<RefCell<Vec<(usize, bool)>>>,
}

impl FakeLeds {
    pub fn new(count: usize) -> Self {
        FakeLeds {
            lit: Rc::new(RefCell::new(vec![false; count])),
            writes: Rc::default(),
        }
    }

    pub fn snapshot(&self) -> Vec<bool> {
        self.lit.borrow().clone()
    }
}

impl LedOutputs for FakeLeds {
    fn set(&mut self, index: usize, on: bool) {
        self.lit.borrow_mut()[index] = on;
        self.writes.borrow_mut().push((index, on));
    }
}

#[derive(Clone)]
pub struct Gate {
    pub up: Rc<RefCell<bool>>,
}

impl Gate {
    pub fn up() -> Self {
        Gate { up: Rc::new(RefCell::new(true)) }
    }

    pub fn set(&self, up: bool) {
        *self.up.borrow_mut() = up;
    }
}

impl Link for Gate {
    fn is_up(&mut self) -> bool {
        *self.up.borrow()
    }
}

/// Scripted service. Records every toggle together with what the LEDs showed
/// while the call was outstanding.
pub struct FakeTracker {
    pub running: HashSet<String>,
    pub fail_toggles_for: HashSet<String>,
    pub fail_fetch: bool,
    pub toggle_delay: Duration,
    pub toggles: Vec<(String, bool)>,
    pub leds_during_toggle: Vec<Vec<bool>>,
    pub fetches: usize,
    leds: FakeLeds,
}

impl FakeTracker {
    pub fn new(leds: &FakeLeds) -> Self {
        FakeTracker {
            running: HashSet::new(),
            fail_toggles_for: HashSet::new(),
            fail_fetch: false,
            toggle_delay: Duration::ZERO,
            toggles: Vec::new(),
            leds_during_toggle: Vec::new(),
            fetches: 0,
            leds: leds.clone(),
        }
    }

    pub fn set_running(&mut self, names: &[&str]) {
        self.running = names.iter().map(|n| n.to_string()).collect();
    }
}

impl TimeTracker for FakeTracker {
    fn toggle(&mut self, project: &str, running: bool) -> Result<(), SyncError> {
        self.toggles.push((project.to_string(), running));
        self.leds_during_toggle.push(self.leds.snapshot());
        thread::sleep(self.toggle_delay);
        if self.fail_toggles_for.contains(project) {
            return Err(SyncError::Timeout);
        }
        // the service accepted the call, but its view is whatever the test scripted
        Ok(())
    }

    fn fetch_running_set(&mut self, projects: &[&str]) -> Result<RunningSet, SyncError> {
        self.fetches += 1;
        if self.fail_fetch {
            return Err(SyncError::Server(503));
        }
        Ok(projects
            .iter()
            .filter(|p| self.running.contains(**p))
            .map(|p| p.to_string())
            .collect())
    }
}
