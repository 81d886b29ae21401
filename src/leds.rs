use log::info;
use rppal::gpio::{Gpio, OutputPin};
use std::thread;
use std::time::Duration;

use crate::reconciler::Reconciler;

/// Half period of the blink shown while the network link is down.
pub const LINK_DOWN_BLINK: Duration = Duration::from_millis(500);

pub trait LedOutputs {
    fn set(&mut self, index: usize, on: bool);
}

pub struct LedBank {
    pins: Vec<OutputPin>,
}

impl LedBank {
    pub fn new(gpio: &Gpio, pin_numbers: &[u8]) -> rppal::gpio::Result<Self> {
        let mut pins = Vec::new();

        for &pin_num in pin_numbers {
            let mut pin = gpio.get(pin_num)?.into_output();
            pin.set_low();
            info!("GPIO {} initialized as LED", pin_num);
            pins.push(pin);
        }

        Ok(LedBank { pins })
    }

    /// Power-on lamp test: every LED lights in turn, then all go dark.
    pub fn sweep(&mut self, step: Duration) {
        for x in &mut self.pins {
            x.set_high();
        }
        thread::sleep(step);
        for x in &mut self.pins {
            x.set_low();
        }
        thread::sleep(step);

        for n in 0..self.pins.len() {
            self.pins[n].set_high();
            thread::sleep(step);
            self.pins[n].set_low();
        }
    }
}

impl LedOutputs for LedBank {
    fn set(&mut self, index: usize, on: bool) {
        if let Some(pin) = self.pins.get_mut(index) {
            if on {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
    }
}

/// Drives one LED from the reconciler's belief for that channel.
pub fn render_channel(reconciler: &Reconciler, index: usize, outputs: &mut impl LedOutputs) {
    if let Some(channel) = reconciler.channel(index) {
        outputs.set(index, channel.believed_running());
    }
}

pub fn render(reconciler: &Reconciler, outputs: &mut impl LedOutputs) {
    for index in 0..reconciler.len() {
        render_channel(reconciler, index, outputs);
    }
}

/// Link-down view: running channels stay lit, stopped ones blink so the box
/// shows it is offline without hiding what it believes.
pub fn render_link_down(reconciler: &Reconciler, outputs: &mut impl LedOutputs, down_for: Duration) {
    let lit_phase = (down_for.as_millis() / LINK_DOWN_BLINK.as_millis()) % 2 == 0;
    for (index, channel) in reconciler.channels().iter().enumerate() {
        outputs.set(index, channel.believed_running() || lit_phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::remote::RunningSet;

    #[derive(Default)]
    struct Recorder(Vec<(usize, bool)>);

    impl LedOutputs for Recorder {
        fn set(&mut self, index: usize, on: bool) {
            self.0.push((index, on));
        }
    }

    #[test]
    fn render_follows_belief() {
        let mut reconciler = Reconciler::new(&Config::default());
        let running: RunningSet = [String::from("MindFit")].into_iter().collect();
        reconciler.merge(&running);

        let mut leds = Recorder::default();
        render(&reconciler, &mut leds);
        assert_eq!(leds.0, [(0, false), (1, true), (2, false)]);

        let mut again = Recorder::default();
        render(&reconciler, &mut again);
        assert_eq!(leds.0, again.0);
    }

    #[test]
    fn link_down_blinks_stopped_channels() {
        let mut reconciler = Reconciler::new(&Config::default());
        let running: RunningSet = [String::from("KraftBank")].into_iter().collect();
        reconciler.merge(&running);

        let mut on = Recorder::default();
        render_link_down(&reconciler, &mut on, Duration::from_millis(499));
        assert_eq!(on.0, [(0, true), (1, true), (2, true)]);

        let mut off = Recorder::default();
        render_link_down(&reconciler, &mut off, Duration::from_millis(500));
        assert_eq!(off.0, [(0, true), (1, false), (2, false)]);

        let mut on_again = Recorder::default();
        render_link_down(&reconciler, &mut on_again, Duration::from_millis(1000));
        assert_eq!(on_again.0, on.0);
    }

    #[test]
    fn render_channel_out_of_range_writes_nothing() {
        let reconciler = Reconciler::new(&Config::default());
        let mut leds = Recorder::default();
        render_channel(&reconciler, 5, &mut leds);
        assert!(leds.0.is_empty());
    }
}
