use log::info;
use rppal::gpio::{Gpio, InputPin, Level};

/// Raw button sampling, indexed by channel.
pub trait ButtonInputs {
    fn count(&self) -> usize;
    fn read_level(&mut self, index: usize) -> Level;
}

pub struct ButtonReader {
    pins: Vec<InputPin>,
}

impl ButtonReader {
    /// Buttons short the pin to ground, so every input gets the internal pull-up.
    pub fn new(gpio: &Gpio, pin_numbers: &[u8]) -> rppal::gpio::Result<Self> {
        let mut pins = Vec::new();

        for &pin_num in pin_numbers {
            let pin = gpio.get(pin_num)?.into_input_pullup();
            info!("GPIO {} initialized as button", pin_num);
            pins.push(pin);
        }

        Ok(ButtonReader { pins })
    }
}

impl ButtonInputs for ButtonReader {
    fn count(&self) -> usize {
        self.pins.len()
    }

    fn read_level(&mut self, index: usize) -> Level {
        // released is the safe reading for a pin we do not own
        self.pins.get(index).map_or(Level::High, |pin| pin.read())
    }
}
