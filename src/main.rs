use anyhow::Context;
use log::{info, warn};
use rppal::gpio::Gpio;
use std::env;
use std::io;
use std::time::Duration;

use timer_box::buttons::ButtonReader;
use timer_box::config::Config;
use timer_box::controller::Controller;
use timer_box::error::ConfigError;
use timer_box::leds::LedBank;
use timer_box::link::InterfaceLink;
use timer_box::reconciler::Reconciler;
use timer_box::remote::HttpTracker;

const DEFAULT_CONFIG_PATH: &str = "timerbox.json";
const LAMP_TEST_STEP_MS: u64 = 150;

fn load_config(path: &str) -> anyhow::Result<Config> {
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded {}", path);
            Ok(config)
        }
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            warn!("{} not found, writing defaults", path);
            let config = Config::default();
            if let Err(e) = config.save(path) {
                warn!("Could not write {}: {}", path, e);
            }
            Ok(config)
        }
        Err(e) => Err(e).with_context(|| format!("loading {}", path)),
    }
}

fn main() -> anyhow::Result<()> {
    sensible_env_logger::init!();

    info!("Starting timer box");

    let path = env::args().nth(1).unwrap_or_else(|| String::from(DEFAULT_CONFIG_PATH));
    let config = load_config(&path)?;

    let gpio = Gpio::new().context("GPIO not available")?;
    let buttons = ButtonReader::new(&gpio, &config.button_pins()).context("button pins")?;
    let mut leds = LedBank::new(&gpio, &config.led_pins()).context("LED pins")?;

    leds.sweep(Duration::from_millis(LAMP_TEST_STEP_MS));

    for (index, channel) in config.channels.iter().enumerate() {
        info!("Channel {}: {} (button GPIO {}, LED GPIO {})",
            index, channel.project, channel.button_pin, channel.led_pin);
    }
    info!("Remote {}:{}, snapshot every {:?}",
        config.remote.host, config.remote.port, config.timing.snapshot_interval());

    let link = InterfaceLink::new(&config.link.interface);
    let tracker = HttpTracker::new(&config.remote);
    let reconciler = Reconciler::new(&config);

    let mut controller = Controller::new(reconciler, buttons, leds, link, tracker);
    controller.run(config.timing.tick())
}
