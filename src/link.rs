//! Connectivity gate.
//!
//! Association and reconnects are handled by the OS network manager. The
//! controller only asks whether the link is usable before touching the network.

use log::{info, warn};
use std::fs;
use std::path::PathBuf;

pub trait Link {
    fn is_up(&mut self) -> bool;
}

/// Watches `/sys/class/net/<iface>/operstate`.
pub struct InterfaceLink {
    interface: String,
    operstate: PathBuf,
    last: Option<bool>,
}

impl InterfaceLink {
    pub fn new(interface: &str) -> Self {
        Self::with_sysfs_root(interface, "/sys/class/net")
    }

    pub fn with_sysfs_root(interface: &str, root: impl Into<PathBuf>) -> Self {
        let operstate = root.into().join(interface).join("operstate");
        InterfaceLink {
            interface: interface.to_string(),
            operstate,
            last: None,
        }
    }

    fn read_state(&self) -> bool {
        match fs::read_to_string(&self.operstate) {
            // some drivers never report carrier and stay "unknown" while usable
            Ok(state) => matches!(state.trim(), "up" | "unknown"),
            Err(_) => false,
        }
    }
}

impl Link for InterfaceLink {
    fn is_up(&mut self) -> bool {
        let up = self.read_state();
        if self.last != Some(up) {
            if up {
                info!("Link {} is up", self.interface);
            } else {
                warn!("Link {} is down", self.interface);
            }
            self.last = Some(up);
        }
        up
    }
}
