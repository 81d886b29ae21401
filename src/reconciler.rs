//! Local belief about which projects are running.
//!
//! A press flips the channel immediately and marks it pending; the next
//! successful snapshot from the service overwrites every channel and clears
//! all pending marks, whatever the press said.

use log::{debug, info, warn};
use rppal::gpio::Level;
use std::time::{Duration, Instant};

use crate::config::{ChannelConfig, Config};
use crate::debounce::{Debouncer, Edge};
use crate::error::SyncError;
use crate::link::Link;
use crate::remote::{RunningSet, TimeTracker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelState {
    Idle,
    PendingConfirm { since: Instant },
}

#[derive(Debug, Clone)]
pub struct Channel {
    config: ChannelConfig,
    debouncer: Debouncer,
    believed_running: bool,
    pending_since: Option<Instant>,
}

impl Channel {
    pub fn new(config: ChannelConfig, debounce: Duration) -> Self {
        Channel {
            config,
            debouncer: Debouncer::new(debounce),
            believed_running: false,
            pending_since: None,
        }
    }

    pub fn project(&self) -> &str {
        &self.config.project
    }

    pub fn believed_running(&self) -> bool {
        self.believed_running
    }

    pub fn pending_since(&self) -> Option<Instant> {
        self.pending_since
    }

    pub fn state(&self) -> ChannelState {
        match self.pending_since {
            Some(since) => ChannelState::PendingConfirm { since },
            None => ChannelState::Idle,
        }
    }
}

/// Request to bring the service in line with an optimistic flip.
#[derive(Debug, Clone, PartialEq)]
pub struct Toggle {
    pub index: usize,
    pub project: String,
    pub running: bool,
}

impl Toggle {
    /// Blocking call to the service. The optimistic flip already happened and
    /// is never rolled back here; a lost toggle is fixed by the next snapshot.
    pub fn send(&self, link: &mut impl Link, tracker: &mut impl TimeTracker) -> Result<(), SyncError> {
        if !link.is_up() {
            info!("Link down, {} for {} left to next snapshot", action(self.running), self.project);
            return Err(SyncError::LinkDown);
        }

        let result = tracker.toggle(&self.project, self.running);
        if let Err(e) = &result {
            warn!("Failed to {} {}: {}", action(self.running), self.project, e);
        }
        result
    }
}

fn action(running: bool) -> &'static str {
    if running { "start" } else { "stop" }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotOutcome {
    NotDue,
    /// Link down; retried as soon as it comes back
    Deferred,
    Merged,
    /// Unreadable answer, merged as "nothing running"
    Degraded,
    Failed,
}

pub struct Reconciler {
    channels: Vec<Channel>,
    snapshot_interval: Duration,
    last_snapshot: Option<Instant>,
}

impl Reconciler {
    pub fn new(config: &Config) -> Self {
        let channels = config
            .channels
            .iter()
            .map(|c| Channel::new(c.clone(), config.timing.debounce()))
            .collect();

        Reconciler {
            channels,
            snapshot_interval: config.timing.snapshot_interval(),
            last_snapshot: None,
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn sample(&mut self, index: usize, level: Level, now: Instant) -> Option<Edge> {
        self.channels.get_mut(index)?.debouncer.sample(level, now)
    }

    /// Optimistic flip. Pressing again while pending flips again; only the
    /// latest desired value is sent.
    pub fn press(&mut self, index: usize, now: Instant) -> Option<Toggle> {
        let channel = self.channels.get_mut(index)?;

        channel.believed_running = !channel.believed_running;
        channel.pending_since = Some(now);
        info!("Button {} pressed, {} now believed running: {}",
            index, channel.config.project, channel.believed_running);

        Some(Toggle {
            index,
            project: channel.config.project.clone(),
            running: channel.believed_running,
        })
    }

    pub fn snapshot_due(&self, now: Instant) -> bool {
        match self.last_snapshot {
            Some(last) => now.saturating_duration_since(last) >= self.snapshot_interval,
            None => true,
        }
    }

    pub fn poll_snapshot(
        &mut self,
        now: Instant,
        link: &mut impl Link,
        tracker: &mut impl TimeTracker,
    ) -> SnapshotOutcome {
        if !self.snapshot_due(now) {
            return SnapshotOutcome::NotDue;
        }
        if !link.is_up() {
            return SnapshotOutcome::Deferred;
        }
        self.last_snapshot = Some(now);

        let projects: Vec<&str> = self.channels.iter().map(|c| c.project()).collect();
        let fetched = tracker.fetch_running_set(&projects);
        match fetched {
            Ok(running) => {
                self.merge(&running);
                SnapshotOutcome::Merged
            }
            Err(SyncError::MalformedResponse(reason)) => {
                warn!("Unreadable snapshot ({}), treating every project as stopped", reason);
                self.merge(&RunningSet::new());
                SnapshotOutcome::Degraded
            }
            Err(e) => {
                warn!("Snapshot failed: {}", e);
                SnapshotOutcome::Failed
            }
        }
    }

    /// The snapshot wins over every local guess.
    pub fn merge(&mut self, running: &RunningSet) {
        for channel in &mut self.channels {
            let is_running = running.contains(channel.project());
            debug!("{} is running: {}", channel.project(), is_running);

            if let Some(since) = channel.pending_since.take() {
                if is_running != channel.believed_running {
                    info!("Snapshot overrides pending press on {} after {:?}, running: {}",
                        channel.project(), since.elapsed(), is_running);
                }
            } else if is_running != channel.believed_running {
                info!("{} changed remotely, running: {}", channel.project(), is_running);
            }

            channel.believed_running = is_running;
        }
    }
}
