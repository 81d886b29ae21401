use log::info;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::error::SyncError;
use crate::http;

/// Names of the projects the service reports as running.
pub type RunningSet = HashSet<String>;

/// The two operations the controller needs from the time-tracking service.
/// Neither touches local state.
pub trait TimeTracker {
    fn toggle(&mut self, project: &str, running: bool) -> Result<(), SyncError>;

    /// `projects` are the names the caller cares about; anything else in the
    /// service's answer is ignored.
    fn fetch_running_set(&mut self, projects: &[&str]) -> Result<RunningSet, SyncError>;
}

pub struct HttpTracker {
    host: String,
    port: u16,
    timeout: Duration,
}

impl HttpTracker {
    pub fn new(config: &RemoteConfig) -> Self {
        HttpTracker {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout(),
        }
    }

    fn get(&self, path: &str) -> Result<http::Response, SyncError> {
        let response = http::get(&self.host, self.port, path, self.timeout)?;
        if !response.is_success() {
            return Err(SyncError::Server(response.status));
        }
        Ok(response)
    }
}

impl TimeTracker for HttpTracker {
    fn toggle(&mut self, project: &str, running: bool) -> Result<(), SyncError> {
        let action = if running { "start" } else { "stop" };
        let path = format!("/{}?project={}", action, http::encode_query_value(project));
        self.get(&path)?;
        info!("Sent {} for {}", action, project);
        Ok(())
    }

    fn fetch_running_set(&mut self, projects: &[&str]) -> Result<RunningSet, SyncError> {
        let response = self.get("/running")?;
        Ok(running_projects(&response.body, projects))
    }
}

/// Picks the configured projects out of a `/running` body.
///
/// A JSON body is matched exactly against every string in the document, object
/// keys included. Anything else falls back to looking for `"name"` in the text.
pub fn running_projects(body: &str, projects: &[&str]) -> RunningSet {
    match serde_json::from_str::<Value>(body) {
        Ok(doc) => {
            let mut strings = HashSet::new();
            collect_strings(&doc, &mut strings);
            projects
                .iter()
                .filter(|p| strings.contains(**p))
                .map(|p| p.to_string())
                .collect()
        }
        Err(_) => projects
            .iter()
            .filter(|p| body.contains(&format!("\"{}\"", p)))
            .map(|p| p.to_string())
            .collect(),
    }
}

fn collect_strings<'a>(value: &'a Value, out: &mut HashSet<&'a str>) {
    match value {
        Value::String(s) => {
            out.insert(s.as_str());
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                out.insert(key.as_str());
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}
