//! Scripted event source
//!
//! Replays a YAML event script through a broadcast channel, standing in
//! for the live transport and sensor collaborators. Useful for exercising
//! a configuration without hardware attached.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{InputEvent, Source};

/// One step of an event script: a time offset plus the event to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Offset from script start, milliseconds.
    #[serde(default)]
    pub at_ms: u64,

    #[serde(flatten)]
    pub event: InputEvent,
}

/// Event source replaying a scripted sequence.
pub struct ScriptSource {
    name: String,
    steps: Vec<ScriptStep>,
    timed: bool,
    running: Arc<AtomicBool>,
    sender: broadcast::Sender<InputEvent>,
    task: Option<JoinHandle<()>>,
}

impl ScriptSource {
    /// Create a source over an already parsed script.
    pub fn new(name: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        // Size the channel for a full untimed burst so no step is lost.
        let (sender, _) = broadcast::channel(steps.len().max(16));
        Self {
            name: name.into(),
            steps,
            timed: false,
            running: Arc::new(AtomicBool::new(false)),
            sender,
            task: None,
        }
    }

    /// Load a script from a YAML file.
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read script {path:?}"))?;
        let steps: Vec<ScriptStep> =
            serde_yaml::from_str(&text).with_context(|| format!("could not parse script {path:?}"))?;
        Ok(Self::new(name, steps))
    }

    /// Honor step timestamps instead of replaying immediately.
    pub fn with_timing(mut self, timed: bool) -> Self {
        self.timed = timed;
        self
    }

    /// Number of steps in the script.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Source for ScriptSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        self.running.store(true, Ordering::SeqCst);

        let steps = self.steps.clone();
        let timed = self.timed;
        let running = Arc::clone(&self.running);
        let sender = self.sender.clone();

        let task = tokio::spawn(async move {
            let mut elapsed = 0u64;
            for step in steps {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if timed && step.at_ms > elapsed {
                    tokio::time::sleep(Duration::from_millis(step.at_ms - elapsed)).await;
                }
                elapsed = elapsed.max(step.at_ms);

                debug!("script step at {}ms", step.at_ms);
                // Ignore errors if no receivers are listening.
                let _ = sender.send(step.event);
            }
            running.store(false, Ordering::SeqCst);
        });

        self.task = Some(task);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<InputEvent> {
        self.sender.subscribe()
    }
}

impl Drop for ScriptSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_script() -> &'static str {
        r#"
- at_ms: 0
  event: microcontroller-connected
  device: test-controller
- at_ms: 10
  event: potentiometer-changed
  value: 512
- at_ms: 20
  event: orientation-changed
  alpha: 45
  beta: -10
  gamma: 2
"#
    }

    #[test]
    fn test_script_steps_parse() {
        let steps: Vec<ScriptStep> = serde_yaml::from_str(sample_script()).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].at_ms, 0);
        assert_eq!(
            steps[1].event,
            InputEvent::PotentiometerChanged { value: 512 }
        );
        assert!(matches!(
            steps[2].event,
            InputEvent::OrientationChanged { alpha, .. } if alpha == 45.0
        ));
    }

    #[test]
    fn test_script_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(sample_script().as_bytes()).unwrap();

        let source = ScriptSource::from_file("test", file.path()).unwrap();
        assert_eq!(source.name(), "test");
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_script_from_file_rejects_bad_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"- event: no-such-event\n").unwrap();
        assert!(ScriptSource::from_file("test", file.path()).is_err());
    }

    #[tokio::test]
    async fn test_script_source_delivers_in_order() {
        let steps: Vec<ScriptStep> = serde_yaml::from_str(sample_script()).unwrap();
        let mut source = ScriptSource::new("test", steps);
        let mut receiver = source.subscribe();

        source.start().unwrap();

        let first = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(first, InputEvent::MicrocontrollerConnected { .. }));

        let second = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second, InputEvent::PotentiometerChanged { value: 512 });
    }

    #[tokio::test]
    async fn test_script_source_stops_when_done() {
        let steps: Vec<ScriptStep> = serde_yaml::from_str(sample_script()).unwrap();
        let mut source = ScriptSource::new("test", steps);
        let mut receiver = source.subscribe();

        source.start().unwrap();
        assert!(source.is_running());

        for _ in 0..3 {
            tokio::time::timeout(Duration::from_secs(1), receiver.recv())
                .await
                .unwrap()
                .unwrap();
        }

        // The task flips the running flag once the script is exhausted.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn test_script_source_stop_is_idempotent() {
        let steps: Vec<ScriptStep> = serde_yaml::from_str(sample_script()).unwrap();
        let mut source = ScriptSource::new("test", steps);

        source.start().unwrap();
        source.stop();
        assert!(!source.is_running());
        source.stop();
    }
}
