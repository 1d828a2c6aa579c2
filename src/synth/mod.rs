//! Synthesizer seam
//!
//! The sound engine itself is an external collaborator; the routing core
//! only ever talks to this trait. The definition value it receives comes
//! straight from the configuration file and is never inspected here.

use std::collections::BTreeMap;

use log::info;
use serde_yaml::Value;

/// Outbound interface to the synthesizer collaborator.
pub trait Synth {
    /// Replace the synthesizer definition (opaque to the routing core).
    fn configure(&mut self, definition: &Value);

    /// Drive one synthesizer parameter, addressed by dot-path.
    fn set_parameter(&mut self, target: &str, value: f64);
}

/// Prints every parameter write to stdout; the replay default.
#[derive(Debug, Default)]
pub struct ConsoleSynth {
    writes: usize,
}

impl ConsoleSynth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parameter writes seen so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Synth for ConsoleSynth {
    fn configure(&mut self, definition: &Value) {
        if definition.is_null() {
            info!("no synthesizer definition configured");
        } else {
            info!("synthesizer definition replaced");
        }
    }

    fn set_parameter(&mut self, target: &str, value: f64) {
        self.writes += 1;
        println!("  {target} = {value:.4}");
    }
}

/// Records parameter writes for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSynth {
    writes: Vec<(String, f64)>,
    definition: Option<Value>,
}

impl RecordingSynth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write, in order.
    pub fn writes(&self) -> &[(String, f64)] {
        &self.writes
    }

    /// The most recent value written to `target`.
    pub fn last(&self, target: &str) -> Option<f64> {
        self.writes
            .iter()
            .rev()
            .find(|(written, _)| written == target)
            .map(|&(_, value)| value)
    }

    /// Final value per target, for summaries.
    pub fn settled(&self) -> BTreeMap<&str, f64> {
        let mut settled = BTreeMap::new();
        for (target, value) in &self.writes {
            settled.insert(target.as_str(), *value);
        }
        settled
    }

    /// The definition most recently handed over, if any.
    pub fn definition(&self) -> Option<&Value> {
        self.definition.as_ref()
    }
}

impl Synth for RecordingSynth {
    fn configure(&mut self, definition: &Value) {
        self.definition = Some(definition.clone());
    }

    fn set_parameter(&mut self, target: &str, value: f64) {
        self.writes.push((target.to_string(), value));
    }
}
