//! Input-to-parameter routing
//!
//! The engine owns the editable routing rules, the live input snapshot,
//! and the outbound synthesizer sink. When a signal changes, `recompute`
//! gathers every rule across the whole layout that drives the same
//! synthesizer parameters, scales each contribution, and pushes the
//! summed result to the synthesizer.

pub mod layout;
pub mod path;
pub mod snapshot;

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::config::{ConfigError, InputConfig, InstrumentConfig, Rule, RuleSet};
use crate::math;
use crate::synth::Synth;
use layout::{CategoryShape, LAYOUT};
use path::{resolve, Resolved, TreeNode};
use snapshot::Snapshot;

/// Resolver view over the routing configuration tree.
#[derive(Debug, Clone, Copy)]
pub enum ConfigNode<'a> {
    /// A category or sub-signal grouping.
    Group(&'a BTreeMap<String, RuleSet>),
    /// The rule list of one signal; indexable by position.
    Rules(&'a [Rule]),
    /// A single mapping rule.
    Rule(&'a Rule),
}

impl<'a> TreeNode for ConfigNode<'a> {
    fn child(self, segment: &str) -> Option<Self> {
        match self {
            ConfigNode::Group(children) => children.get(segment).map(|child| match child {
                RuleSet::Rules(rules) => ConfigNode::Rules(rules),
                RuleSet::Group(grandchildren) => ConfigNode::Group(grandchildren),
            }),
            ConfigNode::Rules(rules) => {
                let index: usize = segment.parse().ok()?;
                rules.get(index).map(ConfigNode::Rule)
            }
            ConfigNode::Rule(_) => None,
        }
    }
}

/// The routing engine.
///
/// One instance per instrument; there is no shared global state, so
/// independent engines can run side by side.
pub struct Engine<S> {
    config: InputConfig,
    snapshot: Snapshot,
    sink: S,
}

impl<S: Synth> Engine<S> {
    /// Create an engine, handing the synthesizer definition to the sink.
    pub fn new(config: InstrumentConfig, mut sink: S) -> Self {
        sink.configure(&config.synth);
        Self::with_rules(config.input, sink)
    }

    /// Create an engine over routing rules alone.
    pub fn with_rules(config: InputConfig, sink: S) -> Self {
        Self {
            config,
            snapshot: Snapshot::new(),
            sink,
        }
    }

    /// The active routing rules.
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// The live input snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The synthesizer sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Store a raw input value without recomputing.
    pub fn store(&mut self, path: &str, value: f64) {
        self.snapshot.store(path, value);
    }

    /// Replace the routing rules.
    ///
    /// Takes effect on the next recompute; the snapshot is untouched.
    pub fn replace_rules(&mut self, config: InputConfig) {
        self.config = config;
    }

    /// Hot-replace the routing rules from configuration text.
    ///
    /// A failed parse or validation keeps the previous rules active.
    pub fn reconfigure_input(&mut self, text: &str) -> Result<(), ConfigError> {
        let config: InputConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Hand a new synthesizer definition to the sink.
    pub fn reconfigure_synth(&mut self, text: &str) -> Result<(), ConfigError> {
        let definition: serde_yaml::Value = serde_yaml::from_str(text)?;
        self.sink.configure(&definition);
        Ok(())
    }

    /// Re-evaluate every parameter driven by the rule list at `changed`.
    ///
    /// `changed` names a signal's rule list, e.g. `"potentiometer"` or
    /// `"orientation.alpha"`. For each distinct affect path in that list
    /// (first occurrence order), all rules across the whole layout that
    /// share the affect contribute to one summed write.
    pub fn recompute(&mut self, changed: &str) {
        let Self {
            config,
            snapshot,
            sink,
        } = self;

        let rules = match resolve(ConfigNode::Group(&config.0), changed) {
            Resolved::Full(ConfigNode::Rules(rules)) => rules,
            _ => {
                warn!("no rule list at '{changed}' in the input configuration");
                return;
            }
        };
        if rules.is_empty() {
            return;
        }

        let mut seen: Vec<&str> = Vec::new();
        for rule in rules {
            let affect = rule.affect.as_str();
            if seen.contains(&affect) {
                continue;
            }
            seen.push(affect);
            let sum = combined_value(config, snapshot, affect);
            sink.set_parameter(affect, sum);
        }
    }
}

/// Sum every configured contribution to `affect` across the whole layout.
///
/// Contributions with no snapshot value yet, or that scale to NaN, are
/// skipped; the sum of zero contributions is 0.
fn combined_value(config: &InputConfig, snapshot: &Snapshot, affect: &str) -> f64 {
    let mut sum = 0.0;
    let mut matched = 0usize;

    for category in LAYOUT {
        let Some(rule_set) = config.0.get(category.id) else {
            continue;
        };
        match (category.shape, rule_set) {
            (CategoryShape::Scalar { rotational }, RuleSet::Rules(rules)) => {
                for rule in rules.iter().filter(|rule| rule.affect == affect) {
                    matched += 1;
                    if let Some(value) = contribution(snapshot, category.id, rotational, rule) {
                        sum += value;
                    }
                }
            }
            (CategoryShape::Group(signals), RuleSet::Group(children)) => {
                for signal in signals {
                    let Some(RuleSet::Rules(rules)) = children.get(signal.id) else {
                        continue;
                    };
                    for rule in rules.iter().filter(|rule| rule.affect == affect) {
                        matched += 1;
                        let signal_path = format!("{}.{}", category.id, signal.id);
                        if let Some(value) =
                            contribution(snapshot, &signal_path, signal.rotational, rule)
                        {
                            sum += value;
                        }
                    }
                }
            }
            _ => {
                debug!(
                    "category '{}' disagrees with the layout shape; skipped",
                    category.id
                );
            }
        }
    }

    if matched == 0 {
        debug!("no rules drive '{affect}'");
    }
    sum
}

/// One rule's scaled contribution, if its input is available and numeric.
fn contribution(snapshot: &Snapshot, signal_path: &str, rotational: bool, rule: &Rule) -> Option<f64> {
    let Some(raw) = snapshot.value(signal_path) else {
        warn!("no value yet at '{signal_path}'; contribution skipped");
        return None;
    };
    let scaled = scale_contribution(raw, rule, rotational);
    if scaled.is_nan() {
        warn!("contribution from '{signal_path}' is not a number; skipped");
        return None;
    }
    Some(scaled)
}

/// Apply a rule's clamp/wrap and rescale steps to a raw value.
///
/// Rotational signals wrap-clamp and then take the signed distance from
/// zero; linear signals clamp plainly. Rescaling needs both bound pairs.
fn scale_contribution(value: f64, rule: &Rule, rotational: bool) -> f64 {
    let mut value = value;
    let input_range = rule.input_range();

    if let Some((min, max)) = input_range {
        if rotational {
            value = math::clamp_angle(value, min, max);
            value = math::distance_angle(value, 0.0);
        } else {
            value = math::clamp(value, min, max);
        }
    }

    if let (Some((min, max)), Some((target_min, target_max))) = (input_range, rule.output_range()) {
        value = math::ratio(value, min, max, target_min, target_max);
    }

    value
}
