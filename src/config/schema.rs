//! Configuration schema definitions

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::engine::layout::{Category, CategoryShape};

/// Top-level configuration: an opaque synthesizer definition plus the
/// input routing tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Handed to the synthesizer collaborator verbatim; the routing core
    /// never looks inside.
    #[serde(default)]
    pub synth: serde_yaml::Value,

    /// The editable routing rules.
    #[serde(default)]
    pub input: InputConfig,
}

impl InstrumentConfig {
    /// Validate the configuration against the compiled-in input layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.input.validate()
    }
}

/// The routing rule tree: category name to rules or sub-signals.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct InputConfig(pub BTreeMap<String, RuleSet>);

impl InputConfig {
    /// Validate every category, signal, and rule against the layout.
    ///
    /// Rejects unknown categories and signals, shapes that disagree with
    /// the layout, empty affect paths, and rescales over an empty input
    /// range. Half-configured bound pairs are legal (the affected step is
    /// skipped at recompute time) but logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (category_id, rule_set) in &self.0 {
            let Some(category) = Category::find(category_id) else {
                return Err(ConfigError::UnknownCategory(category_id.clone()));
            };
            match (category.shape, rule_set) {
                (CategoryShape::Scalar { .. }, RuleSet::Rules(rules)) => {
                    validate_rules(category_id, rules)?;
                }
                (CategoryShape::Group(_), RuleSet::Group(children)) => {
                    for (signal_id, child) in children {
                        if category.signal(signal_id).is_none() {
                            return Err(ConfigError::UnknownSignal {
                                category: category_id.clone(),
                                signal: signal_id.clone(),
                            });
                        }
                        let signal_path = format!("{category_id}.{signal_id}");
                        match child {
                            RuleSet::Rules(rules) => validate_rules(&signal_path, rules)?,
                            RuleSet::Group(_) => {
                                return Err(ConfigError::ShapeMismatch {
                                    signal: signal_path,
                                    expected: "a rule list",
                                })
                            }
                        }
                    }
                }
                (CategoryShape::Scalar { .. }, RuleSet::Group(_)) => {
                    return Err(ConfigError::ShapeMismatch {
                        signal: category_id.clone(),
                        expected: "a rule list",
                    })
                }
                (CategoryShape::Group(_), RuleSet::Rules(_)) => {
                    return Err(ConfigError::ShapeMismatch {
                        signal: category_id.clone(),
                        expected: "a group of sub-signals",
                    })
                }
            }
        }
        Ok(())
    }
}

/// Rules attached to one signal, or a group of named sub-signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RuleSet {
    /// A flat rule list for one signal; indexable by position.
    Rules(Vec<Rule>),
    /// Sub-signal name to its rules.
    Group(BTreeMap<String, RuleSet>),
}

/// One mapping rule: a synthesizer target plus optional scaling bounds.
///
/// `input_min`/`input_max` clamp (wrap-aware for rotational signals);
/// `output_min`/`output_max` rescale linearly. Each pair takes effect
/// only when complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Dot-path of the synthesizer parameter this rule drives.
    pub affect: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_max: Option<f64>,
}

impl Rule {
    /// The clamp bounds, when both are configured.
    pub fn input_range(&self) -> Option<(f64, f64)> {
        match (self.input_min, self.input_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    /// The rescale bounds, when both are configured.
    pub fn output_range(&self) -> Option<(f64, f64)> {
        match (self.output_min, self.output_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

fn validate_rules(signal_path: &str, rules: &[Rule]) -> Result<(), ConfigError> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.affect.is_empty() {
            return Err(ConfigError::EmptyAffect {
                signal: signal_path.to_string(),
                index,
            });
        }
        if rule.input_min.is_some() != rule.input_max.is_some() {
            warn!("rule {index} for '{signal_path}' has only one input bound; clamping is skipped");
        }
        if rule.output_min.is_some() != rule.output_max.is_some() {
            warn!("rule {index} for '{signal_path}' has only one output bound; rescaling is skipped");
        }
        if rule.output_range().is_some() {
            match rule.input_range() {
                Some((min, max)) if min == max => {
                    return Err(ConfigError::EmptyInputRange {
                        signal: signal_path.to_string(),
                        index,
                    });
                }
                None => {
                    warn!(
                        "rule {index} for '{signal_path}' rescales without input bounds; \
                         rescaling is skipped"
                    );
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}
