//! Input events and the adapter that applies them
//!
//! External collaborators (Bluetooth transport, sensor fusion) deliver
//! typed input-change events. The adapter stores the raw values into the
//! engine's snapshot and triggers one recompute per changed leaf signal,
//! all synchronously inside `handle`.

mod script;

pub use script::{ScriptSource, ScriptStep};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::engine::Engine;
use crate::math;
use crate::synth::Synth;

/// A named input-change notification from an external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum InputEvent {
    /// A controller completed its connection handshake.
    #[serde(rename = "microcontroller-connected")]
    MicrocontrollerConnected { device: String },

    /// Controller battery level, percent.
    #[serde(rename = "battery-level-changed")]
    BatteryLevelChanged { value: u8 },

    /// Raw potentiometer reading.
    #[serde(rename = "potentiometer-changed")]
    PotentiometerChanged { value: u16 },

    /// Device orientation in degrees, plus the absolute-reference flag.
    #[serde(rename = "orientation-changed")]
    OrientationChanged {
        alpha: f64,
        beta: f64,
        gamma: f64,
        #[serde(default)]
        absolute: bool,
    },

    /// Linear acceleration, gravity-relative acceleration, and rotation
    /// rate, all in one reading.
    #[serde(rename = "motion-changed")]
    MotionChanged {
        x: f64,
        y: f64,
        z: f64,
        gx: f64,
        gy: f64,
        gz: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    },
}

/// Trait for event sources feeding the adapter.
pub trait Source: Send + Sync {
    /// Get the name of this source.
    fn name(&self) -> &str;

    /// Start delivering events.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Stop delivering events.
    fn stop(&mut self);

    /// Check if the source is running.
    fn is_running(&self) -> bool;

    /// Subscribe to events from this source.
    fn subscribe(&self) -> broadcast::Receiver<InputEvent>;
}

/// One orientation reading, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Applies input events to a routing engine.
///
/// Holds the orientation zero reference and the connection readout on
/// top of the engine's own state.
pub struct Adapter<S> {
    engine: Engine<S>,
    /// Zero reference subtracted from raw orientation readings.
    baseline: Orientation,
    /// Raw orientation from the latest event, for re-centering.
    raw_orientation: Option<Orientation>,
    device: Option<String>,
    battery: Option<u8>,
}

impl<S: Synth> Adapter<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self {
            engine,
            baseline: Orientation::default(),
            raw_orientation: None,
            device: None,
            battery: None,
        }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<S> {
        &mut self.engine
    }

    /// Name of the connected controller, once one has announced itself.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Last reported battery level, percent.
    pub fn battery(&self) -> Option<u8> {
        self.battery
    }

    /// Apply one event: store the raw values, log the readout, and
    /// recompute every affected signal.
    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::MicrocontrollerConnected { device } => {
                info!("controller connected: {device}");
                self.device = Some(device.clone());
            }
            InputEvent::BatteryLevelChanged { value } => {
                debug!("battery {value}%");
                self.battery = Some(*value);
                self.engine.store("battery", f64::from(*value));
                self.engine.recompute("battery");
            }
            InputEvent::PotentiometerChanged { value } => {
                debug!("potentiometer {value}");
                self.engine.store("potentiometer", f64::from(*value));
                self.engine.recompute("potentiometer");

                // The last-nonzero variant only follows the primary
                // value while it is non-zero.
                if *value != 0 {
                    self.engine.store("potentiometer_last", f64::from(*value));
                    self.engine.recompute("potentiometer_last");
                }
            }
            InputEvent::OrientationChanged {
                alpha,
                beta,
                gamma,
                absolute,
            } => {
                let raw = Orientation {
                    alpha: *alpha,
                    beta: *beta,
                    gamma: *gamma,
                };
                self.raw_orientation = Some(raw);
                let oriented = self.recentered(raw);
                debug!(
                    "orientation ({:.3}, {:.3}, {:.3}, {absolute})",
                    oriented.alpha, oriented.beta, oriented.gamma
                );

                self.engine.store("orientation.alpha", oriented.alpha);
                self.engine.store("orientation.beta", oriented.beta);
                self.engine.store("orientation.gamma", oriented.gamma);
                self.engine.recompute("orientation.alpha");
                self.engine.recompute("orientation.beta");
                self.engine.recompute("orientation.gamma");
            }
            InputEvent::MotionChanged {
                x,
                y,
                z,
                gx,
                gy,
                gz,
                alpha,
                beta,
                gamma,
            } => {
                debug!("motion ({x:.3}, {y:.3}, {z:.3}) ({gx:.3}, {gy:.3}, {gz:.3}) ({alpha:.3}, {beta:.3}, {gamma:.3})");

                let signals = [
                    ("motion.x", *x),
                    ("motion.y", *y),
                    ("motion.z", *z),
                    ("motion.gx", *gx),
                    ("motion.gy", *gy),
                    ("motion.gz", *gz),
                    ("motion.alpha", *alpha),
                    ("motion.beta", *beta),
                    ("motion.gamma", *gamma),
                ];
                for (path, value) in signals {
                    self.engine.store(path, value);
                }
                for (path, _) in signals {
                    self.engine.recompute(path);
                }
            }
        }
    }

    /// Capture the current raw orientation as the new zero reference.
    ///
    /// A no-op until the first orientation event has arrived.
    pub fn recenter(&mut self) {
        match self.raw_orientation {
            Some(raw) => {
                self.baseline = raw;
                info!(
                    "orientation re-centered at ({:.3}, {:.3}, {:.3})",
                    raw.alpha, raw.beta, raw.gamma
                );
            }
            None => warn!("no orientation yet; re-center ignored"),
        }
    }

    fn recentered(&self, raw: Orientation) -> Orientation {
        Orientation {
            alpha: math::normalize_angle(raw.alpha - self.baseline.alpha),
            beta: math::normalize_angle(raw.beta - self.baseline.beta),
            gamma: math::normalize_angle(raw.gamma - self.baseline.gamma),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::synth::RecordingSynth;

    fn adapter_from_yaml(yaml: &str) -> Adapter<RecordingSynth> {
        let config: InputConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        Adapter::new(Engine::with_rules(config, RecordingSynth::new()))
    }

    fn full_coverage_adapter() -> Adapter<RecordingSynth> {
        adapter_from_yaml(
            r#"
battery:
  - affect: status.battery
potentiometer:
  - affect: note.gate
potentiometer_last:
  - affect: wave.freq
    input_min: 0
    input_max: 1023
    output_min: 293.7
    output_max: 587.3
orientation:
  alpha:
    - affect: pan.alpha
  beta:
    - affect: pan.beta
  gamma:
    - affect: pan.gamma
motion:
  x: [{ affect: m.x }]
  y: [{ affect: m.y }]
  z: [{ affect: m.z }]
  gx: [{ affect: m.gx }]
  gy: [{ affect: m.gy }]
  gz: [{ affect: m.gz }]
  alpha: [{ affect: m.alpha }]
  beta: [{ affect: m.beta }]
  gamma: [{ affect: m.gamma }]
"#,
        )
    }

    #[test]
    fn test_battery_event_stores_and_recomputes() {
        let mut adapter = full_coverage_adapter();
        adapter.handle(&InputEvent::BatteryLevelChanged { value: 87 });

        assert_eq!(adapter.battery(), Some(87));
        assert_eq!(adapter.engine().snapshot().value("battery"), Some(87.0));
        assert_eq!(adapter.engine().sink().last("status.battery"), Some(87.0));
    }

    #[test]
    fn test_connection_event_records_device_name() {
        let mut adapter = full_coverage_adapter();
        assert_eq!(adapter.device(), None);

        adapter.handle(&InputEvent::MicrocontrollerConnected {
            device: "sway-controller".to_string(),
        });
        assert_eq!(adapter.device(), Some("sway-controller"));
        assert!(adapter.engine().sink().writes().is_empty());
    }

    #[test]
    fn test_nonzero_potentiometer_updates_last_variant() {
        let mut adapter = full_coverage_adapter();
        adapter.handle(&InputEvent::PotentiometerChanged { value: 512 });

        let engine = adapter.engine();
        assert_eq!(engine.snapshot().value("potentiometer"), Some(512.0));
        assert_eq!(engine.snapshot().value("potentiometer_last"), Some(512.0));
        assert!(engine.sink().last("wave.freq").is_some());
    }

    #[test]
    fn test_zero_potentiometer_keeps_last_variant() {
        let mut adapter = full_coverage_adapter();
        adapter.handle(&InputEvent::PotentiometerChanged { value: 512 });
        adapter.handle(&InputEvent::PotentiometerChanged { value: 0 });

        let engine = adapter.engine();
        assert_eq!(engine.snapshot().value("potentiometer"), Some(0.0));
        // The last-nonzero variant still holds the previous reading.
        assert_eq!(engine.snapshot().value("potentiometer_last"), Some(512.0));
    }

    #[test]
    fn test_orientation_event_recomputes_three_signals() {
        let mut adapter = full_coverage_adapter();
        adapter.handle(&InputEvent::OrientationChanged {
            alpha: 45.0,
            beta: 10.0,
            gamma: 350.0,
            absolute: false,
        });

        let sink = adapter.engine().sink();
        assert_eq!(sink.writes().len(), 3);
        assert_eq!(sink.last("pan.alpha"), Some(45.0));
        assert_eq!(sink.last("pan.beta"), Some(10.0));
        assert_eq!(sink.last("pan.gamma"), Some(350.0));
    }

    #[test]
    fn test_orientation_values_are_normalized() {
        let mut adapter = full_coverage_adapter();
        adapter.handle(&InputEvent::OrientationChanged {
            alpha: -10.0,
            beta: 370.0,
            gamma: 0.0,
            absolute: false,
        });

        assert_eq!(adapter.engine().sink().last("pan.alpha"), Some(350.0));
        assert_eq!(adapter.engine().sink().last("pan.beta"), Some(10.0));
    }

    #[test]
    fn test_motion_event_recomputes_nine_signals() {
        let mut adapter = full_coverage_adapter();
        adapter.handle(&InputEvent::MotionChanged {
            x: 0.1,
            y: 0.2,
            z: 0.3,
            gx: 1.0,
            gy: 2.0,
            gz: 3.0,
            alpha: 10.0,
            beta: 20.0,
            gamma: 30.0,
        });

        let sink = adapter.engine().sink();
        assert_eq!(sink.writes().len(), 9);
        assert_eq!(sink.last("m.gz"), Some(3.0));
        assert_eq!(sink.last("m.gamma"), Some(30.0));
    }

    #[test]
    fn test_recenter_shifts_subsequent_orientation() {
        let mut adapter = full_coverage_adapter();
        adapter.handle(&InputEvent::OrientationChanged {
            alpha: 40.0,
            beta: 10.0,
            gamma: 5.0,
            absolute: false,
        });
        adapter.recenter();
        adapter.handle(&InputEvent::OrientationChanged {
            alpha: 45.0,
            beta: 5.0,
            gamma: 5.0,
            absolute: false,
        });

        let sink = adapter.engine().sink();
        assert_eq!(sink.last("pan.alpha"), Some(5.0));
        assert_eq!(sink.last("pan.beta"), Some(355.0));
        assert_eq!(sink.last("pan.gamma"), Some(0.0));
    }

    #[test]
    fn test_recenter_before_any_orientation_is_ignored() {
        let mut adapter = full_coverage_adapter();
        adapter.recenter();
        adapter.handle(&InputEvent::OrientationChanged {
            alpha: 45.0,
            beta: 0.0,
            gamma: 0.0,
            absolute: false,
        });

        assert_eq!(adapter.engine().sink().last("pan.alpha"), Some(45.0));
    }

    #[test]
    fn test_event_names_round_trip_through_yaml() {
        let yaml = "event: potentiometer-changed\nvalue: 512\n";
        let event: InputEvent = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(event, InputEvent::PotentiometerChanged { value: 512 });

        let yaml = "event: orientation-changed\nalpha: 1\nbeta: 2\ngamma: 3\n";
        let event: InputEvent = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            event,
            InputEvent::OrientationChanged {
                alpha: 1.0,
                beta: 2.0,
                gamma: 3.0,
                absolute: false,
            }
        );
    }
}
