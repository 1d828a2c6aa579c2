//! Compiled-in input layout
//!
//! The categories and signals the instrument understands, with the
//! per-signal rotational flag. The layout mirrors the event adapter's
//! sensor surface and is deliberately not part of the editable
//! configuration; `sway signals` prints it.

/// A single raw signal within a grouped category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSpec {
    pub id: &'static str,
    /// True when values are angles wrapping at 360 degrees.
    pub rotational: bool,
}

/// Shape of one input category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryShape {
    /// A single raw value with one rule list.
    Scalar { rotational: bool },
    /// Named sub-signals, each with its own rule list.
    Group(&'static [SignalSpec]),
}

/// One named input category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub shape: CategoryShape,
}

impl Category {
    /// Look a category up by id.
    pub fn find(id: &str) -> Option<&'static Category> {
        LAYOUT.iter().find(|category| category.id == id)
    }

    /// Look a sub-signal up by id, for grouped categories.
    pub fn signal(&self, id: &str) -> Option<&'static SignalSpec> {
        match self.shape {
            CategoryShape::Scalar { .. } => None,
            CategoryShape::Group(signals) => signals.iter().find(|signal| signal.id == id),
        }
    }
}

const ORIENTATION_SIGNALS: &[SignalSpec] = &[
    SignalSpec { id: "alpha", rotational: true },
    SignalSpec { id: "beta", rotational: true },
    SignalSpec { id: "gamma", rotational: true },
];

const MOTION_SIGNALS: &[SignalSpec] = &[
    SignalSpec { id: "x", rotational: false },
    SignalSpec { id: "y", rotational: false },
    SignalSpec { id: "z", rotational: false },
    SignalSpec { id: "gx", rotational: false },
    SignalSpec { id: "gy", rotational: false },
    SignalSpec { id: "gz", rotational: false },
    SignalSpec { id: "alpha", rotational: true },
    SignalSpec { id: "beta", rotational: true },
    SignalSpec { id: "gamma", rotational: true },
];

/// The instrument's full input surface, in scan order.
pub const LAYOUT: &[Category] = &[
    Category {
        id: "battery",
        shape: CategoryShape::Scalar { rotational: false },
    },
    Category {
        id: "potentiometer",
        shape: CategoryShape::Scalar { rotational: false },
    },
    Category {
        id: "potentiometer_last",
        shape: CategoryShape::Scalar { rotational: false },
    },
    Category {
        id: "orientation",
        shape: CategoryShape::Group(ORIENTATION_SIGNALS),
    },
    Category {
        id: "motion",
        shape: CategoryShape::Group(MOTION_SIGNALS),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_categories() {
        assert_eq!(LAYOUT.len(), 5);
        assert!(Category::find("battery").is_some());
        assert!(Category::find("potentiometer_last").is_some());
        assert!(Category::find("humidity").is_none());
    }

    #[test]
    fn test_orientation_signals_are_rotational() {
        let orientation = Category::find("orientation").unwrap();
        for id in ["alpha", "beta", "gamma"] {
            assert!(orientation.signal(id).unwrap().rotational);
        }
    }

    #[test]
    fn test_motion_mixes_linear_and_rotational() {
        let motion = Category::find("motion").unwrap();
        for id in ["x", "y", "z", "gx", "gy", "gz"] {
            assert!(!motion.signal(id).unwrap().rotational);
        }
        for id in ["alpha", "beta", "gamma"] {
            assert!(motion.signal(id).unwrap().rotational);
        }
    }

    #[test]
    fn test_scalar_category_has_no_signals() {
        let battery = Category::find("battery").unwrap();
        assert!(battery.signal("alpha").is_none());
    }
}
