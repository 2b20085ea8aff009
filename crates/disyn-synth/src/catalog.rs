//! Algorithm catalog: display names and parameter ranges.
//!
//! The catalog lists every synthesis generator in [`AlgorithmKind`] order,
//! followed by two special modes handled by the audio task rather than the
//! voice engine: a hardware self-test square and a calibration test tone.
//! Parameter ranges exist for display and for the mapping helpers; the
//! engine itself always works in normalized `[0, 1]` units.
//!
//! ```rust
//! use disyn_synth::catalog::{self, TEST_INDEX};
//!
//! let test = catalog::info(TEST_INDEX);
//! assert_eq!(test.name, "TEST");
//! assert_eq!(catalog::map_normalized(&test.param1, 0.5), 1025.0);
//! ```

use disyn_core::clamp01;
use libm::roundf;

use crate::algorithms::AlgorithmKind;

/// Display range of one algorithm parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamInfo {
    /// Short label.
    pub label: &'static str,
    /// Value at normalized 0.
    pub min: f32,
    /// Value at normalized 1.
    pub max: f32,
    /// Display as an integer.
    pub integer: bool,
}

impl ParamInfo {
    const fn new(label: &'static str, min: f32, max: f32) -> Self {
        Self {
            label,
            min,
            max,
            integer: false,
        }
    }

    const fn int(label: &'static str, min: f32, max: f32) -> Self {
        Self {
            label,
            min,
            max,
            integer: true,
        }
    }

    const UNUSED: Self = Self::new("Unused", 0.0, 1.0);

    /// True when the slot has no effect for its algorithm.
    pub fn is_unused(&self) -> bool {
        self.label == Self::UNUSED.label
    }
}

/// Catalog entry for one algorithm or special mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmInfo {
    /// Display name.
    pub name: &'static str,
    /// First parameter.
    pub param1: ParamInfo,
    /// Second parameter.
    pub param2: ParamInfo,
}

const fn entry(name: &'static str, param1: ParamInfo, param2: ParamInfo) -> AlgorithmInfo {
    AlgorithmInfo {
        name,
        param1,
        param2,
    }
}

/// Number of catalog entries, special modes included.
pub const COUNT: usize = AlgorithmKind::COUNT + 2;
/// Hardware self-test mode.
pub const HARDWARE_INDEX: usize = COUNT - 2;
/// Calibration test-tone mode.
pub const TEST_INDEX: usize = COUNT - 1;

/// Returned for indices outside the catalog.
pub const DEFAULT_INFO: AlgorithmInfo = entry(
    "ALG",
    ParamInfo::new("P1", 0.0, 1.0),
    ParamInfo::new("P2", 0.0, 1.0),
);

const CATALOG: [AlgorithmInfo; COUNT] = [
    entry("Dir Pulse", ParamInfo::int("Harm", 1.0, 64.0), ParamInfo::new("Tilt", -3.0, 15.0)),
    entry("DSF S", ParamInfo::new("Dec", 0.0, 0.98), ParamInfo::new("Rat", 0.5, 4.0)),
    entry("DSF D", ParamInfo::new("Dec", 0.0, 0.96), ParamInfo::new("Rat", 0.5, 4.5)),
    entry("Tanh Sq", ParamInfo::new("Drv", 0.05, 5.0), ParamInfo::new("Trim", 0.2, 1.2)),
    entry("Tanh Saw", ParamInfo::new("Drv", 0.05, 4.5), ParamInfo::new("Blend", 0.0, 1.0)),
    entry("PAF", ParamInfo::new("Form", 0.5, 6.0), ParamInfo::new("BW", 50.0, 3000.0)),
    entry("Mod FM", ParamInfo::new("Idx", 0.01, 8.0), ParamInfo::new("Rat", 0.25, 6.0)),
    entry("C1 Hyb", ParamInfo::new("Idx", 0.01, 3.0), ParamInfo::UNUSED),
    entry("C2 Cas", ParamInfo::new("DSF Dec", 0.5, 0.95), ParamInfo::new("Asym", 0.5, 2.0)),
    entry("C3 Par", ParamInfo::new("Idx", 0.01, 8.0), ParamInfo::UNUSED),
    entry("C4 Fdb", ParamInfo::new("Idx", 0.01, 8.0), ParamInfo::new("Fb", 0.0, 0.95)),
    entry("C5 Mor", ParamInfo::new("Morph", 0.0, 1.0), ParamInfo::new("Char", 0.0, 1.0)),
    entry("C6 Inh", ParamInfo::new("DSF Dec", 0.5, 0.9), ParamInfo::new("PAF Sh", 5.0, 50.0)),
    entry("C7 Flt", ParamInfo::new("Cut", 0.0, 1.0), ParamInfo::new("Res", 0.0, 1.0)),
    entry("N1 Mul", ParamInfo::new("Tanh", 0.1, 10.0), ParamInfo::new("Exp", 0.1, 1.5)),
    entry("N2 Asy", ParamInfo::new("LowR", 0.5, 1.0), ParamInfo::new("HiR", 1.0, 2.0)),
    entry("N3 XMod", ParamInfo::new("M1", 0.0, 1.0), ParamInfo::new("M2", 0.0, 1.0)),
    entry("N4 Tay", ParamInfo::int("T1", 1.0, 10.0), ParamInfo::int("T2", 1.0, 10.0)),
    entry("Traj", ParamInfo::int("Sides", 3.0, 12.0), ParamInfo::new("Ang", 0.0, 360.0)),
    entry("Sine", ParamInfo::int("Steps", 1.0, 64.0), ParamInfo::UNUSED),
    entry("Ramp", ParamInfo::int("Steps", 1.0, 64.0), ParamInfo::UNUSED),
    entry("Triangle", ParamInfo::int("Steps", 1.0, 64.0), ParamInfo::UNUSED),
    entry("Pulse", ParamInfo::new("Width", 0.05, 0.95), ParamInfo::UNUSED),
    entry("Noise", ParamInfo::new("Smooth", 0.0, 1.0), ParamInfo::UNUSED),
    entry("Logistic", ParamInfo::new("Smooth", 0.0, 1.0), ParamInfo::UNUSED),
    entry("Lorenz", ParamInfo::new("Smooth", 0.0, 1.0), ParamInfo::UNUSED),
    entry("Hardware", ParamInfo::UNUSED, ParamInfo::UNUSED),
    entry("TEST", ParamInfo::new("Freq", 50.0, 2000.0), ParamInfo::new("Level", 0.0, 1.0)),
];

/// Catalog entry for `index`, or [`DEFAULT_INFO`] when out of range.
pub fn info(index: usize) -> &'static AlgorithmInfo {
    CATALOG.get(index).unwrap_or(&DEFAULT_INFO)
}

/// Every catalog entry in index order.
pub fn all() -> &'static [AlgorithmInfo] {
    &CATALOG
}

/// Catalog index for a display name (case-insensitive).
pub fn find(name: &str) -> Option<usize> {
    CATALOG.iter().position(|e| e.name.eq_ignore_ascii_case(name))
}

/// Linear map of a normalized value onto the parameter's range.
///
/// Input is clamped to `[0, 1]` first; NaN maps to the minimum.
pub fn map_normalized(param: &ParamInfo, normalized: f32) -> f32 {
    param.min + (param.max - param.min) * clamp01(normalized)
}

/// [`map_normalized`] rounded for integer parameters.
pub fn display_value(param: &ParamInfo, normalized: f32) -> f32 {
    let value = map_normalized(param, normalized);
    if param.integer { roundf(value) } else { value }
}

/// True for the special modes the voice engine does not render.
pub fn is_special_mode(index: usize) -> bool {
    index == HARDWARE_INDEX || index == TEST_INDEX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_indices_follow_generators() {
        assert_eq!(HARDWARE_INDEX, AlgorithmKind::COUNT);
        assert_eq!(TEST_INDEX, AlgorithmKind::COUNT + 1);
        assert_eq!(info(HARDWARE_INDEX).name, "Hardware");
        assert!(is_special_mode(TEST_INDEX));
        assert!(!is_special_mode(0));
    }

    #[test]
    fn out_of_range_returns_default() {
        assert_eq!(info(COUNT), &DEFAULT_INFO);
        assert_eq!(info(usize::MAX).param1.label, "P1");
    }

    #[test]
    fn map_normalized_clamps() {
        let harm = info(0).param1;
        assert_eq!(map_normalized(&harm, -1.0), 1.0);
        assert_eq!(map_normalized(&harm, 2.0), 64.0);
        assert_eq!(map_normalized(&harm, f32::NAN), 1.0);
        assert_eq!(display_value(&harm, 0.5), 33.0);
    }

    #[test]
    fn unused_slots() {
        assert!(info(7).param2.is_unused());
        assert!(!info(7).param1.is_unused());
        let hw = info(HARDWARE_INDEX);
        assert!(hw.param1.is_unused() && hw.param2.is_unused());
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find("mod fm"), Some(AlgorithmKind::ModFm.index()));
        assert_eq!(find("lorenz"), Some(AlgorithmKind::Lorenz.index()));
        assert_eq!(find("nope"), None);
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in all().iter().enumerate() {
            for b in &all()[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
