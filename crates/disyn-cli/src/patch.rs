//! Patch file format.
//!
//! A patch is a TOML file with up to three tables:
//!
//! ```toml
//! [parameters]
//! algorithm = "PAF"      # catalog name or index
//! attack = 0.05
//! param1 = 0.3
//!
//! [dsp]
//! sample_rate = 48000
//!
//! [gate]
//! period = 0.5
//! duty = 0.25
//! ```
//!
//! Missing fields keep their defaults. Modulation inputs (`cv0..2`,
//! `pot0..2`) default to their center, 0.5, so a patch without them plays
//! the knob values unmodulated.

use std::fs;
use std::path::{Path, PathBuf};

use disyn_platform::{DspConfig, ParameterSnapshot};
use disyn_synth::catalog;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Patch loading and saving failures.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The file could not be read.
    #[error("cannot read patch {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid patch.
    #[error("cannot parse patch {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// The patch could not be turned into TOML.
    #[error("cannot serialize patch: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The file could not be written.
    #[error("cannot write patch {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Parsed, but describes something unplayable.
    #[error("invalid patch: {0}")]
    Invalid(String),
}

/// Catalog entry given by name or by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlgorithmRef {
    /// Catalog index.
    Index(u8),
    /// Catalog display name, matched case-insensitively.
    Name(String),
}

impl Default for AlgorithmRef {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl AlgorithmRef {
    /// Catalog index this refers to.
    pub fn resolve(&self) -> Result<u8, PatchError> {
        let index = match self {
            Self::Index(i) => usize::from(*i),
            Self::Name(name) => catalog::find(name)
                .ok_or_else(|| PatchError::Invalid(format!("unknown algorithm '{name}'")))?,
        };
        if index >= catalog::COUNT {
            return Err(PatchError::Invalid(format!(
                "algorithm index {index} out of range (0..{})",
                catalog::COUNT
            )));
        }
        // COUNT is far below 256.
        Ok(index as u8)
    }
}

/// The `[parameters]` table: one field per control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub algorithm: AlgorithmRef,
    pub attack: f32,
    pub decay: f32,
    pub reverb_size: f32,
    pub reverb_level: f32,
    pub param1: f32,
    pub param2: f32,
    pub master_gain: f32,
    pub cv0: f32,
    pub cv1: f32,
    pub cv2: f32,
    pub pot0: f32,
    pub pot1: f32,
    pub pot2: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        let base = ParameterSnapshot::default();
        Self {
            algorithm: AlgorithmRef::Index(base.algorithm),
            attack: base.attack,
            decay: base.decay,
            reverb_size: base.reverb_size,
            reverb_level: base.reverb_level,
            param1: base.param1,
            param2: base.param2,
            master_gain: base.master_gain,
            cv0: 0.5,
            cv1: 0.5,
            cv2: 0.5,
            pot0: 0.5,
            pot1: 0.5,
            pot2: 0.5,
        }
    }
}

impl Parameters {
    /// Snapshot to hand to the audio task.
    pub fn to_snapshot(&self) -> Result<ParameterSnapshot, PatchError> {
        Ok(ParameterSnapshot {
            algorithm: self.algorithm.resolve()?,
            attack: self.attack,
            decay: self.decay,
            reverb_size: self.reverb_size,
            reverb_level: self.reverb_level,
            param1: self.param1,
            param2: self.param2,
            master_gain: self.master_gain,
            cv0: self.cv0,
            cv1: self.cv1,
            cv2: self.cv2,
            pot0: self.pot0,
            pot1: self.pot1,
            pot2: self.pot2,
        })
    }

    fn values(&self) -> [(&'static str, f32); 13] {
        [
            ("attack", self.attack),
            ("decay", self.decay),
            ("reverb_size", self.reverb_size),
            ("reverb_level", self.reverb_level),
            ("param1", self.param1),
            ("param2", self.param2),
            ("master_gain", self.master_gain),
            ("cv0", self.cv0),
            ("cv1", self.cv1),
            ("cv2", self.cv2),
            ("pot0", self.pot0),
            ("pot1", self.pot1),
            ("pot2", self.pot2),
        ]
    }
}

/// The `[gate]` table: how the offline gate input behaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// Seconds per on/off cycle.
    pub period: f32,
    /// Fraction of each cycle the gate is high.
    pub duty: f32,
    /// Hold the gate high for the whole render.
    pub drone: bool,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            period: 1.0,
            duty: 0.5,
            drone: false,
        }
    }
}

/// A complete patch file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patch {
    pub parameters: Parameters,
    pub dsp: DspConfig,
    pub gate: GateSettings,
}

impl Patch {
    /// Read and validate a patch file.
    pub fn load(path: &Path) -> Result<Self, PatchError> {
        let text = fs::read_to_string(path).map_err(|source| PatchError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let patch = Self::parse(&text, path)?;
        tracing::debug!(path = %path.display(), "patch loaded");
        Ok(patch)
    }

    /// Parse and validate patch text.
    pub fn from_toml(text: &str) -> Result<Self, PatchError> {
        Self::parse(text, Path::new("<inline>"))
    }

    fn parse(text: &str, path: &Path) -> Result<Self, PatchError> {
        let patch: Self = toml::from_str(text).map_err(|source| PatchError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        patch.validate()?;
        Ok(patch)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, PatchError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the patch to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PatchError> {
        let text = self.to_toml()?;
        fs::write(path, text).map_err(|source| PatchError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject patches the audio task cannot play as written.
    ///
    /// Controls must be finite and inside `[0, 1]`; the DSP config must
    /// pass [`DspConfig::validate`]; the gate period must be positive.
    pub fn validate(&self) -> Result<(), PatchError> {
        self.parameters.algorithm.resolve()?;
        for (name, value) in self.parameters.values() {
            if !(0.0..=1.0).contains(&value) {
                return Err(PatchError::Invalid(format!(
                    "{name} = {value} is outside [0, 1]"
                )));
            }
        }
        self.dsp
            .validate()
            .map_err(|msg| PatchError::Invalid(msg.to_string()))?;
        if !self.gate.period.is_finite() || self.gate.period <= 0.0 {
            return Err(PatchError::Invalid("gate period must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.gate.duty) {
            return Err(PatchError::Invalid("gate duty must be within [0, 1]".into()));
        }
        Ok(())
    }

    /// Parameter snapshot for the audio task.
    pub fn snapshot(&self) -> Result<ParameterSnapshot, PatchError> {
        self.parameters.to_snapshot()
    }
}
