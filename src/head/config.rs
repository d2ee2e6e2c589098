use crate::error::{HeadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Geometry of one fully-connected head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadConfig {
    pub in_ch: usize,
    pub out_ch: usize,
    pub out_ch_pad: usize,
    pub shift: u32,
}

/// Backbone feature width shared by all heads: 2x2x288.
pub const FEATURE_DIM: usize = 1152;
pub const DEFAULT_SHIFT: u32 = 15;

/// 65 keypoints x 3 coords.
pub const POSE3D: HeadConfig = HeadConfig { in_ch: FEATURE_DIM, out_ch: 195, out_ch_pad: 195 + 5, shift: DEFAULT_SHIFT };
pub const WORLD: HeadConfig = HeadConfig { in_ch: FEATURE_DIM, out_ch: 117, out_ch_pad: 117 + 3, shift: DEFAULT_SHIFT };
pub const FLAG: HeadConfig = HeadConfig { in_ch: FEATURE_DIM, out_ch: 1, out_ch_pad: 1 + 7, shift: DEFAULT_SHIFT };

impl HeadConfig {
    #[inline]
    pub fn row_stride(&self) -> usize { 1 + self.in_ch }
    #[inline]
    pub fn weight_len(&self) -> usize { self.out_ch * self.row_stride() }
    #[inline]
    pub fn pad_len(&self) -> usize { self.out_ch_pad.saturating_sub(self.out_ch) }

    pub fn validate(&self) -> Result<()> {
        self.check().map_err(HeadError::InvalidConfig)
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.out_ch_pad < self.out_ch {
            return Err(format!("out_ch_pad {} < out_ch {}", self.out_ch_pad, self.out_ch));
        }
        // Accumulators are 64 bits wide.
        if self.shift >= 64 {
            return Err(format!("shift {} must be < 64", self.shift));
        }
        // The weight table and every buffer must be addressable in bytes.
        let weight_bytes = self.in_ch.checked_add(1)
            .and_then(|stride| stride.checked_mul(self.out_ch))
            .and_then(|elems| elems.checked_mul(2));
        if weight_bytes.is_none() || self.in_ch.checked_mul(2).is_none() || self.out_ch_pad.checked_mul(2).is_none() {
            return Err(format!(
                "geometry in_ch {} out_ch {} out_ch_pad {} overflows usize",
                self.in_ch, self.out_ch, self.out_ch_pad
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedHead {
    pub name: String,
    #[serde(flatten)]
    pub config: HeadConfig,
}

/// Ordered set of heads sharing one feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadTable {
    pub heads: Vec<NamedHead>,
}

impl Default for HeadTable {
    fn default() -> Self {
        Self {
            heads: vec![
                NamedHead { name: "pose3d".into(), config: POSE3D },
                NamedHead { name: "world".into(), config: WORLD },
                NamedHead { name: "flag".into(), config: FLAG },
            ],
        }
    }
}

impl HeadTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        let table: HeadTable = serde_json::from_reader(BufReader::new(f))?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let table: HeadTable = serde_json::from_str(s)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for h in &self.heads {
            if !seen.insert(h.name.as_str()) {
                return Err(HeadError::InvalidConfig(format!("duplicate head name '{}'", h.name)));
            }
            h.config.check().map_err(|e| HeadError::InvalidConfig(format!("head '{}': {}", h.name, e)))?;
        }
        // The feature vector is shared, so every head must agree on its width.
        if let Some(first) = self.heads.first() {
            if let Some(h) = self.heads.iter().find(|h| h.config.in_ch != first.config.in_ch) {
                return Err(HeadError::InvalidConfig(format!(
                    "head '{}' has in_ch {} but '{}' has {}", h.name, h.config.in_ch, first.name, first.config.in_ch
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&HeadConfig> {
        self.heads.iter().find(|h| h.name == name).map(|h| &h.config)
    }

    /// Shared feature width, 0 for an empty table.
    pub fn feature_dim(&self) -> usize { self.heads.first().map(|h| h.config.in_ch).unwrap_or(0) }
}
