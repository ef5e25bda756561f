//! Reference signatures and the frame compatibility predicate

use crate::fingerprint::CandidateFilter;
use crate::types::{CandidateSet, CanFrame, CarError, Result, Signature, STANDARD_ID_LIMIT};
use std::collections::BTreeMap;
use std::path::Path;

/// Debug address every vehicle may carry regardless of its reference signature
pub const DEBUG_ADDRESS: (u32, usize) = (1880, 8);

/// Reference signatures of every known model. A model may have several
/// signatures (trim levels, option packages); matching any one keeps it.
#[derive(Debug, Clone, Default)]
pub struct FingerprintTable {
    models: BTreeMap<String, Vec<Signature>>,
}

impl FingerprintTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference signature for `model`
    pub fn add_signature(&mut self, model: impl Into<String>, mut signature: Signature) {
        signature.insert(DEBUG_ADDRESS.0, DEBUG_ADDRESS.1);
        self.models.entry(model.into()).or_default().push(signature);
    }

    /// Builder form of [`add_signature`](Self::add_signature)
    pub fn with_signature(mut self, model: impl Into<String>, signature: Signature) -> Self {
        self.add_signature(model, signature);
        self
    }

    /// Merge every signature of `other` into this table
    pub fn extend(&mut self, other: FingerprintTable) {
        for (model, signatures) in other.models {
            self.models.entry(model).or_default().extend(signatures);
        }
    }

    /// Parse a JSON table: `{"MODEL": [{"68": 8, "257": 5}, ...]}`
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<BTreeMap<u32, usize>>> = serde_json::from_str(content)
            .map_err(|e| CarError::TableParseError(e.to_string()))?;

        let mut table = Self::new();
        for (model, signatures) in raw {
            for signature in signatures {
                table.add_signature(model.clone(), signature);
            }
        }
        Ok(table)
    }

    /// Load a JSON table from disk
    pub fn from_json_file(path: &Path) -> Result<Self> {
        log::info!("Loading fingerprint table: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content).map_err(|e| match e {
            CarError::TableParseError(msg) => {
                CarError::TableParseError(format!("{:?}: {}", path, msg))
            }
            other => other,
        })
    }

    /// All models with at least one reference signature
    pub fn all_known_cars(&self) -> CandidateSet {
        self.models.keys().cloned().collect()
    }

    pub fn signatures(&self, model: &str) -> &[Signature] {
        self.models.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Frames on other buses and extended identifiers never disqualify a
    /// signature; everything else must match address and length exactly.
    pub fn is_valid_for_fingerprint(frame: &CanFrame, signature: &Signature) -> bool {
        if frame.bus != 0 || frame.address >= STANDARD_ID_LIMIT {
            return true;
        }
        signature.get(&frame.address) == Some(&frame.data.len())
    }
}

impl CandidateFilter for FingerprintTable {
    fn eliminate(&self, frame: &CanFrame, candidates: &CandidateSet) -> CandidateSet {
        candidates
            .iter()
            .filter(|model| {
                self.signatures(model)
                    .iter()
                    .any(|signature| Self::is_valid_for_fingerprint(frame, signature))
            })
            .cloned()
            .collect()
    }
}
