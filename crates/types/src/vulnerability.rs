//! Static vulnerability reference data.

use crate::VulnerabilityId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Difficulty of an average vulnerability, the midpoint of the 1-10 scale.
pub const MIDPOINT_DIFFICULTY: f64 = 5.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    CodeExecution,
    InformationDisclosure,
    PrivilegeEscalation,
    DenialOfService,
    AccessControlBypass,
    DataManipulation,
    Other,
}

/// A vulnerability definition. Loaded once, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: VulnerabilityId,
    pub name: String,
    pub severity: Severity,
    pub category: Category,
    pub cvss_score: Option<f32>,
    /// How hard the vulnerability is to exploit (1 = trivial, 10 = very hard).
    pub exploit_difficulty: u8,
    /// How hard the vulnerability is to patch (1 = trivial, 10 = very hard).
    pub patch_difficulty: u8,
}

impl Vulnerability {
    /// Create a definition with midpoint difficulties.
    pub fn new(id: impl Into<VulnerabilityId>, name: impl Into<String>, severity: Severity, category: Category) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            severity,
            category,
            cvss_score: None,
            exploit_difficulty: 5,
            patch_difficulty: 5,
        }
    }

    pub fn with_cvss(mut self, score: f32) -> Self {
        self.cvss_score = Some(score);
        self
    }

    /// Set exploit difficulty (clamped to 1..=10).
    pub fn with_exploit_difficulty(mut self, difficulty: u8) -> Self {
        self.exploit_difficulty = difficulty.clamp(1, 10);
        self
    }

    /// Set patch difficulty (clamped to 1..=10).
    pub fn with_patch_difficulty(mut self, difficulty: u8) -> Self {
        self.patch_difficulty = difficulty.clamp(1, 10);
        self
    }
}

/// Registry of all known vulnerability definitions, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRegistry {
    entries: IndexMap<VulnerabilityId, Vulnerability>,
}

impl VulnerabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same id.
    ///
    /// Returns the replaced definition, if any.
    pub fn register(&mut self, vuln: Vulnerability) -> Option<Vulnerability> {
        self.entries.insert(vuln.id.clone(), vuln)
    }

    pub fn get(&self, id: &VulnerabilityId) -> Option<&Vulnerability> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &VulnerabilityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vulnerability> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Vulnerability> for VulnerabilityRegistry {
    fn from_iter<I: IntoIterator<Item = Vulnerability>>(iter: I) -> Self {
        let mut registry = Self::new();
        for vuln in iter {
            registry.register(vuln);
        }
        registry
    }
}
