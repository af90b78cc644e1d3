//! # Source Weights
//!
//! Configurable mapping from news outlets (e.g. "Yonhap News", "Reuters")
//! to normalized trust/impact weights in the range `[0.0, 1.0]`.
//!
//! - Loads from JSON config (weights + aliases).
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative spellings/domains to canonical outlets.
//! - Fallback order: aliases → exact match → substring match → default.
//! - Includes a built-in `default_seed()` with the wires this digest reads.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// Configuration for source weights, loaded from JSON or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceWeightsConfig {
    /// Default weight if no match is found.
    #[serde(default = "default_default_weight")]
    pub default_weight: f32,
    /// Explicit weights for canonical outlet names.
    #[serde(default)]
    pub weights: HashMap<String, f32>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f32 {
    0.60
}

impl SourceWeightsConfig {
    /// Load configuration from a JSON file.
    /// Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    /// Get the weight for a given outlet name.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → weight.
    /// 2. Exact weight match.
    /// 3. Substring fallback (e.g. "The Korea Herald" → "korea herald").
    /// 4. Default weight.
    pub fn weight_for(&self, source: &str) -> f32 {
        let s = normalize(source);

        // 1) Alias resolution.
        if let Some(canon) = self.aliases.get(&s) {
            let c = normalize(canon);
            if let Some(&w) = self.weights.get(&c) {
                return clamp01(w);
            }
        }

        // 2) Exact weight match.
        if let Some(&w) = self.weights.get(&s) {
            return clamp01(w);
        }

        // 3) Substring fallback.
        for (k, &w) in &self.weights {
            if s.contains(k) {
                return clamp01(w);
            }
        }

        // 4) Default.
        clamp01(self.default_weight)
    }

    /// Built-in seed with the wire services and trade press this digest
    /// actually pulls from. Used as fallback if no config is found.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("yonhap news", 0.92),
            ("reuters", 0.88),
            ("bloomberg", 0.88),
            ("nikkei asia", 0.86),
            ("financial times", 0.86),
            ("wall street journal", 0.86),
            ("naver news", 0.78),
            ("korea herald", 0.76),
            ("etnews", 0.80),
            ("digitimes", 0.78),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("yonhap", "yonhap news"),
            ("yna", "yonhap news"),
            ("yna.co.kr", "yonhap news"),
            ("naver", "naver news"),
            ("news.naver.com", "naver news"),
            ("wsj", "wall street journal"),
            ("the wall street journal", "wall street journal"),
            ("ft", "financial times"),
            ("nikkei", "nikkei asia"),
            ("the korea herald", "korea herald"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: 0.60,
            weights,
            aliases,
        }
    }
}

/// Normalize input string: lowercase, replace punctuation/dashes with spaces,
/// collapse multiple spaces into one.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_ascii_lowercase();

    // Replace common separators with spaces.
    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    // Replace disruptive punctuation/whitespace with spaces.
    out = out.replace(['\n', '\r', '\t', ',', '’', '\''], " ");

    // Collapse multiple spaces.
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clamp to [0.0, 1.0].
fn clamp01(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}
