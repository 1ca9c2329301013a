use serde::{Deserialize, Serialize};

/// Knobs of the fragmentation pipeline.
///
/// Deserializes from a partial table; missing keys take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentOptions {
    /// Largest accepted difference, in g/mol, between the molecule's weight
    /// and the summed group weights.
    pub weight_tolerance: f64,
    /// Run the exact-cover search on every result and warn when it fails.
    pub verify_fit: bool,
    /// Let problematic rules rescue an incomplete resolution when the
    /// corrected counts then pass the weight check.
    pub repair_incomplete: bool,
}

impl Default for FragmentOptions {
    fn default() -> Self {
        Self {
            weight_tolerance: 0.01,
            verify_fit: false,
            repair_incomplete: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_keeps_defaults() {
        let opts: FragmentOptions = serde_json::from_str(r#"{"verify_fit": true}"#).unwrap();
        assert!(opts.verify_fit);
        assert!(opts.repair_incomplete);
        assert_eq!(opts.weight_tolerance, 0.01);
    }
}
