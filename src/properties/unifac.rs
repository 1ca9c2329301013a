use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::Catalog;

use super::PropertyError;

/// Molecular van der Waals parameters of the UNIFAC family of models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnifacParameters {
    /// Relative volume, `r = Σ ν R`.
    pub r: Option<f64>,
    /// Relative surface area, `q = Σ ν Q`.
    pub q: Option<f64>,
}

impl UnifacParameters {
    /// Sums the group parameters. A group without `R` (or `Q`) makes the
    /// corresponding molecular value `None`.
    pub fn from_groups(groups: &BTreeMap<String, u32>, catalog: &Catalog) -> Result<Self, PropertyError> {
        let mut rows = Vec::with_capacity(groups.len());
        for (name, &n) in groups.iter().filter(|(_, &n)| n > 0) {
            let group = catalog
                .group_by_name(name)
                .ok_or_else(|| PropertyError::UnknownGroup(name.clone()))?;
            rows.push((f64::from(n), group.r, group.q));
        }
        if rows.is_empty() {
            return Err(PropertyError::NoGroups);
        }
        Ok(Self {
            r: rows.iter().map(|&(n, r, _)| r.map(|r| n * r)).sum(),
            q: rows.iter().map(|&(n, _, q)| q.map(|q| n * q)).sum(),
        })
    }
}
