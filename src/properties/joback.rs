//! Joback group-contribution estimates (Joback and Reid, 1987).
//!
//! Units: temperatures in K, pressures in bar, volumes in cm³/mol,
//! enthalpies and Gibbs energies in kJ/mol, heat capacities in J/(mol K),
//! viscosity in Pa s.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, Model};

use super::{PropertyError, R};

/// One row of the Joback contribution table. `None` marks a value the
/// method does not provide for that group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobackContribution {
    pub group: String,
    pub tc: Option<f64>,
    pub pc: Option<f64>,
    pub vc: Option<f64>,
    pub tb: Option<f64>,
    pub tf: Option<f64>,
    pub hform: Option<f64>,
    pub gform: Option<f64>,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub d: Option<f64>,
    pub hfusion: Option<f64>,
    pub hvap: Option<f64>,
    pub na: Option<f64>,
    pub nb: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobackOptions {
    /// Experimental normal boiling point, K. Replaces the estimated one in
    /// the critical temperature and everything derived from it.
    pub normal_boiling_point: Option<f64>,
    /// Evaluate the temperature-dependent properties at this temperature, K.
    pub temperature: Option<f64>,
}

/// Temperature-dependent estimates at one temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureProperties {
    pub temperature: f64,
    pub heat_capacity_ideal_gas: Option<f64>,
    pub heat_capacity_liquid: Option<f64>,
    pub viscosity_liquid: Option<f64>,
    pub vapor_pressure: Option<f64>,
}

/// Joback estimates for one group multiset.
///
/// A property is `None` when a group in the multiset lacks a contribution
/// it depends on; other properties are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobackProperties {
    pub groups: BTreeMap<String, u32>,
    pub molecular_weight: f64,
    pub normal_boiling_point: Option<f64>,
    pub experimental_boiling_point: Option<f64>,
    pub fusion_temperature: Option<f64>,
    pub critical_temperature: Option<f64>,
    pub critical_pressure: Option<f64>,
    pub critical_volume: Option<f64>,
    pub enthalpy_formation: Option<f64>,
    pub gibbs_formation: Option<f64>,
    pub enthalpy_vaporization: Option<f64>,
    pub enthalpy_fusion: Option<f64>,
    /// `[a, b, c, d]` of `Cp = a + bT + cT² + dT³`.
    pub heat_capacity_coefficients: Option<[f64; 4]>,
    /// `(Σ na, Σ nb)` of the liquid viscosity correlation.
    pub viscosity_sums: Option<(f64, f64)>,
    pub acentric_factor: Option<f64>,
    /// `(G, k)` of the Riedel-Plank-Miller vapor pressure equation.
    pub vapor_pressure_params: Option<(f64, f64)>,
    pub at_temperature: Option<TemperatureProperties>,
}

impl JobackProperties {
    pub fn heat_capacity_ideal_gas(&self, t: f64) -> Option<f64> {
        let [a, b, c, d] = self.heat_capacity_coefficients?;
        Some(a + b * t + c * t.powi(2) + d * t.powi(3))
    }

    /// Rowlinson-Bondi.
    pub fn heat_capacity_liquid(&self, t: f64) -> Option<f64> {
        let tr = t / self.critical_temperature?;
        let w = self.acentric_factor?;
        let cp0 = self.heat_capacity_ideal_gas(t)?;
        Some(
            cp0 + R
                * (2.56
                    + 0.436 / (1.0 - tr)
                    + w * (2.91 + 4.28 * (1.0 - tr).powf(-1.0 / 3.0) / tr + 0.296 / (1.0 - tr))),
        )
    }

    pub fn viscosity_liquid(&self, t: f64) -> Option<f64> {
        let (na, nb) = self.viscosity_sums?;
        Some(self.molecular_weight * ((na - 597.82) / t + nb - 11.202).exp())
    }

    /// Riedel-Plank-Miller, bar.
    pub fn vapor_pressure(&self, t: f64) -> Option<f64> {
        let tr = t / self.critical_temperature?;
        let (g, k) = self.vapor_pressure_params?;
        let reduced = (-g / tr * (1.0 - tr.powi(2) + k * (3.0 + tr) * (1.0 - tr).powi(3))).exp();
        Some(reduced * self.critical_pressure?)
    }

    pub fn at(&self, t: f64) -> TemperatureProperties {
        TemperatureProperties {
            temperature: t,
            heat_capacity_ideal_gas: self.heat_capacity_ideal_gas(t),
            heat_capacity_liquid: self.heat_capacity_liquid(t),
            viscosity_liquid: self.viscosity_liquid(t),
            vapor_pressure: self.vapor_pressure(t),
        }
    }
}

/// Joback estimator bound to a Joback catalog.
#[derive(Debug, Clone)]
pub struct Joback<'a> {
    catalog: &'a Catalog,
    rows: HashMap<String, JobackContribution>,
}

impl<'a> Joback<'a> {
    /// Uses the packaged contribution table.
    pub fn new(catalog: &'a Catalog) -> Result<Self, PropertyError> {
        Self::with_table(catalog, include_str!("data/joback_contributions.json"))
    }

    pub fn with_table(catalog: &'a Catalog, json: &str) -> Result<Self, PropertyError> {
        if catalog.model() != Model::Joback {
            return Err(PropertyError::WrongModel {
                expected: Model::Joback.to_string(),
                found: catalog.model().to_string(),
            });
        }
        let table: Vec<JobackContribution> = serde_json::from_str(json)?;
        let rows: HashMap<String, JobackContribution> =
            table.into_iter().map(|row| (row.group.clone(), row)).collect();
        if let Some(missing) = catalog.groups().iter().find(|g| !rows.contains_key(&g.name)) {
            return Err(PropertyError::MissingContribution(missing.name.clone()));
        }
        Ok(Self { catalog, rows })
    }

    pub fn contribution(&self, group: &str) -> Option<&JobackContribution> {
        self.rows.get(group)
    }

    pub fn estimate(
        &self,
        groups: &BTreeMap<String, u32>,
        options: &JobackOptions,
    ) -> Result<JobackProperties, PropertyError> {
        let mut used = Vec::new();
        for (name, &n) in groups.iter().filter(|(_, &n)| n > 0) {
            let group = self
                .catalog
                .group_by_name(name)
                .ok_or_else(|| PropertyError::UnknownGroup(name.clone()))?;
            let row = self
                .rows
                .get(name)
                .ok_or_else(|| PropertyError::MissingContribution(name.clone()))?;
            used.push((f64::from(n), group, row));
        }
        if used.is_empty() {
            return Err(PropertyError::NoGroups);
        }

        let sum = |column: fn(&JobackContribution) -> Option<f64>| -> Option<f64> {
            used.iter().map(|(n, _, row)| column(row).map(|v| n * v)).sum()
        };

        let molecular_weight: f64 = used.iter().map(|(n, g, _)| n * g.weight).sum();
        let atoms: f64 = used.iter().map(|(n, g, _)| n * f64::from(g.atom_total())).sum();

        let normal_boiling_point = sum(|r| r.tb).map(|s| 198.2 + s);
        let tb = options.normal_boiling_point.or(normal_boiling_point);
        let critical_temperature = tb.zip(sum(|r| r.tc)).map(|(tb, s)| tb / (0.584 + 0.965 * s - s * s));
        let critical_pressure = sum(|r| r.pc).map(|s| (0.113 + 0.0032 * atoms - s).powi(-2));

        let heat_capacity_coefficients = match (sum(|r| r.a), sum(|r| r.b), sum(|r| r.c), sum(|r| r.d)) {
            (Some(a), Some(b), Some(c), Some(d)) => Some([a - 37.93, b + 0.21, c - 3.91e-4, d + 2.06e-7]),
            _ => None,
        };

        let (acentric_factor, vapor_pressure_params) = match (tb, critical_temperature, critical_pressure) {
            (Some(tb), Some(tc), Some(pc)) => {
                let t_br = tb / tc;
                let w = (-pc.ln() - 5.92714 + 6.09648 / t_br + 1.28862 * t_br.ln()
                    - 0.169347 * t_br.powi(6))
                    / (15.2518 - 15.6875 / t_br - 13.4721 * t_br.ln() + 0.43577 * t_br.powi(6));
                let h = t_br * (pc / 1.01325).ln() / (1.0 - t_br);
                let g = 0.4835 + 0.4605 * h;
                let k = (h / g - (1.0 + t_br)) / ((3.0 + t_br) * (1.0 - t_br).powi(2));
                (Some(w), Some((g, k)))
            }
            _ => (None, None),
        };

        let mut properties = JobackProperties {
            groups: groups.clone(),
            molecular_weight,
            normal_boiling_point,
            experimental_boiling_point: options.normal_boiling_point,
            fusion_temperature: sum(|r| r.tf).map(|s| 122.5 + s),
            critical_temperature,
            critical_pressure,
            critical_volume: sum(|r| r.vc).map(|s| 17.5 + s),
            enthalpy_formation: sum(|r| r.hform).map(|s| 68.29 + s),
            gibbs_formation: sum(|r| r.gform).map(|s| 53.88 + s),
            enthalpy_vaporization: sum(|r| r.hvap).map(|s| 15.30 + s),
            enthalpy_fusion: sum(|r| r.hfusion).map(|s| -0.88 + s),
            heat_capacity_coefficients,
            viscosity_sums: sum(|r| r.na).zip(sum(|r| r.nb)),
            acentric_factor,
            vapor_pressure_params,
            at_temperature: None,
        };
        properties.at_temperature = options.temperature.map(|t| properties.at(t));
        debug!(groups = used.len(), tb = ?properties.normal_boiling_point, "joback estimate");
        Ok(properties)
    }
}
