//! Group catalogs: the immutable tables of named functional groups a
//! molecule is fragmented into.
//!
//! A [`Catalog`] is built once from a JSON table (the four packaged models
//! are embedded in the binary) and then shared by reference. Loading
//! compiles every SMARTS alternative and parses every group formula, so all
//! data defects surface here as [`CatalogError`] rather than per molecule.
//!
//! Declaration order in the table is significant: it breaks priority ties
//! between equally sized candidates during overlap resolution.

mod error;

pub use error::CatalogError;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::formula::{composition_weight, hill_string, parse_formula, Composition};
use crate::smarts::{from_smarts, QueryMol, SmartsError};

/// Index of a group inside its catalog.
pub type GroupId = usize;

/// The group-contribution models shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    Unifac,
    Psrk,
    ConstantinouGani,
    Joback,
}

impl Model {
    pub const ALL: [Model; 4] = [
        Model::Unifac,
        Model::Psrk,
        Model::ConstantinouGani,
        Model::Joback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Model::Unifac => "unifac",
            Model::Psrk => "psrk",
            Model::ConstantinouGani => "constantinou_gani",
            Model::Joback => "joback",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Model::Unifac => include_str!("data/unifac.json"),
            Model::Psrk => include_str!("data/psrk.json"),
            Model::ConstantinouGani => include_str!("data/constantinou_gani.json"),
            Model::Joback => include_str!("data/joback.json"),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compiled SMARTS alternative.
#[derive(Debug, Clone)]
pub struct Pattern {
    smarts: String,
    query: QueryMol,
}

impl Pattern {
    pub fn parse(smarts: &str) -> Result<Self, SmartsError> {
        Ok(Self {
            smarts: smarts.to_string(),
            query: from_smarts(smarts)?,
        })
    }

    pub fn smarts(&self) -> &str {
        &self.smarts
    }

    pub fn query(&self) -> &QueryMol {
        &self.query
    }

    /// Heavy atoms one match of this pattern covers.
    pub fn atom_count(&self) -> usize {
        self.query.atom_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainGroup {
    pub name: String,
    pub number: u32,
    /// Families whose candidates are dropped at detection time when they lie
    /// entirely inside a candidate of this family.
    pub excludes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GroupDefinition {
    pub name: String,
    pub subgroup: u32,
    pub main_group: String,
    pub patterns: Vec<Pattern>,
    /// Element counts, hydrogens included.
    pub formula: Composition,
    /// g/mol, derived from `formula`.
    pub weight: f64,
    /// UNIFAC van der Waals volume.
    pub r: Option<f64>,
    /// UNIFAC van der Waals surface area.
    pub q: Option<f64>,
}

impl GroupDefinition {
    /// Heavy-atom counts a single occurrence of this group may cover.
    pub fn valid_sizes(&self) -> BTreeSet<usize> {
        self.patterns.iter().map(Pattern::atom_count).collect()
    }

    pub fn is_valid_size(&self, size: usize) -> bool {
        self.patterns.iter().any(|p| p.atom_count() == size)
    }

    pub fn max_size(&self) -> usize {
        self.patterns.iter().map(Pattern::atom_count).max().unwrap_or(0)
    }

    /// Atoms the group contributes including hydrogens.
    pub fn atom_total(&self) -> u32 {
        self.formula.values().sum()
    }

    pub fn hill_formula(&self) -> String {
        hill_string(&self.formula)
    }
}

/// A group defined as the sum of simpler groups that overlap it by design,
/// e.g. `ACCH3 = AC + CH3`.
#[derive(Debug, Clone)]
pub struct ComposedRule {
    pub group: GroupId,
    pub constituents: Vec<(GroupId, u32)>,
    /// Extra substructure that must be present before the rule applies.
    pub trigger: Option<Pattern>,
}

/// A structure the generic pipeline is known to miscount, with the
/// correction to apply to the resolved counts.
#[derive(Debug, Clone)]
pub struct ProblematicRule {
    pub name: String,
    pub trigger: Pattern,
    pub delta: Vec<(GroupId, i32)>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    model: Model,
    main_groups: Vec<RawMainGroup>,
    groups: Vec<RawGroup>,
    #[serde(default)]
    composed: Vec<RawComposed>,
    #[serde(default)]
    problematics: Vec<RawProblematic>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMainGroup {
    name: String,
    number: u32,
    #[serde(default)]
    excludes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroup {
    name: String,
    subgroup: u32,
    main_group: String,
    smarts: Vec<String>,
    formula: String,
    #[serde(default)]
    r: Option<f64>,
    #[serde(default)]
    q: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawComposed {
    name: String,
    constituents: BTreeMap<String, u32>,
    #[serde(default)]
    trigger: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProblematic {
    name: String,
    smarts: String,
    delta: BTreeMap<String, i32>,
}

/// Immutable group table for one model.
#[derive(Debug, Clone)]
pub struct Catalog {
    model: Model,
    main_groups: Vec<MainGroup>,
    groups: Vec<GroupDefinition>,
    by_name: HashMap<String, GroupId>,
    composed: Vec<ComposedRule>,
    problematics: Vec<ProblematicRule>,
    elements: BTreeSet<Element>,
}

impl Catalog {
    /// Loads one of the packaged tables.
    pub fn load(model: Model) -> Result<Self, CatalogError> {
        let catalog = Self::from_json(model.table())?;
        if catalog.model != model {
            return Err(CatalogError::ModelMismatch {
                expected: model.to_string(),
                found: catalog.model.to_string(),
            });
        }
        Ok(catalog)
    }

    /// Builds a catalog from a caller-supplied table in the packaged format.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::build(raw)
    }

    fn build(raw: RawCatalog) -> Result<Self, CatalogError> {
        let mut main_groups = Vec::with_capacity(raw.main_groups.len());
        let mut main_names = BTreeSet::new();
        for mg in raw.main_groups {
            if !main_names.insert(mg.name.clone()) {
                return Err(CatalogError::DuplicateMainGroup(mg.name));
            }
            main_groups.push(MainGroup {
                name: mg.name,
                number: mg.number,
                excludes: mg.excludes,
            });
        }
        for mg in &main_groups {
            if let Some(missing) = mg.excludes.iter().find(|e| !main_names.contains(*e)) {
                return Err(CatalogError::UnknownMainGroup {
                    context: format!("main group '{}'", mg.name),
                    name: missing.clone(),
                });
            }
        }

        let mut groups = Vec::with_capacity(raw.groups.len());
        let mut by_name = HashMap::with_capacity(raw.groups.len());
        let mut elements = BTreeSet::new();
        for g in raw.groups {
            if by_name.contains_key(&g.name) {
                return Err(CatalogError::DuplicateGroup(g.name));
            }
            if !main_names.contains(&g.main_group) {
                return Err(CatalogError::UnknownMainGroup {
                    context: format!("group '{}'", g.name),
                    name: g.main_group,
                });
            }
            if g.smarts.is_empty() {
                return Err(CatalogError::NoPatterns(g.name));
            }
            let patterns = g
                .smarts
                .iter()
                .map(|s| {
                    Pattern::parse(s).map_err(|source| CatalogError::Smarts {
                        group: g.name.clone(),
                        smarts: s.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let formula = parse_formula(&g.formula).map_err(|source| CatalogError::Formula {
                group: g.name.clone(),
                source,
            })?;
            elements.extend(formula.keys().copied());

            by_name.insert(g.name.clone(), groups.len());
            groups.push(GroupDefinition {
                weight: composition_weight(&formula),
                name: g.name,
                subgroup: g.subgroup,
                main_group: g.main_group,
                patterns,
                formula,
                r: g.r,
                q: g.q,
            });
        }

        let lookup = |context: &str, name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| CatalogError::UnknownGroup {
                    context: context.to_string(),
                    name: name.to_string(),
                })
        };

        let mut composed = Vec::with_capacity(raw.composed.len());
        for rule in raw.composed {
            let context = format!("composed rule '{}'", rule.name);
            let group = lookup(&context, &rule.name)?;
            let constituents = rule
                .constituents
                .iter()
                .map(|(name, &n)| Ok((lookup(&context, name)?, n)))
                .collect::<Result<Vec<_>, CatalogError>>()?;

            let mut sum = Composition::new();
            for &(id, n) in &constituents {
                for (&elem, &count) in &groups[id].formula {
                    *sum.entry(elem).or_default() += count * n;
                }
            }
            if sum != groups[group].formula {
                return Err(CatalogError::ComposedFormula {
                    group: rule.name,
                    expected: groups[group].hill_formula(),
                    found: hill_string(&sum),
                });
            }

            let trigger = rule
                .trigger
                .as_deref()
                .map(|s| {
                    Pattern::parse(s).map_err(|source| CatalogError::Smarts {
                        group: rule.name.clone(),
                        smarts: s.to_string(),
                        source,
                    })
                })
                .transpose()?;
            composed.push(ComposedRule {
                group,
                constituents,
                trigger,
            });
        }

        let mut problematics = Vec::with_capacity(raw.problematics.len());
        for rule in raw.problematics {
            let context = format!("problematic rule '{}'", rule.name);
            let delta = rule
                .delta
                .iter()
                .map(|(name, &d)| Ok((lookup(&context, name)?, d)))
                .collect::<Result<Vec<_>, CatalogError>>()?;
            let trigger = Pattern::parse(&rule.smarts).map_err(|source| CatalogError::Smarts {
                group: rule.name.clone(),
                smarts: rule.smarts.clone(),
                source,
            })?;
            problematics.push(ProblematicRule {
                name: rule.name,
                trigger,
                delta,
            });
        }

        Ok(Self {
            model: raw.model,
            main_groups,
            groups,
            by_name,
            composed,
            problematics,
            elements,
        })
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Groups in declaration order; a group's position is its [`GroupId`].
    pub fn groups(&self) -> &[GroupDefinition] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> &GroupDefinition {
        &self.groups[id]
    }

    pub fn id_of(&self, name: &str) -> Option<GroupId> {
        self.by_name.get(name).copied()
    }

    pub fn group_by_name(&self, name: &str) -> Option<&GroupDefinition> {
        self.id_of(name).map(|id| &self.groups[id])
    }

    pub fn main_groups(&self) -> &[MainGroup] {
        &self.main_groups
    }

    pub fn main_group(&self, name: &str) -> Option<&MainGroup> {
        self.main_groups.iter().find(|mg| mg.name == name)
    }

    pub fn composed(&self) -> &[ComposedRule] {
        &self.composed
    }

    /// The composed rule defining `group`, if it is a composed group.
    pub fn composed_rule(&self, group: GroupId) -> Option<&ComposedRule> {
        self.composed.iter().find(|rule| rule.group == group)
    }

    pub fn is_composed(&self, group: GroupId) -> bool {
        self.composed_rule(group).is_some()
    }

    pub fn problematics(&self) -> &[ProblematicRule] {
        &self.problematics
    }

    pub fn problematic(&self, name: &str) -> Option<&ProblematicRule> {
        self.problematics.iter().find(|rule| rule.name == name)
    }

    /// Elements that at least one group formula contains.
    pub fn covers_element(&self, element: Element) -> bool {
        self.elements.contains(&element)
    }
}
