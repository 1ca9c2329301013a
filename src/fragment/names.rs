use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

/// Turns a compound name into SMILES.
pub trait NameResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> NameResolver for F {
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Case-insensitive name to SMILES table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct NameTable {
    entries: HashMap<String, String>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, smiles: impl Into<String>) -> Option<String> {
        self.entries.insert(key(name), smiles.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NameResolver for NameTable {
    fn resolve(&self, name: &str) -> Option<String> {
        self.entries.get(&key(name)).cloned()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for NameTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, smiles) in iter {
            table.insert(name.as_ref(), smiles);
        }
        table
    }
}

impl From<BTreeMap<String, String>> for NameTable {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}
