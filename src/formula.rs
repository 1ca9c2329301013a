//! Molecular formula and molecular weight calculations.
//!
//! [`mol_formula`] produces a Hill system string and [`average_mol_weight`]
//! the average molecular weight in g/mol. Group formulas such as `"CH2Cl2"`
//! or `"C4H3S"` are parsed by [`parse_formula`] so that a group's weight and
//! atom totals come from the same element table as the molecule's.

use std::collections::BTreeMap;
use std::fmt::Write;

use thiserror::Error;

use crate::element::Element;
use crate::mol::Mol;
use crate::traits::{HasAtomicNum, HasFormalCharge, HasHydrogenCount};

/// Element multiset, iterated in atomic-number order.
pub type Composition = BTreeMap<Element, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,
    #[error("unknown element '{symbol}' in formula '{formula}'")]
    UnknownElement { formula: String, symbol: String },
    #[error("unexpected character '{ch}' in formula '{formula}'")]
    UnexpectedChar { formula: String, ch: char },
}

/// Average molecular weight including the hydrogens folded into each atom.
/// Atoms outside the element table contribute nothing.
pub fn average_mol_weight<A: HasAtomicNum + HasHydrogenCount, B>(mol: &Mol<A, B>) -> f64 {
    let h_weight = Element::H.atomic_weight();
    mol.atoms().fold(0.0, |acc, idx| {
        let a = mol.atom(idx);
        let mass = Element::from_atomic_num(a.atomic_num()).map_or(0.0, Element::atomic_weight);
        acc + mass + f64::from(a.hydrogen_count()) * h_weight
    })
}

/// Element counts of a molecule, hydrogens included.
pub fn composition<A: HasAtomicNum + HasHydrogenCount, B>(mol: &Mol<A, B>) -> Composition {
    let mut counts = Composition::new();
    for idx in mol.atoms() {
        let a = mol.atom(idx);
        if let Some(elem) = Element::from_atomic_num(a.atomic_num()) {
            *counts.entry(elem).or_default() += 1;
        }
        if a.hydrogen_count() > 0 {
            *counts.entry(Element::H).or_default() += u32::from(a.hydrogen_count());
        }
    }
    counts
}

/// Hill system formula: C first, then H, then the rest alphabetically.
/// Without carbon every element is alphabetical. Net charge is appended as
/// `+`, `2+`, `-`, `2-`.
pub fn mol_formula<A: HasAtomicNum + HasHydrogenCount + HasFormalCharge, B>(
    mol: &Mol<A, B>,
) -> String {
    let net_charge: i32 = mol
        .atoms()
        .map(|idx| i32::from(mol.atom(idx).formal_charge()))
        .sum();
    let mut result = hill_string(&composition(mol));

    match net_charge {
        0 => {}
        1 => result.push('+'),
        -1 => result.push('-'),
        n if n > 1 => {
            let _ = write!(result, "{n}+");
        }
        n => {
            let _ = write!(result, "{}-", n.unsigned_abs());
        }
    }
    result
}

/// Hill string of an element multiset.
pub fn hill_string(counts: &Composition) -> String {
    let mut by_symbol: BTreeMap<&'static str, u32> =
        counts.iter().map(|(e, &n)| (e.symbol(), n)).collect();
    let mut result = String::new();

    if let Some(c) = by_symbol.remove("C") {
        append_element(&mut result, "C", c);
        if let Some(h) = by_symbol.remove("H") {
            append_element(&mut result, "H", h);
        }
    }
    for (sym, count) in &by_symbol {
        append_element(&mut result, sym, *count);
    }
    result
}

fn append_element(buf: &mut String, symbol: &str, count: u32) {
    if count == 0 {
        return;
    }
    buf.push_str(symbol);
    if count > 1 {
        let _ = write!(buf, "{count}");
    }
}

/// Parses a plain formula: element symbols each followed by an optional
/// count, e.g. `"CH3"`, `"C5H3N"`, `"SiH2O"`, `"CCl4"`.
pub fn parse_formula(formula: &str) -> Result<Composition, FormulaError> {
    let chars: Vec<char> = formula.trim().chars().collect();
    if chars.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut counts = Composition::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if !ch.is_ascii_uppercase() {
            return Err(FormulaError::UnexpectedChar {
                formula: formula.to_string(),
                ch,
            });
        }
        let mut symbol = ch.to_string();
        i += 1;
        if let Some(&next) = chars.get(i).filter(|c| c.is_ascii_lowercase()) {
            symbol.push(next);
            i += 1;
        }
        let element = Element::from_symbol(&symbol).ok_or_else(|| FormulaError::UnknownElement {
            formula: formula.to_string(),
            symbol: symbol.clone(),
        })?;

        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        let count = if i == start {
            1
        } else {
            chars[start..i]
                .iter()
                .fold(0u32, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0))
        };
        *counts.entry(element).or_default() += count;
    }
    Ok(counts)
}

/// Weight of an element multiset.
pub fn composition_weight(counts: &Composition) -> f64 {
    counts
        .iter()
        .map(|(e, &n)| e.atomic_weight() * f64::from(n))
        .sum()
}
