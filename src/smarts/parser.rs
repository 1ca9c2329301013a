use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;

use crate::element::Element;
use crate::mol::Mol;

use super::error::SmartsError;
use super::query::{AtomExpr, BondExpr};

/// Elements that may appear outside brackets, two-letter symbols first.
const ORGANIC_SUBSET: [(&str, u8); 10] = [
    ("Cl", 17),
    ("Br", 35),
    ("B", 5),
    ("C", 6),
    ("N", 7),
    ("O", 8),
    ("P", 15),
    ("S", 16),
    ("F", 9),
    ("I", 53),
];

const AROMATIC_SYMBOLS: [(&str, u8); 7] = [
    ("se", 34),
    ("as", 33),
    ("c", 6),
    ("n", 7),
    ("o", 8),
    ("s", 16),
    ("p", 15),
];

pub fn parse(input: &str) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SmartsError::EmptyInput);
    }
    Parser::new(trimmed).parse_smarts()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn parse_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok()
    }

    fn parse_count(&mut self, default: u8) -> u8 {
        self.parse_number()
            .map_or(default, |n| u8::try_from(n).unwrap_or(u8::MAX))
    }

    fn parse_smarts(&mut self) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
        let mut mol = Mol::new();
        let mut branches: Vec<(NodeIndex, usize)> = Vec::new();
        let mut current: Option<NodeIndex> = None;
        let mut pending_bond: Option<BondExpr> = None;
        let mut open_rings: BTreeMap<u16, (NodeIndex, Option<BondExpr>)> = BTreeMap::new();

        while let Some(ch) = self.peek() {
            match ch {
                '(' => {
                    let cur = current.ok_or(SmartsError::UnmatchedParen { pos: self.pos })?;
                    branches.push((cur, self.pos));
                    self.pos += 1;
                }
                ')' => {
                    if pending_bond.is_some() {
                        return Err(SmartsError::InvalidSmarts {
                            pos: self.pos,
                            msg: "bond without a following atom".into(),
                        });
                    }
                    let (anchor, _) = branches
                        .pop()
                        .ok_or(SmartsError::UnmatchedParen { pos: self.pos })?;
                    current = Some(anchor);
                    self.pos += 1;
                }
                '.' => {
                    self.pos += 1;
                    current = None;
                    pending_bond = None;
                }
                c if is_bond_start(c) => {
                    if pending_bond.is_some() || current.is_none() {
                        return Err(SmartsError::InvalidSmarts {
                            pos: self.pos,
                            msg: "bond without a preceding atom".into(),
                        });
                    }
                    pending_bond = Some(self.parse_bond_expr()?);
                }
                '0'..='9' | '%' => {
                    let pos = self.pos;
                    let digit = self.parse_ring_closure()?;
                    let cur = current.ok_or(SmartsError::InvalidSmarts {
                        pos,
                        msg: "ring closure without preceding atom".into(),
                    })?;
                    let bond = pending_bond.take();
                    match open_rings.remove(&digit) {
                        Some((other, opened_with)) => {
                            let bond = bond.or(opened_with).unwrap_or(BondExpr::SingleOrAromatic);
                            mol.add_bond(other, cur, bond);
                        }
                        None => {
                            open_rings.insert(digit, (cur, bond));
                        }
                    }
                }
                _ => {
                    let expr = if ch == '[' {
                        self.parse_bracket_atom()?
                    } else {
                        self.parse_bare_atom()?
                    };
                    let idx = mol.add_atom(expr);
                    if let Some(prev) = current {
                        let bond = pending_bond.take().unwrap_or(BondExpr::SingleOrAromatic);
                        mol.add_bond(prev, idx, bond);
                    }
                    current = Some(idx);
                }
            }
        }

        if pending_bond.is_some() {
            return Err(SmartsError::InvalidSmarts {
                pos: self.pos,
                msg: "bond without a following atom".into(),
            });
        }
        if let Some(&(_, pos)) = branches.last() {
            return Err(SmartsError::UnmatchedParen { pos });
        }
        if let Some(&digit) = open_rings.keys().next() {
            return Err(SmartsError::UnclosedRing { digit });
        }

        Ok(mol)
    }

    fn parse_ring_closure(&mut self) -> Result<u16, SmartsError> {
        let start = self.pos;
        if self.peek() == Some('%') {
            self.pos += 1;
            match (self.peek(), self.peek_at(1)) {
                (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
                    self.pos += 2;
                    Ok((a as u16 - '0' as u16) * 10 + (b as u16 - '0' as u16))
                }
                _ => Err(SmartsError::InvalidSmarts {
                    pos: start,
                    msg: "expected two digits after %".into(),
                }),
            }
        } else {
            let d = self.peek().and_then(|c| c.to_digit(10)).unwrap_or(0) as u16;
            self.pos += 1;
            Ok(d)
        }
    }

    // ---- bonds: `;` binds loosest, then `,`, then `&`/juxtaposition, then `!`

    fn parse_bond_expr(&mut self) -> Result<BondExpr, SmartsError> {
        let mut parts = vec![self.parse_bond_or()?];
        while self.peek() == Some(';') {
            self.pos += 1;
            parts.push(self.parse_bond_or()?);
        }
        Ok(bond_and(parts))
    }

    fn parse_bond_or(&mut self) -> Result<BondExpr, SmartsError> {
        let mut parts = vec![self.parse_bond_and()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            parts.push(self.parse_bond_and()?);
        }
        Ok(if parts.len() == 1 {
            bond_and(parts)
        } else {
            BondExpr::Or(parts)
        })
    }

    fn parse_bond_and(&mut self) -> Result<BondExpr, SmartsError> {
        let mut parts = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == '&' {
                self.pos += 1;
            } else if is_bond_start(ch) {
                parts.push(self.parse_bond_not()?);
            } else {
                break;
            }
        }
        if parts.is_empty() {
            return Err(SmartsError::InvalidSmarts {
                pos: self.pos,
                msg: "expected bond primitive".into(),
            });
        }
        Ok(bond_and(parts))
    }

    fn parse_bond_not(&mut self) -> Result<BondExpr, SmartsError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            return Ok(BondExpr::Not(Box::new(self.parse_bond_not()?)));
        }
        let pos = self.pos;
        let ch = self.peek().ok_or(SmartsError::InvalidSmarts {
            pos,
            msg: "expected bond primitive".into(),
        })?;
        self.pos += 1;
        match ch {
            '-' | '/' | '\\' => Ok(BondExpr::Single),
            '=' => Ok(BondExpr::Double),
            '#' => Ok(BondExpr::Triple),
            '~' => Ok(BondExpr::True),
            ':' => Ok(BondExpr::Aromatic),
            '@' => Ok(BondExpr::Ring),
            _ => Err(SmartsError::UnexpectedChar { pos, ch }),
        }
    }

    // ---- atoms

    fn parse_bare_atom(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        let ch = self.peek().ok_or(SmartsError::InvalidSmarts {
            pos: start,
            msg: "expected atom".into(),
        })?;

        match ch {
            '*' => {
                self.pos += 1;
                return Ok(AtomExpr::True);
            }
            'a' if self.peek_at(1) != Some('s') => {
                self.pos += 1;
                return Ok(AtomExpr::Aromatic);
            }
            'A' => {
                self.pos += 1;
                return Ok(AtomExpr::Aliphatic);
            }
            _ => {}
        }

        for (sym, num) in ORGANIC_SUBSET {
            if self.matches_str(sym) {
                self.pos += sym.len();
                return Ok(element(num, Some(false)));
            }
        }
        for (sym, num) in AROMATIC_SYMBOLS {
            if self.matches_str(sym) {
                self.pos += sym.len();
                return Ok(element(num, Some(true)));
            }
        }

        Err(SmartsError::UnexpectedChar { pos: start, ch })
    }

    fn parse_bracket_atom(&mut self) -> Result<AtomExpr, SmartsError> {
        let bracket_start = self.pos;
        self.pos += 1;

        let expr = self.parse_semicolon_expr()?;

        if self.peek() != Some(']') {
            return Err(SmartsError::UnclosedBracket { pos: bracket_start });
        }
        self.pos += 1;

        Ok(expr)
    }

    fn parse_semicolon_expr(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut parts = vec![self.parse_comma_expr()?];
        while self.peek() == Some(';') {
            self.pos += 1;
            parts.push(self.parse_comma_expr()?);
        }
        Ok(flatten_and(parts))
    }

    fn parse_comma_expr(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut parts = vec![self.parse_high_and_expr()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            parts.push(self.parse_high_and_expr()?);
        }
        Ok(flatten_or(parts))
    }

    fn parse_high_and_expr(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut parts = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                ']' | ',' | ';' => break,
                '&' => self.pos += 1,
                _ => parts.push(self.parse_not_expr()?),
            }
        }
        if parts.is_empty() {
            Ok(AtomExpr::True)
        } else {
            Ok(flatten_and(parts))
        }
    }

    fn parse_not_expr(&mut self) -> Result<AtomExpr, SmartsError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            let inner = self.parse_not_expr()?;
            Ok(AtomExpr::Not(Box::new(inner)))
        } else {
            self.parse_primitive()
        }
    }

    fn parse_primitive(&mut self) -> Result<AtomExpr, SmartsError> {
        let ch = self.peek().ok_or(SmartsError::InvalidSmarts {
            pos: self.pos,
            msg: "expected atom primitive".into(),
        })?;

        match ch {
            '*' => {
                self.pos += 1;
                Ok(AtomExpr::True)
            }
            'A' if !self.peek_at(1).is_some_and(|c| c.is_ascii_lowercase()) => {
                self.pos += 1;
                Ok(AtomExpr::Aliphatic)
            }
            'a' if !matches!(self.peek_at(1), Some('s')) => {
                self.pos += 1;
                Ok(AtomExpr::Aromatic)
            }
            '#' => {
                self.pos += 1;
                let num = self
                    .parse_number()
                    .filter(|n| (1..=118).contains(n))
                    .ok_or(SmartsError::InvalidAtomicNum { pos: self.pos })?;
                Ok(element(num as u8, None))
            }
            'D' => {
                self.pos += 1;
                Ok(AtomExpr::Degree(self.parse_count(1)))
            }
            'X' => {
                self.pos += 1;
                Ok(AtomExpr::Connectivity(self.parse_count(1)))
            }
            'H' if self.is_hydrogen_element() => {
                self.pos += 1;
                Ok(element(1, Some(false)))
            }
            'H' => {
                self.pos += 1;
                Ok(AtomExpr::TotalHCount(self.parse_count(1)))
            }
            'h' => {
                self.pos += 1;
                Ok(AtomExpr::ImplicitHCount(self.parse_count(1)))
            }
            'R' => {
                self.pos += 1;
                Ok(match self.parse_number() {
                    Some(0) => AtomExpr::NotInRing,
                    Some(n) => AtomExpr::RingMembership(u8::try_from(n).unwrap_or(u8::MAX)),
                    None => AtomExpr::InRing,
                })
            }
            'r' => {
                self.pos += 1;
                Ok(match self.parse_number() {
                    Some(0) => AtomExpr::NotInRing,
                    Some(n) => AtomExpr::SmallestRingSize(u8::try_from(n).unwrap_or(u8::MAX)),
                    None => AtomExpr::InRing,
                })
            }
            'x' => {
                self.pos += 1;
                Ok(AtomExpr::RingBondCount(self.parse_count(1)))
            }
            '@' => {
                // chirality carries no meaning for a 2D heavy-atom graph
                self.pos += 1;
                while self.peek() == Some('@') {
                    self.pos += 1;
                }
                Ok(AtomExpr::True)
            }
            '+' | '-' => self.parse_charge(ch),
            ':' => {
                self.pos += 1;
                let class = self.parse_number().ok_or(SmartsError::InvalidSmarts {
                    pos: self.pos,
                    msg: "expected atom class number".into(),
                })?;
                Ok(AtomExpr::AtomMapClass(u16::try_from(class).unwrap_or(u16::MAX)))
            }
            '$' => self.parse_recursive(),
            _ if ch.is_ascii_digit() => {
                let n = self.parse_number().unwrap_or(0);
                Ok(AtomExpr::Isotope(u16::try_from(n).unwrap_or(u16::MAX)))
            }
            _ if ch.is_ascii_alphabetic() => self.parse_bracket_element(),
            _ => Err(SmartsError::UnexpectedChar { pos: self.pos, ch }),
        }
    }

    /// `+`, `++`, `+2`, `-`, `--`, `-2`.
    fn parse_charge(&mut self, sign: char) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        self.pos += 1;
        let mut magnitude: i32 = 1;
        if let Some(n) = self.parse_number() {
            magnitude = i32::try_from(n).unwrap_or(i32::MAX);
        } else {
            while self.peek() == Some(sign) {
                self.pos += 1;
                magnitude += 1;
            }
        }
        let value = if sign == '-' { -magnitude } else { magnitude };
        let charge = i8::try_from(value).map_err(|_| SmartsError::InvalidSmarts {
            pos: start,
            msg: "charge out of range".into(),
        })?;
        Ok(AtomExpr::Charge(charge))
    }

    fn parse_recursive(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        self.pos += 1;
        if self.peek() != Some('(') {
            return Err(SmartsError::UnclosedRecursive { pos: start });
        }
        self.pos += 1;
        let inner_start = self.pos;
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner: String = self.chars[inner_start..self.pos].iter().collect();
                        self.pos += 1;
                        return Ok(AtomExpr::Recursive(parse(&inner)?));
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(SmartsError::UnclosedRecursive { pos: start })
    }

    /// `[H]` alone, or `H` followed by a charge or isotope-free terminator,
    /// names the element rather than a hydrogen count.
    fn is_hydrogen_element(&self) -> bool {
        let at_bracket_start = self.pos > 0 && self.chars[self.pos - 1] == '[';
        at_bracket_start && matches!(self.peek_at(1), Some(']') | Some('+') | Some('-'))
    }

    fn parse_bracket_element(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Err(SmartsError::InvalidSmarts {
                pos: start,
                msg: "expected element".into(),
            });
        };

        if ch.is_ascii_lowercase() {
            for (sym, num) in AROMATIC_SYMBOLS {
                if self.matches_str(sym) {
                    self.pos += sym.len();
                    return Ok(element(num, Some(true)));
                }
            }
            return Err(SmartsError::UnexpectedChar { pos: start, ch });
        }

        if let Some(next) = self.peek_at(1).filter(|c| c.is_ascii_lowercase()) {
            let two: String = [ch, next].iter().collect();
            if let Some(elem) = Element::from_symbol(&two) {
                self.pos += 2;
                return Ok(element(elem.atomic_num(), Some(false)));
            }
        }
        if let Some(elem) = Element::from_symbol(&ch.to_string()) {
            self.pos += 1;
            return Ok(element(elem.atomic_num(), Some(false)));
        }

        Err(SmartsError::UnexpectedChar { pos: start, ch })
    }

    fn matches_str(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }
}

fn is_bond_start(ch: char) -> bool {
    matches!(ch, '-' | '=' | '#' | '~' | ':' | '@' | '!' | '/' | '\\')
}

fn element(atomic_num: u8, aromatic: Option<bool>) -> AtomExpr {
    AtomExpr::Element {
        atomic_num,
        aromatic,
    }
}

fn flatten_and(parts: Vec<AtomExpr>) -> AtomExpr {
    let mut flattened = Vec::new();
    for p in parts {
        match p {
            AtomExpr::And(inner) => flattened.extend(inner),
            other => flattened.push(other),
        }
    }
    if flattened.len() == 1 {
        if let Some(only) = flattened.pop() {
            return only;
        }
    }
    AtomExpr::And(flattened)
}

fn flatten_or(parts: Vec<AtomExpr>) -> AtomExpr {
    let mut flattened = Vec::new();
    for p in parts {
        match p {
            AtomExpr::Or(inner) => flattened.extend(inner),
            other => flattened.push(other),
        }
    }
    if flattened.len() == 1 {
        if let Some(only) = flattened.pop() {
            return only;
        }
    }
    AtomExpr::Or(flattened)
}

fn bond_and(mut parts: Vec<BondExpr>) -> BondExpr {
    if parts.len() == 1 {
        if let Some(only) = parts.pop() {
            return only;
        }
    }
    BondExpr::And(parts)
}
