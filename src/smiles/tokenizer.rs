use crate::element::Element;
use crate::smiles::error::SmilesError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    Bond { bond: BondToken, pos: usize },
    RingClosure {
        bond: Option<BondToken>,
        digit: u16,
        pos: usize,
    },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    /// `None` for the `*` wildcard.
    pub element: Option<Element>,
    pub is_aromatic: bool,
    pub isotope: u16,
    pub hcount: Option<u8>,
    pub charge: i8,
    pub is_bracket: bool,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondToken {
    Single,
    Double,
    Triple,
    Aromatic,
    /// `/` or `\`. Stereo is not kept; these read as single bonds.
    Directional,
}

// Two-letter symbols first so `Cl` is not read as `C` + `l`.
const ORGANIC_SUBSET: [(&str, Element, bool); 16] = [
    ("Cl", Element::Cl, false),
    ("Br", Element::Br, false),
    ("B", Element::B, false),
    ("C", Element::C, false),
    ("N", Element::N, false),
    ("O", Element::O, false),
    ("P", Element::P, false),
    ("S", Element::S, false),
    ("F", Element::F, false),
    ("I", Element::I, false),
    ("b", Element::B, true),
    ("c", Element::C, true),
    ("n", Element::N, true),
    ("o", Element::O, true),
    ("p", Element::P, true),
    ("s", Element::S, true),
];

const AROMATIC_BRACKET: [(&str, Element); 7] = [
    ("se", Element::Se),
    ("b", Element::B),
    ("c", Element::C),
    ("n", Element::N),
    ("o", Element::O),
    ("p", Element::P),
    ("s", Element::S),
];

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '[' => {
                let (tok, next) = parse_bracket_atom(&chars, i)?;
                tokens.push(Token::Atom(tok));
                i = next;
            }
            '*' => {
                tokens.push(Token::Atom(bare_atom(None, false, i)));
                i += 1;
            }
            '-' => {
                tokens.push(bond(BondToken::Single, i));
                i += 1;
            }
            '=' => {
                tokens.push(bond(BondToken::Double, i));
                i += 1;
            }
            '#' => {
                tokens.push(bond(BondToken::Triple, i));
                i += 1;
            }
            ':' => {
                tokens.push(bond(BondToken::Aromatic, i));
                i += 1;
            }
            '/' | '\\' => {
                tokens.push(bond(BondToken::Directional, i));
                i += 1;
            }
            '$' => {
                return Err(SmilesError::Unsupported {
                    pos: i,
                    feature: "quadruple bond",
                })
            }
            '(' => {
                tokens.push(Token::OpenParen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen(i));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot(i));
                i += 1;
            }
            '%' => {
                let digit = parse_percent_ring(&chars, i)?;
                let bond = take_pending_bond(&mut tokens);
                tokens.push(Token::RingClosure { bond, digit, pos: i });
                i += 3;
            }
            d @ '0'..='9' => {
                let bond = take_pending_bond(&mut tokens);
                tokens.push(Token::RingClosure {
                    bond,
                    digit: d as u16 - '0' as u16,
                    pos: i,
                });
                i += 1;
            }
            ch => {
                let (element, aromatic, len) = organic_atom(&chars, i)
                    .ok_or(SmilesError::UnexpectedChar { pos: i, ch })?;
                tokens.push(Token::Atom(bare_atom(Some(element), aromatic, i)));
                i += len;
            }
        }
    }

    Ok(tokens)
}

fn bond(bond: BondToken, pos: usize) -> Token {
    Token::Bond { bond, pos }
}

fn bare_atom(element: Option<Element>, aromatic: bool, pos: usize) -> AtomToken {
    AtomToken {
        element,
        is_aromatic: aromatic,
        isotope: 0,
        hcount: None,
        charge: 0,
        is_bracket: false,
        pos,
    }
}

fn organic_atom(chars: &[char], i: usize) -> Option<(Element, bool, usize)> {
    ORGANIC_SUBSET.iter().find_map(|&(sym, element, aromatic)| {
        starts_with(chars, i, sym).then_some((element, aromatic, sym.len()))
    })
}

fn starts_with(chars: &[char], i: usize, s: &str) -> bool {
    let mut k = i;
    for c in s.chars() {
        if chars.get(k) != Some(&c) {
            return false;
        }
        k += 1;
    }
    true
}

// A bond written just before a ring-closure digit belongs to the closure.
fn take_pending_bond(tokens: &mut Vec<Token>) -> Option<BondToken> {
    match tokens.last() {
        Some(Token::Bond { bond, .. }) => {
            let bond = *bond;
            tokens.pop();
            Some(bond)
        }
        _ => None,
    }
}

fn parse_percent_ring(chars: &[char], start: usize) -> Result<u16, SmilesError> {
    match (chars.get(start + 1), chars.get(start + 2)) {
        (Some(d1), Some(d2)) if d1.is_ascii_digit() && d2.is_ascii_digit() => {
            Ok((*d1 as u16 - '0' as u16) * 10 + (*d2 as u16 - '0' as u16))
        }
        _ => Err(SmilesError::UnexpectedChar {
            pos: start,
            ch: '%',
        }),
    }
}

fn parse_bracket_atom(chars: &[char], start: usize) -> Result<(AtomToken, usize), SmilesError> {
    let mut i = start + 1;

    let isotope = parse_digits(chars, &mut i).unwrap_or(0);
    let (element, is_aromatic) = parse_bracket_element(chars, &mut i, start)?;
    skip_chirality(chars, &mut i);
    let hcount = parse_hcount(chars, &mut i);
    let charge = parse_charge(chars, &mut i)?;
    if chars.get(i) == Some(&':') {
        i += 1;
        parse_digits(chars, &mut i);
    }

    if chars.get(i) != Some(&']') {
        return Err(SmilesError::UnclosedBracket { pos: start });
    }

    Ok((
        AtomToken {
            element,
            is_aromatic,
            isotope,
            hcount: Some(hcount.unwrap_or(0)),
            charge,
            is_bracket: true,
            pos: start,
        },
        i + 1,
    ))
}

fn parse_digits(chars: &[char], i: &mut usize) -> Option<u16> {
    let mut val: Option<u16> = None;
    while let Some(d) = chars.get(*i).and_then(|c| c.to_digit(10)) {
        val = Some(val.unwrap_or(0).saturating_mul(10).saturating_add(d as u16));
        *i += 1;
    }
    val
}

fn parse_bracket_element(
    chars: &[char],
    i: &mut usize,
    bracket_start: usize,
) -> Result<(Option<Element>, bool), SmilesError> {
    let Some(&first) = chars.get(*i) else {
        return Err(SmilesError::UnclosedBracket { pos: bracket_start });
    };

    if first == '*' {
        *i += 1;
        return Ok((None, false));
    }

    if first.is_ascii_lowercase() {
        for &(sym, element) in &AROMATIC_BRACKET {
            if starts_with(chars, *i, sym) {
                *i += sym.len();
                return Ok((Some(element), true));
            }
        }
    }

    if first.is_ascii_uppercase() {
        // nothing lowercase may follow a one-letter symbol inside brackets
        if let Some(&second) = chars.get(*i + 1).filter(|c| c.is_ascii_lowercase()) {
            let sym: String = [first, second].iter().collect();
            return match Element::from_symbol(&sym) {
                Some(e) => {
                    *i += 2;
                    Ok((Some(e), false))
                }
                None => Err(SmilesError::InvalidElement { pos: *i, text: sym }),
            };
        }
        if let Some(e) = Element::from_symbol(&first.to_string()) {
            *i += 1;
            return Ok((Some(e), false));
        }
    }

    Err(SmilesError::InvalidElement {
        pos: *i,
        text: first.to_string(),
    })
}

fn skip_chirality(chars: &[char], i: &mut usize) {
    while chars.get(*i) == Some(&'@') {
        *i += 1;
    }
}

fn parse_hcount(chars: &[char], i: &mut usize) -> Option<u8> {
    if chars.get(*i) != Some(&'H') {
        return None;
    }
    *i += 1;
    match chars.get(*i).and_then(|c| c.to_digit(10)) {
        Some(d) => {
            *i += 1;
            Some(d as u8)
        }
        None => Some(1),
    }
}

fn parse_charge(chars: &[char], i: &mut usize) -> Result<i8, SmilesError> {
    let sign: i8 = match chars.get(*i) {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Ok(0),
    };
    let sign_char = chars[*i];
    let start = *i;
    *i += 1;

    let mut magnitude: i8 = 1;
    while chars.get(*i) == Some(&sign_char) {
        magnitude = magnitude
            .checked_add(1)
            .ok_or(SmilesError::InvalidCharge { pos: start })?;
        *i += 1;
    }
    if magnitude == 1 {
        if let Some(n) = parse_digits(chars, i) {
            magnitude = i8::try_from(n).map_err(|_| SmilesError::InvalidCharge { pos: start })?;
        }
    }
    Ok(sign * magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(tok: &Token) -> &AtomToken {
        match tok {
            Token::Atom(a) => a,
            other => panic!("expected atom token, got {:?}", other),
        }
    }

    #[test]
    fn organic_subset_two_letter_symbols() {
        let tokens = tokenize("ClCBr").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(atom(&tokens[0]).element, Some(Element::Cl));
        assert_eq!(atom(&tokens[1]).element, Some(Element::C));
        assert_eq!(atom(&tokens[2]).element, Some(Element::Br));
    }

    #[test]
    fn aromatic_lowercase() {
        let tokens = tokenize("c1ccsc1").unwrap();
        let a = atom(&tokens[0]);
        assert!(a.is_aromatic);
        assert_eq!(a.element, Some(Element::C));
        assert!(matches!(tokens[1], Token::RingClosure { digit: 1, .. }));
    }

    #[test]
    fn bracket_atom_fields() {
        let tokens = tokenize("[13CH3+]").unwrap();
        let a = atom(&tokens[0]);
        assert_eq!(a.isotope, 13);
        assert_eq!(a.element, Some(Element::C));
        assert_eq!(a.hcount, Some(3));
        assert_eq!(a.charge, 1);
        assert!(a.is_bracket);
    }

    #[test]
    fn bracket_charges() {
        assert_eq!(atom(&tokenize("[O-]").unwrap()[0]).charge, -1);
        assert_eq!(atom(&tokenize("[N+]").unwrap()[0]).charge, 1);
        assert_eq!(atom(&tokenize("[O--]").unwrap()[0]).charge, -2);
        assert_eq!(atom(&tokenize("[Ca+2]").unwrap()[0]).charge, 2);
    }

    #[test]
    fn element_outside_table() {
        assert!(matches!(
            tokenize("[Fe+2]"),
            Err(SmilesError::InvalidElement { pos: 1, .. })
        ));
    }

    #[test]
    fn bracket_silicon_and_chirality() {
        let tokens = tokenize("C[SiH3]").unwrap();
        assert_eq!(atom(&tokens[1]).element, Some(Element::Si));
        assert_eq!(atom(&tokens[1]).hcount, Some(3));

        let tokens = tokenize("F[C@@H](Cl)Br").unwrap();
        assert_eq!(atom(&tokens[1]).hcount, Some(1));
    }

    #[test]
    fn ring_closure_with_bond() {
        let tokens = tokenize("C=1CCCCC1").unwrap();
        assert!(matches!(
            tokens[1],
            Token::RingClosure {
                bond: Some(BondToken::Double),
                digit: 1,
                ..
            }
        ));
    }

    #[test]
    fn percent_ring_closure() {
        let tokens = tokenize("C%12CC%12").unwrap();
        assert!(matches!(tokens[1], Token::RingClosure { digit: 12, .. }));
    }

    #[test]
    fn unexpected_character() {
        assert_eq!(
            tokenize("CXC"),
            Err(SmilesError::UnexpectedChar { pos: 1, ch: 'X' })
        );
    }

    #[test]
    fn unclosed_bracket() {
        assert_eq!(
            tokenize("[CH3"),
            Err(SmilesError::UnclosedBracket { pos: 0 })
        );
    }

    #[test]
    fn quadruple_bond_unsupported() {
        assert!(matches!(
            tokenize("C$C"),
            Err(SmilesError::Unsupported { pos: 1, .. })
        ));
    }
}
