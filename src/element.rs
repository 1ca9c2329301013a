/// Elements that can appear in molecules handled by the group catalogs.
///
/// The table is intentionally limited to the main-group elements that occur
/// in group-contribution work (organics, halogens, silicon, the noble gases
/// used by the PSRK gas groups and a few counter-ions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He = 2,
    Li = 3,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
    K = 19,
    Ca = 20,
    Se = 34,
    Br = 35,
    Kr = 36,
    I = 53,
    Xe = 54,
}

// (element, symbol, standard atomic weight)
static TABLE: [(Element, &str, f64); 24] = [
    (Element::H, "H", 1.008),
    (Element::He, "He", 4.003),
    (Element::Li, "Li", 6.941),
    (Element::B, "B", 10.812),
    (Element::C, "C", 12.011),
    (Element::N, "N", 14.007),
    (Element::O, "O", 15.999),
    (Element::F, "F", 18.998),
    (Element::Ne, "Ne", 20.180),
    (Element::Na, "Na", 22.990),
    (Element::Mg, "Mg", 24.305),
    (Element::Al, "Al", 26.982),
    (Element::Si, "Si", 28.086),
    (Element::P, "P", 30.974),
    (Element::S, "S", 32.067),
    (Element::Cl, "Cl", 35.453),
    (Element::Ar, "Ar", 39.948),
    (Element::K, "K", 39.098),
    (Element::Ca, "Ca", 40.078),
    (Element::Se, "Se", 78.971),
    (Element::Br, "Br", 79.904),
    (Element::Kr, "Kr", 83.798),
    (Element::I, "I", 126.904),
    (Element::Xe, "Xe", 131.293),
];

impl Element {
    pub fn from_atomic_num(n: u8) -> Option<Element> {
        TABLE.iter().find(|(e, _, _)| *e as u8 == n).map(|(e, _, _)| *e)
    }

    pub fn from_symbol(s: &str) -> Option<Element> {
        TABLE.iter().find(|(_, sym, _)| *sym == s).map(|(e, _, _)| *e)
    }

    pub fn atomic_num(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> &'static str {
        self.row().1
    }

    /// Standard atomic weight in g/mol.
    pub fn atomic_weight(self) -> f64 {
        self.row().2
    }

    /// Valences used to derive implicit hydrogens for organic-subset atoms.
    pub fn default_valences(self) -> &'static [u8] {
        match self {
            Element::H => &[1],
            Element::B => &[3],
            Element::C | Element::Si => &[4],
            Element::N | Element::P => &[3, 5],
            Element::O => &[2],
            Element::F | Element::Cl | Element::Br => &[1],
            Element::S | Element::Se => &[2, 4, 6],
            Element::I => &[1, 3, 5, 7],
            _ => &[],
        }
    }

    fn row(self) -> &'static (Element, &'static str, f64) {
        // every variant has exactly one row
        TABLE
            .iter()
            .find(|(e, _, _)| *e == self)
            .unwrap_or(&TABLE[0])
    }
}
