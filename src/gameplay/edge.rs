use super::odds::Odds;

/// an abstract action. raises carry a pot fraction
/// rather than a chip amount, so the same edge means
/// the same thing at every node of a street.
#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, PartialEq, Eq)]
pub enum Edge {
    Fold,
    Call,
    Raise(Odds),
    Shove,
}

impl Edge {
    pub fn is_raise(&self) -> bool {
        matches!(self, Edge::Raise(_))
    }
    pub fn is_shove(&self) -> bool {
        matches!(self, Edge::Shove)
    }
    pub fn is_aggro(&self) -> bool {
        self.is_raise() || self.is_shove()
    }
}

/// nibble bijection used by Path. zero is reserved for
/// empty and 0xF for the street separator.
impl From<Edge> for u8 {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::Fold => 1,
            Edge::Call => 2,
            Edge::Shove => 3,
            Edge::Raise(odds) => 4 + odds.position() as u8,
        }
    }
}
impl From<u8> for Edge {
    fn from(code: u8) -> Self {
        match code {
            1 => Edge::Fold,
            2 => Edge::Call,
            3 => Edge::Shove,
            c @ 4..=11 => Edge::Raise(Odds::GRID[c as usize - 4]),
            _ => panic!("invalid edge code"),
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Edge::Fold => write!(f, "F"),
            Edge::Call => write!(f, "C"),
            Edge::Shove => write!(f, "A"),
            Edge::Raise(odds) => write!(f, "{}", odds),
        }
    }
}

impl crate::Arbitrary for Edge {
    fn random() -> Self {
        use crate::Arbitrary;
        use rand::Rng;
        match rand::rng().random_range(0..4) {
            0 => Self::Fold,
            1 => Self::Call,
            2 => Self::Shove,
            _ => Self::Raise(Odds::random()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijective_nibble() {
        let raises = Odds::GRID.map(Edge::Raise);
        let edges = [Edge::Fold, Edge::Call, Edge::Shove];
        assert!(edges
            .into_iter()
            .chain(raises)
            .all(|edge| edge == Edge::from(u8::from(edge))));
    }
}
