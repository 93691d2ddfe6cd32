use super::rank::Rank;

/// tie-breaking side cards as a one-hot rank mask.
/// masks compare correctly because higher ranks occupy
/// higher bits and kicker counts match within a category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Kickers(u16);

impl From<u16> for Kickers {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}
impl From<Kickers> for u16 {
    fn from(kicks: Kickers) -> Self {
        kicks.0
    }
}

impl std::fmt::Display for Kickers {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut bits = self.0;
        while bits != 0 {
            let rank = Rank::from(bits);
            write!(f, "{}", rank)?;
            bits &= !u16::from(rank);
        }
        Ok(())
    }
}
