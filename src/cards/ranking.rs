use super::rank::Rank;

/// showdown hand categories in ascending strength.
/// derived Ord compares the category first, then the
/// defining ranks within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ranking {
    HighCard(Rank),
    OnePair(Rank),
    TwoPair(Rank, Rank),
    ThreeOAK(Rank),
    Straight(Rank),
    Flush(Rank),
    FullHouse(Rank, Rank),
    FourOAK(Rank),
    StraightFlush(Rank),
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Ranking::HighCard(r) => write!(f, "{} high", r),
            Ranking::OnePair(r) => write!(f, "pair of {}s", r),
            Ranking::TwoPair(hi, lo) => write!(f, "two pair {}s {}s", hi, lo),
            Ranking::ThreeOAK(r) => write!(f, "trip {}s", r),
            Ranking::Straight(r) => write!(f, "{} high straight", r),
            Ranking::Flush(r) => write!(f, "{} high flush", r),
            Ranking::FullHouse(t, p) => write!(f, "{}s full of {}s", t, p),
            Ranking::FourOAK(r) => write!(f, "quad {}s", r),
            Ranking::StraightFlush(r) => write!(f, "{} high straight flush", r),
        }
    }
}
