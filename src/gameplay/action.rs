use crate::cards::hand::Hand;
use crate::Chips;

/// a concrete table action. chip amounts are the chips
/// put in by the actor now, not totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Blind(Chips),
    Fold,
    Check,
    Call(Chips),
    Raise(Chips),
    Shove(Chips),
    Draw(Hand),
}

impl Action {
    pub fn is_chance(&self) -> bool {
        matches!(self, Action::Draw(_))
    }
    pub fn is_aggro(&self) -> bool {
        matches!(self, Action::Raise(_) | Action::Shove(_))
    }
    pub fn chips(&self) -> Chips {
        match self {
            Action::Blind(x) | Action::Call(x) | Action::Raise(x) | Action::Shove(x) => *x,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Action::Fold => write!(f, "fold"),
            Action::Check => write!(f, "check"),
            Action::Blind(x) => write!(f, "blind {}", x),
            Action::Call(x) => write!(f, "call {}", x),
            Action::Raise(x) => write!(f, "raise {}", x),
            Action::Shove(x) => write!(f, "shove {}", x),
            Action::Draw(hand) => write!(f, "deal {}", hand),
        }
    }
}
