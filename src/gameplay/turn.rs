/// whose move it is, if anyone's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Chance,
    Choice(usize),
    Terminal,
}

impl Turn {
    pub fn is_chance(&self) -> bool {
        matches!(self, Turn::Chance)
    }
    pub fn is_choice(&self) -> bool {
        matches!(self, Turn::Choice(_))
    }
    pub fn is_terminal(&self) -> bool {
        matches!(self, Turn::Terminal)
    }
    pub fn position(&self) -> usize {
        match self {
            Turn::Choice(seat) => *seat,
            _ => panic!("no seat to act"),
        }
    }
}

impl std::fmt::Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Turn::Chance => write!(f, "chance"),
            Turn::Choice(seat) => write!(f, "seat {}", seat),
            Turn::Terminal => write!(f, "terminal"),
        }
    }
}
