use super::path::Path;
use crate::cards::street::Street;

/// what the acting player knows: the street, their hand's
/// bucket, and the public action history. distinct decision
/// points map to distinct keys because bucket and path are
/// both total encodings of their inputs.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Infoset {
    pub street: Street,
    pub bucket: u16,
    pub path: Path,
}

impl From<(Street, u16, Path)> for Infoset {
    fn from((street, bucket, path): (Street, u16, Path)) -> Self {
        Self {
            street,
            bucket,
            path,
        }
    }
}

/// the versioned key format: `v2:<STREET>:<bucket>:<history>`
impl std::fmt::Display for Infoset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "v2:{}:{}:{}", self.street.tag(), self.bucket, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::edge::Edge;
    use crate::gameplay::odds::Odds;

    #[test]
    fn versioned_key_format() {
        let path = [Edge::Call, Edge::Raise(Odds(3, 4)), Edge::Call]
            .into_iter()
            .collect::<Path>();
        let infoset = Infoset::from((Street::Flop, 12, path));
        assert_eq!(infoset.to_string(), "v2:FLOP:12:C-B75-C");
    }

    #[test]
    fn distinct_points_distinct_keys() {
        let a = Infoset::from((Street::Flop, 12, Path::default()));
        let b = Infoset::from((Street::Flop, 13, Path::default()));
        let c = Infoset::from((Street::Turn, 12, Path::default()));
        assert!(a != b && a != c && b != c);
    }
}
