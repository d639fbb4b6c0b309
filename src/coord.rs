use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A board coordinate as it appears on the wire: `"A1"`, `"pass"`, `"resign"`.
///
/// Board representation, move legality, and symmetry normalization are
/// external concerns (provided by a board library); `Coord` only needs to
/// round-trip through the wire and sort deterministically so that sibling
/// lists in the tree-merge contract (spec §4.6) can be walked with a linear
/// two-pointer merge.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Coord(String);

impl Coord {
    pub fn pass() -> Self {
        Coord("pass".to_string())
    }

    pub fn resign() -> Self {
        Coord("resign".to_string())
    }

    pub fn is_pass(&self) -> bool {
        self.0.eq_ignore_ascii_case("pass")
    }

    pub fn is_resign(&self) -> bool {
        self.0.eq_ignore_ascii_case("resign")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits a point coordinate like "Q16" into its letter prefix and
    /// numeric suffix so siblings sort by column then row instead of
    /// lexicographically (which would put "A10" before "A2").
    fn split(&self) -> (&str, Option<u32>) {
        let digits_at = self.0.find(|c: char| c.is_ascii_digit());
        match digits_at {
            Some(i) => (&self.0[..i], self.0[i..].parse().ok()),
            None => (&self.0[..], None),
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Coord {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Coord(s.to_string()))
    }
}

impl From<&str> for Coord {
    fn from(s: &str) -> Self {
        Coord(s.to_string())
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        let (p1, n1) = self.split();
        let (p2, n2) = other.split();
        p1.cmp(p2).then(n1.cmp(&n2))
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Color to move, as exchanged on the wire (`b` / `w`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn other(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "b"),
            Color::White => write!(f, "w"),
        }
    }
}

impl FromStr for Color {
    type Err = crate::error::EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" | "B" | "black" => Ok(Color::Black),
            "w" | "W" | "white" => Ok(Color::White),
            other => Err(crate::error::EngineError::Parse(format!(
                "unrecognized color token: {other}"
            ))),
        }
    }
}
