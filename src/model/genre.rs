use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Story genre, chosen once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Horror,
    Adventure,
    Mystery,
    Fantasy,
}

impl Genre {
    /// Menu order. Key `n` maps to `ALL[n - 1]`.
    pub const ALL: [Genre; 5] = [
        Genre::Action,
        Genre::Horror,
        Genre::Adventure,
        Genre::Mystery,
        Genre::Fantasy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Horror => "Horror",
            Genre::Adventure => "Adventure",
            Genre::Mystery => "Mystery",
            Genre::Fantasy => "Fantasy",
        }
    }

    pub fn from_menu_key(key: &str) -> Option<Genre> {
        let index: usize = key.trim().parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Genre {
        *Self::ALL.choose(rng).unwrap_or(&Genre::Adventure)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|g| g.name().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|g| g.name()).collect();
                format!("unknown genre '{}' (expected one of: {})", wanted, names.join(", "))
            })
    }
}
