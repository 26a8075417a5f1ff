// Rarity value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rarity {
    Three,
    Four,
    Five,
}

impl Rarity {
    pub fn stars(&self) -> u8 {
        match self {
            Rarity::Three => 3,
            Rarity::Four => 4,
            Rarity::Five => 5,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u8>().ok().and_then(|value| Rarity::try_from(value).ok())
    }
}

impl TryFrom<u8> for Rarity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Rarity::Three),
            4 => Ok(Rarity::Four),
            5 => Ok(Rarity::Five),
            other => Err(format!("rarity must be 3, 4 or 5, got {}", other)),
        }
    }
}

impl From<Rarity> for u8 {
    fn from(value: Rarity) -> Self {
        value.stars()
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stars())
    }
}
