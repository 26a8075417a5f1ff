// Pool category value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical banner family a draw belongs to. The three beginner banner codes
/// collapse into [`PoolCategory::Beginner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolCategory {
    Character,
    Weapon,
    Standard,
    StandardWeapon,
    Beginner,
}

impl PoolCategory {
    pub const ALL: [PoolCategory; 5] = [
        PoolCategory::Character,
        PoolCategory::Weapon,
        PoolCategory::Standard,
        PoolCategory::StandardWeapon,
        PoolCategory::Beginner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolCategory::Character => "character",
            PoolCategory::Weapon => "weapon",
            PoolCategory::Standard => "standard",
            PoolCategory::StandardWeapon => "standard_weapon",
            PoolCategory::Beginner => "beginner",
        }
    }

    /// Interchange code; beginner variants always encode as "5".
    pub fn code(&self) -> &'static str {
        match self {
            PoolCategory::Character => "1",
            PoolCategory::Weapon => "2",
            PoolCategory::Standard => "3",
            PoolCategory::StandardWeapon => "4",
            PoolCategory::Beginner => "5",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(PoolCategory::Character),
            "2" => Some(PoolCategory::Weapon),
            "3" => Some(PoolCategory::Standard),
            "4" => Some(PoolCategory::StandardWeapon),
            "5" | "6" | "7" => Some(PoolCategory::Beginner),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PoolCategory::Character => "角色活动唤取",
            PoolCategory::Weapon => "武器活动唤取",
            PoolCategory::Standard => "角色常驻唤取",
            PoolCategory::StandardWeapon => "武器常驻唤取",
            PoolCategory::Beginner => "新手唤取",
        }
    }

    /// Whether a lost 50/50 on this banner guarantees the next featured 5★.
    pub fn has_guarantee(&self) -> bool {
        matches!(self, PoolCategory::Character | PoolCategory::Weapon)
    }
}

impl fmt::Display for PoolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        if let Some(category) = PoolCategory::from_code(&normalized) {
            return Ok(category);
        }
        PoolCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized || category.label() == normalized)
            .ok_or_else(|| format!("unknown pool category '{}'", s))
    }
}
