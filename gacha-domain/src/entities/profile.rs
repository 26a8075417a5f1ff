// Player profile entity
// Which providers populated a player's history, and when it last changed

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::formats::SourceFormat;
use crate::utils::local_time;
use crate::value_objects::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    #[serde(default)]
    pub providers: BTreeSet<SourceFormat>,
    #[serde(with = "local_time")]
    pub updated_at: NaiveDateTime,
}

impl PlayerProfile {
    pub fn new(player_id: PlayerId, updated_at: NaiveDateTime) -> Self {
        Self {
            player_id,
            providers: BTreeSet::new(),
            updated_at,
        }
    }

    pub fn has_provider(&self, format: SourceFormat) -> bool {
        self.providers.contains(&format)
    }
}
