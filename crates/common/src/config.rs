use serde::{Deserialize, Serialize};

use crate::types::ItemType;

/// Errors from configuration parsing and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    #[error("max_footprint_cells must be at least 1")]
    InvalidFootprint,
    #[error("tick_rate must be at least 1")]
    InvalidTickRate,
    #[error("{kind} limit {limit} exceeds the native ceiling of {ceiling}")]
    LimitExceedsCeiling {
        kind: ItemType,
        limit: usize,
        ceiling: usize,
    },
    #[error("identifier limit must be at least 1")]
    InvalidIdentifierLimit,
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-type ceilings on how many items one player may see at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemLimits {
    pub objects: usize,
    pub pickups: usize,
    pub checkpoints: usize,
    pub race_checkpoints: usize,
    pub map_icons: usize,
    pub text_labels: usize,
    pub actors: usize,
}

impl ItemLimits {
    /// The protocol's fixed per-player ceilings.
    pub const NATIVE: ItemLimits = ItemLimits {
        objects: 1000,
        pickups: 4096,
        checkpoints: 1,
        race_checkpoints: 1,
        map_icons: 100,
        text_labels: 1024,
        actors: 1000,
    };

    /// Capacity for a slot-backed type; `None` for areas.
    pub fn get(&self, kind: ItemType) -> Option<usize> {
        match kind {
            ItemType::Object => Some(self.objects),
            ItemType::Pickup => Some(self.pickups),
            ItemType::Checkpoint => Some(self.checkpoints),
            ItemType::RaceCheckpoint => Some(self.race_checkpoints),
            ItemType::MapIcon => Some(self.map_icons),
            ItemType::TextLabel => Some(self.text_labels),
            ItemType::Actor => Some(self.actors),
            ItemType::Area => None,
        }
    }

    pub fn set(&mut self, kind: ItemType, limit: usize) {
        match kind {
            ItemType::Object => self.objects = limit,
            ItemType::Pickup => self.pickups = limit,
            ItemType::Checkpoint => self.checkpoints = limit,
            ItemType::RaceCheckpoint => self.race_checkpoints = limit,
            ItemType::MapIcon => self.map_icons = limit,
            ItemType::TextLabel => self.text_labels = limit,
            ItemType::Actor => self.actors = limit,
            ItemType::Area => {}
        }
    }
}

impl Default for ItemLimits {
    fn default() -> Self {
        Self::NATIVE
    }
}

/// Streamer configuration: spatial index tuning, per-type capacities, tick cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Edge length of a spatial index cell, in world units.
    pub cell_size: f32,
    /// Footprints spanning more cells than this along an axis go to the global bucket.
    pub max_footprint_cells: u32,
    pub limits: ItemLimits,
    /// Host ticks between streaming evaluations.
    pub tick_rate: u32,
    /// Highest dynamic id issued per item type.
    pub identifier_limit: u32,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            cell_size: 300.0,
            max_footprint_cells: 16,
            limits: ItemLimits::default(),
            tick_rate: 1,
            identifier_limit: i32::MAX as u32,
        }
    }
}

impl StreamerConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if self.max_footprint_cells == 0 {
            return Err(ConfigError::InvalidFootprint);
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::InvalidTickRate);
        }
        if self.identifier_limit == 0 {
            return Err(ConfigError::InvalidIdentifierLimit);
        }
        for kind in ItemType::STREAMED {
            let (Some(limit), Some(ceiling)) = (self.limits.get(kind), ItemLimits::NATIVE.get(kind))
            else {
                continue;
            };
            if limit > ceiling {
                return Err(ConfigError::LimitExceedsCeiling {
                    kind,
                    limit,
                    ceiling,
                });
            }
        }
        Ok(())
    }

    /// Capacity for `kind`, clamped to the native ceiling.
    pub fn capacity(&self, kind: ItemType) -> usize {
        match (self.limits.get(kind), ItemLimits::NATIVE.get(kind)) {
            (Some(limit), Some(ceiling)) => limit.min(ceiling),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StreamerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity(ItemType::Checkpoint), 1);
        assert_eq!(config.capacity(ItemType::MapIcon), 100);
        assert_eq!(config.capacity(ItemType::Area), 0);
    }

    #[test]
    fn yaml_overrides_merge_with_defaults() {
        let config = StreamerConfig::from_yaml_str(
            "cell_size: 150.0\nlimits:\n  objects: 500\n",
        )
        .unwrap();
        assert_eq!(config.cell_size, 150.0);
        assert_eq!(config.limits.objects, 500);
        assert_eq!(config.limits.pickups, 4096);
        assert_eq!(config.tick_rate, 1);
    }

    #[test]
    fn json_is_accepted() {
        let config = StreamerConfig::from_json_str(r#"{"tick_rate": 5}"#).unwrap();
        assert_eq!(config.tick_rate, 5);
    }

    #[test]
    fn limit_above_ceiling_is_rejected() {
        let err = StreamerConfig::from_yaml_str("limits:\n  map_icons: 101\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LimitExceedsCeiling {
                kind: ItemType::MapIcon,
                limit: 101,
                ceiling: 100
            }
        ));
    }

    #[test]
    fn invalid_cell_size_is_rejected() {
        let config = StreamerConfig {
            cell_size: 0.0,
            ..StreamerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn limits_set_and_get() {
        let mut limits = ItemLimits::default();
        limits.set(ItemType::Actor, 10);
        assert_eq!(limits.get(ItemType::Actor), Some(10));
        limits.set(ItemType::Area, 10);
        assert_eq!(limits.get(ItemType::Area), None);
    }
}
