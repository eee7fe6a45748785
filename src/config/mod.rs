//! Layout settings and configuration file loading.

pub mod loader;

pub use loader::{
    apply_env_overrides, default_config_path, default_log_path, load_config_file,
    load_config_with_precedence, merge_config, resolve_settings, ConfigError, ConfigFile,
    GroupingSection,
};

use crate::layout::OptimizerSettings;
use crate::model::InitializationError;
use std::path::PathBuf;
use std::time::Duration;

/// Fully resolved settings for every component.
///
/// Created by merging defaults, an optional config file, and environment
/// overrides. The thresholds are empirical defaults, not domain laws.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    /// Resize debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Resize changes smaller than this (px, either axis) are ignored.
    pub min_resize_delta: f64,
    /// Dimension cache entries expire after this many milliseconds.
    pub cache_ttl_ms: u64,
    /// Snapshots retained in the state history.
    pub history_capacity: usize,
    /// Minimum board edge length in px.
    pub min_board_size: f64,
    /// Minimum gap between placed elements (and the board) in px.
    pub element_spacing: f64,
    /// Allowed shortfall on the spacing rule in px.
    pub spacing_tolerance: f64,
    /// Maximum gap between consecutive group members in px.
    pub grouping_tolerance: f64,
    /// Ceiling on group spread relative to the members' own extent.
    pub max_group_spread_ratio: f64,
    /// Allowed deviation between requested and realized geometry in px.
    pub position_tolerance: f64,
    /// Duration of a layout transition; 0 disables queuing.
    pub transition_ms: u64,
    /// Latency budget for a visibility refresh in milliseconds.
    pub refresh_budget_ms: u64,
    /// Z-index written to the board.
    pub board_z_index: i32,
    /// Z-index of the first placed element; later ones count up.
    pub element_z_base: i32,
    /// Log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            min_resize_delta: 10.0,
            cache_ttl_ms: 1000,
            history_capacity: 10,
            min_board_size: 280.0,
            element_spacing: 16.0,
            spacing_tolerance: 1.0,
            grouping_tolerance: 20.0,
            max_group_spread_ratio: 2.5,
            position_tolerance: 1.0,
            transition_ms: 150,
            refresh_budget_ms: 100,
            board_z_index: 1,
            element_z_base: 10,
            log_file_path: default_log_path(),
        }
    }
}

impl LayoutSettings {
    /// Debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Transition length.
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    /// Refresh latency budget.
    pub fn refresh_budget(&self) -> Duration {
        Duration::from_millis(self.refresh_budget_ms)
    }

    /// Subset consumed by the layout optimizer.
    pub fn optimizer(&self) -> OptimizerSettings {
        OptimizerSettings {
            min_board_size: self.min_board_size,
            element_spacing: self.element_spacing,
            spacing_tolerance: self.spacing_tolerance,
            grouping_tolerance: self.grouping_tolerance,
            max_group_spread_ratio: self.max_group_spread_ratio,
            board_z_index: self.board_z_index,
            element_z_base: self.element_z_base,
        }
    }

    /// Reject settings no component can work with.
    pub fn validate(&self) -> Result<(), InitializationError> {
        fn positive(field: &'static str, value: f64) -> Result<(), InitializationError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(InitializationError::InvalidSettings {
                    field,
                    reason: format!("must be a positive finite number (got {value})"),
                })
            }
        }

        fn non_negative(field: &'static str, value: f64) -> Result<(), InitializationError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(InitializationError::InvalidSettings {
                    field,
                    reason: format!("must be a non-negative finite number (got {value})"),
                })
            }
        }

        positive("min_board_size", self.min_board_size)?;
        positive("element_spacing", self.element_spacing)?;
        positive("grouping_tolerance", self.grouping_tolerance)?;
        positive("max_group_spread_ratio", self.max_group_spread_ratio)?;
        non_negative("min_resize_delta", self.min_resize_delta)?;
        non_negative("spacing_tolerance", self.spacing_tolerance)?;
        non_negative("position_tolerance", self.position_tolerance)?;

        if self.history_capacity == 0 {
            return Err(InitializationError::InvalidSettings {
                field: "history_capacity",
                reason: "must hold at least one snapshot".to_string(),
            });
        }
        if self.spacing_tolerance >= self.element_spacing {
            return Err(InitializationError::InvalidSettings {
                field: "spacing_tolerance",
                reason: "must be smaller than element_spacing".to_string(),
            });
        }
        if self.grouping_tolerance < self.element_spacing {
            return Err(InitializationError::InvalidSettings {
                field: "grouping_tolerance",
                reason: "must be at least element_spacing".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let settings = LayoutSettings::default();
        assert_eq!(settings.debounce(), Duration::from_millis(100));
        assert_eq!(settings.min_resize_delta, 10.0);
        assert_eq!(settings.cache_ttl(), Duration::from_millis(1000));
        assert_eq!(settings.history_capacity, 10);
        assert_eq!(settings.min_board_size, 280.0);
        assert_eq!(settings.element_spacing, 16.0);
        assert_eq!(settings.grouping_tolerance, 20.0);
        assert_eq!(settings.max_group_spread_ratio, 2.5);
        assert_eq!(settings.refresh_budget(), Duration::from_millis(100));
    }

    #[test]
    fn default_settings_validate() {
        assert!(LayoutSettings::default().validate().is_ok());
    }

    #[test]
    fn zero_history_capacity_is_rejected() {
        let settings = LayoutSettings {
            history_capacity: 0,
            ..LayoutSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("history_capacity"));
    }

    #[test]
    fn nan_spacing_is_rejected() {
        let settings = LayoutSettings {
            element_spacing: f64::NAN,
            ..LayoutSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(InitializationError::InvalidSettings {
                field: "element_spacing",
                ..
            })
        ));
    }

    #[test]
    fn tolerance_must_be_below_spacing() {
        let settings = LayoutSettings {
            spacing_tolerance: 16.0,
            ..LayoutSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn optimizer_subset_carries_values() {
        let settings = LayoutSettings {
            min_board_size: 300.0,
            ..LayoutSettings::default()
        };
        let optimizer = settings.optimizer();
        assert_eq!(optimizer.min_board_size, 300.0);
        assert_eq!(optimizer.element_spacing, 16.0);
    }
}
