//! Runtime configuration for order numbering and analytics limits

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;

/// Tunables shared by the order and analytics layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcurementConfig {
    /// Prefix for generated order numbers
    pub order_number_prefix: String,
    /// Number of random characters after the prefix (at most 32)
    pub order_number_length: usize,
    pub recent_default_limit: usize,
    pub recent_max_limit: usize,
    pub top_items_default_limit: usize,
    pub top_items_max_limit: usize,
    pub monthly_loss_default_months: u32,
    pub monthly_loss_max_months: u32,
}

impl Default for ProcurementConfig {
    fn default() -> Self {
        Self {
            order_number_prefix: "ORD-".to_string(),
            order_number_length: 10,
            recent_default_limit: 5,
            recent_max_limit: 20,
            top_items_default_limit: 5,
            top_items_max_limit: 20,
            monthly_loss_default_months: 6,
            monthly_loss_max_months: 24,
        }
    }
}

impl ProcurementConfig {
    /// Load defaults and overlay any `PROCUREMENT_*` environment variables
    pub fn from_env() -> ProcurementResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> ProcurementResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(prefix) = lookup("PROCUREMENT_ORDER_NUMBER_PREFIX") {
            config.order_number_prefix = prefix;
        }
        overlay(&lookup, "PROCUREMENT_ORDER_NUMBER_LENGTH", &mut config.order_number_length)?;
        overlay(&lookup, "PROCUREMENT_RECENT_DEFAULT_LIMIT", &mut config.recent_default_limit)?;
        overlay(&lookup, "PROCUREMENT_RECENT_MAX_LIMIT", &mut config.recent_max_limit)?;
        overlay(
            &lookup,
            "PROCUREMENT_TOP_ITEMS_DEFAULT_LIMIT",
            &mut config.top_items_default_limit,
        )?;
        overlay(&lookup, "PROCUREMENT_TOP_ITEMS_MAX_LIMIT", &mut config.top_items_max_limit)?;
        overlay(
            &lookup,
            "PROCUREMENT_MONTHLY_LOSS_DEFAULT_MONTHS",
            &mut config.monthly_loss_default_months,
        )?;
        overlay(
            &lookup,
            "PROCUREMENT_MONTHLY_LOSS_MAX_MONTHS",
            &mut config.monthly_loss_max_months,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Check that limits are usable
    pub fn validate(&self) -> ProcurementResult<()> {
        if self.order_number_length == 0 || self.order_number_length > 32 {
            return Err(ProcurementError::Validation(
                "Order number length must be between 1 and 32".to_string(),
            ));
        }
        if self.recent_max_limit == 0
            || self.top_items_max_limit == 0
            || self.monthly_loss_max_months == 0
        {
            return Err(ProcurementError::Validation(
                "Analytics limits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn clamp_recent_limit(&self, requested: Option<usize>) -> usize {
        clamp(requested, self.recent_default_limit, self.recent_max_limit)
    }

    pub fn clamp_top_items_limit(&self, requested: Option<usize>) -> usize {
        clamp(requested, self.top_items_default_limit, self.top_items_max_limit)
    }

    pub fn clamp_months(&self, requested: Option<u32>) -> u32 {
        clamp(
            requested,
            self.monthly_loss_default_months,
            self.monthly_loss_max_months,
        )
    }
}

fn overlay<F, T>(lookup: &F, key: &str, target: &mut T) -> ProcurementResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|_| {
            ProcurementError::Validation(format!("Invalid value for {}: '{}'", key, raw))
        })?;
    }
    Ok(())
}

fn clamp<T: Ord + Copy + From<u8>>(requested: Option<T>, default: T, max: T) -> T {
    let min = T::from(1);
    requested.unwrap_or(default).clamp(min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ProcurementConfig::default();
        assert_eq!(config.order_number_prefix, "ORD-");
        assert_eq!(config.clamp_recent_limit(None), 5);
        assert_eq!(config.clamp_top_items_limit(None), 5);
        assert_eq!(config.clamp_months(None), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamping() {
        let config = ProcurementConfig::default();
        assert_eq!(config.clamp_recent_limit(Some(0)), 1);
        assert_eq!(config.clamp_recent_limit(Some(500)), 20);
        assert_eq!(config.clamp_months(Some(12)), 12);
        assert_eq!(config.clamp_months(Some(100)), 24);
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("PROCUREMENT_ORDER_NUMBER_PREFIX", "PO-"),
            ("PROCUREMENT_RECENT_MAX_LIMIT", " 50 "),
        ]
        .into_iter()
        .collect();

        let config =
            ProcurementConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.order_number_prefix, "PO-");
        assert_eq!(config.recent_max_limit, 50);
        assert_eq!(config.top_items_max_limit, 20);
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let result = ProcurementConfig::from_lookup(|key| {
            (key == "PROCUREMENT_MONTHLY_LOSS_MAX_MONTHS").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ProcurementError::Validation(_))));

        let result = ProcurementConfig::from_lookup(|key| {
            (key == "PROCUREMENT_ORDER_NUMBER_LENGTH").then(|| "64".to_string())
        });
        assert!(matches!(result, Err(ProcurementError::Validation(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ProcurementConfig =
            serde_json::from_str(r#"{ "order_number_prefix": "PO-" }"#).unwrap();
        assert_eq!(config.order_number_prefix, "PO-");
        assert_eq!(config.monthly_loss_max_months, 24);
    }
}
