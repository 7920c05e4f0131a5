//! Loss modes and the metrics token each one reports under.

use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Loss function selector handed to the training driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossMode {
    /// Evidential negative log-likelihood.
    Nll,
    /// NLL plus evidence regularizer.
    Full,
    Variational,
    Kl,
    /// Point-estimate mean squared error.
    Mse,
    /// Point-estimate absolute error.
    Abs,
}

impl LossMode {
    pub const ALL: [LossMode; 6] = [
        LossMode::Nll,
        LossMode::Full,
        LossMode::Variational,
        LossMode::Kl,
        LossMode::Mse,
        LossMode::Abs,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nll => "nll",
            Self::Full => "full",
            Self::Variational => "variational",
            Self::Kl => "kl",
            Self::Mse => "mse",
            Self::Abs => "abs",
        }
    }

    /// Metrics bundle reported for runs trained with this loss.
    #[must_use]
    pub fn metrics_token(self) -> MetricsToken {
        match self {
            Self::Nll | Self::Full | Self::Variational | Self::Kl => MetricsToken::Uq,
            Self::Mse | Self::Abs => MetricsToken::Regression,
        }
    }
}

impl std::fmt::Display for LossMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LossMode {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| TrainingError::UnknownLossMode(s.to_string()))
    }
}

/// Key into the metrics registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsToken {
    Regression,
    Uq,
    Probabilistic,
}

impl MetricsToken {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::Uq => "uq",
            Self::Probabilistic => "probabilistic",
        }
    }
}

impl std::fmt::Display for MetricsToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a raw loss-mode tag straight to its metrics token.
///
/// Unrecognized tags are rejected instead of silently reporting no metrics.
pub fn resolve_metrics_token(tag: &str) -> TrainingResult<MetricsToken> {
    Ok(tag.parse::<LossMode>()?.metrics_token())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uq_family_resolves_to_uq() {
        for tag in ["nll", "full", "variational", "kl"] {
            assert_eq!(resolve_metrics_token(tag).unwrap(), MetricsToken::Uq, "{tag}");
        }
    }

    #[test]
    fn test_point_estimate_family_resolves_to_regression() {
        assert_eq!(resolve_metrics_token("mse").unwrap(), MetricsToken::Regression);
        assert_eq!(resolve_metrics_token("abs").unwrap(), MetricsToken::Regression);
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let err = resolve_metrics_token("foo").unwrap_err();
        assert!(matches!(err, TrainingError::UnknownLossMode(ref t) if t == "foo"));
        assert!("MSE".parse::<LossMode>().is_err());
    }

    #[test]
    fn test_loss_mode_serde_uses_tags() {
        let json = serde_json::to_string(&LossMode::Variational).unwrap();
        assert_eq!(json, "\"variational\"");
        let back: LossMode = serde_json::from_str("\"abs\"").unwrap();
        assert_eq!(back, LossMode::Abs);
    }
}
