//! Named bundles of evaluation metrics.
//!
//! The registry only names metrics; computing them is the driver's job.

use crate::loss::MetricsToken;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    bundles: BTreeMap<MetricsToken, Vec<&'static str>>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        let mut bundles = BTreeMap::new();
        bundles.insert(MetricsToken::Regression, vec!["mse", "rmse", "mae", "r2"]);
        bundles.insert(
            MetricsToken::Uq,
            vec!["nll", "rmse", "mae", "coverage_95", "interval_width", "calibration_error"],
        );
        bundles.insert(MetricsToken::Probabilistic, vec!["nll", "crps", "calibration_error"]);
        Self { bundles }
    }
}

impl MetricsRegistry {
    #[must_use]
    pub fn bundles(&self) -> &BTreeMap<MetricsToken, Vec<&'static str>> {
        &self.bundles
    }

    #[must_use]
    pub fn bundle(&self, token: MetricsToken) -> &[&'static str] {
        self.bundles.get(&token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tokens(&self) -> impl Iterator<Item = MetricsToken> + '_ {
        self.bundles.keys().copied()
    }

    /// One line per token, e.g. `regression: mse, rmse, mae, r2`.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.bundles
            .iter()
            .map(|(token, metrics)| format!("{token}: {}", metrics.join(", ")))
            .collect()
    }
}
