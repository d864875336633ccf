// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Branch-aware metric lookup over validated reports.

use crate::{error::Error, report::Report};

/// Metric value resolved for a concrete branch.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    /// Branch the value was read from.
    pub branch: String,
    /// Raw metric value reported upstream.
    pub value:  f64
}

/// Resolves the branch to inspect, falling back to the report default.
///
/// Empty selectors count as absent.
pub fn effective_branch<'a>(report: &'a Report, branch: Option<&'a str>) -> &'a str {
    branch
        .filter(|candidate| !candidate.is_empty())
        .unwrap_or(report.default_branch.as_str())
}

/// Reads `metric` for `branch` (or the default branch) from `report`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] with `branch not found` when the branch has no
/// application entry, and `metric not found` when any step of
/// `index._embedded.project.metric_values[metric]` is missing or the stored
/// value is not numeric.
///
/// # Examples
///
/// ```
/// use scrutinizer_badges::{ReportSchema, extract_metric};
///
/// let report = ReportSchema::new("scrutinizer.quality").validate(serde_json::json!({
///     "default_branch": "master",
///     "applications": { "master": { "index": { "_embedded": { "project": {
///         "metric_values": { "scrutinizer.quality": 8.5 }
///     } } } } }
/// }))?;
///
/// let result = extract_metric(&report, None, "scrutinizer.quality")?;
/// assert_eq!(result.branch, "master");
/// assert_eq!(result.value, 8.5);
/// # Ok::<(), scrutinizer_badges::Error>(())
/// ```
pub fn extract_metric(
    report: &Report,
    branch: Option<&str>,
    metric: &str
) -> Result<MetricResult, Error> {
    let (branch, value) = lookup_metric(report, branch, metric)?;
    let value = value.ok_or_else(|| {
        tracing::debug!(branch, metric, "metric missing for branch");
        Error::not_found("metric not found")
    })?;

    Ok(MetricResult {
        branch: branch.to_owned(),
        value
    })
}

/// Resolves the branch and reads `metric` without treating a missing value
/// as an error.
///
/// Returns the effective branch with `None` when any step of the metric
/// path is absent or the stored value is not numeric.
///
/// # Errors
///
/// Returns [`Error::NotFound`] with `branch not found` when the effective
/// branch has no application entry.
pub fn lookup_metric<'a>(
    report: &'a Report,
    branch: Option<&'a str>,
    metric: &str
) -> Result<(&'a str, Option<f64>), Error> {
    let branch = effective_branch(report, branch);

    let application = report.application(branch).ok_or_else(|| {
        tracing::debug!(branch, "branch missing from report applications");
        Error::not_found("branch not found")
    })?;

    let value = application
        .metric(metric)
        .and_then(serde_json::Value::as_f64);

    Ok((branch, value))
}
