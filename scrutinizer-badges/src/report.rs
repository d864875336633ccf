// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Typed model of the repository report returned by Scrutinizer.
//!
//! Reports are decoded in two steps. Serde enforces the structural shape
//! (`default_branch` and `applications` are mandatory, everything below a
//! branch entry is optional) and [`ReportSchema::validate`] then checks the
//! metric the caller is interested in. Keys the model does not name are
//! ignored, so unrelated parts of the upstream document never fail
//! validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Repository report as served by `GET /api/repositories/{vcs}/{slug}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Report {
    /// Branch used when the caller does not select one.
    pub default_branch: String,
    /// Per-branch analysis entries keyed by branch name.
    pub applications:   BTreeMap<String, Application>
}

/// Analysis entry for a single branch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Application {
    /// Latest inspection index of the branch, absent for unanalysed branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<ApplicationIndex>
}

/// Inspection index wrapping the embedded project resource.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ApplicationIndex {
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<EmbeddedResources>
}

/// HAL `_embedded` block of an inspection index.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EmbeddedResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>
}

/// Project resource carrying the computed metrics.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Project {
    /// Metric values keyed by metric name, such as `scrutinizer.quality`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_values: Option<BTreeMap<String, Value>>
}

impl Report {
    /// Returns the application entry for `branch`.
    pub fn application(&self, branch: &str) -> Option<&Application> {
        self.applications.get(branch)
    }
}

impl Application {
    /// Returns the metric map when the full `index._embedded.project` path
    /// is present.
    pub fn metric_values(&self) -> Option<&BTreeMap<String, Value>> {
        self.index
            .as_ref()?
            .embedded
            .as_ref()?
            .project
            .as_ref()?
            .metric_values
            .as_ref()
    }

    /// Returns the raw value stored under `metric`.
    pub fn metric(&self, metric: &str) -> Option<&Value> {
        self.metric_values()?.get(metric)
    }
}

/// Validation rules for a report consumed by a single metric pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSchema {
    metric_key: &'static str
}

impl ReportSchema {
    /// Creates a schema constraining `metric_key`.
    pub const fn new(metric_key: &'static str) -> Self {
        Self {
            metric_key
        }
    }

    /// Metric key whose values are constrained by this schema.
    pub fn metric_key(&self) -> &'static str {
        self.metric_key
    }

    /// Converts a raw JSON document into a validated [`Report`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when the document lacks the mandatory
    /// fields, has values of the wrong type, or carries a value for the
    /// schema's metric that is not a finite, strictly positive number.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrutinizer_badges::ReportSchema;
    ///
    /// let document = serde_json::json!({
    ///     "default_branch": "master",
    ///     "applications": {}
    /// });
    /// let report = ReportSchema::new("scrutinizer.quality").validate(document)?;
    /// assert_eq!(report.default_branch, "master");
    /// # Ok::<(), scrutinizer_badges::Error>(())
    /// ```
    pub fn validate(&self, document: Value) -> Result<Report, Error> {
        let report: Report = serde_json::from_value(document)
            .map_err(|error| Error::schema(error.to_string()))?;

        for (branch, application) in &report.applications {
            let Some(value) = application.metric(self.metric_key) else {
                continue;
            };

            let valid = value
                .as_f64()
                .is_some_and(|number| number.is_finite() && number > 0.0);
            if !valid {
                return Err(Error::schema(format!(
                    "applications.{branch}.index._embedded.project.metric_values[\"{}\"] must be a positive number, got {value}",
                    self.metric_key
                )));
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const QUALITY: ReportSchema = ReportSchema::new("scrutinizer.quality");

    fn report_with(value: Value) -> Value {
        json!({
            "default_branch": "master",
            "applications": {
                "master": {
                    "index": {
                        "_embedded": {
                            "project": {
                                "metric_values": {
                                    "scrutinizer.quality": value,
                                    "scrutinizer.nb_issues": 0
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn validate_accepts_positive_metric() {
        let report = QUALITY.validate(report_with(json!(8.5))).expect("valid report");
        let application = report.application("master").expect("master entry");
        assert_eq!(application.metric("scrutinizer.quality"), Some(&json!(8.5)));
    }

    #[test]
    fn validate_ignores_other_metric_keys() {
        let report = QUALITY.validate(report_with(json!(3))).expect("valid report");
        let application = report.application("master").expect("master entry");
        assert_eq!(application.metric("scrutinizer.nb_issues"), Some(&json!(0)));
    }

    #[test]
    fn validate_rejects_zero_and_negative_metric() {
        for value in [json!(0), json!(-1.5), json!("8.5"), Value::Null] {
            let error = QUALITY.validate(report_with(value)).expect_err("invalid metric");
            assert!(matches!(error, Error::Schema { .. }), "unexpected error: {error:?}");
        }
    }

    #[test]
    fn validate_requires_default_branch() {
        let error = QUALITY
            .validate(json!({ "applications": {} }))
            .expect_err("missing default branch");
        match error {
            Error::Schema {
                message
            } => assert!(message.contains("default_branch")),
            other => panic!("unexpected error variant: {other:?}")
        }
    }

    #[test]
    fn validate_requires_applications_object() {
        let missing = QUALITY.validate(json!({ "default_branch": "master" }));
        assert!(matches!(missing, Err(Error::Schema { .. })));

        let wrong_type = QUALITY.validate(json!({ "default_branch": "master", "applications": [] }));
        assert!(matches!(wrong_type, Err(Error::Schema { .. })));
    }

    #[test]
    fn branch_entries_may_omit_metric_path() {
        let document = json!({
            "default_branch": "master",
            "applications": {
                "master": {},
                "develop": { "index": {} },
                "feature": { "index": { "_embedded": { "project": {} } } }
            },
            "repository_name": "ignored"
        });
        let report = QUALITY.validate(document).expect("structurally valid");
        assert_eq!(report.applications.len(), 3);
        assert!(report.applications.values().all(|app| app.metric_values().is_none()));
    }
}
