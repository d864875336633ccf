// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Metric badge pipelines and badge document output.
//!
//! A [`MetricPipeline`] bundles everything that differs between the quality
//! and coverage badges: the metric key validated in the report, the step
//! turning a report into a displayable number, the number formatter and the
//! colour scale. [`QUALITY`] and [`COVERAGE`] are the two instances; both
//! share [`MetricPipeline::make_badge`].

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf}
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{self, Error},
    fetch::ReportSource,
    metric::{effective_branch, extract_metric, lookup_metric},
    report::{Report, ReportSchema},
    route::BadgeRequest,
    scale::{COVERAGE_SCALE, ColorScale, QUALITY_SCALE}
};

/// Metric key of the quality score.
pub const QUALITY_METRIC: &str = "scrutinizer.quality";
/// Metric key of the test coverage ratio.
pub const COVERAGE_METRIC: &str = "scrutinizer.test_coverage";

/// Message and colour handed to a badge renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeData {
    /// Text shown on the right-hand side of the badge.
    pub message: String,
    /// Named colour of the message side.
    pub color:   String
}

impl BadgeData {
    /// Renders an error as a badge: `red` for not-found outcomes and
    /// `lightgrey` for everything else.
    pub fn from_error(error: &Error) -> Self {
        let color = if error.is_not_found() { "red" } else { "lightgrey" };
        Self {
            message: error.pretty_message(),
            color:   color.to_owned()
        }
    }
}

/// shields.io endpoint document describing a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointBadge {
    /// Endpoint schema version, always `1`.
    pub schema_version: u8,
    /// Text shown on the left-hand side of the badge.
    pub label:          String,
    /// Text shown on the right-hand side of the badge.
    pub message:        String,
    /// Named colour of the message side.
    pub color:          String
}

impl EndpointBadge {
    /// Wraps `badge` with `label`.
    pub fn new(label: &str, badge: BadgeData) -> Self {
        Self {
            schema_version: 1,
            label:          label.to_owned(),
            message:        badge.message,
            color:          badge.color
        }
    }
}

/// Configuration of one metric badge.
#[derive(Debug, Clone, Copy)]
pub struct MetricPipeline {
    /// Default badge label.
    pub label:     &'static str,
    /// Schema applied to fetched reports.
    pub schema:    ReportSchema,
    /// Colour scale applied to the transformed value.
    pub scale:     ColorScale,
    /// Turns a validated report and branch selector into the displayed value.
    pub transform: fn(&Report, Option<&str>) -> Result<f64, Error>,
    /// Formats the transformed value as the badge message.
    pub format:    fn(f64) -> String
}

/// Code quality score badge.
pub const QUALITY: MetricPipeline = MetricPipeline {
    label:     "code quality",
    schema:    ReportSchema::new(QUALITY_METRIC),
    scale:     QUALITY_SCALE,
    transform: quality_score,
    format:    format_score
};

/// Test coverage percentage badge.
pub const COVERAGE: MetricPipeline = MetricPipeline {
    label:     "coverage",
    schema:    ReportSchema::new(COVERAGE_METRIC),
    scale:     COVERAGE_SCALE,
    transform: coverage_percentage,
    format:    format_percentage
};

impl MetricPipeline {
    /// Formats `value` and picks its colour from the unrounded value.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrutinizer_badges::QUALITY;
    ///
    /// let badge = QUALITY.render(8.333);
    /// assert_eq!(badge.message, "8.33");
    /// assert_eq!(badge.color, "green");
    /// ```
    pub fn render(&self, value: f64) -> BadgeData {
        BadgeData {
            message: (self.format)(value),
            color:   self.scale.color(value).to_owned()
        }
    }

    /// Extracts the displayed value for `branch` from a validated report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the branch or metric is missing.
    pub fn transform(&self, report: &Report, branch: Option<&str>) -> Result<f64, Error> {
        (self.transform)(report, branch)
    }

    /// Fetches, validates and renders the badge for `request`.
    ///
    /// # Errors
    ///
    /// Fetch errors propagate unmodified, schema violations surface as
    /// [`Error::Schema`] and missing data as [`Error::NotFound`].
    pub async fn make_badge<S>(&self, source: &S, request: &BadgeRequest) -> Result<BadgeData, Error>
    where
        S: ReportSource + Sync + ?Sized
    {
        let document = source.fetch(request.vcs, &request.slug).await?;
        let report = self.schema.validate(document)?;
        let value = self.transform(&report, request.branch.as_deref())?;

        debug!(
            metric = self.schema.metric_key(),
            vcs = %request.vcs,
            slug = %request.slug,
            branch = effective_branch(&report, request.branch.as_deref()),
            value,
            "rendering metric badge"
        );

        Ok(self.render(value))
    }

    /// Attaches the pipeline label to `badge`.
    pub fn endpoint(&self, badge: BadgeData) -> EndpointBadge {
        EndpointBadge::new(self.label, badge)
    }
}

/// Quality score of the selected branch.
///
/// # Errors
///
/// Returns the not-found errors of [`extract_metric`].
pub fn quality_score(report: &Report, branch: Option<&str>) -> Result<f64, Error> {
    extract_metric(report, branch, QUALITY_METRIC).map(|result| result.value)
}

/// Coverage of the selected branch as a percentage.
///
/// The upstream value is a ratio in `[0, 1]`. A missing, zero or negative
/// value is reported as `coverage not found`; the report schema already
/// rejects non-positive values, so a genuine 0% report cannot be told apart
/// from a missing one here.
///
/// # Errors
///
/// Returns `branch not found` for unknown branches and `coverage not found`
/// when the branch carries no usable coverage value.
pub fn coverage_percentage(report: &Report, branch: Option<&str>) -> Result<f64, Error> {
    let (_, ratio) = lookup_metric(report, branch, COVERAGE_METRIC)?;
    match ratio {
        Some(ratio) if ratio > 0.0 => Ok(ratio * 100.0),
        _ => Err(Error::not_found("coverage not found"))
    }
}

/// Formats a score rounded to two decimals without trailing zeros.
pub fn format_score(score: f64) -> String {
    let rounded = (score * 100.0).round() / 100.0;
    format!("{rounded}")
}

/// Formats a percentage rounded to the nearest integer.
pub fn format_percentage(percentage: f64) -> String {
    format!("{}%", percentage.round())
}

/// Writes `badge` as pretty JSON to `output_dir/{stem}.json`.
///
/// The directory hierarchy is created when missing.
///
/// # Errors
///
/// Returns [`Error::BadgeIo`] when directories or files cannot be created
/// and [`Error::Serialize`] if the document cannot be encoded.
pub fn write_endpoint_badge(
    output_dir: &Path,
    stem: &str,
    badge: &EndpointBadge
) -> Result<PathBuf, Error> {
    fs::create_dir_all(output_dir).map_err(|source| error::badge_io_error(output_dir, source))?;

    let path = output_dir.join(format!("{stem}.json"));
    let file = File::create(&path).map_err(|source| error::badge_io_error(&path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, badge)?;
    writer
        .write_all(b"\n")
        .map_err(|source| error::badge_io_error(&path, source))?;
    writer
        .flush()
        .map_err(|source| error::badge_io_error(&path, source))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering}
        }
    };

    use serde_json::{Value, json};
    use tempfile::tempdir;

    use super::*;
    use crate::route::{RouteParams, Vcs, handle, Metric};

    struct StaticSource {
        document: Value,
        calls:    AtomicUsize,
        requests: Mutex<Vec<(Vcs, String)>>
    }

    impl StaticSource {
        fn new(document: Value) -> Self {
            Self {
                document,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new())
            }
        }
    }

    impl ReportSource for StaticSource {
        async fn fetch(&self, vcs: Vcs, slug: &str) -> Result<Value, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("requests lock")
                .push((vcs, slug.to_owned()));
            Ok(self.document.clone())
        }
    }

    struct FailingSource;

    impl ReportSource for FailingSource {
        async fn fetch(&self, _vcs: Vcs, _slug: &str) -> Result<Value, Error> {
            Err(Error::Upstream {
                status:  404,
                message: "project not found".to_owned()
            })
        }
    }

    fn branch(metrics: Value) -> Value {
        json!({ "index": { "_embedded": { "project": { "metric_values": metrics } } } })
    }

    fn sample_document() -> Value {
        json!({
            "default_branch": "master",
            "applications": {
                "master": branch(json!({
                    "scrutinizer.quality": 8.5,
                    "scrutinizer.test_coverage": 0.755
                })),
                "legacy": branch(json!({ "scrutinizer.quality": 3.2 })),
                "empty": {}
            }
        })
    }

    fn hosted_request(branch: Option<&str>) -> BadgeRequest {
        BadgeRequest {
            vcs:    Vcs::GitHub,
            slug:   "filp/whoops".to_owned(),
            branch: branch.map(str::to_owned)
        }
    }

    fn coverage_report(value: Value) -> Report {
        serde_json::from_value(json!({
            "default_branch": "master",
            "applications": { "master": branch(json!({ "scrutinizer.test_coverage": value })) }
        }))
        .expect("coverage report")
    }

    #[test]
    fn quality_render_rounds_to_two_decimals() {
        assert_eq!(QUALITY.render(7.5), BadgeData {
            message: "7.5".to_owned(),
            color:   "green".to_owned()
        });
        assert_eq!(QUALITY.render(8.333), BadgeData {
            message: "8.33".to_owned(),
            color:   "green".to_owned()
        });
        assert_eq!(QUALITY.render(10.0).message, "10");
    }

    #[test]
    fn quality_color_uses_unrounded_score() {
        let badge = QUALITY.render(8.999);
        assert_eq!(badge.message, "9");
        assert_eq!(badge.color, "green");
    }

    #[test]
    fn coverage_transform_converts_ratio_to_percentage() {
        let report = coverage_report(json!(0.755));
        let coverage = COVERAGE.transform(&report, None).expect("coverage present");
        assert!((coverage - 75.5).abs() < 1e-9);
        assert_eq!(COVERAGE.render(coverage), BadgeData {
            message: "76%".to_owned(),
            color:   "brightgreen".to_owned()
        });
    }

    #[test]
    fn zero_coverage_is_reported_as_not_found() {
        let report = coverage_report(json!(0));
        let error = COVERAGE.transform(&report, None).expect_err("zero coverage");
        assert!(matches!(error, Error::NotFound { ref message } if message == "coverage not found"));
    }

    #[test]
    fn absent_coverage_is_reported_as_not_found() {
        let report: Report = serde_json::from_value(sample_document()).expect("report");
        let error = COVERAGE
            .transform(&report, Some("legacy"))
            .expect_err("legacy has no coverage");
        assert_eq!(error.pretty_message(), "coverage not found");

        let error = COVERAGE
            .transform(&report, Some("empty"))
            .expect_err("empty branch entry");
        assert_eq!(error.pretty_message(), "coverage not found");
    }

    #[test]
    fn coverage_for_unknown_branch_reports_branch() {
        let report: Report = serde_json::from_value(sample_document()).expect("report");
        let error = COVERAGE
            .transform(&report, Some("unknown"))
            .expect_err("unknown branch");
        assert_eq!(error.pretty_message(), "branch not found");
    }

    #[test]
    fn coverage_scale_boundaries_render_expected_colors() {
        assert_eq!(COVERAGE.render(39.0).color, "red");
        assert_eq!(COVERAGE.render(40.0).color, "yellow");
        assert_eq!(COVERAGE.render(60.0).color, "yellow");
        assert_eq!(COVERAGE.render(61.0).color, "brightgreen");
    }

    #[tokio::test]
    async fn make_badge_renders_default_branch_quality() {
        let source = StaticSource::new(sample_document());
        let badge = QUALITY
            .make_badge(&source, &hosted_request(None))
            .await
            .expect("badge");
        assert_eq!(badge, BadgeData {
            message: "8.5".to_owned(),
            color:   "green".to_owned()
        });
    }

    #[tokio::test]
    async fn make_badge_is_idempotent() {
        let source = StaticSource::new(sample_document());
        let request = hosted_request(Some("legacy"));
        let first = QUALITY.make_badge(&source, &request).await.expect("first");
        let second = QUALITY.make_badge(&source, &request).await.expect("second");
        assert_eq!(first, second);
        assert_eq!(first.color, "red");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn make_badge_rejects_schema_violations() {
        let source = StaticSource::new(json!({ "applications": {} }));
        let error = QUALITY
            .make_badge(&source, &hosted_request(None))
            .await
            .expect_err("missing default_branch");
        assert!(matches!(error, Error::Schema { .. }));
        assert_eq!(BadgeData::from_error(&error).color, "lightgrey");
    }

    #[tokio::test]
    async fn make_badge_propagates_fetch_errors() {
        let error = COVERAGE
            .make_badge(&FailingSource, &hosted_request(None))
            .await
            .expect_err("fetch fails");
        assert!(matches!(error, Error::Upstream { status: 404, .. }));
        assert_eq!(BadgeData::from_error(&error), BadgeData {
            message: "project not found".to_owned(),
            color:   "red".to_owned()
        });
    }

    #[tokio::test]
    async fn gitlab_handler_fetches_instance_slug() {
        let source = StaticSource::new(sample_document());
        let params = RouteParams::GitLab {
            instance: "propertywindow".to_owned(),
            user:     "propertywindow".to_owned(),
            repo:     "client".to_owned(),
            branch:   None
        };

        let badge = handle(Metric::Coverage, params, &source).await.expect("badge");
        assert_eq!(badge.message, "76%");

        let requests = source.requests.lock().expect("requests lock");
        assert_eq!(requests.as_slice(), &[(
            Vcs::GitLab,
            "propertywindow/propertywindow/client".to_owned()
        )]);
    }

    #[test]
    fn endpoint_badge_serializes_shields_schema() {
        let endpoint = QUALITY.endpoint(QUALITY.render(7.5));
        let value = serde_json::to_value(&endpoint).expect("serializable");
        assert_eq!(value, json!({
            "schemaVersion": 1,
            "label": "code quality",
            "message": "7.5",
            "color": "green"
        }));
    }

    #[test]
    fn write_endpoint_badge_creates_json_file() {
        let directory = tempdir().expect("failed to create temp dir");
        let output_dir = directory.path().join("badges");
        let endpoint = COVERAGE.endpoint(COVERAGE.render(42.0));

        let path = write_endpoint_badge(&output_dir, "coverage-g-filp-whoops", &endpoint)
            .expect("write should succeed");

        assert_eq!(path, output_dir.join("coverage-g-filp-whoops.json"));
        let contents = fs::read_to_string(&path).expect("should read badge");
        let parsed: BTreeMap<String, Value> = serde_json::from_str(&contents).expect("json");
        assert_eq!(parsed["message"], "42%");
        assert_eq!(parsed["color"], "yellow");
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn write_endpoint_badge_propagates_directory_errors() {
        let directory = tempdir().expect("failed to create temp dir");
        let blocked = directory.path().join("blocked");
        File::create(&blocked).expect("failed to create placeholder file");

        let endpoint = QUALITY.endpoint(QUALITY.render(5.0));
        let error = write_endpoint_badge(&blocked, "quality", &endpoint).expect_err("io failure");
        match error {
            Error::BadgeIo {
                path, ..
            } => assert_eq!(path, blocked),
            other => panic!("unexpected error variant: {other:?}")
        }
    }
}
