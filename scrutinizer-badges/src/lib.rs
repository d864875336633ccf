//! Code quality and coverage badges backed by Scrutinizer repository reports.
//!
//! A badge request names a metric, a repository host and a repository slug.
//! The crate fetches the repository report, validates it, reads the metric
//! for the requested branch and maps the value onto a colour scale. The
//! result is a [`BadgeData`] that can be wrapped into a shields.io endpoint
//! document via [`EndpointBadge`].
//!
//! ```no_run
//! use scrutinizer_badges::{HttpReportSource, Route, ServiceConfig};
//!
//! # async fn example() -> Result<(), scrutinizer_badges::Error> {
//! let source = HttpReportSource::new(&ServiceConfig::default())?;
//! let badge = Route::parse("/quality/g/filp/whoops")?.resolve(&source).await?;
//! println!("{} ({})", badge.message, badge.color);
//! # Ok(())
//! # }
//! ```

mod badge;
mod config;
mod error;
mod fetch;
mod metric;
mod report;
pub mod retry;
mod route;
mod scale;
mod slug;

pub use badge::{
    BadgeData, COVERAGE, COVERAGE_METRIC, EndpointBadge, MetricPipeline, QUALITY, QUALITY_METRIC,
    coverage_percentage, format_percentage, format_score, quality_score, write_endpoint_badge,
};
pub use config::{DEFAULT_BASE_URL, ServiceConfig, load_config, parse_config};
pub use error::{Error, badge_io_error, io_error, output_error};
pub use fetch::{HttpReportSource, ReportSource};
pub use metric::{MetricResult, effective_branch, extract_metric, lookup_metric};
pub use report::{Application, ApplicationIndex, EmbeddedResources, Project, Report, ReportSchema};
pub use route::{
    BadgeRequest, HostedVcs, Metric, ROUTE_CATALOG, Route, RouteExample, RouteParams, Vcs, handle,
};
pub use scale::{COVERAGE_SCALE, ColorScale, QUALITY_SCALE};
pub use slug::{RepositorySlug, artifact_stem};
