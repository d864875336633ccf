// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Badge routes and their translation into report requests.
//!
//! Three route families exist for each metric:
//!
//! | Family    | Path                                                | Slug                    |
//! |-----------|-----------------------------------------------------|-------------------------|
//! | Hosted    | `/{metric}/{g\|b}/{user}/{repo}[/{branch}]`         | `user/repo`             |
//! | GitLab    | `/{metric}/gl/{instance}/{user}/{repo}[/{branch}]`  | `instance/user/repo`    |
//! | Plain Git | `/{metric}/gp/{slug}[/{branch}]`                    | `slug`                  |
//!
//! Handlers only assemble a [`BadgeRequest`]; all metric logic lives in
//! [`crate::badge`].

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    badge::{BadgeData, COVERAGE, MetricPipeline, QUALITY},
    error::Error,
    fetch::ReportSource,
    slug::RepositorySlug,
};

/// Version control hosts understood by the Scrutinizer API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vcs {
    /// github.com, code `g`.
    GitHub,
    /// bitbucket.org, code `b`.
    Bitbucket,
    /// Any GitLab instance, code `gl`.
    GitLab,
    /// Plain Git remotes, code `gp`.
    PlainGit,
}

impl Vcs {
    /// Code used in both badge routes and upstream URLs.
    pub fn code(self) -> &'static str {
        match self {
            Self::GitHub => "g",
            Self::Bitbucket => "b",
            Self::GitLab => "gl",
            Self::PlainGit => "gp",
        }
    }
}

impl fmt::Display for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Hosts addressed through the `user/repo` route family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostedVcs {
    GitHub,
    Bitbucket,
}

impl From<HostedVcs> for Vcs {
    fn from(value: HostedVcs) -> Self {
        match value {
            HostedVcs::GitHub => Vcs::GitHub,
            HostedVcs::Bitbucket => Vcs::Bitbucket,
        }
    }
}

impl FromStr for HostedVcs {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "g" => Ok(Self::GitHub),
            "b" => Ok(Self::Bitbucket),
            other => Err(Error::validation(format!(
                "unsupported vcs '{other}', expected one of g, b, gl, gp"
            ))),
        }
    }
}

/// Metric rendered by a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Quality,
    Coverage,
}

impl Metric {
    /// Route segment naming the metric.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Coverage => "coverage",
        }
    }

    /// Pipeline producing badges for this metric.
    pub fn pipeline(self) -> &'static MetricPipeline {
        match self {
            Self::Quality => &QUALITY,
            Self::Coverage => &COVERAGE,
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "quality" => Ok(Self::Quality),
            "coverage" => Ok(Self::Coverage),
            other => Err(Error::validation(format!(
                "unsupported metric '{other}', expected quality or coverage"
            ))),
        }
    }
}

/// Fully resolved upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeRequest {
    /// Host of the repository.
    pub vcs:    Vcs,
    /// Repository path following the VCS code.
    pub slug:   String,
    /// Branch to report on; the report default applies when `None`.
    pub branch: Option<String>,
}

/// Parameters captured by one of the three route families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteParams {
    /// GitHub or Bitbucket repository.
    Hosted {
        vcs:    HostedVcs,
        user:   String,
        repo:   String,
        branch: Option<String>,
    },
    /// Repository on a GitLab instance.
    GitLab {
        instance: String,
        user:     String,
        repo:     String,
        branch:   Option<String>,
    },
    /// Plain Git remote identified by an opaque slug.
    PlainGit { slug: String, branch: Option<String> },
}

impl RouteParams {
    /// Assembles the VCS identifier and slug for the upstream request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a slug segment is blank or, for the
    /// named segments, contains a `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrutinizer_badges::{RouteParams, Vcs};
    ///
    /// let request = RouteParams::GitLab {
    ///     instance: "propertywindow".to_owned(),
    ///     user:     "propertywindow".to_owned(),
    ///     repo:     "client".to_owned(),
    ///     branch:   None,
    /// }
    /// .into_request()?;
    /// assert_eq!(request.vcs, Vcs::GitLab);
    /// assert_eq!(request.slug, "propertywindow/propertywindow/client");
    /// # Ok::<(), scrutinizer_badges::Error>(())
    /// ```
    pub fn into_request(self) -> Result<BadgeRequest, Error> {
        let (vcs, slug, branch) = match self {
            Self::Hosted {
                vcs,
                user,
                repo,
                branch,
            } => {
                let slug = RepositorySlug::builder()
                    .segment("user", &user)?
                    .segment("repo", &repo)?
                    .build();
                (vcs.into(), slug, branch)
            }
            Self::GitLab {
                instance,
                user,
                repo,
                branch,
            } => {
                let slug = RepositorySlug::builder()
                    .segment("instance", &instance)?
                    .segment("user", &user)?
                    .segment("repo", &repo)?
                    .build();
                (Vcs::GitLab, slug, branch)
            }
            Self::PlainGit { slug, branch } => {
                let slug = RepositorySlug::builder().opaque(&slug)?.build();
                (Vcs::PlainGit, slug, branch)
            }
        };

        Ok(BadgeRequest {
            vcs,
            slug,
            branch: branch.filter(|name| !name.is_empty()),
        })
    }
}

/// A parsed badge route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub metric: Metric,
    pub params: RouteParams,
}

impl Route {
    /// Parses a badge path such as `/quality/g/filp/whoops/master`.
    ///
    /// An optional `scrutinizer/` prefix and a `.json` or `.svg` extension
    /// are accepted. Segments are percent-decoded; every segment after the
    /// fixed parameters belongs to the branch, so `release/1.x` needs no
    /// escaping. A plain Git slug containing `/` must be written as `%2F`.
    ///
    /// The extension is stripped before the path is split, so a branch whose
    /// name ends in `.json` or `.svg` (such as `fix.json`) loses that suffix
    /// and cannot be addressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unknown metrics or hosts, missing
    /// segments, empty segments, or invalid percent-encoding.
    pub fn parse(path: &str) -> Result<Self, Error> {
        let trimmed = path.trim().trim_matches('/');
        let trimmed = trimmed.strip_prefix("scrutinizer/").unwrap_or(trimmed);
        let trimmed = [".json", ".svg"]
            .iter()
            .find_map(|extension| trimmed.strip_suffix(extension))
            .unwrap_or(trimmed);

        let segments = trimmed
            .split('/')
            .map(decode_segment)
            .collect::<Result<Vec<_>, _>>()?;

        let [metric, vcs, rest @ ..] = segments.as_slice() else {
            return Err(Error::validation(format!(
                "route '{path}' must name a metric and a vcs"
            )));
        };
        let metric = metric.parse::<Metric>()?;

        let params = match vcs.as_str() {
            "gl" => {
                let [instance, user, repo, branch @ ..] = rest else {
                    return Err(Error::validation(format!(
                        "route '{path}' must provide instance, user and repo"
                    )));
                };
                RouteParams::GitLab {
                    instance: instance.clone(),
                    user:     user.clone(),
                    repo:     repo.clone(),
                    branch:   join_branch(branch),
                }
            }
            "gp" => {
                let [slug, branch @ ..] = rest else {
                    return Err(Error::validation(format!(
                        "route '{path}' must provide a slug"
                    )));
                };
                RouteParams::PlainGit {
                    slug:   slug.clone(),
                    branch: join_branch(branch),
                }
            }
            hosted => {
                let vcs = hosted.parse::<HostedVcs>()?;
                let [user, repo, branch @ ..] = rest else {
                    return Err(Error::validation(format!(
                        "route '{path}' must provide user and repo"
                    )));
                };
                RouteParams::Hosted {
                    vcs,
                    user: user.clone(),
                    repo: repo.clone(),
                    branch: join_branch(branch),
                }
            }
        };

        Ok(Self { metric, params })
    }

    /// Resolves the route into badge data using `source`.
    ///
    /// # Errors
    ///
    /// Propagates slug validation, fetch, schema, and not-found errors.
    pub async fn resolve<S>(self, source: &S) -> Result<BadgeData, Error>
    where
        S: ReportSource + Sync,
    {
        handle(self.metric, self.params, source).await
    }
}

/// Shared handler behind every route: assemble the request and delegate to
/// the metric pipeline.
///
/// # Errors
///
/// Propagates slug validation errors and every error of
/// [`MetricPipeline::make_badge`].
pub async fn handle<S>(metric: Metric, params: RouteParams, source: &S) -> Result<BadgeData, Error>
where
    S: ReportSource + Sync,
{
    let request = params.into_request()?;
    metric.pipeline().make_badge(source, &request).await
}

fn decode_segment(segment: &str) -> Result<String, Error> {
    if segment.is_empty() {
        return Err(Error::validation("route contains an empty segment"));
    }
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .map_err(|error| Error::validation(format!("invalid percent-encoding in '{segment}': {error}")))
}

fn join_branch(segments: &[String]) -> Option<String> {
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Documented route pattern with a working example path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteExample {
    pub metric:  Metric,
    pub pattern: &'static str,
    pub example: &'static str,
}

/// Every documented badge route, with and without a branch.
pub const ROUTE_CATALOG: &[RouteExample] = &[
    RouteExample {
        metric:  Metric::Quality,
        pattern: "/quality/{vcs}/{user}/{repo}",
        example: "/quality/g/filp/whoops",
    },
    RouteExample {
        metric:  Metric::Quality,
        pattern: "/quality/{vcs}/{user}/{repo}/{branch}",
        example: "/quality/g/filp/whoops/master",
    },
    RouteExample {
        metric:  Metric::Quality,
        pattern: "/quality/gl/{instance}/{user}/{repo}",
        example: "/quality/gl/propertywindow/propertywindow/client",
    },
    RouteExample {
        metric:  Metric::Quality,
        pattern: "/quality/gl/{instance}/{user}/{repo}/{branch}",
        example: "/quality/gl/propertywindow/propertywindow/client/master",
    },
    RouteExample {
        metric:  Metric::Quality,
        pattern: "/quality/gp/{slug}",
        example: "/quality/gp/acme-corp%2Fbilling",
    },
    RouteExample {
        metric:  Metric::Quality,
        pattern: "/quality/gp/{slug}/{branch}",
        example: "/quality/gp/acme-corp%2Fbilling/develop",
    },
    RouteExample {
        metric:  Metric::Coverage,
        pattern: "/coverage/{vcs}/{user}/{repo}",
        example: "/coverage/g/filp/whoops",
    },
    RouteExample {
        metric:  Metric::Coverage,
        pattern: "/coverage/{vcs}/{user}/{repo}/{branch}",
        example: "/coverage/b/atlassian/python-bitbucket/master",
    },
    RouteExample {
        metric:  Metric::Coverage,
        pattern: "/coverage/gl/{instance}/{user}/{repo}",
        example: "/coverage/gl/propertywindow/propertywindow/client",
    },
    RouteExample {
        metric:  Metric::Coverage,
        pattern: "/coverage/gl/{instance}/{user}/{repo}/{branch}",
        example: "/coverage/gl/propertywindow/propertywindow/client/master",
    },
    RouteExample {
        metric:  Metric::Coverage,
        pattern: "/coverage/gp/{slug}",
        example: "/coverage/gp/acme-corp%2Fbilling",
    },
    RouteExample {
        metric:  Metric::Coverage,
        pattern: "/coverage/gp/{slug}/{branch}",
        example: "/coverage/gp/acme-corp%2Fbilling/develop",
    },
];
