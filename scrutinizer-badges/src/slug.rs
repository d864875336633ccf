// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Repository slug assembly and artifact naming.
//!
//! Repository slugs are the `/`-joined path that follows the VCS code in the
//! upstream report URL. Artifact stems are flattened, filesystem-safe names
//! derived from a badge route.

use crate::error::Error;

/// Builder joining validated path segments into a repository slug.
#[derive(Debug, Clone, Default,)]
pub struct RepositorySlug
{
    segments: Vec<String,>,
}

impl RepositorySlug
{
    /// Creates an empty slug builder.
    pub fn builder() -> Self
    {
        Self::default()
    }

    /// Appends a single named segment such as a user or repository.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the trimmed segment is empty or
    /// contains a `/`.
    pub fn segment(mut self, name: &str, value: &str,) -> Result<Self, Error,>
    {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::validation(format!("{name} must not be empty"),),);
        }
        if trimmed.contains('/',) {
            return Err(Error::validation(format!("{name} must be a single path segment"),),);
        }
        self.segments.push(trimmed.to_owned(),);
        Ok(self,)
    }

    /// Appends an opaque slug that may itself span several path segments.
    ///
    /// Leading and trailing slashes are dropped; interior empty segments are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when nothing remains after trimming or an
    /// interior segment is empty.
    pub fn opaque(mut self, value: &str,) -> Result<Self, Error,>
    {
        let trimmed = value.trim().trim_matches('/',);
        if trimmed.is_empty() {
            return Err(Error::validation("slug must not be empty",),);
        }
        if trimmed.split('/',).any(|part| part.trim().is_empty(),) {
            return Err(Error::validation(format!("slug '{trimmed}' contains an empty segment"),),);
        }
        self.segments.push(trimmed.to_owned(),);
        Ok(self,)
    }

    /// Joins the collected segments with `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrutinizer_badges::RepositorySlug;
    ///
    /// let slug = RepositorySlug::builder()
    ///     .segment("user", "filp",)?
    ///     .segment("repo", " whoops ",)?
    ///     .build();
    /// assert_eq!(slug, "filp/whoops");
    /// # Ok::<(), scrutinizer_badges::Error>(())
    /// ```
    pub fn build(self,) -> String
    {
        self.segments.join("/",)
    }
}

/// Derives a lowercase, hyphen-separated file stem from a badge route.
///
/// Returns `None` when the route has no ASCII alphanumeric characters.
///
/// # Examples
///
/// ```
/// use scrutinizer_badges::artifact_stem;
///
/// assert_eq!(artifact_stem("/quality/g/filp/whoops/master").as_deref(), Some("quality-g-filp-whoops-master"));
/// ```
pub fn artifact_stem(route: &str,) -> Option<String,>
{
    let stem = route
        .split(|candidate: char| !candidate.is_ascii_alphanumeric(),)
        .filter(|part| !part.is_empty(),)
        .map(str::to_ascii_lowercase,)
        .collect::<Vec<_,>>()
        .join("-",);

    if stem.is_empty() { None } else { Some(stem,) }
}
