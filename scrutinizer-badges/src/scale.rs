// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Discrete colour scales mapping metric values onto badge colours.

/// Ordered thresholds paired with one more colour than there are thresholds.
///
/// A value below the first threshold takes the first colour; a value at or
/// above threshold `i` takes colour `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    thresholds: &'static [f64],
    colors:     &'static [&'static str]
}

/// Scale applied to Scrutinizer quality scores (0 to 10).
pub const QUALITY_SCALE: ColorScale = ColorScale::new(
    &[4.0, 5.0, 7.0, 9.0],
    &["red", "orange", "yellow", "green", "brightgreen"]
);

/// Scale applied to coverage percentages (0 to 100).
pub const COVERAGE_SCALE: ColorScale =
    ColorScale::new(&[40.0, 61.0], &["red", "yellow", "brightgreen"]);

impl ColorScale {
    /// Builds a scale from ascending thresholds and their colours.
    ///
    /// # Panics
    ///
    /// Panics when `colors` does not hold exactly one entry more than
    /// `thresholds`. Scales are constants, so the check runs at compile time.
    pub const fn new(thresholds: &'static [f64], colors: &'static [&'static str]) -> Self {
        assert!(
            colors.len() == thresholds.len() + 1,
            "a colour scale needs one colour more than thresholds"
        );
        Self {
            thresholds,
            colors
        }
    }

    /// Returns the colour of the bucket containing `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrutinizer_badges::QUALITY_SCALE;
    ///
    /// assert_eq!(QUALITY_SCALE.color(6.9), "yellow");
    /// assert_eq!(QUALITY_SCALE.color(9.0), "brightgreen");
    /// ```
    pub fn color(&self, value: f64) -> &'static str {
        let index = self
            .thresholds
            .iter()
            .take_while(|threshold| value >= **threshold)
            .count();
        self.colors[index]
    }

    /// Colours of the scale from lowest to highest bucket.
    pub fn colors(&self) -> &'static [&'static str] {
        self.colors
    }
}
