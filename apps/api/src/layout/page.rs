//! Page geometry shared by the estimator, paginator and both renderers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{get_metrics, FontFamily};

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
}

impl PageFormat {
    pub fn width_mm(self) -> f32 {
        match self {
            PageFormat::A4 => 210.0,
            PageFormat::Letter => 215.9,
        }
    }

    pub fn height_mm(self) -> f32 {
        match self {
            PageFormat::A4 => 297.0,
            PageFormat::Letter => 279.4,
        }
    }
}

impl FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "letter" | "us-letter" => Ok(PageFormat::Letter),
            other => Err(format!("Unknown page format '{other}' (expected a4 or letter)")),
        }
    }
}

/// Layout parameters for one exported document.
///
/// Default: A4, 20 mm margins, Helvetica 12 pt, line spacing 1.2
/// → 257 mm usable height, 170 mm content width, ~5.08 mm per line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayoutConfig {
    pub page_format: PageFormat,
    pub margins_mm: f32,
    pub font: FontFamily,
    pub font_size_pt: f32,
    pub line_spacing: f32,
}

impl Default for PageLayoutConfig {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            margins_mm: 20.0,
            font: FontFamily::Helvetica,
            font_size_pt: 12.0,
            line_spacing: 1.2,
        }
    }
}

impl PageLayoutConfig {
    pub fn page_width_mm(&self) -> f32 {
        self.page_format.width_mm()
    }

    pub fn page_height_mm(&self) -> f32 {
        self.page_format.height_mm()
    }

    /// Page height minus top and bottom margins.
    pub fn usable_height_mm(&self) -> f32 {
        self.page_height_mm() - 2.0 * self.margins_mm
    }

    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm() - 2.0 * self.margins_mm
    }

    pub fn line_height_mm(&self) -> f32 {
        self.font_size_pt * self.line_spacing * MM_PER_PT
    }

    /// Size of one em in millimetres at the configured font size.
    pub fn em_mm(&self) -> f32 {
        self.font_size_pt * MM_PER_PT
    }

    /// Converts a width in millimetres to em units at the configured font size.
    pub fn width_em(&self, width_mm: f32) -> f32 {
        width_mm / self.em_mm()
    }

    /// Average characters per full content line, used by the character heuristic.
    pub fn chars_per_line(&self, width_mm: f32) -> usize {
        let avg = get_metrics(self.font).average_char_width;
        ((self.width_em(width_mm) / avg).floor() as usize).max(1)
    }

    /// Rejects geometry that leaves no printable area.
    pub fn validate(&self) -> Result<(), String> {
        if !(6.0..=36.0).contains(&self.font_size_pt) {
            return Err(format!(
                "Font size must be between 6 and 36 pt (got {}).",
                self.font_size_pt
            ));
        }
        if !(1.0..=3.0).contains(&self.line_spacing) {
            return Err(format!(
                "Line spacing must be between 1.0 and 3.0 (got {}).",
                self.line_spacing
            ));
        }
        if self.margins_mm < 0.0 || self.content_width_mm() < 50.0 || self.usable_height_mm() < 50.0
        {
            return Err(format!(
                "Margins of {} mm leave too little room on a {:?} page.",
                self.margins_mm, self.page_format
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_usable_height_is_257mm() {
        let config = PageLayoutConfig::default();
        assert!((config.usable_height_mm() - 257.0).abs() < 1e-4);
        assert!((config.content_width_mm() - 170.0).abs() < 1e-4);
    }

    #[test]
    fn test_line_height_at_12pt() {
        let config = PageLayoutConfig::default();
        // 12 pt × 1.2 = 14.4 pt ≈ 5.08 mm
        assert!((config.line_height_mm() - 5.08).abs() < 0.01);
    }

    #[test]
    fn test_letter_dimensions() {
        let config = PageLayoutConfig {
            page_format: PageFormat::Letter,
            ..Default::default()
        };
        assert!((config.usable_height_mm() - 239.4).abs() < 1e-3);
    }

    #[test]
    fn test_page_format_parse() {
        assert_eq!("A4".parse::<PageFormat>().unwrap(), PageFormat::A4);
        assert_eq!("letter".parse::<PageFormat>().unwrap(), PageFormat::Letter);
        assert!("legal".parse::<PageFormat>().is_err());
    }

    #[test]
    fn test_chars_per_line_reasonable() {
        let config = PageLayoutConfig::default();
        let cpl = config.chars_per_line(config.content_width_mm());
        assert!((70..=110).contains(&cpl), "got {cpl}");
    }

    #[test]
    fn test_validate_rejects_huge_margins() {
        let config = PageLayoutConfig {
            margins_mm: 90.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(PageLayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: PageLayoutConfig =
            serde_json::from_value(serde_json::json!({ "font_size_pt": 11.0 })).unwrap();
        assert_eq!(config.page_format, PageFormat::A4);
        assert_eq!(config.font_size_pt, 11.0);
    }
}
