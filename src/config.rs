use derive_more::{Deref, From, Into};
use palette::{Srgb, Srgba, WithAlpha};
use serde::Deserialize;
use serde_with::{DeserializeFromStr, DurationMilliSeconds, serde_as};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

/// Slack allowed when checking that the values add up to at most 100.
const TOTAL_TOLERANCE: f64 = 1e-9;

/// Which drawing-surface variant the host mounted.
///
/// `Native` surfaces repaint on their own and come with a per-frame callback;
/// `Buffered` surfaces must be flushed with `present()` and are driven by a
/// fixed interval timer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeserializeFromStr, EnumString, StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum SurfaceKind {
    #[strum(serialize = "native", serialize = "2d")]
    Native,
    #[default]
    #[strum(serialize = "buffered", serialize = "legacy")]
    Buffered,
}

impl SurfaceKind {
    pub fn needs_present(&self) -> bool {
        matches!(self, Self::Buffered)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ColorParseError {
    #[error("invalid hex color '{0}'")]
    InvalidHex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deref, From, Into, DeserializeFromStr)]
pub struct Color(Srgba<f64>);

impl Color {
    pub fn rgba(&self) -> (f64, f64, f64, f64) {
        self.0.into_components()
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rgb: Srgb<u8> = s
            .trim()
            .parse()
            .map_err(|_| ColorParseError::InvalidHex(s.to_string()))?;
        Ok(Self(rgb.into_format::<f64>().with_alpha(1.0)))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rgb: Srgb<u8> = self.0.color.into_format();
        write!(f, "#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
    }
}

/// Builds the text drawn for a segment label from its index and raw value.
#[derive(Clone)]
pub struct LabelFormatter(Rc<dyn Fn(usize, f64) -> String>);

impl LabelFormatter {
    pub fn new(f: impl Fn(usize, f64) -> String + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn format(&self, index: usize, value: f64) -> String {
        (self.0)(index, value)
    }
}

impl fmt::Debug for LabelFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LabelFormatter(..)")
    }
}

pub fn default_label(value: f64) -> String {
    format!("{value}%")
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{colors} segment colors supplied for {values} values")]
    NotEnoughColors { values: usize, colors: usize },
    #[error("value {value} at index {index} is not a finite, non-negative percentage")]
    InvalidValue { index: usize, value: f64 },
    #[error("values add up to {0}, more than 100")]
    TotalExceeded(f64),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("border {border} does not fit a ring of radius {radius}")]
    BorderTooWide { border: f64, radius: f64 },
    #[error("active border {active_border} is thinner than border {border}")]
    ActiveBorderTooThin { border: f64, active_border: f64 },
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Segment values as percentages, drawn clockwise from the positive x axis.
    pub values: Vec<f64>,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    /// Segment emphasised once the animation settles.
    pub active: Option<usize>,
    pub surface: SurfaceKind,
    pub border: f64,
    pub active_border: f64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub duration: Duration,
    pub border_bg_color: Color,
    pub border_colors: Vec<Color>,
    pub tips_color: Color,
    pub tips_size: f64,
    pub center_text: String,
    pub center_text_size: f64,
    pub mask_color: Color,
    pub center_text_color: Color,
    #[serde(skip)]
    pub label_formatter: Option<LabelFormatter>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            width: 200.0,
            height: 200.0,
            radius: 65.0,
            active: None,
            surface: SurfaceKind::default(),
            border: 32.0,
            active_border: 36.0,
            duration: Duration::from_millis(600),
            border_bg_color: hex(0xef, 0xef, 0xef),
            border_colors: vec![
                hex(0x6d, 0x77, 0xe6),
                hex(0xfe, 0x4e, 0x75),
                hex(0xfc, 0xd9, 0x5c),
                hex(0x3b, 0xde, 0xff),
            ],
            tips_color: hex(0xff, 0xff, 0xff),
            tips_size: 8.0,
            center_text: "结果统计".to_string(),
            center_text_size: 16.0,
            mask_color: hex(0xff, 0xff, 0xff),
            center_text_color: hex(0x20, 0x3e, 0x62),
            label_formatter: None,
        }
    }
}

fn hex(r: u8, g: u8, b: u8) -> Color {
    Color(Srgb::new(r, g, b).into_format::<f64>().with_alpha(1.0))
}

impl ChartConfig {
    pub fn with_values(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.values = values.into();
        self
    }

    pub fn with_active(mut self, active: Option<usize>) -> Self {
        self.active = active;
        self
    }

    pub fn with_label_formatter(mut self, formatter: LabelFormatter) -> Self {
        self.label_formatter = Some(formatter);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("radius", self.radius),
            ("border", self.border),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if self.border >= self.radius * 2.0 {
            return Err(ConfigError::BorderTooWide {
                border: self.border,
                radius: self.radius,
            });
        }

        if self.active_border.is_nan() || self.active_border < self.border {
            return Err(ConfigError::ActiveBorderTooThin {
                border: self.border,
                active_border: self.active_border,
            });
        }

        if let Some((index, &value)) = self
            .values
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
        {
            return Err(ConfigError::InvalidValue { index, value });
        }

        let total: f64 = self.values.iter().sum();
        if total > 100.0 + TOTAL_TOLERANCE {
            return Err(ConfigError::TotalExceeded(total));
        }

        if self.border_colors.len() < self.values.len() {
            return Err(ConfigError::NotEnoughColors {
                values: self.values.len(),
                colors: self.border_colors.len(),
            });
        }

        Ok(())
    }

    pub fn label(&self, index: usize, value: f64) -> String {
        self.label_formatter
            .as_ref()
            .map(|f| f.format(index, value))
            .unwrap_or_else(|| default_label(value))
    }

    /// Whether switching to `other` changes the canvas the surface was built for.
    pub fn same_canvas(&self, other: &ChartConfig) -> bool {
        self.width == other.width && self.height == other.height && self.surface == other.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_kind_deserialization() {
        let cases = vec![
            ("\"native\"", SurfaceKind::Native),
            ("\"Native\"", SurfaceKind::Native),
            ("\"2d\"", SurfaceKind::Native),
            ("\"2D\"", SurfaceKind::Native),
            ("\"buffered\"", SurfaceKind::Buffered),
            ("\"LEGACY\"", SurfaceKind::Buffered),
        ];

        for (json, expected) in cases {
            let deserialized: SurfaceKind = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
    }

    #[test]
    fn test_color_parsing() {
        let color: Color = "#6d77e6".parse().unwrap();
        assert_eq!(color.to_string(), "#6d77e6");

        let short: Color = "#fff".parse().unwrap();
        assert_eq!(short.to_string(), "#ffffff");
        assert_eq!(short.rgba(), (1.0, 1.0, 1.0, 1.0));

        assert_eq!(
            "blue".parse::<Color>(),
            Err(ColorParseError::InvalidHex("blue".to_string()))
        );
    }

    #[test]
    fn test_defaults_match_component_props() {
        let config = ChartConfig::default();
        assert_eq!(config.radius, 65.0);
        assert_eq!(config.border, 32.0);
        assert_eq!(config.active_border, 36.0);
        assert_eq!(config.duration, Duration::from_millis(600));
        assert_eq!(config.border_bg_color.to_string(), "#efefef");
        assert_eq!(config.border_colors.len(), 4);
        assert_eq!(config.surface, SurfaceKind::Buffered);
        assert!(config.active.is_none());
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json = r##"{
            "values": [10, 20, 30, 40],
            "active": 2,
            "duration": 250,
            "surface": "native",
            "border_colors": ["#000000", "#111111", "#222222", "#333333"]
        }"##;
        let config: ChartConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.values, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(config.active, Some(2));
        assert_eq!(config.duration, Duration::from_millis(250));
        assert_eq!(config.surface, SurfaceKind::Native);
        assert_eq!(config.border_colors[3].to_string(), "#333333");
        assert_eq!(config.radius, 65.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_malformed_configs() {
        let base = ChartConfig::default();

        let cases = vec![
            (
                base.clone().with_values(vec![20.0; 5]),
                ConfigError::NotEnoughColors {
                    values: 5,
                    colors: 4,
                },
            ),
            (
                base.clone().with_values(vec![60.0, 50.0]),
                ConfigError::TotalExceeded(110.0),
            ),
            (
                base.clone().with_values(vec![10.0, -1.0]),
                ConfigError::InvalidValue {
                    index: 1,
                    value: -1.0,
                },
            ),
            (
                ChartConfig {
                    radius: 0.0,
                    ..base.clone()
                },
                ConfigError::NonPositive {
                    field: "radius",
                    value: 0.0,
                },
            ),
            (
                ChartConfig {
                    border: 140.0,
                    active_border: 150.0,
                    ..base.clone()
                },
                ConfigError::BorderTooWide {
                    border: 140.0,
                    radius: 65.0,
                },
            ),
            (
                ChartConfig {
                    active_border: 30.0,
                    ..base.clone()
                },
                ConfigError::ActiveBorderTooThin {
                    border: 32.0,
                    active_border: 30.0,
                },
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn test_label_formatting() {
        let config = ChartConfig::default();
        assert_eq!(config.label(0, 10.0), "10%");
        assert_eq!(config.label(0, 12.5), "12.5%");

        let config = config.with_label_formatter(LabelFormatter::new(|i, v| format!("#{i}:{v}")));
        assert_eq!(config.label(3, 40.0), "#3:40");
    }
}
