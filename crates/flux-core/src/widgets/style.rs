//! Per-widget appearance overrides.

use crate::error::{FluxError, FluxResult};
use serde::{Deserialize, Serialize};

/// Fully resolved appearance used for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStyle {
    pub text_color: String,
    pub background_color: String,
    pub border_color: String,
    pub opacity: f64,
    pub corner_radius: f64,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            text_color: "#f4f4f5".to_string(),
            background_color: "#18181b".to_string(),
            border_color: "#3f3f46".to_string(),
            opacity: 1.0,
            corner_radius: 12.0,
        }
    }
}

/// Optional overrides; `None` falls back to the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
}

/// Names a single override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleField {
    TextColor,
    BackgroundColor,
    BorderColor,
    Opacity,
    CornerRadius,
}

impl WidgetStyle {
    /// Merge overrides over `defaults`.
    pub fn resolve(&self, defaults: &ResolvedStyle) -> ResolvedStyle {
        ResolvedStyle {
            text_color: self
                .text_color
                .clone()
                .unwrap_or_else(|| defaults.text_color.clone()),
            background_color: self
                .background_color
                .clone()
                .unwrap_or_else(|| defaults.background_color.clone()),
            border_color: self
                .border_color
                .clone()
                .unwrap_or_else(|| defaults.border_color.clone()),
            opacity: self.opacity.unwrap_or(defaults.opacity),
            corner_radius: self.corner_radius.unwrap_or(defaults.corner_radius),
        }
    }

    /// Merge `other`'s set fields into `self`, validating them first.
    pub fn apply(&mut self, other: WidgetStyle) -> FluxResult<()> {
        other.validate()?;
        if other.text_color.is_some() {
            self.text_color = other.text_color;
        }
        if other.background_color.is_some() {
            self.background_color = other.background_color;
        }
        if other.border_color.is_some() {
            self.border_color = other.border_color;
        }
        if other.opacity.is_some() {
            self.opacity = other.opacity;
        }
        if other.corner_radius.is_some() {
            self.corner_radius = other.corner_radius;
        }
        Ok(())
    }

    /// Revert one field to its default.
    pub fn clear(&mut self, field: StyleField) {
        match field {
            StyleField::TextColor => self.text_color = None,
            StyleField::BackgroundColor => self.background_color = None,
            StyleField::BorderColor => self.border_color = None,
            StyleField::Opacity => self.opacity = None,
            StyleField::CornerRadius => self.corner_radius = None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == WidgetStyle::default()
    }

    pub fn validate(&self) -> FluxResult<()> {
        for color in [&self.text_color, &self.background_color, &self.border_color]
            .into_iter()
            .flatten()
        {
            if !is_hex_color(color) {
                return Err(FluxError::Config(format!("Invalid color: {}", color)));
            }
        }
        if let Some(opacity) = self.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(FluxError::Config(format!("Opacity out of range: {}", opacity)));
            }
        }
        if let Some(radius) = self.corner_radius {
            if !(radius >= 0.0) {
                return Err(FluxError::Config(format!("Negative corner radius: {}", radius)));
            }
        }
        Ok(())
    }
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`.
fn is_hex_color(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_merges_over_defaults() {
        let style = WidgetStyle {
            background_color: Some("#ff0000".to_string()),
            opacity: Some(0.5),
            ..Default::default()
        };
        let resolved = style.resolve(&ResolvedStyle::default());

        assert_eq!(resolved.background_color, "#ff0000");
        assert_eq!(resolved.opacity, 0.5);
        assert_eq!(resolved.text_color, ResolvedStyle::default().text_color);
    }

    #[test]
    fn test_clear_reverts_to_default() {
        let mut style = WidgetStyle {
            corner_radius: Some(0.0),
            ..Default::default()
        };
        style.clear(StyleField::CornerRadius);

        assert!(style.is_empty());
        assert_eq!(style.resolve(&ResolvedStyle::default()).corner_radius, 12.0);
    }

    #[test]
    fn test_apply_rejects_invalid() {
        let mut style = WidgetStyle::default();
        let bad = WidgetStyle {
            opacity: Some(1.5),
            ..Default::default()
        };
        assert!(style.apply(bad).is_err());

        let bad_color = WidgetStyle {
            text_color: Some("red".to_string()),
            ..Default::default()
        };
        assert!(style.apply(bad_color).is_err());
        assert!(style.is_empty());
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut style = WidgetStyle {
            border_color: Some("#abc".to_string()),
            ..Default::default()
        };
        style
            .apply(WidgetStyle {
                opacity: Some(0.8),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(style.border_color.as_deref(), Some("#abc"));
        assert_eq!(style.opacity, Some(0.8));
    }

    #[test]
    fn test_serialization_skips_unset() {
        let style = WidgetStyle {
            opacity: Some(0.25),
            ..Default::default()
        };
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(json, r#"{"opacity":0.25}"#);
    }
}
