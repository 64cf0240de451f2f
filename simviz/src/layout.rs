use serde::{Deserialize, Serialize};

use crate::{Result, VizError};

/// Layout shared by every figure. Sizes are in 1x pixels and multiplied
/// by `scale` when the PNG is rendered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureLayout {
    pub scale: u32,
    pub margin_top: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    /// Marker diameter.
    pub marker_size: u32,
    pub line_width: u32,
    pub title_font_size: f64,
    pub axis_title_font_size: f64,
    pub tick_font_size: f64,
    pub legend_font_size: f64,
    pub legend_height: u32,
}

impl Default for FigureLayout {
    fn default() -> Self {
        Self {
            scale: 2,
            margin_top: 30,
            margin_left: 0,
            margin_right: 30,
            margin_bottom: 0,
            marker_size: 10,
            line_width: 2,
            title_font_size: 14.0,
            axis_title_font_size: 12.0,
            tick_font_size: 11.0,
            legend_font_size: 12.0,
            legend_height: 36,
        }
    }
}

impl FigureLayout {
    pub fn px(&self, value: u32) -> u32 {
        value.saturating_mul(self.scale.max(1))
    }

    pub fn font(&self, size: f64) -> f64 {
        size * self.scale.max(1) as f64
    }

    /// Canvas size in device pixels.
    pub fn canvas(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        if width == 0 || height == 0 {
            return Err(VizError::InvalidArgument(format!(
                "figure size must be positive, got {}x{}",
                width, height
            )));
        }
        let scale = self.scale.max(1);
        match (width.checked_mul(scale), height.checked_mul(scale)) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(VizError::InvalidArgument(format!(
                "figure size {}x{} at scale {} overflows the canvas",
                width, height, scale
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_is_scaled() {
        let layout = FigureLayout::default();
        assert_eq!(layout.canvas(850, 600).unwrap(), (1700, 1200));
        assert!(layout.canvas(0, 600).is_err());
    }

    #[test]
    fn oversized_scale_is_rejected() {
        let layout = FigureLayout {
            scale: 4_000_000_000,
            ..FigureLayout::default()
        };
        assert!(matches!(
            layout.canvas(850, 600),
            Err(VizError::InvalidArgument(_))
        ));
        assert_eq!(layout.px(10), u32::MAX);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let layout: FigureLayout = serde_json::from_str(r#"{"scale": 1}"#).unwrap();
        assert_eq!(layout.scale, 1);
        assert_eq!(layout.marker_size, 10);
    }
}
