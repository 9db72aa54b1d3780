//! Declarative cell styling for emitted sheets

use rust_xlsxwriter::{Color, Format, FormatBorder};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::consolidate::Dataset;

/// Styling applied to every populated cell of an emitted dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_family: String,
    pub font_size: f64,
    /// Hex RGB, e.g. "#1F2937"
    pub font_color: String,
    /// Thin border on every populated cell
    pub borders: bool,
    pub bold_header: bool,
    /// Excel number format for date/time cells
    pub datetime_format: String,
    /// Added to the widest rendered value of each column
    pub width_padding: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        StyleConfig {
            font_family: "Calibri".to_string(),
            font_size: 11.0,
            font_color: "#000000".to_string(),
            borders: true,
            bold_header: true,
            datetime_format: "yyyy-mm-dd hh:mm:ss".to_string(),
            width_padding: 2.0,
        }
    }
}

impl StyleConfig {
    fn base_format(&self) -> Format {
        let mut format = Format::new()
            .set_font_name(&self.font_family)
            .set_font_size(self.font_size);

        match parse_hex_color(&self.font_color) {
            Some(color) => format = format.set_font_color(color),
            None => log::warn!("Ignoring invalid font color '{}'", self.font_color),
        }

        if self.borders {
            format = format.set_border(FormatBorder::Thin);
        }
        format
    }

    pub fn header_format(&self) -> Format {
        let format = self.base_format();
        if self.bold_header { format.set_bold() } else { format }
    }

    pub fn body_format(&self) -> Format {
        self.base_format()
    }

    pub fn datetime_format(&self) -> Format {
        self.base_format().set_num_format(&self.datetime_format)
    }
}

/// Parse "#RRGGBB" (leading '#' optional)
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    hex_rgb(hex).map(Color::RGB)
}

/// "#RRGGBB" as a 0xRRGGBB integer
pub fn hex_rgb(hex: &str) -> Option<u32> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Column widths: widest rendered value (header included) in display columns, plus padding
pub fn column_widths(dataset: &Dataset, padding: f64) -> Vec<f64> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let widest = dataset
                .rows()
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|value| value.to_string().width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or(0);
            widest as f64 + padding
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::Value;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1F2937"), Some(Color::RGB(0x1F2937)));
        assert_eq!(parse_hex_color("ff0000"), Some(Color::RGB(0xFF0000)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(hex_rgb(" #00ff7f "), Some(0x00FF7F));
    }

    #[test]
    fn test_column_widths_include_header() {
        let dataset = Dataset::from_rows(
            &["Production order", "WF_PPO"],
            vec![
                vec![Value::from("P1"), Value::from("Relax dryer")],
                vec![Value::from("P2"), Value::from("-")],
            ],
        );

        let widths = column_widths(&dataset, 2.0);
        assert_eq!(widths, vec![18.0, 13.0]);
    }

    #[test]
    fn test_column_widths_use_display_width() {
        let dataset = Dataset::from_rows(&["Shade"], vec![vec![Value::from("藍色染め")]]);
        assert_eq!(column_widths(&dataset, 0.0), vec![8.0]);
    }

    #[test]
    fn test_style_config_partial_toml() {
        let style: StyleConfig = toml::from_str(
            r##"
            font_family = "Arial"
            font_color = "#1F2937"
            "##,
        )
        .unwrap();

        assert_eq!(style.font_family, "Arial");
        assert_eq!(style.font_size, 11.0);
        assert!(style.borders);
    }
}
