//! Chart rendering backends.

use std::fmt::Write;

use crate::grad_flow::GradientFlowChart;

const MAX_COLOR: &str = "#00bfbf";
const MEAN_COLOR: &str = "#0000ff";
const ZERO_COLOR: &str = "#000000";
const BAR_OPACITY: f32 = 0.1;
const Y_TICKS: usize = 5;

/// Turns a chart description into a figure.
pub trait ChartRenderer {
    type Figure;

    fn render(&self, chart: &GradientFlowChart) -> Self::Figure;
}

/// Renders charts as standalone SVG documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 800,
        }
    }
}

/// Pixel box of the plotting area.
struct Frame {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    y_min: f32,
    y_max: f32,
}

impl Frame {
    fn y(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.y_min, self.y_max);
        self.top + (self.y_max - clamped) / (self.y_max - self.y_min) * self.height
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

impl ChartRenderer for SvgRenderer {
    type Figure = String;

    fn render(&self, chart: &GradientFlowChart) -> String {
        let mut svg = String::new();
        match self.write_svg(chart, &mut svg) {
            Ok(()) => svg,
            Err(_) => String::new(),
        }
    }
}

impl SvgRenderer {
    /// Write the SVG document for `chart` into `out`.
    pub fn write_svg(&self, chart: &GradientFlowChart, out: &mut impl Write) -> std::fmt::Result {
        let (w, h) = (self.width as f32, self.height as f32);
        // room below the axis for vertical layer names
        let frame = Frame {
            left: 90.0,
            top: 50.0,
            width: w - 110.0,
            height: h - 50.0 - 260.0,
            y_min: chart.y_window.0,
            y_max: chart.y_window.1,
        };
        let slots = chart.layers.len().max(1) as f32;
        let slot = frame.width / slots;

        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" font-family="sans-serif">"#,
            self.width, self.height, self.width, self.height
        )?;
        writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            out,
            r#"<text x="{:.1}" y="30" font-size="20" text-anchor="middle">{}</text>"#,
            frame.left + frame.width / 2.0,
            escape(&chart.title)
        )?;

        // grid and y ticks
        for i in 0..=Y_TICKS {
            let value = frame.y_min + (frame.y_max - frame.y_min) * i as f32 / Y_TICKS as f32;
            let y = frame.y(value);
            writeln!(
                out,
                r##"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#b0b0b0" stroke-width="0.8"/>"##,
                frame.left,
                frame.left + frame.width
            )?;
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end">{value:.4}</text>"#,
                frame.left - 6.0,
                y + 4.0
            )?;
        }

        for (i, layer) in chart.layers.iter().enumerate() {
            let x = frame.left + slot * i as f32 + slot * 0.1;
            let bar_w = slot * 0.8;
            for (value, color) in [(layer.max, MAX_COLOR), (layer.mean, MEAN_COLOR)] {
                let top = frame.y(value);
                let base = frame.y(0.0);
                writeln!(
                    out,
                    r#"<rect x="{x:.1}" y="{:.1}" width="{bar_w:.1}" height="{:.1}" fill="{color}" fill-opacity="{BAR_OPACITY}" stroke="{color}" stroke-width="1"/>"#,
                    top.min(base),
                    (base - top).abs()
                )?;
            }

            let label_x = x + bar_w / 2.0;
            let label_y = frame.bottom() + 8.0;
            writeln!(
                out,
                r#"<text x="{label_x:.1}" y="{label_y:.1}" font-size="12" text-anchor="end" transform="rotate(-90 {label_x:.1} {label_y:.1})">{}</text>"#,
                escape(&layer.name)
            )?;
        }

        let zero = frame.y(0.0);
        writeln!(
            out,
            r#"<line x1="{:.1}" y1="{zero:.1}" x2="{:.1}" y2="{zero:.1}" stroke="{ZERO_COLOR}" stroke-width="2"/>"#,
            frame.left,
            frame.left + frame.width
        )?;
        writeln!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="{ZERO_COLOR}"/>"#,
            frame.left, frame.top, frame.width, frame.height
        )?;

        writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" font-size="16" text-anchor="middle">{}</text>"#,
            frame.left + frame.width / 2.0,
            h - 12.0,
            escape(&chart.x_label)
        )?;
        writeln!(
            out,
            r#"<text x="24" y="{:.1}" font-size="16" text-anchor="middle" transform="rotate(-90 24 {:.1})">{}</text>"#,
            frame.top + frame.height / 2.0,
            frame.top + frame.height / 2.0,
            escape(&chart.y_label)
        )?;

        let legend_x = frame.left + frame.width - 190.0;
        for (i, (label, color)) in [
            ("max-gradient", MAX_COLOR),
            ("mean-gradient", MEAN_COLOR),
            ("zero-gradient", ZERO_COLOR),
        ]
        .into_iter()
        .enumerate()
        {
            let y = frame.top + 20.0 + 22.0 * i as f32;
            writeln!(
                out,
                r#"<line x1="{legend_x:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{color}" stroke-width="4"/>"#,
                legend_x + 30.0
            )?;
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-size="14">{label}</text>"#,
                legend_x + 38.0,
                y + 5.0
            )?;
        }

        out.write_str("</svg>\n")
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
