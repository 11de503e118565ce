//! Donut chart rendering
//!
//! Produces a standalone SVG: a ring split into "Plagiarized" and "Original"
//! slices with the percentage label in the hole.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::score::OverlapResult;

const PLAGIARIZED_COLOR: &str = "#FF6B6B";
const ORIGINAL_COLOR: &str = "#4ECDC4";
const TITLE: &str = "Plagiarism Percentage";

const WIDTH: f64 = 400.0;
const HEIGHT: f64 = 420.0;
const CENTER_X: f64 = 200.0;
const CENTER_Y: f64 = 220.0;
const OUTER_RADIUS: f64 = 140.0;
/// Inner radius as a share of the outer one
const HOLE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct DonutChart {
    percentage: f64,
}

impl DonutChart {
    /// Chart for a raw percentage, clamped to 0-100
    pub fn new(percentage: f64) -> Self {
        let percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self { percentage }
    }

    pub fn from_result(result: &OverlapResult) -> Self {
        Self::new(result.percentage)
    }

    pub fn label(&self) -> String {
        format!("{:.1}%", self.percentage)
    }

    pub fn to_svg(&self) -> String {
        // The ring is drawn as a thick stroke along the mid radius; the
        // plagiarized slice is a dash starting at twelve o'clock.
        let inner = OUTER_RADIUS * HOLE;
        let radius = (OUTER_RADIUS + inner) / 2.0;
        let thickness = OUTER_RADIUS - inner;
        let circumference = 2.0 * PI * radius;
        let dash = circumference * self.percentage / 100.0;

        let mut svg = String::new();
        // Writing into a String cannot fail
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img" aria-label="{title}: {label}">"#,
            w = WIDTH,
            h = HEIGHT,
            title = TITLE,
            label = self.label(),
        );
        let _ = write!(
            svg,
            r#"<text x="{x}" y="36" text-anchor="middle" font-family="sans-serif" font-size="20">{title}</text>"#,
            x = CENTER_X,
            title = TITLE,
        );
        let _ = write!(
            svg,
            r#"<circle cx="{cx}" cy="{cy}" r="{r:.3}" fill="none" stroke="{color}" stroke-width="{t:.3}"><title>Original</title></circle>"#,
            cx = CENTER_X,
            cy = CENTER_Y,
            r = radius,
            color = ORIGINAL_COLOR,
            t = thickness,
        );
        if self.percentage > 0.0 {
            let _ = write!(
                svg,
                r#"<circle cx="{cx}" cy="{cy}" r="{r:.3}" fill="none" stroke="{color}" stroke-width="{t:.3}" stroke-dasharray="{dash:.3} {circ:.3}" transform="rotate(-90 {cx} {cy})"><title>Plagiarized</title></circle>"#,
                cx = CENTER_X,
                cy = CENTER_Y,
                r = radius,
                color = PLAGIARIZED_COLOR,
                t = thickness,
                dash = dash,
                circ = circumference,
            );
        }
        let _ = write!(
            svg,
            r#"<text x="{cx}" y="{cy}" text-anchor="middle" dominant-baseline="middle" font-family="sans-serif" font-size="20">{label}</text>"#,
            cx = CENTER_X,
            cy = CENTER_Y,
            label = self.label(),
        );
        let legend_y = HEIGHT - 20.0;
        let _ = write!(
            svg,
            r#"<rect x="110" y="{y}" width="12" height="12" fill="{pc}"/><text x="128" y="{ty}" font-family="sans-serif" font-size="13">Plagiarized</text><rect x="220" y="{y}" width="12" height="12" fill="{oc}"/><text x="238" y="{ty}" font-family="sans-serif" font-size="13">Original</text>"#,
            y = legend_y - 10.0,
            ty = legend_y,
            pc = PLAGIARIZED_COLOR,
            oc = ORIGINAL_COLOR,
        );
        svg.push_str("</svg>");
        svg
    }
}
