//! SVG pie chart of correct versus incorrect answers.

use std::f64::consts::TAU;
use std::fmt::Write;

use crate::report::ScoreReport;

pub const CORRECT_COLOR: &str = "#4CAF50";
pub const INCORRECT_COLOR: &str = "#F44336";
const EMPTY_COLOR: &str = "#9E9E9E";

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 640.0;
const CENTER_X: f64 = 400.0;
const CENTER_Y: f64 = 350.0;
const RADIUS: f64 = 210.0;
// Fraction of the radius the correct slice is pushed out by.
const EXPLODE: f64 = 0.1;

struct Slice<'a> {
    label: &'a str,
    count: usize,
    color: &'a str,
    exploded: bool,
}

pub fn render_pie(report: &ScoreReport) -> String {
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' width='{WIDTH:.0}' height='{HEIGHT:.0}' viewBox='0 0 {WIDTH:.0} {HEIGHT:.0}' role='img'>"
    );
    let _ = writeln!(svg, "  <rect width='{WIDTH:.0}' height='{HEIGHT:.0}' fill='#ffffff'/>");
    let _ = writeln!(
        svg,
        "  <text x='{CENTER_X:.0}' y='56' text-anchor='middle' font-family='sans-serif' font-size='28' font-weight='700'>Quiz Performance - {}</text>",
        escape_text(report.user_name())
    );
    let _ = writeln!(
        svg,
        "  <text x='{CENTER_X:.0}' y='92' text-anchor='middle' font-family='sans-serif' font-size='22'>Score: {} ({})</text>",
        report.score_label(),
        report.percentage_label()
    );

    let slices = [
        Slice {
            label: "Correct",
            count: report.correct(),
            color: CORRECT_COLOR,
            exploded: true,
        },
        Slice {
            label: "Incorrect",
            count: report.incorrect(),
            color: INCORRECT_COLOR,
            exploded: false,
        },
    ];

    let total = report.total();
    if total == 0 {
        let _ = writeln!(
            svg,
            "  <circle cx='{CENTER_X:.0}' cy='{CENTER_Y:.0}' r='{RADIUS:.0}' fill='{EMPTY_COLOR}'/>"
        );
        let _ = writeln!(
            svg,
            "  <text x='{CENTER_X:.0}' y='{CENTER_Y:.0}' text-anchor='middle' font-family='sans-serif' font-size='20'>No questions</text>"
        );
        let _ = writeln!(svg, "</svg>");
        return svg;
    }

    // Angles run clockwise from twelve o'clock.
    let mut start = 0.0_f64;
    for slice in slices.iter().filter(|slice| slice.count > 0) {
        let fraction = slice.count as f64 / total as f64;
        let sweep = fraction * TAU;
        let mid = start + sweep / 2.0;
        let (dx, dy) = if slice.exploded {
            polar(EXPLODE * RADIUS, mid)
        } else {
            (0.0, 0.0)
        };
        let (cx, cy) = (CENTER_X + dx, CENTER_Y + dy);

        if slice.count == total {
            let _ = writeln!(
                svg,
                "  <circle cx='{cx:.2}' cy='{cy:.2}' r='{RADIUS:.0}' fill='{}' stroke='#ffffff' stroke-width='2'/>",
                slice.color
            );
        } else {
            let (x1, y1) = polar(RADIUS, start);
            let (x2, y2) = polar(RADIUS, start + sweep);
            let large_arc = u8::from(sweep > TAU / 2.0);
            let _ = writeln!(
                svg,
                "  <path d='M {cx:.2} {cy:.2} L {:.2} {:.2} A {RADIUS:.0} {RADIUS:.0} 0 {large_arc} 1 {:.2} {:.2} Z' fill='{}' stroke='#ffffff' stroke-width='2'/>",
                cx + x1,
                cy + y1,
                cx + x2,
                cy + y2,
                slice.color
            );
        }

        let (lx, ly) = polar(RADIUS * 0.6, mid);
        let _ = writeln!(
            svg,
            "  <text x='{:.2}' y='{:.2}' text-anchor='middle' font-family='sans-serif' font-size='20' fill='#ffffff'>{:.1}%</text>",
            cx + lx,
            cy + ly,
            fraction * 100.0
        );
        let (tx, ty) = polar(RADIUS * 1.15, mid);
        let _ = writeln!(
            svg,
            "  <text x='{:.2}' y='{:.2}' text-anchor='middle' font-family='sans-serif' font-size='18'>{}</text>",
            cx + tx,
            cy + ty,
            slice.label
        );

        start += sweep;
    }

    let _ = writeln!(svg, "</svg>");
    svg
}

/// Offset from the centre for `radius` at `angle` radians clockwise from the top.
fn polar(radius: f64, angle: f64) -> (f64, f64) {
    (radius * angle.sin(), -radius * angle.cos())
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_two_slices_with_exploded_correct() {
        let svg = render_pie(&ScoreReport::compute("ada", 4, 1, 0));

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(CORRECT_COLOR));
        assert!(svg.contains(INCORRECT_COLOR));
        assert!(svg.contains("25.0%"));
        assert!(svg.contains("75.0%"));

        // Correct slice spans 0..90 degrees, so its exploded centre moves up and right.
        let correct = svg
            .lines()
            .find(|line| line.contains(CORRECT_COLOR))
            .unwrap();
        assert!(!correct.contains("M 400.00 350.00"), "{correct}");
        let incorrect = svg
            .lines()
            .find(|line| line.contains(INCORRECT_COLOR))
            .unwrap();
        assert!(incorrect.contains("M 400.00 350.00"), "{incorrect}");
    }

    #[test]
    fn perfect_score_is_a_full_circle() {
        let svg = render_pie(&ScoreReport::compute("ada", 3, 3, 0));
        assert_eq!(svg.matches("<path").count(), 0);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains(CORRECT_COLOR));
        assert!(svg.contains("100.0%"));
        assert!(!svg.contains(">Incorrect<"));
    }

    #[test]
    fn empty_report_draws_placeholder() {
        let svg = render_pie(&ScoreReport::compute("ada", 0, 0, 0));
        assert!(svg.contains(EMPTY_COLOR));
        assert!(svg.contains("No questions"));
    }

    #[test]
    fn title_is_escaped() {
        let svg = render_pie(&ScoreReport::compute("<Tom & Jerry>", 2, 1, 0));
        assert!(svg.contains("&lt;Tom &amp; Jerry&gt;"));
        assert!(!svg.contains("<Tom"));
    }
}
