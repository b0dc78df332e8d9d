//! Inline SVG line charts for a city's forecast history.
//!
//! [`render`] turns stored forecasts into one HTML fragment holding three
//! charts (temperature, pressure and wind speed over time) that can be
//! embedded directly into a page.

use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::forecasts::repo_types::Forecast;

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 300.0;
const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 16.0;
const PAD_TOP: f64 = 32.0;
const PAD_BOTTOM: f64 = 48.0;

const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

struct Series<'a> {
    title: &'a str,
    y_label: &'a str,
    points: Vec<(i64, f64)>,
}

/// Empty input yields an empty fragment.
pub fn render(data: &[Forecast]) -> String {
    if data.is_empty() {
        return String::new();
    }

    let series = [
        Series {
            title: "Temperature dependency",
            y_label: "temp",
            points: data.iter().map(|f| (f.data_time.unix_timestamp(), f.temperature)).collect(),
        },
        Series {
            title: "Pressure dependency",
            y_label: "pressure",
            points: data.iter().map(|f| (f.data_time.unix_timestamp(), f.pressure)).collect(),
        },
        Series {
            title: "Wind speed dependency",
            y_label: "speed wind",
            points: data.iter().map(|f| (f.data_time.unix_timestamp(), f.wind_speed)).collect(),
        },
    ];

    let mut out = String::from(r#"<div class="forecast-charts">"#);
    for s in &series {
        out.push_str(&render_series(s));
    }
    out.push_str("</div>");
    out
}

fn render_series(s: &Series<'_>) -> String {
    let (x_min, x_max) = bounds(s.points.iter().map(|p| p.0 as f64));
    let (y_min, y_max) = bounds(s.points.iter().map(|p| p.1));

    let plot_w = WIDTH - PAD_LEFT - PAD_RIGHT;
    let plot_h = HEIGHT - PAD_TOP - PAD_BOTTOM;

    let points = s
        .points
        .iter()
        .map(|&(x, y)| {
            let px = PAD_LEFT + scale(x as f64, x_min, x_max) * plot_w;
            let py = PAD_TOP + (1.0 - scale(y, y_min, y_max)) * plot_h;
            format!("{:.1},{:.1}", px, py)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let first = s.points.first().map(|p| p.0).unwrap_or_default();
    let last = s.points.last().map(|p| p.0).unwrap_or_default();
    let bottom = HEIGHT - PAD_BOTTOM;

    format!(
        concat!(
            r#"<figure class="chart">"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" role="img" aria-label="{title}">"#,
            r#"<text x="{cx:.1}" y="18" text-anchor="middle" font-size="14">{title}</text>"#,
            r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
            r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
            r#"<text x="{lx}" y="{t}" text-anchor="end" font-size="10">{y_max}</text>"#,
            r#"<text x="{lx}" y="{b}" text-anchor="end" font-size="10">{y_min}</text>"#,
            r#"<text x="{l}" y="{dy}" font-size="10">{first}</text>"#,
            r#"<text x="{r}" y="{dy}" text-anchor="end" font-size="10">{last}</text>"#,
            r#"<text x="{cx:.1}" y="{xl}" text-anchor="middle" font-size="12">date</text>"#,
            r#"<text x="12" y="{cy:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 12 {cy:.1})">{y_label}</text>"#,
            r#"<polyline fill="none" stroke="steelblue" stroke-width="2" points="{points}"/>"#,
            r#"</svg></figure>"#,
        ),
        w = WIDTH,
        h = HEIGHT,
        title = escape(s.title),
        y_label = escape(s.y_label),
        cx = PAD_LEFT + plot_w / 2.0,
        cy = PAD_TOP + plot_h / 2.0,
        l = PAD_LEFT,
        r = WIDTH - PAD_RIGHT,
        t = PAD_TOP,
        b = bottom,
        lx = PAD_LEFT - 4.0,
        dy = bottom + 14.0,
        xl = HEIGHT - 8.0,
        y_min = format_value(y_min),
        y_max = format_value(y_max),
        first = format_time(first),
        last = format_time(last),
        points = points,
    )
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Position of `v` within `[lo, hi]` as 0..=1; a flat range maps to the middle.
fn scale(v: f64, lo: f64, hi: f64) -> f64 {
    if hi - lo <= f64::EPSILON {
        0.5
    } else {
        (v - lo) / (hi - lo)
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v)
    } else {
        format!("{:.1}", v)
    }
}

fn format_time(ts: i64) -> String {
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|t| t.format(DATE_FORMAT).ok())
        .unwrap_or_default()
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(ts: i64, temperature: f64) -> Forecast {
        Forecast {
            id: ts,
            city_id: 703448,
            data_time: OffsetDateTime::from_unix_timestamp(ts).unwrap(),
            temperature,
            wind_speed: 4.0,
            clouds: "40%".into(),
            pressure: 1012.5,
            description: "broken clouds".into(),
        }
    }

    fn polylines(html: &str) -> Vec<&str> {
        html.split("points=\"")
            .skip(1)
            .map(|rest| rest.split('"').next().unwrap())
            .collect()
    }

    #[test]
    fn empty_input_is_empty_fragment() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn renders_three_titled_charts() {
        let html = render(&[forecast(1_700_000_000, 10.0), forecast(1_700_010_800, 14.0)]);
        assert!(html.starts_with(r#"<div class="forecast-charts">"#));
        assert_eq!(html.matches("<figure").count(), 3);
        assert!(html.contains("Temperature dependency"));
        assert!(html.contains("Pressure dependency"));
        assert!(html.contains("Wind speed dependency"));
        assert!(html.contains("2023-11-14 22:13"));
    }

    #[test]
    fn one_vertex_per_forecast() {
        let data: Vec<_> = (0..5).map(|i| forecast(1_700_000_000 + i * 3_600, i as f64)).collect();
        let html = render(&data);
        for line in polylines(&html) {
            assert_eq!(line.split(' ').count(), 5);
        }
    }

    #[test]
    fn higher_values_are_drawn_higher() {
        let html = render(&[forecast(0, -3.0), forecast(3_600, 20.0)]);
        let temp = polylines(&html)[0];
        let ys: Vec<f64> = temp
            .split(' ')
            .map(|p| p.split(',').nth(1).unwrap().parse().unwrap())
            .collect();
        assert!(ys[1] < ys[0]);
    }

    #[test]
    fn single_point_has_no_nan() {
        let html = render(&[forecast(1_700_000_000, 5.0)]);
        assert!(!html.contains("NaN"));
        assert!(!html.contains("inf"));
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}
