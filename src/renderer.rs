//! # Tide Frame Rendering
//!
//! This module draws a [`TideFrame`] both to the e-ink page buffer and to
//! ASCII terminal output. Everything it draws is already resolved in the
//! frame's [`DrawableModel`] and [`WeatherPanel`]; the renderer only rounds
//! to pixels and picks fonts, inks and icons.
//!
//! ## Page layout (800×480)
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Weather for Portland        Last Refresh: ... │  header
//! │ ┌─now──────┐ ┌─Fri─┐ ┌─Sat─┐ ┌─Sun─┐ ┌─Mon─┐  │  weather row
//! │ └──────────┘ └─────┘ └─────┘ └─────┘ └─────┘  │
//! │ Tide Chart: Portland, ME                      │
//! │ ┌───────────── 800×120 tide panel ──────────┐ │
//! │ └───────────────────────────────────────────┘ │
//! │ Current Tide: 3.21 ft                OFFLINE  │  annotations
//! │ Next High: 8.9 ft at 3:07 PM                  │
//! │ Next Low: 0.4 ft at 9:21 PM                   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Text uses the ISO 8859-1 mono fonts so `°` renders.

use crate::chart::ChartGeometry;
use crate::framebuffer::{Ink, PAGE_WIDTH};
use crate::render_model::{DrawableModel, TideFrame, NO_DATA_MESSAGE};
use crate::weather::{MoonPhase, WeatherIcon, WeatherPanel};
use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    prelude::*,
    primitives::{Circle, Ellipse, Line, PrimitiveStyle, Polyline, Rectangle},
    text::{Alignment, Text},
};

/// Top-left corner of the tide panel on the page
pub const CHART_ORIGIN: Point = Point::new(0, 196);

/// Top-left corner of the weather row
pub const WEATHER_ORIGIN: Point = Point::new(TEXT_LEFT, 44);

/// Left edge for header text
const TEXT_LEFT: i32 = 16;

/// Baseline of the first annotation line, below the chart's hour labels
const ANNOTATION_TOP: i32 = 346;
const LINE_SPACING: i32 = 28;

const BOX_HEIGHT: u32 = 120;
const CURRENT_BOX_WIDTH: u32 = 256;
const DAY_BOX_WIDTH: u32 = 120;
const BOX_GAP: i32 = 8;

/// Icons fill a square of this side
pub const ICON_SIZE: u32 = 32;
const MOON_DIAMETER: u32 = 27;

/// Description characters that fit the current-conditions box
const DESCRIPTION_CHARS: usize = 23;

fn to_point(origin: Point, x: f64, y: f64) -> Point {
    origin + Point::new(x.round() as i32, y.round() as i32)
}

/// Render a full page: header, weather row, tide panel and annotations.
pub fn draw_frame<D>(frame: &TideFrame, station: &str, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let large = MonoTextStyle::new(&FONT_10X20, Ink::Black);
    let small = MonoTextStyle::new(&FONT_6X10, Ink::Black);
    let right = PAGE_WIDTH as i32 - TEXT_LEFT;

    let title = frame.weather.as_ref().map_or(station, |w| w.title.as_str());
    Text::new(title, Point::new(TEXT_LEFT, 28), large).draw(target)?;
    Text::with_alignment(
        &frame.refresh_label(),
        Point::new(right, 24),
        small,
        Alignment::Right,
    )
    .draw(target)?;

    let heading = match &frame.weather {
        Some(weather) => {
            draw_weather(weather, target, WEATHER_ORIGIN)?;
            format!("Tide Chart: {station}")
        }
        None => "Tide Chart".to_string(),
    };
    Text::new(&heading, Point::new(TEXT_LEFT, CHART_ORIGIN.y - 6), large).draw(target)?;

    draw_chart(&frame.model, target, CHART_ORIGIN)?;

    if frame.offline {
        let badge = MonoTextStyle::new(&FONT_10X20, Ink::Red);
        Text::with_alignment(
            "OFFLINE",
            Point::new(right, ANNOTATION_TOP),
            badge,
            Alignment::Right,
        )
        .draw(target)?;
    }

    let mut lines: Vec<String> = Vec::new();
    lines.extend(frame.current_label());
    lines.extend(frame.next_high_label());
    lines.extend(frame.next_low_label());
    lines.extend(frame.extrema_notice().map(str::to_string));

    for (i, line) in lines.iter().enumerate() {
        let y = ANNOTATION_TOP + i as i32 * LINE_SPACING;
        Text::new(line, Point::new(TEXT_LEFT, y), large).draw(target)?;
    }

    Ok(())
}

/// Render the weather row with its top-left corner at `origin`: current
/// conditions, then one box per forecast day.
pub fn draw_weather<D>(panel: &WeatherPanel, target: &mut D, origin: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let outline = PrimitiveStyle::with_stroke(Ink::Black, 1);
    let large = MonoTextStyle::new(&FONT_10X20, Ink::Black);
    let large_red = MonoTextStyle::new(&FONT_10X20, Ink::Red);
    let small = MonoTextStyle::new(&FONT_6X10, Ink::Black);
    let small_red = MonoTextStyle::new(&FONT_6X10, Ink::Red);

    Rectangle::new(origin, Size::new(CURRENT_BOX_WIDTH, BOX_HEIGHT))
        .into_styled(outline)
        .draw(target)?;
    draw_icon(panel.icon, target, origin + Point::new(12, 12))?;
    Text::with_alignment(
        &panel.temperature,
        origin + Point::new(CURRENT_BOX_WIDTH as i32 - 12, 36),
        large,
        Alignment::Right,
    )
    .draw(target)?;

    let description: String = panel.description.chars().take(DESCRIPTION_CHARS).collect();
    Text::new(&description, origin + Point::new(12, 72), large).draw(target)?;

    // high in red, like the forecast boxes
    if let (Some(high), Some(low)) = (&panel.high, &panel.low) {
        let mut at = origin + Point::new(12, 100);
        at = Text::new("H: ", at, large).draw(target)?;
        at = Text::new(high, at, large_red).draw(target)?;
        at = Text::new("  L: ", at, large).draw(target)?;
        Text::new(low, at, large).draw(target)?;
    }

    let center = DAY_BOX_WIDTH as i32 / 2;
    for (i, day) in panel.days.iter().enumerate() {
        let x = CURRENT_BOX_WIDTH as i32 + BOX_GAP + i as i32 * (DAY_BOX_WIDTH as i32 + BOX_GAP);
        let corner = origin + Point::new(x, 0);

        Rectangle::new(corner, Size::new(DAY_BOX_WIDTH, BOX_HEIGHT))
            .into_styled(outline)
            .draw(target)?;
        Text::with_alignment(
            &day.weekday,
            corner + Point::new(center, 26),
            large,
            Alignment::Center,
        )
        .draw(target)?;
        draw_icon(
            day.icon,
            target,
            corner + Point::new(center - ICON_SIZE as i32 / 2, 38),
        )?;
        Text::with_alignment(
            &format!("High: {}", day.high),
            corner + Point::new(center, 92),
            small_red,
            Alignment::Center,
        )
        .draw(target)?;
        Text::with_alignment(
            &format!("Low: {}", day.low),
            corner + Point::new(center, 108),
            small,
            Alignment::Center,
        )
        .draw(target)?;
    }

    Ok(())
}

/// Draw `icon` inside the [`ICON_SIZE`] square at `top_left`.
pub fn draw_icon<D>(icon: WeatherIcon, target: &mut D, top_left: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let fill = PrimitiveStyle::with_fill(Ink::Black);
    let at = |x: i32, y: i32| top_left + Point::new(x, y);
    let center = at(ICON_SIZE as i32 / 2, ICON_SIZE as i32 / 2);

    match icon {
        WeatherIcon::Sun => {
            Circle::with_center(center, 14).into_styled(fill).draw(target)?;
            let ray = PrimitiveStyle::with_stroke(Ink::Black, 2);
            for k in 0..8_i32 {
                let (dy, dx) = (f64::from(k) * std::f64::consts::FRAC_PI_4).sin_cos();
                let along = |r: f64| center + Point::new((dx * r).round() as i32, (dy * r).round() as i32);
                Line::new(along(10.0), along(15.0)).into_styled(ray).draw(target)?;
            }
        }
        WeatherIcon::Moon(phase) => draw_moon(phase, target, center)?,
        cloudy => {
            draw_cloud(target, top_left)?;
            let drop = PrimitiveStyle::with_stroke(Ink::Black, 2);
            match cloudy {
                WeatherIcon::Drizzle => {
                    for x in [9, 16, 23] {
                        Line::new(at(x, 24), at(x, 27)).into_styled(drop).draw(target)?;
                    }
                }
                WeatherIcon::Rain => {
                    for x in [10, 17, 24] {
                        Line::new(at(x, 23), at(x - 3, 31)).into_styled(drop).draw(target)?;
                    }
                }
                WeatherIcon::Thunderstorm => {
                    let bolt = [at(18, 21), at(13, 27), at(19, 27), at(14, 32)];
                    Polyline::new(&bolt)
                        .into_styled(PrimitiveStyle::with_stroke(Ink::Red, 2))
                        .draw(target)?;
                }
                WeatherIcon::Snow => {
                    for x in [9, 16, 23] {
                        Circle::with_center(at(x, 27), 3).into_styled(fill).draw(target)?;
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn draw_cloud<D>(target: &mut D, top_left: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let fill = PrimitiveStyle::with_fill(Ink::Black);
    Circle::with_center(top_left + Point::new(11, 13), 12)
        .into_styled(fill)
        .draw(target)?;
    Circle::with_center(top_left + Point::new(20, 10), 14)
        .into_styled(fill)
        .draw(target)?;
    Rectangle::new(top_left + Point::new(5, 13), Size::new(22, 7))
        .into_styled(fill)
        .draw(target)
}

/// Lit part in black, shadow in white, then the rim.
fn draw_moon<D>(phase: MoonPhase, target: &mut D, center: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let lit = PrimitiveStyle::with_fill(Ink::Black);
    let shadow = PrimitiveStyle::with_fill(Ink::White);
    let r = MOON_DIAMETER as i32 / 2 + 1;
    let disc = Circle::with_center(center, MOON_DIAMETER);
    let half = Size::new(r as u32, 2 * r as u32 + 1);
    let left_half = Rectangle::new(center - Point::new(r, r), half);
    let right_half = Rectangle::new(center + Point::new(1, -r), half);
    let bulge = Ellipse::with_center(center, Size::new(MOON_DIAMETER / 2, MOON_DIAMETER));
    let offset = Point::new(MOON_DIAMETER as i32 / 3, 0);

    if phase != MoonPhase::New {
        disc.into_styled(lit).draw(target)?;
    }
    match phase {
        MoonPhase::New | MoonPhase::Full => {}
        MoonPhase::WaxingCrescent => Circle::with_center(center - offset, MOON_DIAMETER)
            .into_styled(shadow)
            .draw(target)?,
        MoonPhase::WaningCrescent => Circle::with_center(center + offset, MOON_DIAMETER)
            .into_styled(shadow)
            .draw(target)?,
        MoonPhase::FirstQuarter => left_half.into_styled(shadow).draw(target)?,
        MoonPhase::LastQuarter => right_half.into_styled(shadow).draw(target)?,
        MoonPhase::WaxingGibbous => {
            left_half.into_styled(shadow).draw(target)?;
            bulge.into_styled(lit).draw(target)?;
        }
        MoonPhase::WaningGibbous => {
            right_half.into_styled(shadow).draw(target)?;
            bulge.into_styled(lit).draw(target)?;
        }
    }
    disc.into_styled(PrimitiveStyle::with_stroke(Ink::Black, 2))
        .draw(target)
}

const ASCII_ROWS: usize = 16;
const ASCII_COLS: usize = 72;
const Y_AXIS_WIDTH: usize = 4;

fn push_weather(out: &mut String, panel: &WeatherPanel) {
    out.push_str(&panel.title);
    out.push('\n');

    let mut line = format!("[{}] ", panel.icon.label());
    if !panel.temperature.is_empty() {
        line.push_str(&panel.temperature);
        line.push_str("  ");
    }
    line.push_str(&panel.description);
    if let (Some(high), Some(low)) = (&panel.high, &panel.low) {
        line.push_str(&format!("  H: {high} L: {low}"));
    }
    out.push_str(&line);
    out.push('\n');

    if !panel.days.is_empty() {
        let days: Vec<String> = panel
            .days
            .iter()
            .map(|d| format!("{} {} {}/{}", d.weekday, d.icon.label(), d.high, d.low))
            .collect();
        out.push_str(&days.join(" | "));
        out.push('\n');
    }
    out.push('\n');
}

/// ASCII preview of a frame, for development without the display.
pub fn ascii_chart(frame: &TideFrame) -> String {
    let mut out = String::new();

    if frame.offline {
        out.push_str("⚠ OFFLINE\n");
    }
    if let Some(weather) = &frame.weather {
        push_weather(&mut out, weather);
    }
    out.push_str(&frame.refresh_label());
    out.push('\n');
    for line in [
        frame.current_label(),
        frame.next_high_label(),
        frame.next_low_label(),
        frame.extrema_notice().map(str::to_string),
    ]
    .into_iter()
    .flatten()
    {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');

    let model = &frame.model;
    if model.no_data {
        out.push_str(NO_DATA_MESSAGE);
        out.push('\n');
        return out;
    }

    let g = &model.geometry;
    let to_col = |x: f64| {
        let f = ((x - g.margins.left) / g.drawable_width().max(1.0)).clamp(0.0, 1.0);
        Y_AXIS_WIDTH + (f * (ASCII_COLS - 1) as f64).round() as usize
    };
    let to_row = |y: f64| {
        let f = ((y - g.margins.top) / g.plot_height().max(1.0)).clamp(0.0, 1.0);
        (f * (ASCII_ROWS - 1) as f64).round() as usize
    };

    let mut grid = vec![vec![' '; Y_AXIS_WIDTH + ASCII_COLS]; ASCII_ROWS];
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    for tick in &model.y_ticks {
        let row = to_row(tick.position);
        let label = format!("{:>width$}", tick.label, width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
    }

    if let Some(x) = model.now_marker_x {
        let col = to_col(x);
        for row in grid.iter_mut() {
            row[col] = '|';
        }
    }

    for &(x, y) in &model.polyline {
        grid[to_row(y)][to_col(x)] = '•';
    }

    for row in grid {
        out.extend(row);
        out.push('\n');
    }

    // Axis and hour labels, each centred under its tick
    let width = Y_AXIS_WIDTH + ASCII_COLS + 4;
    let mut axis = vec!['─'; width];
    let mut hours = vec![' '; width];
    axis[Y_AXIS_WIDTH - 1] = '└';
    for tick in &model.x_ticks {
        let col = to_col(tick.position);
        axis[col] = '┴';
        let start = col.saturating_sub(tick.label.chars().count() / 2);
        for (i, ch) in tick.label.chars().enumerate() {
            if let Some(slot) = hours.get_mut(start + i) {
                *slot = ch;
            }
        }
    }
    out.extend(axis);
    out.push('\n');
    out.extend(hours.into_iter().collect::<String>().trim_end().chars());
    out.push('\n');

    out
}

/// Print the ASCII preview to stdout.
pub fn draw_ascii(frame: &TideFrame) {
    print!("{}", ascii_chart(frame));
}
