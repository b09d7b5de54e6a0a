//! Drawing of the Skew-T diagram and the wind panel with plotters

use std::iter::once;
use std::path::Path;

use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::barbs;
use super::font::FAMILY;
use super::skew::{SkewTransform, clip_runs};
use super::thermo;
use crate::config::PlotConfig;
use crate::error::PlotError;
use crate::models::Sounding;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const ISOBARS: [f64; 11] = [
    1000.0, 925.0, 850.0, 700.0, 500.0, 400.0, 300.0, 250.0, 200.0, 150.0, 100.0,
];
/// g/kg
const MIXING_RATIOS: [f64; 7] = [1.0, 2.0, 4.0, 7.0, 10.0, 16.0, 24.0];
const MIXING_RATIO_TOP: f64 = 500.0;
const MOIST_ADIABAT_TOP: f64 = 200.0;

const ISOBAR_COLOR: RGBColor = RGBColor(190, 190, 190);
const ISOTHERM_COLOR: RGBColor = RGBColor(150, 150, 150);
const DRY_ADIABAT_COLOR: RGBColor = RGBColor(214, 140, 70);
const MOIST_ADIABAT_COLOR: RGBColor = RGBColor(70, 150, 90);
const MIXING_RATIO_COLOR: RGBColor = RGBColor(120, 120, 200);
const DEW_POINT_COLOR: RGBColor = RGBColor(30, 90, 200);
const WIND_COLOR: RGBColor = RGBColor(120, 60, 160);

/// Pixel rows two barbs in the same column keep apart
const BARB_MIN_GAP: i32 = 18;
/// Barb columns as fractions of the wind axis, preferred first
const BARB_COLUMNS: [f64; 3] = [0.78, 0.52, 0.26];
const MARGIN: u32 = 8;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 48;

/// Colour of a temperature segment by lapse rate in K/km, from red for
/// inversions through yellow to green for near dry-adiabatic layers
#[must_use]
pub fn lapse_rate_color(rate: f64) -> RGBColor {
    const STOPS: [(f64, (u8, u8, u8)); 3] = [
        (-3.0, (215, 48, 39)),
        (3.5, (230, 200, 60)),
        (10.0, (26, 152, 80)),
    ];
    let rate = rate.clamp(STOPS[0].0, STOPS[2].0);
    let (lo, hi) = if rate <= STOPS[1].0 {
        (STOPS[0], STOPS[1])
    } else {
        (STOPS[1], STOPS[2])
    };
    let f = (rate - lo.0) / (hi.0 - lo.0);
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * f).round() as u8;
    RGBColor(
        mix(lo.1.0, hi.1.0),
        mix(lo.1.1, hi.1.1),
        mix(lo.1.2, hi.1.2),
    )
}

#[must_use]
pub fn title(sounding: &Sounding, lead_hours: Option<i64>) -> String {
    let mut title = format!(
        "{} | {} | valid {} UTC",
        sounding.location.name,
        sounding.model,
        sounding.timestamp.format("%Y-%m-%d %H:%M")
    );
    if let Some(lead) = lead_hours {
        title.push_str(&format!(" ({lead:+}h)"));
    }
    title
}

/// Column of each barb, given the pixel row of each in drawing order.
/// A barb takes the first column whose previous barb is at least
/// `min_gap` rows away, else the column with the most room.
#[must_use]
pub fn barb_columns(rows: &[i32], columns: usize, min_gap: i32) -> Vec<usize> {
    let mut last: Vec<Option<i32>> = vec![None; columns.max(1)];
    rows.iter()
        .map(|&row| {
            let room = |c: usize| last[c].map_or(i32::MAX, |prev: i32| (prev - row).abs());
            let column = (0..last.len())
                .find(|&c| room(c) >= min_gap)
                .or_else(|| (0..last.len()).max_by_key(|&c| room(c)))
                .unwrap_or(0);
            last[column] = Some(row);
            column
        })
        .collect()
}

/// What a render put on the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendered {
    /// Wind barbs drawn, calm circles included
    pub barbs: usize,
}

/// Render `sounding` as a PNG at `path`. Text is only drawn when `labels`
/// is set, i.e. a font is registered.
pub fn render(
    path: &Path,
    sounding: &Sounding,
    lead_hours: Option<i64>,
    config: &PlotConfig,
    labels: bool,
) -> Result<Rendered, PlotError> {
    let transform = SkewTransform::new(config.skew, config.bottom_pressure, config.top_pressure);

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(PlotError::render)?;

    let area = if labels {
        root.titled(&title(sounding, lead_hours), (FAMILY, 22).into_font())
            .map_err(PlotError::render)?
    } else {
        root.margin(MARGIN, MARGIN, MARGIN, MARGIN)
    };

    let (width, _) = area.dim_in_pixel();
    let (left, right) = area.split_horizontally(width * 4 / 5);

    draw_skew_t(&left, sounding, &transform, labels)?;
    let barbs = draw_wind(&right, sounding, &transform, labels)?;

    root.present().map_err(PlotError::render)?;
    Ok(Rendered { barbs })
}

fn draw_skew_t<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    sounding: &Sounding,
    transform: &SkewTransform,
    labels: bool,
) -> Result<(), PlotError> {
    let x_range = transform.x_range(&sounding.levels);
    let y_range = transform.y_range();

    let mut chart = ChartBuilder::on(area)
        .margin(MARGIN)
        .x_label_area_size(if labels { X_LABEL_AREA } else { 0 })
        .y_label_area_size(if labels { Y_LABEL_AREA } else { 0 })
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(PlotError::render)?;

    if labels {
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_y_axis()
            .x_labels(10)
            .x_desc(format!("Temperature at {:.0} hPa (°C)", transform.bottom_pressure))
            .label_style((FAMILY, 13).into_font())
            .draw()
            .map_err(PlotError::render)?;
    }

    let pressures = transform.pressures(80);

    // isobars
    let isobars: Vec<f64> = ISOBARS
        .iter()
        .copied()
        .filter(|p| transform.contains_pressure(*p))
        .collect();
    draw_polylines(
        &mut chart,
        isobars
            .iter()
            .map(|&p| vec![(x_range.start, transform.y(p)), (x_range.end, transform.y(p))])
            .collect(),
        ISOBAR_COLOR.stroke_width(1),
    )?;
    if labels {
        for p in &isobars {
            chart
                .draw_series(once(
                    EmptyElement::at((x_range.start, transform.y(*p)))
                        + Text::new(format!("{p:.0}"), (-40, -7), (FAMILY, 13).into_font()),
                ))
                .map_err(PlotError::render)?;
        }
    }

    // isotherms every 10 °C
    let isotherms: Vec<Vec<(f64, f64)>> = (-12..=5)
        .map(|i| {
            let t = f64::from(i) * 10.0;
            pressures.iter().map(|&p| transform.point(t, p)).collect()
        })
        .collect();
    draw_clipped(&mut chart, isotherms, &x_range, ISOTHERM_COLOR.mix(0.6).stroke_width(1))?;

    // dry adiabats
    let dry: Vec<Vec<(f64, f64)>> = (0..=20)
        .map(|i| {
            let theta = 250.0 + f64::from(i) * 10.0;
            pressures
                .iter()
                .map(|&p| transform.point(thermo::dry_adiabat(theta, p), p))
                .collect()
        })
        .collect();
    draw_clipped(&mut chart, dry, &x_range, DRY_ADIABAT_COLOR.mix(0.6).stroke_width(1))?;

    // moist adiabats
    let moist_pressures: Vec<f64> = pressures
        .iter()
        .copied()
        .filter(|p| *p >= MOIST_ADIABAT_TOP)
        .collect();
    let moist: Vec<Vec<(f64, f64)>> = (-5..=9)
        .map(|i| {
            let t1000 = f64::from(i) * 4.0;
            thermo::moist_adiabat(t1000, &moist_pressures)
                .into_iter()
                .map(|(p, t)| transform.point(t, p))
                .collect()
        })
        .collect();
    draw_clipped(&mut chart, moist, &x_range, MOIST_ADIABAT_COLOR.mix(0.6).stroke_width(1))?;

    // saturation mixing ratio lines
    let mixing_pressures: Vec<f64> = pressures
        .iter()
        .copied()
        .filter(|p| *p >= MIXING_RATIO_TOP)
        .collect();
    let mixing: Vec<Vec<(f64, f64)>> = MIXING_RATIOS
        .iter()
        .map(|&w| {
            mixing_pressures
                .iter()
                .filter_map(|&p| thermo::mixing_ratio_line(w, p).map(|t| transform.point(t, p)))
                .collect()
        })
        .collect();
    draw_clipped(&mut chart, mixing, &x_range, MIXING_RATIO_COLOR.mix(0.5).stroke_width(1))?;
    if labels && transform.contains_pressure(MIXING_RATIO_TOP) {
        for w in MIXING_RATIOS {
            let Some(t) = thermo::mixing_ratio_line(w, MIXING_RATIO_TOP) else {
                continue;
            };
            let at = transform.point(t, MIXING_RATIO_TOP);
            if x_range.contains(&at.0) {
                chart
                    .draw_series(once(
                        EmptyElement::at(at)
                            + Text::new(
                                format!("{w}"),
                                (-4, -14),
                                (FAMILY, 11).into_font().color(&MIXING_RATIO_COLOR),
                            ),
                    ))
                    .map_err(PlotError::render)?;
            }
        }
    }

    // traces
    let levels: Vec<_> = sounding
        .levels
        .iter()
        .filter(|l| transform.contains_pressure(l.pressure))
        .collect();

    for pair in levels.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        let color = match (lower.height, upper.height) {
            (Some(z0), Some(z1)) => thermo::lapse_rate(lower.temperature, z0, upper.temperature, z1)
                .map_or(RED, lapse_rate_color),
            _ => RED,
        };
        chart
            .draw_series(once(PathElement::new(
                vec![
                    transform.point(lower.temperature, lower.pressure),
                    transform.point(upper.temperature, upper.pressure),
                ],
                color.stroke_width(3),
            )))
            .map_err(PlotError::render)?;
    }

    chart
        .draw_series(once(PathElement::new(
            levels
                .iter()
                .map(|l| transform.point(l.dew_point, l.pressure))
                .collect::<Vec<_>>(),
            DEW_POINT_COLOR.stroke_width(3),
        )))
        .map_err(PlotError::render)?;

    if labels {
        let corner = (x_range.end, y_range.end);
        for (i, (text, color)) in [
            ("Temperature (lapse rate)", RGBColor(26, 152, 80)),
            ("Dew point", DEW_POINT_COLOR),
        ]
        .into_iter()
        .enumerate()
        {
            let row = 8 + 18 * i as i32;
            chart
                .draw_series(once(
                    EmptyElement::at(corner)
                        + PathElement::new(vec![(-190, row + 7), (-165, row + 7)], color.stroke_width(3))
                        + Text::new(text, (-158, row), (FAMILY, 13).into_font()),
                ))
                .map_err(PlotError::render)?;
        }
    }

    chart
        .draw_series(once(Rectangle::new(
            [(x_range.start, y_range.start), (x_range.end, y_range.end)],
            BLACK.stroke_width(1),
        )))
        .map_err(PlotError::render)?;

    Ok(())
}

fn draw_wind<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    sounding: &Sounding,
    transform: &SkewTransform,
    labels: bool,
) -> Result<usize, PlotError> {
    let levels: Vec<_> = sounding
        .levels
        .iter()
        .filter(|l| transform.contains_pressure(l.pressure))
        .collect();
    let max_speed = levels.iter().map(|l| l.wind_speed).fold(0.0, f64::max);
    let x_max = (max_speed * 1.5).max(60.0);
    let y_range = transform.y_range();

    let mut chart = ChartBuilder::on(area)
        .margin(MARGIN)
        .x_label_area_size(if labels { X_LABEL_AREA } else { 0 })
        .build_cartesian_2d(0.0..x_max, y_range.clone())
        .map_err(PlotError::render)?;

    if labels {
        chart
            .configure_mesh()
            .disable_y_mesh()
            .disable_y_axis()
            .x_labels(4)
            .x_desc("Wind (km/h)")
            .label_style((FAMILY, 13).into_font())
            .draw()
            .map_err(PlotError::render)?;
    }

    chart
        .draw_series(once(PathElement::new(
            levels
                .iter()
                .map(|l| (l.wind_speed, transform.y(l.pressure)))
                .collect::<Vec<_>>(),
            WIND_COLOR.stroke_width(2),
        )))
        .map_err(PlotError::render)?;

    // crowded levels spread sideways so every level keeps its barb
    let rows: Vec<i32> = levels
        .iter()
        .map(|l| chart.backend_coord(&(0.0, transform.y(l.pressure))).1)
        .collect();
    let columns = barb_columns(&rows, BARB_COLUMNS.len(), BARB_MIN_GAP);

    let mut drawn = 0;
    for (level, column) in levels.iter().zip(columns) {
        let anchor = (x_max * BARB_COLUMNS[column], transform.y(level.pressure));
        drawn += 1;

        let barb = barbs::barb(level.wind_speed, level.wind_direction);
        if barb.is_calm() {
            chart
                .draw_series(once(
                    EmptyElement::at(anchor) + Circle::new((0, 0), 4, BLACK.stroke_width(1)),
                ))
                .map_err(PlotError::render)?;
            continue;
        }
        for [from, to] in &barb.lines {
            chart
                .draw_series(once(
                    EmptyElement::at(anchor)
                        + PathElement::new(vec![*from, *to], BLACK.stroke_width(1)),
                ))
                .map_err(PlotError::render)?;
        }
        for pennant in &barb.pennants {
            chart
                .draw_series(once(
                    EmptyElement::at(anchor) + Polygon::new(pennant.to_vec(), BLACK.filled()),
                ))
                .map_err(PlotError::render)?;
        }
    }

    chart
        .draw_series(once(Rectangle::new(
            [(0.0, y_range.start), (x_max, y_range.end)],
            BLACK.stroke_width(1),
        )))
        .map_err(PlotError::render)?;

    Ok(drawn)
}

fn draw_clipped<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    lines: Vec<Vec<(f64, f64)>>,
    x_range: &std::ops::Range<f64>,
    style: ShapeStyle,
) -> Result<(), PlotError> {
    let runs = lines
        .iter()
        .flat_map(|line| clip_runs(line, x_range))
        .collect();
    draw_polylines(chart, runs, style)
}

fn draw_polylines<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    lines: Vec<Vec<(f64, f64)>>,
    style: ShapeStyle,
) -> Result<(), PlotError> {
    chart
        .draw_series(lines.into_iter().map(|line| PathElement::new(line, style)))
        .map_err(PlotError::render)?;
    Ok(())
}
