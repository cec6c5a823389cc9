//! PNG backend: executes a compiled [`Figure`] with plotters.
//!
//! Layout decisions are all made by the chart builders; this module only maps
//! data-space primitives onto a bitmap and encodes it.

use crate::error::{ChartError, Result};
use crate::ir::{Anchor, Axis, Colorbar, DrawCommand, Figure, Marker, MarkerStyle, Panel, Ticks};
use crate::layout::num_to_date;
use crate::palette::{greys, Color as PaletteColor};
use anyhow::Context;
use image::ImageEncoder;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::path::Path;

type PanelChart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type Area<'b> = DrawingArea<BitMapBackend<'b>, Shift>;

const DASH_STEPS: usize = 40;
const COLORBAR_STEPS: usize = 50;

/// Result of [`save_png`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The target existed and `overwrite` was not set
    Skipped,
}

/// Render a figure to PNG bytes.
pub fn render_png(figure: &Figure) -> Result<Vec<u8>> {
    if figure.panels.is_empty() {
        return Err(ChartError::Render("figure has no panels".into()));
    }
    draw_figure(figure).map_err(|e| ChartError::Render(format!("{:#}", e)))
}

/// Render and write a figure, leaving an existing file alone unless `overwrite` is set.
pub fn save_png(figure: &Figure, path: &Path, overwrite: bool) -> Result<SaveOutcome> {
    if path.exists() && !overwrite {
        log::warn!("Figure not saved. File exists: {}", path.display());
        return Ok(SaveOutcome::Skipped);
    }
    let png = render_png(figure)?;
    fs::write(path, png)?;
    log::info!("Wrote {}", path.display());
    Ok(SaveOutcome::Written)
}

fn draw_figure(figure: &Figure) -> anyhow::Result<Vec<u8>> {
    let (width, height) = (figure.width, figure.height);
    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();

        root.fill(&WHITE).context("Failed to fill background")?;

        let body = match &figure.title {
            Some(title) => root
                .titled(title, ("sans-serif", 20))
                .context("Failed to draw figure title")?,
            None => root.clone(),
        };

        let nrows = figure.nrows.max(1);
        let ncols = figure.ncols.max(1);
        let cells = body.split_evenly((nrows, ncols));
        for panel in &figure.panels {
            let cell = cells
                .get(panel.row * ncols + panel.col)
                .with_context(|| format!("Panel ({}, {}) is outside the figure grid", panel.row, panel.col))?;
            draw_panel(&root, cell, panel)?;
        }

        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn rgb(color: PaletteColor) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn label_area(axis: &Axis, horizontal: bool) -> u32 {
    if !axis.visible {
        return 0;
    }
    match (&axis.ticks, horizontal) {
        (Ticks::Fixed(labels), false) => {
            let widest = labels.iter().map(|(_, l)| l.chars().count()).max().unwrap_or(0);
            ((widest * 7 + 15) as u32).clamp(40, 200)
        }
        (_, true) => 40,
        (_, false) => 50,
    }
}

fn tick_formatter(ticks: &Ticks) -> Box<dyn Fn(&f64) -> String> {
    match ticks {
        Ticks::Dates { format } => {
            let format = format.clone();
            Box::new(move |v: &f64| {
                num_to_date(*v)
                    .map(|d| d.format(&format).to_string())
                    .unwrap_or_default()
            })
        }
        // fixed labels are drawn by hand
        Ticks::Fixed(_) | Ticks::Hidden => Box::new(|_: &f64| String::new()),
        Ticks::Auto => Box::new(|v: &f64| format!("{}", (v * 1000.0).round() / 1000.0)),
    }
}

fn draw_panel(root: &Area<'_>, area: &Area<'_>, panel: &Panel) -> anyhow::Result<()> {
    let (x0, x1) = panel.x_axis.range;
    let (y0, y1) = panel.y_axis.range;

    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if let Some(title) = &panel.title {
        builder.caption(title, ("sans-serif", 16));
    }
    if panel.colorbar.is_some() {
        builder.margin_top(40);
    }
    let x_size = label_area(&panel.x_axis, true);
    let y_size = label_area(&panel.y_axis, false);
    let x_side = if panel.x_axis.opposite {
        LabelAreaPosition::Top
    } else {
        LabelAreaPosition::Bottom
    };
    let y_side = if panel.y_axis.opposite {
        LabelAreaPosition::Right
    } else {
        LabelAreaPosition::Left
    };
    builder.set_label_area_size(x_side, x_size);
    builder.set_label_area_size(y_side, y_size);

    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .context("Failed to build chart")?;

    let x_fmt = tick_formatter(&panel.x_axis.ticks);
    let y_fmt = tick_formatter(&panel.y_axis.ticks);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_formatter(&*x_fmt).y_label_formatter(&*y_fmt);
        if matches!(panel.x_axis.ticks, Ticks::Fixed(_) | Ticks::Hidden) {
            mesh.x_labels(0);
        }
        if matches!(panel.y_axis.ticks, Ticks::Fixed(_) | Ticks::Hidden) {
            mesh.y_labels(0);
        }
        if !panel.x_axis.grid {
            mesh.disable_x_mesh();
        }
        if !panel.y_axis.grid {
            mesh.disable_y_mesh();
        }
        if !panel.x_axis.visible {
            mesh.disable_x_axis();
        }
        if !panel.y_axis.visible {
            mesh.disable_y_axis();
        }
        if let Some(label) = &panel.x_axis.label {
            mesh.x_desc(label);
        }
        if let Some(label) = &panel.y_axis.label {
            mesh.y_desc(label);
        }
        mesh.draw().context("Failed to draw mesh")?;
    }

    let with_legend = panel.legend.is_some();
    if let Some(title) = panel.legend.as_ref().and_then(|l| l.title.as_deref()) {
        // title row of the legend box
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
            .context("Failed to draw legend title")?
            .label(title)
            .legend(|(x, y)| Circle::new((x, y), 0, WHITE.filled()));
    }

    let mut labelled: Vec<&str> = Vec::new();
    for command in &panel.commands {
        let label = match command.legend() {
            Some(l) if with_legend && !labelled.contains(&l) => {
                labelled.push(l);
                Some(l)
            }
            _ => None,
        };
        draw_command(&mut chart, command, label)?;
    }

    if with_legend && !labelled.is_empty() {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .context("Failed to draw legend")?;
    }

    draw_fixed_ticks(root, &chart, panel)?;
    if let Some(colorbar) = &panel.colorbar {
        draw_colorbar(root, &chart, colorbar)?;
    }
    Ok(())
}

fn draw_command(chart: &mut PanelChart<'_, '_>, command: &DrawCommand, label: Option<&str>) -> anyhow::Result<()> {
    match command {
        DrawCommand::Rect { from, to, style, .. } => {
            if let Some(fill) = style.fill {
                let color = rgb(fill).mix(style.alpha);
                let anno = chart
                    .draw_series(std::iter::once(Rectangle::new([*from, *to], color.filled())))
                    .context("Failed to draw rectangle")?;
                if let Some(text) = label {
                    anno.label(text)
                        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
                }
            }
            if let Some(edge) = style.edge {
                let stroke = rgb(edge).stroke_width(style.edge_width.round().max(1.0) as u32);
                chart
                    .draw_series(std::iter::once(Rectangle::new([*from, *to], stroke)))
                    .context("Failed to draw rectangle edge")?;
            }
        }
        DrawCommand::Polygon { points, style, .. } => {
            if let Some(fill) = style.fill {
                let color = rgb(fill).mix(style.alpha);
                let anno = chart
                    .draw_series(std::iter::once(Polygon::new(points.clone(), color.filled())))
                    .context("Failed to draw polygon")?;
                if let Some(text) = label {
                    anno.label(text)
                        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
                }
            }
            if let Some(edge) = style.edge {
                let stroke = rgb(edge).stroke_width(style.edge_width.round().max(1.0) as u32);
                let mut outline = points.clone();
                if let Some(first) = points.first() {
                    outline.push(*first);
                }
                chart
                    .draw_series(std::iter::once(PathElement::new(outline, stroke)))
                    .context("Failed to draw polygon edge")?;
            }
        }
        DrawCommand::Polyline { points, style, .. } => {
            let stroke = rgb(style.color).stroke_width(style.width.round().max(1.0) as u32);
            let drawn = if style.dashed {
                chart.draw_series(dashes(points).into_iter().map(|seg| PathElement::new(seg, stroke)))
            } else {
                chart.draw_series(LineSeries::new(points.iter().copied(), stroke))
            };
            let anno = drawn.context("Failed to draw line")?;
            if let Some(text) = label {
                anno.label(text)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], stroke));
            }
        }
        DrawCommand::Markers { points, style, .. } => draw_markers(chart, points, style, label)?,
        DrawCommand::Text {
            position,
            text,
            color,
            size,
            anchor,
        } => {
            let pos = match anchor {
                Anchor::Center => Pos::new(HPos::Center, VPos::Center),
                Anchor::Left => Pos::new(HPos::Left, VPos::Bottom),
            };
            let font = ("sans-serif", *size as f64).into_font().color(&rgb(*color)).pos(pos);
            chart
                .draw_series(std::iter::once(Text::new(text.clone(), *position, font)))
                .context("Failed to draw text")?;
        }
    }
    Ok(())
}

fn draw_markers(
    chart: &mut PanelChart<'_, '_>,
    points: &[(f64, f64)],
    style: &MarkerStyle,
    label: Option<&str>,
) -> anyhow::Result<()> {
    let r = ((style.size / 2.0).round() as i32).max(1);
    let fill = rgb(style.fill).filled();
    let strokes = std::iter::once(fill).chain(style.edge.map(|e| rgb(e).stroke_width(1)));

    for (pass, shape) in strokes.enumerate() {
        let anno = match style.marker {
            Marker::Circle => chart.draw_series(points.iter().map(|p| Circle::new(*p, r, shape))),
            Marker::TriangleUp => chart.draw_series(points.iter().map(|p| TriangleMarker::new(*p, r, shape))),
            Marker::Cross => chart.draw_series(points.iter().map(|p| Cross::new(*p, r, shape))),
            Marker::Plus => chart.draw_series(points.iter().map(|p| {
                EmptyElement::at(*p)
                    + PathElement::new(vec![(-r, 0), (r, 0)], shape)
                    + PathElement::new(vec![(0, -r), (0, r)], shape)
            })),
            Marker::Square | Marker::Star | Marker::Diamond | Marker::Hexagon => {
                let outline = glyph(style.marker, r);
                chart.draw_series(
                    points
                        .iter()
                        .map(|p| EmptyElement::at(*p) + Polygon::new(outline.clone(), shape)),
                )
            }
        }
        .context("Failed to draw markers")?;

        if let (0, Some(text)) = (pass, label) {
            let legend_r = r.min(5);
            anno.label(text)
                .legend(move |(x, y)| Circle::new((x + 7, y), legend_r, fill));
        }
    }
    Ok(())
}

/// Pixel outline of a polygonal marker centred on the origin
fn glyph(marker: Marker, r: i32) -> Vec<(i32, i32)> {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    let (corners, inner, phase) = match marker {
        Marker::Square => (4, 1.0, FRAC_PI_4),
        Marker::Hexagon => (6, 1.0, FRAC_PI_2),
        Marker::Star => (5, 0.45, FRAC_PI_2),
        _ => (4, 1.0, FRAC_PI_2),
    };
    let steps = if inner < 1.0 { corners * 2 } else { corners };
    (0..steps)
        .map(|i| {
            let radius = if inner < 1.0 && i % 2 == 1 {
                r as f64 * inner
            } else {
                r as f64
            };
            let angle = phase + 2.0 * std::f64::consts::PI * i as f64 / steps as f64;
            ((radius * angle.cos()).round() as i32, -(radius * angle.sin()).round() as i32)
        })
        .collect()
}

/// Split a polyline into alternating dash segments in data space
fn dashes(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    for pair in points.windows(2) {
        let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
        let at = |t: f64| (ax + (bx - ax) * t, ay + (by - ay) * t);
        for step in (0..DASH_STEPS).step_by(2) {
            let t0 = step as f64 / DASH_STEPS as f64;
            let t1 = (step + 1) as f64 / DASH_STEPS as f64;
            segments.push(vec![at(t0), at(t1)]);
        }
    }
    segments
}

fn draw_fixed_ticks(root: &Area<'_>, chart: &PanelChart<'_, '_>, panel: &Panel) -> anyhow::Result<()> {
    let font = ("sans-serif", 12.0).into_font().color(&BLACK);

    if let (Ticks::Fixed(ticks), true) = (&panel.x_axis.ticks, panel.x_axis.visible) {
        let (y_bottom, y_top) = panel.y_axis.range;
        let (edge, offset, vpos) = if panel.x_axis.opposite {
            (y_top, -5, VPos::Bottom)
        } else {
            (y_bottom, 5, VPos::Top)
        };
        let style = font.pos(Pos::new(HPos::Center, vpos));
        for (value, text) in ticks {
            let (px, py) = chart.backend_coord(&(*value, edge));
            root.draw(&Text::new(text.clone(), (px, py + offset), style.clone()))
                .context("Failed to draw x tick label")?;
        }
    }

    if let (Ticks::Fixed(ticks), true) = (&panel.y_axis.ticks, panel.y_axis.visible) {
        let (x_left, x_right) = panel.x_axis.range;
        let (edge, offset, hpos) = if panel.y_axis.opposite {
            (x_right, 5, HPos::Left)
        } else {
            (x_left, -5, HPos::Right)
        };
        let style = font.pos(Pos::new(hpos, VPos::Center));
        for (value, text) in ticks {
            let (px, py) = chart.backend_coord(&(edge, *value));
            root.draw(&Text::new(text.clone(), (px + offset, py), style.clone()))
                .context("Failed to draw y tick label")?;
        }
    }
    Ok(())
}

/// Greys color scale drawn as a strip above the plotting area
fn draw_colorbar(root: &Area<'_>, chart: &PanelChart<'_, '_>, colorbar: &Colorbar) -> anyhow::Result<()> {
    let (xs, ys) = chart.plotting_area().get_pixel_range();
    let (top, left, right) = (ys.start - 30, xs.start, xs.end);
    let width = (right - left).max(1) as f64;

    for step in 0..COLORBAR_STEPS {
        let x0 = left + (width * step as f64 / COLORBAR_STEPS as f64).round() as i32;
        let x1 = left + (width * (step + 1) as f64 / COLORBAR_STEPS as f64).round() as i32;
        let shade = rgb(greys(step as f64 / (COLORBAR_STEPS - 1) as f64));
        root.draw(&Rectangle::new([(x0, top), (x1, top + 10)], shade.filled()))
            .context("Failed to draw colorbar")?;
    }
    root.draw(&Rectangle::new([(left, top), (right, top + 10)], BLACK.stroke_width(1)))
        .context("Failed to draw colorbar")?;

    let font = ("sans-serif", 11.0).into_font().color(&BLACK);
    let ends = [
        (left, HPos::Left, format!("{}", colorbar.min)),
        (right, HPos::Right, format!("{}", colorbar.max)),
    ];
    for (x, hpos, text) in ends {
        root.draw(&Text::new(text, (x, top - 2), font.pos(Pos::new(hpos, VPos::Bottom))))
            .context("Failed to draw colorbar labels")?;
    }
    root.draw(&Text::new(
        colorbar.label.clone(),
        ((left + right) / 2, top - 2),
        font.pos(Pos::new(HPos::Center, VPos::Bottom)),
    ))
    .context("Failed to draw colorbar labels")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{LineStyle, ShapeStyle};
    use crate::options::Settings;

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn sample_figure() -> Figure {
        let mut panel = Panel::new(0, 0, (-0.5, 1.5), (0.0, 4.0));
        panel.push(DrawCommand::Rect {
            from: (-0.4, 0.0),
            to: (0.4, 3.0),
            style: ShapeStyle::filled(PaletteColor::GRAY).with_edge(PaletteColor::BLACK),
            legend: Some("a".into()),
        });
        panel.push(DrawCommand::Polyline {
            points: vec![(0.0, 1.0), (1.0, 2.0)],
            style: LineStyle {
                color: PaletteColor::RED,
                width: 1.0,
                dashed: true,
            },
            legend: None,
        });
        panel.x_axis.ticks = Ticks::Fixed(vec![(0.0, "A".into()), (1.0, "B".into())]);
        panel.legend = Some(crate::ir::Legend { title: None });
        let mut figure = Figure::single(&Settings::default(), panel);
        figure.title = Some("Sample".into());
        figure
    }

    #[test]
    fn test_render_png_magic_bytes() {
        let png = render_png(&sample_figure()).unwrap();
        assert_eq!(&png[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_render_empty_figure_fails() {
        let figure = Figure::new(&Settings::default(), 1, 1);
        assert!(matches!(render_png(&figure), Err(ChartError::Render(_))));
    }

    #[test]
    fn test_save_png_skips_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        fs::write(&path, b"keep").unwrap();

        let outcome = save_png(&sample_figure(), &path, false).unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped);
        assert_eq!(fs::read(&path).unwrap(), b"keep");

        let outcome = save_png(&sample_figure(), &path, true).unwrap();
        assert_eq!(outcome, SaveOutcome::Written);
        assert_eq!(&fs::read(&path).unwrap()[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_dashes_cover_half_the_segment() {
        let segments = dashes(&[(0.0, 0.0), (0.0, 10.0)]);
        assert_eq!(segments.len(), DASH_STEPS / 2);
        assert_eq!(segments[0], vec![(0.0, 0.0), (0.0, 0.25)]);
    }

    #[test]
    fn test_star_glyph_alternates_radius() {
        let star = glyph(Marker::Star, 10);
        assert_eq!(star.len(), 10);
        assert_eq!(star[0], (0, -10));
    }
}
