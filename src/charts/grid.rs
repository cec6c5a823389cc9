use super::timeline::{grouped_panel, TimeChartKind, TimeSeries};
use crate::error::Result;
use crate::ir::Figure;
use crate::layout::padded_range;
use crate::options::{ChartOptions, Settings, DEFAULT_FIGSIZE};
use chrono::NaiveDateTime;

fn defaults(n: usize) -> Settings {
    Settings {
        figsize: Some((DEFAULT_FIGSIZE.0, DEFAULT_FIGSIZE.1 * n as f64)),
        title: Some("Grouped Chart Grid".into()),
        xlabel: Some("Time".into()),
        color: Some("black".into()),
        line_width: Some(2.0),
        marker_size: Some(6.0),
        legend: Some(true),
        date_format: Some("%Y".into()),
        ..Default::default()
    }
}

/// Stack one grouped time chart per entry, sharing the time axis.
///
/// The input lists are zipped, so the shortest one decides how many panels
/// are drawn. Returns `None` when there is nothing to draw.
pub fn plot_grid(
    categories_list: &[Vec<String>],
    starts_list: &[Vec<NaiveDateTime>],
    ends_list: &[Vec<NaiveDateTime>],
    kinds: &[TimeChartKind],
    values_list: Option<&[Vec<f64>]>,
    options: &ChartOptions,
) -> Result<Option<Figure>> {
    let n = categories_list
        .len()
        .min(starts_list.len())
        .min(ends_list.len())
        .min(kinds.len());
    if n == 0 {
        log::warn!("plot grid has no entries; nothing to draw");
        return Ok(None);
    }

    let settings = options.resolve(defaults(n));
    let series: Vec<TimeSeries> = (0..n)
        .map(|i| {
            let s = TimeSeries::new(&categories_list[i], &starts_list[i], &ends_list[i]);
            match values_list.and_then(|v| v.get(i)) {
                Some(values) => s.with_values(values),
                None => s,
            }
        })
        .collect();

    let mut panels = Vec::with_capacity(n);
    for (row, (s, kind)) in series.iter().zip(kinds).enumerate() {
        let panel_settings = settings.clone().layer(&Settings {
            title: Some(kind.title().into()),
            ..Default::default()
        });
        let mut panel = grouped_panel(s, *kind, None, &panel_settings, row)?;
        if row + 1 < n {
            panel.x_axis.label = None;
        }
        panels.push(panel);
    }

    // shared x range across every panel
    let (first, last) = series.iter().map(|s| s.span()).fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), (a, b)| (lo.min(a), hi.max(b)),
    );
    let x_range = settings.xlim.unwrap_or_else(|| padded_range(first, last, 0.05));
    for panel in &mut panels {
        panel.x_axis.range = x_range;
    }

    let mut figure = Figure::new(&settings, n, 1);
    figure.shared_x = true;
    figure.title = settings.title.clone();
    figure.panels = panels;
    Ok(Some(figure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_plot_grid_stacks_panels() {
        let cats = vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string()]];
        let starts = vec![vec![day(2020, 1, 1), day(2021, 1, 1)], vec![day(2019, 1, 1)]];
        let ends = vec![vec![day(2020, 6, 1), day(2021, 6, 1)], vec![day(2022, 1, 1)]];
        let kinds = [TimeChartKind::Line, TimeChartKind::Scatter];

        let figure = plot_grid(&cats, &starts, &ends, &kinds, None, &ChartOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.nrows, 2);
        assert!(figure.shared_x);
        assert_eq!(figure.title.as_deref(), Some("Grouped Chart Grid"));
        assert_eq!((figure.width, figure.height), (600, 800));
        assert_eq!(figure.panels[0].x_axis.range, figure.panels[1].x_axis.range);
        assert_eq!(figure.panels[0].x_axis.label, None);
        assert_eq!(figure.panels[1].x_axis.label.as_deref(), Some("Time"));
        assert_eq!(figure.panels[1].title.as_deref(), Some("Scatter Chart"));
    }

    #[test]
    fn test_plot_grid_zips_to_shortest() {
        let cats = vec![vec!["A".to_string()], vec!["B".to_string()]];
        let starts = vec![vec![day(2020, 1, 1)], vec![day(2020, 1, 1)]];
        let ends = vec![vec![day(2020, 2, 1)], vec![day(2020, 2, 1)]];
        let figure = plot_grid(&cats, &starts, &ends, &[TimeChartKind::Line], None, &ChartOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(figure.panels.len(), 1);
    }

    #[test]
    fn test_plot_grid_empty_returns_none() {
        let result = plot_grid(&[], &[], &[], &[], None, &ChartOptions::default()).unwrap();
        assert!(result.is_none());
    }
}
