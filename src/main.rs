use anyhow::{bail, Context, Result};
use chartwright::charts::{Orientation, TimeChartKind};
use chartwright::dispatch::{self, ChartKind, Output, PlotRequest, Plotted};
use chartwright::layout::Bins;
use chartwright::options::{load_options, ChartOptions, Settings, DEFAULT_DPI};
use chartwright::profile::profile;
use chartwright::render::{render_png, save_png};
use chartwright::table::{self, parse_column_selector, Table};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "chartwright")]
#[command(about = "Generate charts from CSV data", long_about = None)]
struct Cli {
    #[arg(long = "input", global = true, help = "CSV file to read (defaults to stdin)")]
    input: Option<PathBuf>,

    #[arg(
        long = "ordered",
        global = true,
        help = "Treat a column as ordered categories, low to high: col=a,b,c"
    )]
    ordered: Vec<OrderedLevels>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the column type profile and the suggested charts
    Profile {
        #[arg(long = "columns", help = "Number of leading columns to profile (defaults to all)")]
        columns: Option<usize>,
    },
    /// Render a single chart
    Plot {
        #[arg(help = "Chart type (bar, box, calendar, dot, gantt, heatmap, yearly, hist, line, table, pie, radar, scatter, violin)")]
        chart: String,

        #[arg(short = 'c', long = "column", required = true, help = "Column (name or 0-based index), repeatable")]
        columns: Vec<String>,

        #[arg(long = "horizontal", help = "Draw bars, boxes and violins horizontally")]
        horizontal: bool,

        #[arg(long = "bins", help = "Histogram bin count")]
        bins: Option<usize>,

        #[arg(long = "dot-size", help = "Calendar dot size in figure units")]
        dot_size: Option<f64>,

        #[arg(long = "now", help = "Mark the current time on time charts")]
        now: bool,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Render every chart suggested by the column profile
    Auto {
        #[arg(short = 'c', long = "column", required = true, help = "Column (name or 0-based index), repeatable")]
        columns: Vec<String>,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Stack grouped time charts over the same interval columns
    Grid {
        #[arg(
            long = "kinds",
            value_delimiter = ',',
            default_value = "line,scatter,heatmap",
            help = "Panel kinds, top to bottom"
        )]
        kinds: Vec<String>,

        #[arg(short = 'c', long = "column", required = true, help = "Category, start and end columns, then an optional value column")]
        columns: Vec<String>,

        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(short = 'o', long = "output", help = "Output PNG file (directory for auto); defaults to stdout")]
    output: Option<PathBuf>,

    #[arg(long = "overwrite", help = "Replace existing output files")]
    overwrite: bool,

    #[arg(long = "config", help = "TOML file with [figure], [plot] and [overrides] settings")]
    config: Option<PathBuf>,

    #[arg(short = 't', long = "title", help = "Chart title")]
    title: Option<String>,

    #[arg(long = "x-label", help = "X-axis label")]
    x_label: Option<String>,

    #[arg(long = "y-label", help = "Y-axis label")]
    y_label: Option<String>,

    #[arg(long = "width", help = "Output width in pixels")]
    width: Option<u32>,

    #[arg(long = "height", help = "Output height in pixels")]
    height: Option<u32>,
}

impl RenderArgs {
    fn options(&self) -> Result<ChartOptions> {
        let base = match &self.config {
            Some(path) => load_options(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ChartOptions::default(),
        };
        let figsize = match (self.width, self.height) {
            (None, None) => None,
            (w, h) => Some((
                w.unwrap_or(600) as f64 / DEFAULT_DPI,
                h.unwrap_or(400) as f64 / DEFAULT_DPI,
            )),
        };
        Ok(base.with_overrides(Settings {
            figsize,
            dpi: figsize.map(|_| DEFAULT_DPI),
            title: self.title.clone(),
            xlabel: self.x_label.clone(),
            ylabel: self.y_label.clone(),
            ..Default::default()
        }))
    }
}

#[derive(Debug, Clone)]
struct OrderedLevels {
    column: String,
    levels: Vec<String>,
}

impl FromStr for OrderedLevels {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (column, levels) = s
            .split_once('=')
            .ok_or_else(|| format!("expected col=a,b,c, got '{}'", s))?;
        let levels: Vec<String> = levels
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if column.trim().is_empty() || levels.is_empty() {
            return Err(format!("expected col=a,b,c, got '{}'", s));
        }
        Ok(OrderedLevels {
            column: column.trim().to_string(),
            levels,
        })
    }
}

fn load_table(cli: &Cli) -> Result<Table> {
    let mut table = match &cli.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            table::read_csv(file).with_context(|| format!("Failed to read CSV from {}", path.display()))?
        }
        None => table::read_csv_from_stdin().context("Failed to read CSV from stdin")?,
    };
    for ordered in &cli.ordered {
        table
            .set_ordered(&ordered.column, ordered.levels.clone())
            .with_context(|| format!("Failed to order column '{}'", ordered.column))?;
    }
    Ok(table)
}

fn write_stdout(png_bytes: &[u8]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(png_bytes)
        .context("Failed to write PNG to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let table = load_table(&cli)?;

    match &cli.command {
        Command::Profile { columns } => {
            let count = columns.unwrap_or(table.n_cols());
            let profiled = profile(&table, count).context("Failed to profile columns")?;
            for (name, tag) in &profiled.columns {
                println!("{}\t{}", name, tag);
            }
            println!("type code: {}", profiled.code);
            println!("suggested: {}", profiled.suggestions.join(", "));
        }
        Command::Plot {
            chart,
            columns,
            horizontal,
            bins,
            dot_size,
            now,
            render,
        } => {
            let kind: ChartKind = chart.parse()?;
            let options = render.options()?;
            let mut request = PlotRequest::new(columns.iter().map(|c| parse_column_selector(c)).collect());
            if *horizontal {
                request.orientation = Orientation::Horizontal;
            }
            if let Some(count) = bins {
                request.bins = Bins::Count(*count);
            }
            if let Some(size) = dot_size {
                request.dot_size = *size;
            }
            if *now {
                request.now = Some(chrono::Local::now().naive_local());
            }

            let output = match &render.output {
                Some(path) => Output::File {
                    path,
                    overwrite: render.overwrite,
                },
                None => Output::Png,
            };
            match dispatch::plot(kind, &table, &request, &options, output)
                .with_context(|| format!("Failed to generate {} chart", kind))?
            {
                Plotted::Png(png_bytes) => write_stdout(&png_bytes)?,
                // a skipped save is already logged as a warning
                Plotted::Saved(_) => {}
            }
        }
        Command::Auto { columns, render } => {
            let Some(dir) = &render.output else {
                bail!("auto writes one file per chart; pass --output <directory>");
            };
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
            let options = render.options()?;
            let refs: Vec<_> = columns.iter().map(|c| parse_column_selector(c)).collect();
            let figures = dispatch::plot_charts(&table, &refs, &options)?;
            if figures.is_empty() {
                eprintln!("No suitable plot type found for the columns or data types.");
            }
            for (i, (kind, figure)) in figures.iter().enumerate() {
                let path = dir.join(format!("{:02}_{}.png", i + 1, kind));
                save_png(figure, &path, render.overwrite)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
            }
        }
        Command::Grid { kinds, columns, render } => {
            let kinds = kinds
                .iter()
                .map(|k| k.parse::<TimeChartKind>())
                .collect::<chartwright::Result<Vec<_>>>()?;
            let options = render.options()?;
            let request = PlotRequest::new(columns.iter().map(|c| parse_column_selector(c)).collect());
            let Some(figure) = dispatch::plot_time_grid(&table, &request, &kinds, &options)? else {
                bail!("Nothing to draw");
            };
            match &render.output {
                Some(path) => {
                    save_png(&figure, path, render.overwrite)?;
                }
                None => write_stdout(&render_png(&figure).context("Failed to generate grid")?)?,
            }
        }
    }

    Ok(())
}
