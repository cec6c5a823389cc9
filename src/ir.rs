use crate::error::ChartError;
use crate::options::Settings;
use crate::palette::Color;
use std::str::FromStr;

// =============================================================================
// Scene graph
// =============================================================================

/// A complete chart: a grid of panels plus figure-level decorations.
/// The backend executes it without any further layout decisions.
#[derive(Debug, Clone)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub nrows: usize,
    pub ncols: usize,
    /// Panels stacked in one column share the x axis label of the last row
    pub shared_x: bool,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn new(settings: &Settings, nrows: usize, ncols: usize) -> Self {
        let (width, height) = settings.pixel_size();
        Figure {
            width,
            height,
            title: None,
            nrows,
            ncols,
            shared_x: false,
            panels: Vec::new(),
        }
    }

    /// Figure holding a single panel
    pub fn single(settings: &Settings, panel: Panel) -> Self {
        let mut figure = Figure::new(settings, 1, 1);
        figure.panels.push(panel);
        figure
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub row: usize,
    pub col: usize,
    pub title: Option<String>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub commands: Vec<DrawCommand>,
    pub legend: Option<Legend>,
    pub colorbar: Option<Colorbar>,
}

impl Panel {
    pub fn new(row: usize, col: usize, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Panel {
            row,
            col,
            title: None,
            x_axis: Axis::new(x_range),
            y_axis: Axis::new(y_range),
            commands: Vec::new(),
            legend: None,
            colorbar: None,
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn rect_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { .. }))
            .count()
    }

    pub fn polygon_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polygon { .. }))
            .count()
    }

    /// Total number of marker glyphs across all marker commands
    pub fn marker_count(&self) -> usize {
        self.commands
            .iter()
            .map(|c| match c {
                DrawCommand::Markers { points, .. } => points.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Legend labels in drawing order, first occurrence only
    pub fn legend_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for label in self.commands.iter().filter_map(DrawCommand::legend) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }
}

#[derive(Debug, Clone)]
pub struct Axis {
    pub range: (f64, f64),
    pub label: Option<String>,
    pub ticks: Ticks,
    pub grid: bool,
    pub visible: bool,
    /// Draw tick labels on the top (x) or right (y) side
    pub opposite: bool,
}

impl Axis {
    pub fn new(range: (f64, f64)) -> Self {
        Axis {
            range,
            label: None,
            ticks: Ticks::Auto,
            grid: false,
            visible: true,
            opposite: false,
        }
    }

    pub fn hidden(range: (f64, f64)) -> Self {
        Axis {
            visible: false,
            ticks: Ticks::Hidden,
            ..Axis::new(range)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ticks {
    Auto,
    /// Explicit tick positions with labels (categorical axes)
    Fixed(Vec<(f64, String)>),
    /// Axis values are days since the Unix epoch, shown with a chrono format string
    Dates { format: String },
    Hidden,
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub title: Option<String>,
}

/// Horizontal color scale drawn above the panel
#[derive(Debug, Clone)]
pub struct Colorbar {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

// =============================================================================
// Primitives
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub fill: Option<Color>,
    pub alpha: f64,
    pub edge: Option<Color>,
    pub edge_width: f64,
}

impl ShapeStyle {
    pub fn filled(fill: Color) -> Self {
        ShapeStyle {
            fill: Some(fill),
            alpha: 1.0,
            edge: None,
            edge_width: 1.0,
        }
    }

    pub fn with_edge(mut self, edge: Color) -> Self {
        self.edge = Some(edge);
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    pub dashed: bool,
}

impl LineStyle {
    pub fn solid(color: Color, width: f64) -> Self {
        LineStyle {
            color,
            width,
            dashed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub marker: Marker,
    /// Glyph size in pixels
    pub size: f64,
    pub fill: Color,
    pub edge: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Circle,
    TriangleUp,
    Square,
    Star,
    Plus,
    Cross,
    Diamond,
    Hexagon,
}

impl FromStr for Marker {
    type Err = ChartError;

    /// Accepts the one-character marker codes `o ^ s * + x D h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "o" => Ok(Marker::Circle),
            "^" => Ok(Marker::TriangleUp),
            "s" => Ok(Marker::Square),
            "*" => Ok(Marker::Star),
            "+" => Ok(Marker::Plus),
            "x" => Ok(Marker::Cross),
            "D" => Ok(Marker::Diamond),
            "h" => Ok(Marker::Hexagon),
            other => Err(ChartError::Validation(format!(
                "Unknown marker '{}'. Use one of o ^ s * + x D h",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    Left,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Rect {
        // Two opposite corners in data space
        from: (f64, f64),
        to: (f64, f64),
        style: ShapeStyle,
        legend: Option<String>,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        style: LineStyle,
        legend: Option<String>,
    },
    Markers {
        points: Vec<(f64, f64)>,
        style: MarkerStyle,
        legend: Option<String>,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        style: ShapeStyle,
        legend: Option<String>,
    },
    Text {
        position: (f64, f64),
        text: String,
        color: Color,
        size: u32,
        anchor: Anchor,
    },
}

impl DrawCommand {
    pub fn legend(&self) -> Option<&str> {
        match self {
            DrawCommand::Rect { legend, .. }
            | DrawCommand::Polyline { legend, .. }
            | DrawCommand::Markers { legend, .. }
            | DrawCommand::Polygon { legend, .. } => legend.as_deref(),
            DrawCommand::Text { .. } => None,
        }
    }
}
