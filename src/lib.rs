// Library exports for chartwright

pub mod error;
pub mod options;
pub mod palette;
pub mod profile;
pub mod table;

// Scene graph and layout
pub mod ir;
pub mod layout;

pub mod charts;
pub mod dispatch;
pub mod render;

pub use dispatch::{build, plot, plot_charts, ChartKind, Output, PlotRequest, Plotted};
pub use error::{ChartError, Result};
pub use options::ChartOptions;
pub use render::{render_png, save_png, SaveOutcome};
