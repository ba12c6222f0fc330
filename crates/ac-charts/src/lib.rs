//! Per-chart-family navigation wiring
//!
//! Each chart family owns one nav map built at chart-build time from
//! the `ac-core` construction algorithms, and forwards keyboard
//! commands to it. Rendering, announcement and sonification subscribe
//! to the map's run notifications; none of that lives here.

pub mod bar;
pub mod command;
pub mod line;
pub mod scatter;

pub use bar::BarChartNav;
pub use command::NavCommand;
pub use line::LineChartNav;
pub use scatter::ScatterChartNav;

/// Chart instance identifier type
pub type ChartId = uuid::Uuid;
