//! Animated ring (doughnut) chart rendering with pointer hit-testing.
//!
//! The engine is independent of any UI toolkit: hosts supply a
//! [`surface::SurfaceProvider`] and a [`scheduler::FrameScheduler`] and drive
//! a [`chart::Doughnut`] from their lifecycle callbacks.

pub mod chart;
pub mod config;
pub mod scheduler;
pub mod surface;

pub use chart::{Doughnut, Phase, Point};
pub use config::{ChartConfig, Color, ConfigError, LabelFormatter, SurfaceKind};
