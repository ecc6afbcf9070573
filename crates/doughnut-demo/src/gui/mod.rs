pub mod app;
pub mod schedule;
pub mod surface;
pub mod theme;
