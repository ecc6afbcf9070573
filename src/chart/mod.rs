pub mod animation;
pub mod geometry;
pub mod hit;
pub mod model;
pub mod view;

pub use animation::{Animation, Phase, ease_in_quad};
pub use geometry::{AngleTable, ArcSegment, Layout, Point, TextPoint};
pub use hit::{Ring, hit_test};
pub use model::Doughnut;
pub use view::{draw_frame, draw_static};

/// Tolerance for treating the last end angle as a full turn when hit testing.
pub const WRAP_EPSILON: f64 = 1e-9;
