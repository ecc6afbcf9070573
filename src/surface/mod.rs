use crate::config::{Color, SurfaceKind};
use thiserror::Error;

pub mod canvas;
pub mod recording;

pub use canvas::CairoSurface;
pub use recording::{DrawLog, DrawOp, FixedProvider, RecordingSurface};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("drawing surface is not ready yet")]
    NotReady,
    #[error("failed to allocate image surface: {0}")]
    Image(cairo::Error),
    #[error(transparent)]
    Cairo(#[from] cairo::Error),
}

/// Size and pixel density of the element a surface is created for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementGeometry {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl ElementGeometry {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn device_size(&self) -> (i32, i32) {
        (
            (self.width * self.pixel_ratio).ceil() as i32,
            (self.height * self.pixel_ratio).ceil() as i32,
        )
    }
}

/// Immediate-mode 2D drawing primitives the chart is rendered with.
///
/// Coordinates are logical pixels; implementations apply the pixel ratio.
pub trait DrawingSurface {
    fn kind(&self) -> SurfaceKind;

    fn clear(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError>;

    fn begin_path(&mut self);

    fn close_path(&mut self);

    fn set_stroke_color(&mut self, color: Color);

    fn set_line_width(&mut self, width: f64);

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64, counterclockwise: bool);

    fn stroke(&mut self) -> Result<(), SurfaceError>;

    fn set_fill_color(&mut self, color: Color);

    fn fill_disk(&mut self, cx: f64, cy: f64, radius: f64) -> Result<(), SurfaceError>;

    fn set_font(&mut self, size: f64);

    fn measure_text(&mut self, text: &str) -> Result<f64, SurfaceError>;

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), SurfaceError>;

    /// Flushes buffered drawing to the screen. Only called for buffered surfaces.
    fn present(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Resolves the host element a chart draws into.
pub trait SurfaceProvider {
    /// `None` while the element has not been laid out.
    fn lookup(&self) -> Option<ElementGeometry>;

    fn create(
        &mut self,
        geometry: &ElementGeometry,
        kind: SurfaceKind,
    ) -> Result<Box<dyn DrawingSurface>, SurfaceError>;

    fn acquire(&mut self, kind: SurfaceKind) -> Result<Box<dyn DrawingSurface>, SurfaceError> {
        let geometry = self.lookup().ok_or(SurfaceError::NotReady)?;
        self.create(&geometry, kind)
    }
}
