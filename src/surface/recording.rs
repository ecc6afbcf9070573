use super::{DrawingSurface, ElementGeometry, SurfaceError, SurfaceProvider};
use crate::config::{Color, SurfaceKind};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Glyph advance used for text measurement, as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    BeginPath,
    ClosePath,
    StrokeColor(Color),
    LineWidth(f64),
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        end: f64,
        counterclockwise: bool,
    },
    Stroke,
    FillColor(Color),
    FillDisk {
        cx: f64,
        cy: f64,
        radius: f64,
    },
    Font(f64),
    FillText {
        text: String,
        x: f64,
        y: f64,
    },
    Present,
}

pub type DrawLog = Rc<RefCell<Vec<DrawOp>>>;

/// Surface that records primitives instead of rasterizing them.
pub struct RecordingSurface {
    kind: SurfaceKind,
    log: DrawLog,
    font_size: f64,
}

impl RecordingSurface {
    pub fn new(kind: SurfaceKind, log: DrawLog) -> Self {
        Self {
            kind,
            log,
            font_size: 10.0,
        }
    }

    fn push(&self, op: DrawOp) {
        self.log.borrow_mut().push(op);
    }
}

impl DrawingSurface for RecordingSurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn clear(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError> {
        self.push(DrawOp::Clear {
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn begin_path(&mut self) {
        self.push(DrawOp::BeginPath);
    }

    fn close_path(&mut self) {
        self.push(DrawOp::ClosePath);
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.push(DrawOp::StrokeColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawOp::LineWidth(width));
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64, counterclockwise: bool) {
        self.push(DrawOp::Arc {
            cx,
            cy,
            radius,
            start,
            end,
            counterclockwise,
        });
    }

    fn stroke(&mut self) -> Result<(), SurfaceError> {
        self.push(DrawOp::Stroke);
        Ok(())
    }

    fn set_fill_color(&mut self, color: Color) {
        self.push(DrawOp::FillColor(color));
    }

    fn fill_disk(&mut self, cx: f64, cy: f64, radius: f64) -> Result<(), SurfaceError> {
        self.push(DrawOp::FillDisk { cx, cy, radius });
        Ok(())
    }

    fn set_font(&mut self, size: f64) {
        self.font_size = size;
        self.push(DrawOp::Font(size));
    }

    fn measure_text(&mut self, text: &str) -> Result<f64, SurfaceError> {
        Ok(text.chars().count() as f64 * self.font_size * GLYPH_ADVANCE)
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), SurfaceError> {
        self.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.push(DrawOp::Present);
        Ok(())
    }
}

/// Hands out recording surfaces that all write to one shared log.
///
/// Clones share the element geometry, so a test can keep a clone and
/// resolve the lookup after the provider was given to a chart.
#[derive(Clone, Default)]
pub struct FixedProvider {
    geometry: Rc<Cell<Option<ElementGeometry>>>,
    log: DrawLog,
    acquisitions: Rc<Cell<usize>>,
}

impl FixedProvider {
    pub fn new(geometry: ElementGeometry) -> Self {
        let provider = Self::default();
        provider.resolve(geometry);
        provider
    }

    /// A provider whose element has not been laid out yet.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn resolve(&self, geometry: ElementGeometry) {
        self.geometry.set(Some(geometry));
    }

    pub fn log(&self) -> DrawLog {
        self.log.clone()
    }

    pub fn take_ops(&self) -> Vec<DrawOp> {
        self.log.take()
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.get()
    }
}

impl SurfaceProvider for FixedProvider {
    fn lookup(&self) -> Option<ElementGeometry> {
        self.geometry.get()
    }

    fn create(
        &mut self,
        _geometry: &ElementGeometry,
        kind: SurfaceKind,
    ) -> Result<Box<dyn DrawingSurface>, SurfaceError> {
        self.acquisitions.set(self.acquisitions.get() + 1);
        Ok(Box::new(RecordingSurface::new(kind, self.log.clone())))
    }
}
