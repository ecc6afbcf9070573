use cairo::{Context, ImageSurface};
use doughnut::SurfaceKind;
use doughnut::surface::{CairoSurface, DrawingSurface, ElementGeometry, SurfaceError, SurfaceProvider};
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

/// Last image the chart drew, painted by the drawing area on every draw.
pub type FrameSlot = Rc<RefCell<Option<ImageSurface>>>;

/// Creates chart surfaces for a laid-out `gtk::DrawingArea`.
pub struct DrawingAreaProvider {
    area: gtk::DrawingArea,
    frame: FrameSlot,
}

impl DrawingAreaProvider {
    pub fn new(area: gtk::DrawingArea, frame: FrameSlot) -> Self {
        Self { area, frame }
    }
}

impl SurfaceProvider for DrawingAreaProvider {
    fn lookup(&self) -> Option<ElementGeometry> {
        let (width, height) = (self.area.width(), self.area.height());
        (width > 0 && height > 0).then(|| {
            ElementGeometry::new(
                width as f64,
                height as f64,
                self.area.scale_factor() as f64,
            )
        })
    }

    fn create(
        &mut self,
        geometry: &ElementGeometry,
        kind: SurfaceKind,
    ) -> Result<Box<dyn DrawingSurface>, SurfaceError> {
        let area = self.area.clone();
        let frame = self.frame.clone();
        let surface = CairoSurface::new(geometry, kind)?.with_present_hook(move |image| {
            frame.replace(Some(image.clone()));
            area.queue_draw();
        });

        self.frame.replace(Some(surface.image().clone()));
        Ok(Box::new(surface))
    }
}

/// Installs the draw function that blits the chart's image onto the area.
pub fn install_draw_func(area: &gtk::DrawingArea, frame: FrameSlot) {
    area.set_draw_func(move |area, cr, _, _| {
        if let Some(image) = frame.borrow().as_ref()
            && let Err(e) = paint_frame(cr, image, area.scale_factor() as f64)
        {
            log::error!("Drawing error: {}", e);
        }
    });
}

fn paint_frame(cr: &Context, image: &ImageSurface, scale: f64) -> Result<(), cairo::Error> {
    cr.save()?;
    cr.scale(1.0 / scale, 1.0 / scale);
    cr.set_source_surface(image, 0.0, 0.0)?;
    cr.paint()?;
    cr.restore()
}
