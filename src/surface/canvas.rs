use super::{DrawingSurface, ElementGeometry, SurfaceError};
use crate::config::{Color, SurfaceKind};
use cairo::{Context, Format, ImageSurface, Operator};
use palette::Srgba;
use std::f64::consts::PI;

const FONT_FAMILY: &str = "Sans";

/// Draws into an offscreen cairo image sized for the element's pixel density.
pub struct CairoSurface {
    cr: Context,
    image: ImageSurface,
    kind: SurfaceKind,
    stroke: Color,
    fill: Color,
    on_present: Option<Box<dyn Fn(&ImageSurface)>>,
}

impl CairoSurface {
    pub fn new(geometry: &ElementGeometry, kind: SurfaceKind) -> Result<Self, SurfaceError> {
        let (w, h) = geometry.device_size();
        let image = ImageSurface::create(Format::ARgb32, w.max(1), h.max(1))
            .map_err(SurfaceError::Image)?;
        let cr = Context::new(&image)?;
        cr.scale(geometry.pixel_ratio, geometry.pixel_ratio);
        cr.select_font_face(FONT_FAMILY, cairo::FontSlant::Normal, cairo::FontWeight::Normal);

        let black = Color::from(Srgba::new(0.0, 0.0, 0.0, 1.0));
        Ok(Self {
            cr,
            image,
            kind,
            stroke: black,
            fill: black,
            on_present: None,
        })
    }

    /// Runs `hook` with the flushed image every time the chart presents a frame.
    pub fn with_present_hook(mut self, hook: impl Fn(&ImageSurface) + 'static) -> Self {
        self.on_present = Some(Box::new(hook));
        self
    }

    pub fn image(&self) -> &ImageSurface {
        &self.image
    }

    fn set_source(&self, color: Color) {
        let (r, g, b, a) = color.rgba();
        self.cr.set_source_rgba(r, g, b, a);
    }
}

impl DrawingSurface for CairoSurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn clear(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), SurfaceError> {
        self.cr.save()?;
        self.cr.set_operator(Operator::Clear);
        self.cr.rectangle(x, y, width, height);
        self.cr.fill()?;
        self.cr.restore()?;
        Ok(())
    }

    fn begin_path(&mut self) {
        self.cr.new_path();
    }

    fn close_path(&mut self) {
        self.cr.close_path();
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.cr.set_line_width(width);
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64, counterclockwise: bool) {
        if counterclockwise {
            self.cr.arc_negative(cx, cy, radius, start, end);
        } else {
            self.cr.arc(cx, cy, radius, start, end);
        }
    }

    fn stroke(&mut self) -> Result<(), SurfaceError> {
        self.set_source(self.stroke);
        self.cr.stroke()?;
        Ok(())
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn fill_disk(&mut self, cx: f64, cy: f64, radius: f64) -> Result<(), SurfaceError> {
        self.set_source(self.fill);
        self.cr.new_path();
        self.cr.arc(cx, cy, radius, 0.0, 2.0 * PI);
        self.cr.fill()?;
        Ok(())
    }

    fn set_font(&mut self, size: f64) {
        self.cr.set_font_size(size);
    }

    fn measure_text(&mut self, text: &str) -> Result<f64, SurfaceError> {
        Ok(self.cr.text_extents(text)?.width())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), SurfaceError> {
        self.set_source(self.fill);
        self.cr.move_to(x, y);
        self.cr.show_text(text)?;
        self.cr.new_path();
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.image.flush();
        if let Some(hook) = &self.on_present {
            hook(&self.image);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_matches_pixel_ratio() {
        let geometry = ElementGeometry::new(200.0, 120.0, 2.0);
        let surface = CairoSurface::new(&geometry, SurfaceKind::Buffered).unwrap();
        assert_eq!(surface.image().width(), 400);
        assert_eq!(surface.image().height(), 240);
        assert_eq!(surface.kind(), SurfaceKind::Buffered);
    }

    #[test]
    fn test_present_runs_hook() {
        use std::cell::Cell;
        use std::rc::Rc;

        let presented = Rc::new(Cell::new(0));
        let counter = presented.clone();
        let geometry = ElementGeometry::new(10.0, 10.0, 1.0);
        let mut surface = CairoSurface::new(&geometry, SurfaceKind::Buffered)
            .unwrap()
            .with_present_hook(move |_| counter.set(counter.get() + 1));

        surface.set_fill_color("#ff0000".parse().unwrap());
        surface.fill_disk(5.0, 5.0, 4.0).unwrap();
        surface.present().unwrap();
        surface.present().unwrap();
        assert_eq!(presented.get(), 2);
    }
}
