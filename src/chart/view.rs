use super::geometry::{Layout, Point};
use crate::config::{ChartConfig, Color};
use crate::surface::{DrawingSurface, SurfaceError};
use std::f64::consts::PI;

/// Stroke width of segment `index`: widened for the active segment when
/// emphasis is on and there is more than one segment.
pub fn segment_border(
    config: &ChartConfig,
    index: usize,
    count: usize,
    active: Option<usize>,
    emphasis: bool,
) -> f64 {
    if emphasis && active == Some(index) && count > 1 {
        config.border + (config.active_border - config.border) * 2.0
    } else {
        config.border
    }
}

struct ChartRenderer<'a> {
    surface: &'a mut dyn DrawingSurface,
    config: &'a ChartConfig,
    center: Point,
}

impl<'a> ChartRenderer<'a> {
    fn new(surface: &'a mut dyn DrawingSurface, config: &'a ChartConfig, center: Point) -> Self {
        Self {
            surface,
            config,
            center,
        }
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.surface
            .clear(0.0, 0.0, self.config.width, self.config.height)
    }

    fn draw_arc(
        &mut self,
        start: f64,
        end: f64,
        width: f64,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.surface.begin_path();
        self.surface.set_line_width(width);
        self.surface.set_stroke_color(color);
        self.surface.arc(
            self.center.x,
            self.center.y,
            self.config.radius,
            start,
            end,
            false,
        );
        self.surface.stroke()?;
        self.surface.close_path();
        Ok(())
    }

    fn draw_background(&mut self) -> Result<(), SurfaceError> {
        self.draw_arc(
            0.0,
            2.0 * PI,
            self.config.border,
            self.config.border_bg_color,
        )
    }

    fn draw_arcs(
        &mut self,
        values: &[f64],
        active: Option<usize>,
        emphasis: bool,
    ) -> Result<Layout, SurfaceError> {
        let layout = Layout::compute(values, self.center, self.config.radius);

        for (i, segment) in layout.segments.iter().enumerate() {
            let width = segment_border(self.config, i, values.len(), active, emphasis);
            // validated configs always carry enough colors
            let color = self
                .config
                .border_colors
                .get(i)
                .copied()
                .unwrap_or(self.config.border_bg_color);
            self.draw_arc(segment.start, segment.end, width, color)?;
        }

        Ok(layout)
    }

    fn draw_labels(&mut self, layout: &Layout) -> Result<(), SurfaceError> {
        let size = self.config.tips_size;
        self.surface.set_font(size);
        self.surface.set_fill_color(self.config.tips_color);

        for (i, point) in layout.text_points.iter().enumerate() {
            if point.value <= 0.0 {
                continue;
            }
            let text = self.config.label(i, point.value);
            let width = self.surface.measure_text(&text)?;
            self.surface
                .fill_text(&text, point.x - width / 2.0, point.y + size / 2.0)?;
        }
        Ok(())
    }

    /// Covers the ring's hole so arcs read as a band.
    fn draw_center(&mut self) -> Result<(), SurfaceError> {
        self.surface.set_fill_color(self.config.mask_color);
        self.surface.fill_disk(
            self.center.x,
            self.center.y,
            self.config.radius - self.config.border / 2.0,
        )
    }

    fn draw_caption(&mut self) -> Result<(), SurfaceError> {
        let text = &self.config.center_text;
        if text.is_empty() {
            return Ok(());
        }
        let size = self.config.center_text_size;
        self.surface.set_font(size);
        self.surface.set_fill_color(self.config.center_text_color);

        let width = self.surface.measure_text(text)?;
        self.surface
            .fill_text(text, self.center.x - width / 2.0, self.center.y + size / 2.0)
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if self.surface.kind().needs_present() {
            self.surface.present()?;
        }
        Ok(())
    }
}

/// One animation frame: background ring, eased arcs without emphasis, mask.
pub fn draw_frame(
    surface: &mut dyn DrawingSurface,
    config: &ChartConfig,
    center: Point,
    values: &[f64],
) -> Result<Layout, SurfaceError> {
    let mut renderer = ChartRenderer::new(surface, config, center);
    renderer.clear()?;
    renderer.draw_background()?;
    let layout = renderer.draw_arcs(values, None, false)?;
    renderer.draw_center()?;
    renderer.present()?;
    Ok(layout)
}

/// The settled chart: target arcs with the active segment widened, labels,
/// mask and caption.
pub fn draw_static(
    surface: &mut dyn DrawingSurface,
    config: &ChartConfig,
    center: Point,
    active: Option<usize>,
) -> Result<Layout, SurfaceError> {
    let mut renderer = ChartRenderer::new(surface, config, center);
    renderer.clear()?;
    renderer.draw_background()?;
    let layout = renderer.draw_arcs(&config.values, active, true)?;
    renderer.draw_labels(&layout)?;
    renderer.draw_center()?;
    renderer.draw_caption()?;
    renderer.present()?;
    Ok(layout)
}
