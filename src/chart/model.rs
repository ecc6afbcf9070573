use super::animation::{Animation, Phase, Step};
use super::geometry::{AngleTable, Layout, Point};
use super::hit::{Ring, hit_test};
use super::view;
use crate::config::{ChartConfig, ConfigError};
use crate::scheduler::FrameScheduler;
use crate::surface::{DrawingSurface, SurfaceError, SurfaceProvider};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Continue,
    Finished,
    Stopped,
}

/// Everything one chart instance owns, mutated only through [`Doughnut`].
struct State {
    config: ChartConfig,
    center: Point,
    layout: Layout,
    active_index: Option<usize>,
    animation: Animation,
    surface: Option<Box<dyn DrawingSurface>>,
}

impl State {
    fn new(config: ChartConfig) -> Self {
        Self {
            center: Self::center_of(&config),
            config,
            layout: Layout::default(),
            active_index: None,
            animation: Animation::default(),
            surface: None,
        }
    }

    fn center_of(config: &ChartConfig) -> Point {
        Point::new(config.width / 2.0, config.height / 2.0)
    }

    fn ring(&self) -> Ring {
        Ring::new(self.center, self.config.radius, self.config.border)
    }

    fn apply_config(&mut self, config: ChartConfig) {
        if !self.config.same_canvas(&config) {
            log::debug!("Canvas changed, releasing drawing surface");
            self.surface = None;
        }
        self.center = Self::center_of(&config);
        self.config = config;
    }

    /// Returns whether a surface is held afterwards.
    fn acquire_surface(&mut self, provider: &mut dyn SurfaceProvider) -> bool {
        if self.surface.is_some() {
            return true;
        }
        match provider.acquire(self.config.surface) {
            Ok(surface) => {
                log::debug!("Acquired {} drawing surface", self.config.surface);
                self.surface = Some(surface);
                true
            }
            Err(SurfaceError::NotReady) => {
                log::debug!("Drawing surface not ready, skipping");
                false
            }
            Err(e) => {
                log::error!("Failed to acquire drawing surface: {}", e);
                false
            }
        }
    }

    fn tick(&mut self, delta: Duration) -> TickOutcome {
        self.animation.take_pending();

        if !self.animation.is_running() || self.surface.is_none() {
            self.animation.finish();
            return TickOutcome::Stopped;
        }

        match self.animation.advance(delta) {
            Step::Frame(values) => {
                self.render_frame(&values);
                TickOutcome::Continue
            }
            Step::Finished => {
                self.active_index = self.config.active;
                self.render_static();
                self.animation.finish();
                TickOutcome::Finished
            }
        }
    }

    fn render_frame(&mut self, values: &[f64]) {
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        match view::draw_frame(surface, &self.config, self.center, values) {
            Ok(layout) => self.layout = layout,
            Err(e) => log::error!("Drawing error: {}", e),
        }
    }

    fn render_static(&mut self) {
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        match view::draw_static(surface, &self.config, self.center, self.active_index) {
            Ok(layout) => self.layout = layout,
            Err(e) => log::error!("Drawing error: {}", e),
        }
    }

    fn handle_pointer(&mut self, point: Point) -> Option<usize> {
        let hit = hit_test(&self.ring(), &self.layout.angles, point);
        log::debug!("Pointer at ({}, {}) hit segment {:?}", point.x, point.y, hit);
        self.active_index = hit;
        self.render_static();
        hit
    }
}

struct Inner {
    state: RefCell<State>,
    scheduler: RefCell<Box<dyn FrameScheduler>>,
    provider: RefCell<Box<dyn SurfaceProvider>>,
}

impl Inner {
    fn cancel_pending(&self) {
        let pending = self.state.borrow_mut().animation.take_pending();
        if let Some(handle) = pending {
            log::debug!("Cancelling pending tick {}", handle.id());
            self.scheduler.borrow_mut().cancel_tick(handle);
        }
    }

    fn acquire_surface(&self) -> bool {
        let mut provider = self.provider.borrow_mut();
        self.state.borrow_mut().acquire_surface(&mut **provider)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().animation.take_pending() {
            self.scheduler.get_mut().cancel_tick(handle);
        }
    }
}

/// An animated ring chart bound to one drawing surface.
///
/// The host calls [`init`](Self::init) on mount, [`update`](Self::update)
/// whenever it re-supplies configuration, [`handle_pointer`](Self::handle_pointer)
/// for presses on the surface and [`dispose`](Self::dispose) on teardown.
/// Everything runs on the thread that drives the scheduler.
pub struct Doughnut {
    inner: Rc<Inner>,
}

impl Doughnut {
    pub fn new(
        config: ChartConfig,
        scheduler: Box<dyn FrameScheduler>,
        provider: Box<dyn SurfaceProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Rc::new(Inner {
                state: RefCell::new(State::new(config)),
                scheduler: RefCell::new(scheduler),
                provider: RefCell::new(provider),
            }),
        })
    }

    /// Mounts the chart: (re)acquires the surface and animates from zero.
    /// Does nothing beyond logging while the surface is not ready.
    pub fn init(&self) {
        self.inner.cancel_pending();
        self.inner.state.borrow_mut().surface = None;
        self.start_if_ready();
    }

    /// Replaces the configuration and animates from zero to the new values.
    /// A rejected configuration leaves the chart untouched.
    pub fn update(&self, config: ChartConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            log::warn!("Rejected chart config: {}", e);
            return Err(e);
        }

        self.inner.cancel_pending();
        self.inner.state.borrow_mut().apply_config(config);
        self.start_if_ready();
        Ok(())
    }

    /// Selects the segment under `point`, or clears the selection when the
    /// pointer misses the ring, and redraws the settled chart.
    ///
    /// Native surfaces are not presented, so the host must repaint its
    /// widget after this returns.
    pub fn handle_pointer(&self, point: Point) -> Option<usize> {
        self.inner.state.borrow_mut().handle_pointer(point)
    }

    /// Stops any running animation and releases the surface.
    pub fn dispose(&self) {
        self.inner.cancel_pending();
        let mut state = self.inner.state.borrow_mut();
        state.animation.finish();
        state.surface = None;
        log::debug!("Chart disposed");
    }

    pub fn active_index(&self) -> Option<usize> {
        self.inner.state.borrow().active_index
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().animation.phase()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().surface.is_some()
    }

    pub fn center(&self) -> Point {
        self.inner.state.borrow().center
    }

    /// Snapshot of the most recently drawn arc layout.
    pub fn layout(&self) -> Layout {
        self.inner.state.borrow().layout.clone()
    }

    pub fn angles(&self) -> AngleTable {
        self.inner.state.borrow().layout.angles.clone()
    }

    pub fn config(&self) -> ChartConfig {
        self.inner.state.borrow().config.clone()
    }

    fn start_if_ready(&self) {
        if self.inner.acquire_surface() {
            Self::animate(&self.inner);
        } else {
            self.inner.state.borrow_mut().animation.finish();
        }
    }

    fn animate(inner: &Rc<Inner>) {
        inner.cancel_pending();
        {
            let mut state = inner.state.borrow_mut();
            let State {
                config, animation, ..
            } = &mut *state;
            animation.start(&config.values, config.duration);
            log::debug!(
                "Animating {} values over {:?}",
                config.values.len(),
                config.duration
            );
        }
        Self::schedule_tick(inner);
    }

    fn schedule_tick(inner: &Rc<Inner>) {
        let weak: Weak<Inner> = Rc::downgrade(inner);
        let handle = inner
            .scheduler
            .borrow_mut()
            .request_tick(Box::new(move |delta| {
                if let Some(inner) = weak.upgrade() {
                    Doughnut::on_tick(&inner, delta);
                }
            }));
        inner.state.borrow_mut().animation.set_pending(handle);
    }

    fn on_tick(inner: &Rc<Inner>, delta: Duration) {
        let outcome = inner.state.borrow_mut().tick(delta);
        match outcome {
            TickOutcome::Continue => Self::schedule_tick(inner),
            TickOutcome::Finished => log::debug!("Animation finished"),
            TickOutcome::Stopped => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceKind;
    use crate::scheduler::{ManualClock, ManualScheduler, TICK_INTERVAL};
    use crate::surface::{DrawOp, ElementGeometry, FixedProvider};
    use std::f64::consts::PI;

    const MS_600: Duration = Duration::from_millis(600);

    fn quarters() -> ChartConfig {
        ChartConfig::default()
            .with_values(vec![10.0, 20.0, 30.0, 40.0])
            .with_active(Some(1))
    }

    fn mounted(config: ChartConfig) -> (Doughnut, ManualClock, FixedProvider) {
        let (scheduler, clock) = ManualScheduler::new();
        let provider = FixedProvider::new(ElementGeometry::new(200.0, 200.0, 2.0));
        let chart =
            Doughnut::new(config, Box::new(scheduler), Box::new(provider.clone())).unwrap();
        chart.init();
        (chart, clock, provider)
    }

    fn stroke_widths(ops: &[DrawOp]) -> Vec<f64> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::LineWidth(w) => Some(*w),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_animation_runs_to_target_angles() {
        let (chart, clock, _) = mounted(quarters());
        assert_eq!(chart.phase(), Phase::Running);
        assert_eq!(clock.pending(), 1);

        clock.advance(Duration::from_millis(300));
        let midway = chart.angles();
        assert!((midway.last_end() - 2.0 * PI / 4.0).abs() < 1e-9);
        assert_eq!(chart.active_index(), None);

        clock.advance(Duration::from_millis(300));
        assert_eq!(chart.phase(), Phase::Idle);
        assert_eq!(clock.pending(), 0);

        let expected = [PI / 5.0, 3.0 * PI / 5.0, 6.0 * PI / 5.0, 2.0 * PI];
        for (got, want) in chart.angles().iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
        assert_eq!(chart.active_index(), Some(1));
    }

    #[test]
    fn test_frames_follow_tick_interval() {
        let (chart, clock, provider) = mounted(quarters());
        provider.take_ops();

        let steps = clock.run_until_idle(TICK_INTERVAL, 100);
        // 600ms / 16ms: 37 intermediate frames, then the settled one
        assert_eq!(steps, 38);
        assert_eq!(chart.phase(), Phase::Idle);

        let ops = provider.take_ops();
        let clears = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Clear { .. }))
            .count();
        assert_eq!(clears, 38);

        // buffered surfaces present every frame
        let presents = ops.iter().filter(|op| **op == DrawOp::Present).count();
        assert_eq!(presents, 38);
    }

    #[test]
    fn test_settled_frame_emphasises_active_segment() {
        let (_chart, clock, provider) = mounted(quarters());
        clock.advance(MS_600);

        let ops = provider.take_ops();
        assert_eq!(stroke_widths(&ops), vec![32.0, 32.0, 40.0, 32.0, 32.0]);
    }

    #[test]
    fn test_native_surface_skips_present() {
        let config = ChartConfig {
            surface: SurfaceKind::Native,
            ..quarters()
        };
        let (_chart, clock, provider) = mounted(config);
        clock.run_until_idle(TICK_INTERVAL, 100);
        assert!(!provider.take_ops().contains(&DrawOp::Present));
    }

    #[test]
    fn test_restart_cancels_exactly_one_tick() {
        let (chart, clock, _) = mounted(quarters());
        clock.advance(Duration::from_millis(100));
        assert_eq!(clock.pending(), 1);
        assert!(clock.cancelled().is_empty());

        chart
            .update(quarters().with_values(vec![40.0, 30.0, 20.0, 10.0]))
            .unwrap();
        assert_eq!(clock.cancelled().len(), 1);
        assert_eq!(clock.pending(), 1);

        // the new chain starts from zero
        clock.advance(Duration::from_millis(300));
        assert!((chart.angles()[0] - (40.0 * 0.25) * PI / 50.0).abs() < 1e-9);

        clock.run_until_idle(TICK_INTERVAL, 100);
        assert!((chart.angles()[0] - 40.0 * PI / 50.0).abs() < 1e-9);
        assert_eq!(clock.cancelled().len(), 1);
    }

    #[test]
    fn test_update_after_settling_cancels_nothing() {
        let (chart, clock, _) = mounted(quarters());
        clock.advance(MS_600);
        assert_eq!(clock.pending(), 0);

        chart.update(quarters()).unwrap();
        assert!(clock.cancelled().is_empty());
        assert_eq!(clock.pending(), 1);
        assert_eq!(chart.phase(), Phase::Running);
    }

    #[test]
    fn test_requests_ignored_until_surface_ready() {
        let (scheduler, clock) = ManualScheduler::new();
        let provider = FixedProvider::pending();
        let chart =
            Doughnut::new(quarters(), Box::new(scheduler), Box::new(provider.clone())).unwrap();

        chart.init();
        assert!(!chart.is_ready());
        assert_eq!(chart.phase(), Phase::Idle);
        assert_eq!(clock.requested(), 0);

        chart.update(quarters()).unwrap();
        assert_eq!(clock.requested(), 0);

        provider.resolve(ElementGeometry::new(200.0, 200.0, 1.0));
        chart.update(quarters()).unwrap();
        assert!(chart.is_ready());
        assert_eq!(clock.requested(), 1);
    }

    #[test]
    fn test_surface_is_reacquired_on_remount_and_resize() {
        let (chart, _clock, provider) = mounted(quarters());
        assert_eq!(provider.acquisitions(), 1);

        chart.update(quarters()).unwrap();
        assert_eq!(provider.acquisitions(), 1);

        chart.init();
        assert_eq!(provider.acquisitions(), 2);

        let wider = ChartConfig {
            width: 300.0,
            ..quarters()
        };
        chart.update(wider).unwrap();
        assert_eq!(provider.acquisitions(), 3);
        assert_eq!(chart.center(), Point::new(150.0, 100.0));
    }

    #[test]
    fn test_rejected_update_keeps_previous_config() {
        let (chart, clock, _) = mounted(quarters());
        clock.advance(MS_600);

        let bad = quarters().with_values(vec![20.0; 5]);
        assert!(matches!(
            chart.update(bad),
            Err(ConfigError::NotEnoughColors { .. })
        ));
        assert_eq!(chart.config().values, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_pointer_selects_and_clears_segments() {
        let (chart, clock, provider) = mounted(quarters());
        clock.advance(MS_600);
        provider.take_ops();

        let layout = chart.layout();
        let on_third = Point::on_circle(chart.center(), 65.0, layout.segments[2].mid());
        assert_eq!(chart.handle_pointer(on_third), Some(2));
        assert_eq!(chart.active_index(), Some(2));
        assert_eq!(
            stroke_widths(&provider.take_ops()),
            vec![32.0, 32.0, 32.0, 40.0, 32.0]
        );

        assert_eq!(chart.handle_pointer(chart.center()), None);
        assert_eq!(chart.active_index(), None);
        assert_eq!(stroke_widths(&provider.take_ops()), vec![32.0; 5]);
    }

    #[test]
    fn test_pointer_on_native_surface_leaves_repaint_to_host() {
        let config = ChartConfig {
            surface: SurfaceKind::Native,
            ..quarters()
        };
        let (chart, clock, provider) = mounted(config);
        clock.run_until_idle(TICK_INTERVAL, 100);
        provider.take_ops();

        assert_eq!(chart.handle_pointer(Point::new(100.0, 165.0)), Some(1));
        let ops = provider.take_ops();
        assert_eq!(
            stroke_widths(&ops),
            vec![32.0, 32.0, 40.0, 32.0, 32.0]
        );
        assert!(!ops.contains(&DrawOp::Present));
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_pointer_in_gap_of_partial_chart_clears_selection() {
        let (chart, clock, _) = mounted(
            ChartConfig::default()
                .with_values(vec![25.0, 25.0])
                .with_active(Some(0)),
        );
        clock.advance(MS_600);
        assert_eq!(chart.active_index(), Some(0));

        let in_gap = Point::on_circle(chart.center(), 65.0, 1.5 * PI);
        assert_eq!(chart.handle_pointer(in_gap), None);
        assert_eq!(chart.active_index(), None);
    }

    #[test]
    fn test_dispose_cancels_and_releases() {
        let (chart, clock, provider) = mounted(quarters());
        clock.advance(Duration::from_millis(100));
        provider.take_ops();

        chart.dispose();
        assert_eq!(clock.cancelled().len(), 1);
        assert_eq!(clock.pending(), 0);
        assert!(!chart.is_ready());
        assert_eq!(chart.phase(), Phase::Idle);

        chart.handle_pointer(Point::new(165.0, 100.0));
        assert!(provider.take_ops().is_empty());
    }

    #[test]
    fn test_drop_cancels_pending_tick() {
        let (chart, clock, _) = mounted(quarters());
        drop(chart);
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.cancelled().len(), 1);
    }

    #[test]
    fn test_zero_duration_settles_on_first_tick() {
        let config = ChartConfig {
            duration: Duration::ZERO,
            ..quarters()
        };
        let (chart, clock, _) = mounted(config);
        assert_eq!(clock.advance(TICK_INTERVAL), 1);
        assert_eq!(chart.phase(), Phase::Idle);
        assert_eq!(clock.pending(), 0);
        assert_eq!(chart.active_index(), Some(1));
    }
}
