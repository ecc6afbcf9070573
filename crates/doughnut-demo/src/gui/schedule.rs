use doughnut::SurfaceKind;
use doughnut::scheduler::{FrameScheduler, HandleSeq, TICK_INTERVAL, TickCallback, TickHandle};
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Picks the tick source matching the surface: native surfaces follow the
/// widget's frame clock, buffered ones a fixed interval timer.
pub fn scheduler_for(kind: SurfaceKind, widget: &impl IsA<gtk::Widget>) -> Box<dyn FrameScheduler> {
    match kind {
        SurfaceKind::Native => Box::new(FrameClockScheduler::new(widget.as_ref().clone())),
        SurfaceKind::Buffered => Box::new(IntervalScheduler::new(TICK_INTERVAL)),
    }
}

/// One-shot tick callbacks on a widget's frame clock.
pub struct FrameClockScheduler {
    widget: gtk::Widget,
    handles: HandleSeq,
    live: Rc<RefCell<HashMap<TickHandle, gtk::TickCallbackId>>>,
}

impl FrameClockScheduler {
    pub fn new(widget: gtk::Widget) -> Self {
        Self {
            widget,
            handles: HandleSeq::default(),
            live: Rc::default(),
        }
    }
}

impl FrameScheduler for FrameClockScheduler {
    fn request_tick(&mut self, callback: TickCallback) -> TickHandle {
        let handle = self.handles.next_handle();
        let requested = Instant::now();
        let callback = Cell::new(Some(callback));
        let live = self.live.clone();

        let id = self.widget.add_tick_callback(move |widget, _clock| {
            live.borrow_mut().remove(&handle);
            if let Some(callback) = callback.take() {
                callback(requested.elapsed());
            }
            // native surfaces have no present step
            widget.queue_draw();
            glib::ControlFlow::Break
        });

        self.live.borrow_mut().insert(handle, id);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        let id = self.live.borrow_mut().remove(&handle);
        if let Some(id) = id {
            id.remove();
        }
    }
}

/// One-shot timeouts on the main context.
pub struct IntervalScheduler {
    interval: Duration,
    handles: HandleSeq,
    live: Rc<RefCell<HashMap<TickHandle, glib::SourceId>>>,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handles: HandleSeq::default(),
            live: Rc::default(),
        }
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_tick(&mut self, callback: TickCallback) -> TickHandle {
        let handle = self.handles.next_handle();
        let requested = Instant::now();
        let live = self.live.clone();

        let id = glib::timeout_add_local_once(self.interval, move || {
            live.borrow_mut().remove(&handle);
            callback(requested.elapsed());
        });

        self.live.borrow_mut().insert(handle, id);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        let id = self.live.borrow_mut().remove(&handle);
        if let Some(id) = id {
            id.remove();
        }
    }
}
