use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Fallback interval for surfaces without a per-frame callback.
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Invoked once with the wall time that passed since the tick was requested.
pub type TickCallback = Box<dyn FnOnce(Duration)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Monotonic source of tick handles for scheduler implementations.
#[derive(Debug, Default)]
pub struct HandleSeq(u64);

impl HandleSeq {
    pub fn next_handle(&mut self) -> TickHandle {
        self.0 += 1;
        TickHandle(self.0)
    }
}

pub trait FrameScheduler {
    fn request_tick(&mut self, callback: TickCallback) -> TickHandle;

    /// Cancelling a handle that already fired is a no-op.
    fn cancel_tick(&mut self, handle: TickHandle);
}

#[derive(Default)]
struct TickQueue {
    handles: HandleSeq,
    pending: Vec<(TickHandle, TickCallback)>,
    requested: usize,
    cancelled: Vec<TickHandle>,
}

/// Scheduler that only fires when its [`ManualClock`] is advanced.
pub struct ManualScheduler {
    queue: Rc<RefCell<TickQueue>>,
}

/// Test-side handle driving a [`ManualScheduler`].
#[derive(Clone)]
pub struct ManualClock {
    queue: Rc<RefCell<TickQueue>>,
}

impl ManualScheduler {
    pub fn new() -> (Self, ManualClock) {
        let queue = Rc::new(RefCell::new(TickQueue::default()));
        (
            Self {
                queue: queue.clone(),
            },
            ManualClock { queue },
        )
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_tick(&mut self, callback: TickCallback) -> TickHandle {
        let mut queue = self.queue.borrow_mut();
        let handle = queue.handles.next_handle();
        queue.requested += 1;
        queue.pending.push((handle, callback));
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        let mut queue = self.queue.borrow_mut();
        let before = queue.pending.len();
        queue.pending.retain(|(h, _)| *h != handle);
        if queue.pending.len() != before {
            queue.cancelled.push(handle);
        }
    }
}

impl ManualClock {
    /// Fires every tick that was pending when called. Ticks requested by the
    /// callbacks wait for the next advance. Returns how many fired.
    pub fn advance(&self, delta: Duration) -> usize {
        let due = std::mem::take(&mut self.queue.borrow_mut().pending);
        let mut fired = 0;
        for (handle, callback) in due {
            if self.queue.borrow().cancelled.contains(&handle) {
                continue;
            }
            callback(delta);
            fired += 1;
        }
        fired
    }

    /// Advances in `step` increments until nothing is pending or `limit`
    /// steps have run. Returns the number of steps taken.
    pub fn run_until_idle(&self, step: Duration, limit: usize) -> usize {
        let mut steps = 0;
        while self.pending() > 0 && steps < limit {
            self.advance(step);
            steps += 1;
        }
        steps
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    pub fn requested(&self) -> usize {
        self.queue.borrow().requested
    }

    pub fn cancelled(&self) -> Vec<TickHandle> {
        self.queue.borrow().cancelled.clone()
    }
}
