use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use gtk::glib::{self, SourceId};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(750);

/// Single-shot timer that can be re-armed.
///
/// Arming while a timer is pending cancels the pending one, so a burst of
/// `arm` calls results in one callback, `delay` after the last call. Must be
/// used from the thread owning the default main context.
#[derive(Debug)]
pub struct Debouncer {
    delay: Cell<Duration>,
    pending: Rc<RefCell<Option<SourceId>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: Cell::new(delay),
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay.set(delay);
    }

    pub fn is_armed(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn arm<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.cancel();

        let pending = self.pending.clone();
        let id = glib::timeout_add_local_once(self.delay.get(), move || {
            // the source is gone once it fired, don't remove it again
            pending.borrow_mut().take();
            callback();
        });

        self.pending.replace(Some(id));
    }

    pub fn cancel(&self) {
        if let Some(id) = self.pending.borrow_mut().take() {
            id.remove();
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
