use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into one `requestAnimationFrame` callback.
///
/// `mark_dirty()` can be called any number of times per frame. The draw
/// function returns `true` while something is still moving (an auto-pan
/// animation) and the scheduler then keeps requesting frames on its own.
pub struct FrameScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    dirty: Cell<bool>,
    pending: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn request_frame(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let callback = self.callback.borrow();
        let (Some(window), Some(cb)) = (self.window.as_ref(), callback.as_ref()) else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            self.pending.set(Some(id));
        }
    }
}

impl FrameScheduler {
    pub fn new(draw: impl Fn() -> bool + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            dirty: Cell::new(false),
            pending: Cell::new(None),
            callback: RefCell::new(None),
        });

        let frame_inner = inner.clone();
        let cb = Closure::<dyn FnMut()>::new(move || {
            frame_inner.pending.set(None);
            if !frame_inner.dirty.replace(false) {
                return;
            }
            if draw() {
                frame_inner.dirty.set(true);
                frame_inner.request_frame();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    pub fn mark_dirty(&self) {
        self.inner.dirty.set(true);
        self.inner.request_frame();
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.inner.pending.take()
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.inner.dirty.set(false);
        // The closure holds `inner`; drop it to break the cycle.
        self.inner.callback.borrow_mut().take();
    }
}
