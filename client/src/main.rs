mod animation;
mod app;
mod canvas;
mod page;
mod popup;
mod render_loop;
mod tiles;

use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsValue;
use zui_shared::MapConfig;

use crate::app::MapApp;
use crate::page::PageController;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();

    let page = match PageController::from_window(MapConfig::default()) {
        Ok(page) => page,
        Err(e) => {
            web_sys::console::error_1(&JsValue::from_str(&format!("map not started: {e}")));
            return;
        }
    };
    let target = page.map_target.clone();

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop a previous mount if main() runs again so its effects stop.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, move || view! { <MapApp page=page /> });
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
