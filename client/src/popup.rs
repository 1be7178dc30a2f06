use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlElement, MouseEvent};
use zui_shared::PopupContent;
use zui_shared::overlay::{self, OverlayState, PixelRect};

/// The three DOM nodes that make up the popup: the positioned container, the
/// node whose children are replaced on every click, and the closer link.
#[derive(Clone)]
pub struct PopupElements {
    pub container: HtmlElement,
    pub content: HtmlElement,
    pub closer: HtmlElement,
}

struct CloserBinding {
    closer: HtmlElement,
    _handler: Closure<dyn Fn(MouseEvent) -> bool>,
}

thread_local! {
    static CLOSER_BINDING: RefCell<Option<CloserBinding>> = const { RefCell::new(None) };
}

impl PopupElements {
    /// Move the container into the map element so it is positioned in map pixels.
    pub fn attach_to(&self, map: &HtmlElement) -> Result<(), JsValue> {
        map.append_child(&self.container)?;
        Ok(())
    }

    /// Replace the popup body with heading, coordinate and image.
    pub fn render_content(&self, content: &PopupContent) -> Result<(), JsValue> {
        let document = self
            .content
            .owner_document()
            .ok_or_else(|| JsValue::from_str("popup content is detached"))?;

        self.content.set_inner_html("");
        let heading = document.create_element("p")?;
        heading.set_text_content(Some(content.heading));
        let code = document.create_element("code")?;
        code.set_text_content(Some(&content.coordinate_text));
        let image = document.create_element("img")?;
        image.set_attribute("src", &content.image_url)?;
        image.set_attribute("width", content.image_width)?;

        self.content.append_child(&heading)?;
        self.content.append_child(&code)?;
        self.content.append_child(&image)?;
        Ok(())
    }

    /// Show the container anchored at `anchor` (map pixels), or hide it.
    pub fn place(&self, anchor: Option<(f64, f64)>) {
        let style = self.container.style();
        match anchor {
            Some((x, y)) => {
                style.set_property("display", "block").ok();
                style.set_property("left", &format!("{x}px")).ok();
                style.set_property("top", &format!("{y}px")).ok();
            }
            None => {
                style.set_property("display", "none").ok();
            }
        }
    }

    pub fn bounding_rect(&self) -> PixelRect {
        pixel_rect(&self.container)
    }
}

pub fn pixel_rect(element: &web_sys::Element) -> PixelRect {
    let rect = element.get_bounding_client_rect();
    PixelRect {
        left: rect.left(),
        top: rect.top(),
        right: rect.right(),
        bottom: rect.bottom(),
    }
}

/// Wire the closer link: hide the overlay, drop focus, suppress navigation.
pub fn bind_closer(popup: &PopupElements, overlay_state: RwSignal<OverlayState>) {
    unbind_closer();

    let closer = popup.closer.clone();
    let closer_for_handler = closer.clone();
    let handler = Closure::<dyn Fn(MouseEvent) -> bool>::new(move |e: MouseEvent| {
        e.prevent_default();
        let mut follow_link = false;
        overlay_state.update(|state| follow_link = overlay::handle_closer(state));
        closer_for_handler.blur().ok();
        follow_link
    });
    closer.set_onclick(Some(handler.as_ref().unchecked_ref()));

    CLOSER_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(CloserBinding {
            closer,
            _handler: handler,
        });
    });
}

pub fn unbind_closer() {
    CLOSER_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.closer.set_onclick(None);
        }
    });
}
