use leptos::prelude::*;
use wasm_bindgen::JsValue;
use zui_shared::{OverlayState, ViewState};

use crate::canvas::MapCanvas;
use crate::page::PageController;
use crate::popup;

/// Newtype wrappers so each signal gets its own context slot.
#[derive(Clone, Copy)]
pub(crate) struct MapView(pub RwSignal<ViewState>);
#[derive(Clone, Copy)]
pub(crate) struct Overlay(pub RwSignal<OverlayState>);

/// Root component: owns the view and overlay state and wires the popup closer.
#[component]
pub fn MapApp(page: PageController) -> impl IntoView {
    let PageController {
        map_target,
        popup,
        config,
    } = page;

    let view_state: RwSignal<ViewState> = RwSignal::new(config.initial_view());
    let overlay: RwSignal<OverlayState> = RwSignal::new(OverlayState::default());
    provide_context(MapView(view_state));
    provide_context(Overlay(overlay));

    if let Err(e) = popup.attach_to(&map_target) {
        web_sys::console::warn_2(&JsValue::from_str("could not move popup into map"), &e);
    }
    popup.place(None);
    popup::bind_closer(&popup, overlay);
    on_cleanup(popup::unbind_closer);

    view! { <MapCanvas popup=popup config=config /> }
}
