use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};
use zui_shared::overlay::{autopan_delta, handle_single_click};
use zui_shared::{Coordinate, MapConfig, PlannedTile, TileCoord, ViewState};

use crate::animation::PanAnimation;
use crate::app::{MapView, Overlay};
use crate::popup::{PopupElements, pixel_rect};
use crate::render_loop::FrameScheduler;
use crate::tiles::{self, SharedTileLayer, TileLayer};

/// Pointer travel (px) beyond which a press is a drag, not a click.
const CLICK_TOLERANCE_PX: f64 = 5.0;
/// A click only counts as single once no second click follows within this window.
const SINGLE_CLICK_DELAY_MS: u32 = 250;
const WHEEL_ZOOM_PER_PIXEL: f64 = 1.0 / 300.0;
const WHEEL_LINE_HEIGHT_PX: f64 = 40.0;

struct ResizeBinding {
    window: web_sys::Window,
    callback: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

fn unbind_resize() {
    RESIZE_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old
                .window
                .remove_event_listener_with_callback("resize", old.callback.as_ref().unchecked_ref());
        }
    });
}

fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Position of a client-space point relative to `canvas`.
fn local_point(canvas: Option<HtmlCanvasElement>, client_x: f64, client_y: f64) -> (f64, f64) {
    match canvas {
        Some(el) => {
            let rect = el.get_bounding_client_rect();
            (client_x - rect.left(), client_y - rect.top())
        }
        None => (client_x, client_y),
    }
}

/// Screen rectangle `(x, y, w, h)` a planned tile covers, snapped to whole pixels.
fn tile_screen_rect(view: &ViewState, tile: &PlannedTile, w: f64, h: f64) -> (f64, f64, f64, f64) {
    let p = &tile.placement;
    let (x0, y0) = view.coordinate_to_pixel(Coordinate::new(p.min_x, p.max_y), w, h);
    let (x1, y1) = view.coordinate_to_pixel(Coordinate::new(p.max_x, p.min_y), w, h);
    let (x0, y0, x1, y1) = (x0.round(), y0.round(), x1.round(), y1.round());
    (x0, y0, x1 - x0, y1 - y0)
}

fn draw_tiles(
    ctx: &CanvasRenderingContext2d,
    layer: &SharedTileLayer,
    view: &ViewState,
    plan: &[PlannedTile],
    w: f64,
    h: f64,
) -> HashSet<TileCoord> {
    let mut in_use = HashSet::with_capacity(plan.len());
    let mut layer = layer.borrow_mut();
    for planned in plan {
        in_use.insert(planned.source);
        let Some(image) = layer.image(&planned.source) else {
            continue;
        };
        let (x, y, dw, dh) = tile_screen_rect(view, planned, w, h);
        if dw <= 0.0 || dh <= 0.0 {
            continue;
        }
        ctx.draw_image_with_html_image_element_and_dw_and_dh(&image, x, y, dw, dh)
            .ok();
    }
    in_use
}

#[component]
pub fn MapCanvas(popup: PopupElements, config: MapConfig) -> impl IntoView {
    let MapView(view_state) = expect_context();
    let Overlay(overlay) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let layer: SharedTileLayer = Rc::new(RefCell::new(TileLayer::new(&config.tile_layer)));

    // Map size in CSS pixels as of the last frame; input handlers read it.
    let map_size: Rc<Cell<(f64, f64)>> = Rc::new(Cell::new((0.0, 0.0)));
    let animation: Rc<Cell<Option<PanAnimation>>> = Rc::new(Cell::new(None));
    let autopan_pending: Rc<Cell<bool>> = Rc::new(Cell::new(false));
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));

    // Tile loads finish outside the frame loop and need to request a repaint.
    let scheduler_slot: Rc<RefCell<Weak<FrameScheduler>>> = Rc::new(RefCell::new(Weak::new()));
    let on_tile_loaded: Rc<dyn Fn()> = {
        let slot = scheduler_slot.clone();
        Rc::new(move || {
            if let Some(scheduler) = slot.borrow().upgrade() {
                scheduler.mark_dirty();
            }
        })
    };

    let wrap_x = config.tile_layer.wrap_x;
    let preload = config.tile_layer.preload;
    let auto_pan = config.auto_pan.clone();
    let canvas_css = canvas_style(config.tile_layer.z_index);

    let scheduler = {
        let layer = layer.clone();
        let map_size = map_size.clone();
        let animation = animation.clone();
        let autopan_pending = autopan_pending.clone();
        let popup = popup.clone();
        FrameScheduler::new(move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return false;
            };
            let canvas: &HtmlCanvasElement = &canvas;
            let Some(parent) = canvas.parent_element() else {
                return false;
            };
            let w = parent.client_width() as f64;
            let h = parent.client_height() as f64;
            if w <= 0.0 || h <= 0.0 {
                return false;
            }
            map_size.set((w, h));

            let dpr = web_sys::window()
                .map(|window| window.device_pixel_ratio())
                .unwrap_or(1.0)
                .max(1.0);
            let bw = (w * dpr).round() as u32;
            let bh = (h * dpr).round() as u32;
            if canvas.width() != bw || canvas.height() != bh {
                canvas.set_width(bw);
                canvas.set_height(bh);
                // Resizing resets the 2D context state.
                *cached_ctx.borrow_mut() = None;
            }

            let ctx = {
                let mut slot = cached_ctx.borrow_mut();
                if slot.is_none() {
                    *slot = canvas
                        .get_context("2d")
                        .ok()
                        .flatten()
                        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
                }
                let Some(ctx) = slot.clone() else {
                    return false;
                };
                ctx
            };

            let now = now_ms();
            let mut animating = false;
            if let Some(anim) = animation.get() {
                let center = match anim.center_at(now) {
                    Some(center) => {
                        animating = true;
                        center
                    }
                    None => {
                        animation.set(None);
                        anim.to
                    }
                };
                view_state.update_untracked(|view| view.set_center(center));
            }
            let view = view_state.get_untracked();

            ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
            ctx.clear_rect(0.0, 0.0, w, h);

            let plan = view
                .grid()
                .plan(&view.extent(w, h), view.zoom(), wrap_x, preload);
            tiles::request_tiles(&layer, &plan, on_tile_loaded.clone());
            let in_use = draw_tiles(&ctx, &layer, &view, &plan, w, h);
            layer.borrow_mut().expire(&in_use);

            let anchor = overlay
                .get_untracked()
                .position()
                .map(|coordinate| view.coordinate_to_pixel(coordinate, w, h));
            popup.place(anchor);

            if autopan_pending.replace(false) && anchor.is_some() && auto_pan.enabled {
                let map_rect = pixel_rect(&parent);
                let (dx, dy) = autopan_delta(map_rect, popup.bounding_rect(), auto_pan.margin_px);
                if dx != 0.0 || dy != 0.0 {
                    let mut target = view;
                    target.pan_pixels(dx, dy);
                    animation.set(Some(PanAnimation::new(
                        view.center(),
                        target.center(),
                        now,
                        auto_pan.duration_ms,
                    )));
                    animating = true;
                }
            }

            animating
        })
    };
    let scheduler = Rc::new(scheduler);
    *scheduler_slot.borrow_mut() = Rc::downgrade(&scheduler);

    let sched_state = scheduler.clone();
    Effect::new(move || {
        view_state.track();
        overlay.track();
        sched_state.mark_dirty();
    });

    // Window resize changes the canvas size without touching any signal.
    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            let Some(window) = web_sys::window() else {
                return;
            };
            let scheduler = scheduler.clone();
            let callback = Closure::<dyn Fn()>::new(move || scheduler.mark_dirty());
            unbind_resize();
            RESIZE_BINDING.with(|slot| {
                if window
                    .add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref())
                    .is_ok()
                {
                    *slot.borrow_mut() = Some(ResizeBinding { window, callback });
                }
            });
        }
    });
    on_cleanup(unbind_resize);

    // --- Input handlers ---

    let is_dragging = Rc::new(Cell::new(false));
    let press_x = Rc::new(Cell::new(0.0f64));
    let press_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));
    let pinch_dist = Rc::new(Cell::new(0.0f64));
    let click_pending = Rc::new(Cell::new(false));
    let click_timer: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));

    let on_wheel = {
        let map_size = map_size.clone();
        let animation = animation.clone();
        move |e: WheelEvent| {
            e.prevent_default();
            let mut delta = e.delta_y();
            if e.delta_mode() == WheelEvent::DOM_DELTA_LINE {
                delta *= WHEEL_LINE_HEIGHT_PX;
            }
            let (x, y) = local_point(
                canvas_ref.get_untracked(),
                e.client_x() as f64,
                e.client_y() as f64,
            );
            let (w, h) = map_size.get();
            animation.set(None);
            view_state.update(|view| {
                view.zoom_by_around(-delta * WHEEL_ZOOM_PER_PIXEL, x, y, w, h);
            });
        }
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let press_x = press_x.clone();
        let press_y = press_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let animation = animation.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            animation.set(None);
            press_x.set(e.client_x() as f64);
            press_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            if !is_dragging.get() {
                return;
            }
            let dx = e.client_x() as f64 - last_x.get();
            let dy = e.client_y() as f64 - last_y.get();
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);
            if dx != 0.0 || dy != 0.0 {
                view_state.update(|view| view.pan_pixels(dx, dy));
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_click = {
        let map_size = map_size.clone();
        let autopan_pending = autopan_pending.clone();
        let click_pending = click_pending.clone();
        let click_timer = click_timer.clone();
        let scheduler = scheduler.clone();
        let image_url = config.popup_image_url.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - press_x.get()).abs();
            let dy = (e.client_y() as f64 - press_y.get()).abs();
            if dx >= CLICK_TOLERANCE_PX || dy >= CLICK_TOLERANCE_PX {
                return;
            }
            // Second click inside the window: this is a double click.
            if click_pending.replace(false) {
                click_timer.borrow_mut().take();
                return;
            }

            let (x, y) = local_point(
                canvas_ref.get_untracked(),
                e.client_x() as f64,
                e.client_y() as f64,
            );
            let (w, h) = map_size.get();
            let coordinate = view_state.get_untracked().pixel_to_coordinate(x, y, w, h);

            click_pending.set(true);
            let click_pending = click_pending.clone();
            let autopan_pending = autopan_pending.clone();
            let scheduler = scheduler.clone();
            let popup = popup.clone();
            let image_url = image_url.clone();
            let timer = Timeout::new(SINGLE_CLICK_DELAY_MS, move || {
                if !click_pending.replace(false) {
                    return;
                }
                let mut content = None;
                overlay.update(|state| {
                    content = Some(handle_single_click(state, coordinate, &image_url));
                });
                if let Some(content) = content
                    && let Err(e) = popup.render_content(&content)
                {
                    web_sys::console::warn_2(&JsValue::from_str("popup content failed"), &e);
                }
                autopan_pending.set(true);
                scheduler.mark_dirty();
            });
            *click_timer.borrow_mut() = Some(timer);
        }
    };

    let on_double_click = {
        let map_size = map_size.clone();
        let animation = animation.clone();
        move |e: MouseEvent| {
            e.prevent_default();
            let (x, y) = local_point(
                canvas_ref.get_untracked(),
                e.client_x() as f64,
                e.client_y() as f64,
            );
            let (w, h) = map_size.get();
            animation.set(None);
            view_state.update(|view| {
                view.zoom_by_around(1.0, x, y, w, h);
            });
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                pinch_dist.set((dx * dx + dy * dy).sqrt());
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        let map_size = map_size.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() != 2 {
                return;
            }
            e.prevent_default();
            let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                return;
            };
            let dx = (t1.client_x() - t0.client_x()) as f64;
            let dy = (t1.client_y() - t0.client_y()) as f64;
            let new_dist = (dx * dx + dy * dy).sqrt();
            let old_dist = pinch_dist.get();

            if old_dist > 0.0 && new_dist > 0.0 {
                let mid_x = (t0.client_x() + t1.client_x()) as f64 / 2.0;
                let mid_y = (t0.client_y() + t1.client_y()) as f64 / 2.0;
                let (x, y) = local_point(canvas_ref.get_untracked(), mid_x, mid_y);
                let (w, h) = map_size.get();
                view_state.update(|view| {
                    view.zoom_by_around((new_dist / old_dist).log2(), x, y, w, h);
                });
            }

            pinch_dist.set(new_dist);
        }
    };

    view! {
        <div
            class="zui-viewport"
            style="position: absolute; inset: 0; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:click=on_click
            on:dblclick=on_double_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
        >
            <canvas
                node_ref=canvas_ref
                style=canvas_css
            />
        </div>
    }
}

/// The tile layer's stacking order comes from its config.
fn canvas_style(z_index: i32) -> String {
    format!(
        "position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab; z-index: {z_index};"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use zui_shared::Extent;

    #[test]
    fn tile_rect_matches_view_pixels() {
        let view = MapConfig::default().initial_view();
        let extent = view.extent(512.0, 512.0);
        let tile = PlannedTile {
            source: TileCoord::new(3, 4, 4),
            placement: Extent {
                min_x: extent.min_x,
                min_y: extent.center().y,
                max_x: extent.center().x,
                max_y: extent.max_y,
            },
        };
        let (x, y, w, h) = tile_screen_rect(&view, &tile, 512.0, 512.0);
        assert_eq!((x, y), (0.0, 0.0));
        assert_eq!((w, h), (256.0, 256.0));
    }

    #[test]
    fn canvas_stacks_at_configured_z_index() {
        let config = MapConfig::default();
        assert!(canvas_style(config.tile_layer.z_index).ends_with("z-index: 1;"));
        assert!(canvas_style(7).contains("z-index: 7;"));
    }
}
