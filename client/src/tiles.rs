#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;
use zui_shared::config::TileLayerConfig;
use zui_shared::{PlannedTile, TileCache, TileCoord, TileUrlTemplate};

const MAX_CONCURRENT_LOADS: usize = 8;
const ONLOAD_HANDLE_KEY: &str = "__zuiTileOnload";
const ONERROR_HANDLE_KEY: &str = "__zuiTileOnerror";

#[derive(Clone)]
pub enum TileEntry {
    Loading,
    Loaded(HtmlImageElement),
    /// Not retried until evicted.
    Failed,
}

/// Loading queue plus LRU cache for one XYZ tile source.
pub struct TileLayer {
    url: TileUrlTemplate,
    cross_origin: String,
    cache: TileCache<TileCoord, TileEntry>,
    queue: VecDeque<TileCoord>,
    in_flight: usize,
    max_in_flight: usize,
}

pub type SharedTileLayer = Rc<RefCell<TileLayer>>;
type RedrawCallback = Rc<dyn Fn()>;

impl TileLayer {
    pub fn new(config: &TileLayerConfig) -> Self {
        Self {
            url: config.url.clone(),
            cross_origin: config.cross_origin.clone(),
            cache: TileCache::new(config.cache_size),
            queue: VecDeque::new(),
            in_flight: 0,
            max_in_flight: MAX_CONCURRENT_LOADS,
        }
    }

    /// Replace the pending queue with the tiles of `plan` that have no cache
    /// entry yet, keeping the plan's priority order.
    pub fn schedule(&mut self, plan: &[PlannedTile]) {
        let mut seen = HashSet::new();
        self.queue = plan
            .iter()
            .map(|planned| planned.source)
            .filter(|tile| !self.cache.contains_key(tile) && seen.insert(*tile))
            .collect();
    }

    /// Pop queued tiles up to the concurrency limit and mark them loading.
    pub fn take_ready(&mut self) -> Vec<TileCoord> {
        let mut ready = Vec::new();
        while self.in_flight < self.max_in_flight {
            let Some(tile) = self.queue.pop_front() else {
                break;
            };
            self.cache.insert(tile, TileEntry::Loading);
            self.in_flight += 1;
            ready.push(tile);
        }
        ready
    }

    /// Record a finished load. A tile evicted while in flight is dropped.
    pub fn finish(&mut self, tile: TileCoord, image: Option<HtmlImageElement>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let entry = match image {
            Some(image) => TileEntry::Loaded(image),
            None => TileEntry::Failed,
        };
        self.cache.replace(&tile, entry);
    }

    /// Drawable image for `tile`, refreshing its recency.
    pub fn image(&mut self, tile: &TileCoord) -> Option<HtmlImageElement> {
        match self.cache.get(tile) {
            Some(TileEntry::Loaded(image)) => Some(image.clone()),
            _ => None,
        }
    }

    /// Trim to capacity after a frame, never evicting tiles the frame used.
    pub fn expire(&mut self, in_use: &HashSet<TileCoord>) -> usize {
        self.cache.expire(|tile| in_use.contains(tile)).len()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn url_for(&self, tile: TileCoord) -> String {
        self.url.expand(tile)
    }
}

/// Queue the tiles `plan` needs and start as many loads as the limit allows.
pub fn request_tiles(layer: &SharedTileLayer, plan: &[PlannedTile], on_loaded: RedrawCallback) {
    layer.borrow_mut().schedule(plan);
    pump(layer, on_loaded);
}

fn pump(layer: &SharedTileLayer, on_loaded: RedrawCallback) {
    let (ready, cross_origin) = {
        let mut layer = layer.borrow_mut();
        let ready: Vec<(TileCoord, String)> = layer
            .take_ready()
            .into_iter()
            .map(|tile| (tile, layer.url_for(tile)))
            .collect();
        (ready, layer.cross_origin.clone())
    };
    for (tile, src) in ready {
        load_tile(layer.clone(), tile, &src, &cross_origin, on_loaded.clone());
    }
}

fn load_tile(
    layer: SharedTileLayer,
    tile: TileCoord,
    src: &str,
    cross_origin: &str,
    on_loaded: RedrawCallback,
) {
    let img = match HtmlImageElement::new() {
        Ok(img) => img,
        Err(_) => {
            complete(&layer, tile, None, on_loaded);
            return;
        }
    };
    img.set_cross_origin(Some(cross_origin));

    let img_for_load = img.clone();
    let layer_for_load = layer.clone();
    let on_loaded_load = on_loaded.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_load);
        let img = img_for_load.clone();
        let layer = layer_for_load.clone();
        let on_loaded = on_loaded_load.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = JsFuture::from(img.decode()).await;
            complete(&layer, tile, Some(img), on_loaded);
        });
    });

    let img_for_error = img.clone();
    let src_for_error = src.to_string();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_error);
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "tile failed to load: {src_for_error}"
        )));
        complete(&layer, tile, None, on_loaded.clone());
    });

    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    img.set_onload(Some(onload_js.unchecked_ref()));
    img.set_onerror(Some(onerror_js.unchecked_ref()));
    let _ = Reflect::set(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY), &onload_js);
    let _ = Reflect::set(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY), &onerror_js);
    img.set_src(src);
}

fn complete(
    layer: &SharedTileLayer,
    tile: TileCoord,
    image: Option<HtmlImageElement>,
    on_loaded: RedrawCallback,
) {
    layer.borrow_mut().finish(tile, image);
    pump(layer, on_loaded.clone());
    on_loaded();
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}
