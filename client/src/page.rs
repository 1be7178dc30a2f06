use std::fmt;

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};
use zui_shared::MapConfig;
use zui_shared::config::{MAP_TARGET_ID, POPUP_CLOSER_ID, POPUP_CONTENT_ID, POPUP_ID};

use crate::popup::PopupElements;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    NoWindow,
    NoDocument,
    /// No element with this id, or it is not an HTML element.
    MissingElement(&'static str),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::NoWindow => write!(f, "no global window"),
            PageError::NoDocument => write!(f, "window has no document"),
            PageError::MissingElement(id) => {
                write!(f, "page is missing required element #{id}")
            }
        }
    }
}

impl std::error::Error for PageError {}

/// Everything the map page needs from the host document, resolved once at startup.
pub struct PageController {
    pub map_target: HtmlElement,
    pub popup: PopupElements,
    pub config: MapConfig,
}

impl PageController {
    pub fn from_window(config: MapConfig) -> Result<Self, PageError> {
        let window = web_sys::window().ok_or(PageError::NoWindow)?;
        let document = window.document().ok_or(PageError::NoDocument)?;
        Self::from_document(&document, config)
    }

    pub fn from_document(document: &Document, config: MapConfig) -> Result<Self, PageError> {
        let popup = PopupElements {
            container: lookup(document, POPUP_ID)?,
            content: lookup(document, POPUP_CONTENT_ID)?,
            closer: lookup(document, POPUP_CLOSER_ID)?,
        };
        let map_target = lookup(document, MAP_TARGET_ID)?;
        Ok(Self {
            map_target,
            popup,
            config,
        })
    }
}

fn lookup(document: &Document, id: &'static str) -> Result<HtmlElement, PageError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or(PageError::MissingElement(id))
}
