use crate::coord::Coordinate;

/// Popup visibility. The only way to be visible is to have a position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OverlayState {
    #[default]
    Hidden,
    Shown(Coordinate),
}

impl OverlayState {
    pub fn position(&self) -> Option<Coordinate> {
        match self {
            OverlayState::Hidden => None,
            OverlayState::Shown(coordinate) => Some(*coordinate),
        }
    }

    pub fn show(&mut self, coordinate: Coordinate) {
        *self = OverlayState::Shown(coordinate);
    }

    pub fn hide(&mut self) {
        *self = OverlayState::Hidden;
    }
}

/// What the popup displays after a click.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub heading: &'static str,
    pub coordinate_text: String,
    pub image_url: String,
    pub image_width: &'static str,
}

pub const POPUP_HEADING: &str = "You clicked here:";
pub const POPUP_IMAGE_WIDTH: &str = "800px";

impl PopupContent {
    pub fn for_click(coordinate: Coordinate, image_url: &str) -> Self {
        Self {
            heading: POPUP_HEADING,
            coordinate_text: coordinate.to_string(),
            image_url: image_url.to_string(),
            image_width: POPUP_IMAGE_WIDTH,
        }
    }

    /// The popup's visible text, in document order.
    pub fn text(&self) -> String {
        format!("{}{}", self.heading, self.coordinate_text)
    }
}

/// Single-click on the map: fill the popup and anchor it at the clicked point.
pub fn handle_single_click(
    overlay: &mut OverlayState,
    coordinate: Coordinate,
    image_url: &str,
) -> PopupContent {
    let content = PopupContent::for_click(coordinate, image_url);
    overlay.show(coordinate);
    content
}

/// Closer control activation. Always returns `false`: the link's default
/// navigation must not happen.
pub fn handle_closer(overlay: &mut OverlayState) -> bool {
    overlay.hide();
    false
}

/// Screen-space rectangle, pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// How far (in pixels) the map content must move so `popup` sits inside `map`
/// shrunk by `margin`. Positive `dx` moves content right. `(0, 0)` when it already fits.
pub fn autopan_delta(map: PixelRect, popup: PixelRect, margin: f64) -> (f64, f64) {
    let inner_left = map.left + margin;
    let inner_top = map.top + margin;
    let inner_right = map.right - margin;
    let inner_bottom = map.bottom - margin;

    let dx = if popup.left < inner_left {
        inner_left - popup.left
    } else if popup.right > inner_right {
        inner_right - popup.right
    } else {
        0.0
    };
    let dy = if popup.top < inner_top {
        inner_top - popup.top
    } else if popup.bottom > inner_bottom {
        inner_bottom - popup.bottom
    } else {
        0.0
    };
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG: &str = "http://localhost:2345/images/AE/anim-grid_vs_autonomous.gif";

    #[test]
    fn overlay_starts_hidden() {
        let overlay = OverlayState::default();
        assert_eq!(overlay, OverlayState::Hidden);
        assert_eq!(overlay.position(), None);
    }

    #[test]
    fn click_shows_overlay_at_clicked_coordinate() {
        let mut overlay = OverlayState::default();
        let content = handle_single_click(&mut overlay, Coordinate::new(10.0, 20.0), IMG);
        assert_eq!(overlay.position(), Some(Coordinate::new(10.0, 20.0)));
        assert!(content.text().contains("You clicked here:"));
        assert!(content.text().contains("10,20"));
        assert_eq!(content.image_url, IMG);
        assert_eq!(content.image_width, "800px");
    }

    #[test]
    fn second_click_moves_overlay() {
        let mut overlay = OverlayState::Shown(Coordinate::new(1.0, 1.0));
        handle_single_click(&mut overlay, Coordinate::new(-5.5, 3.0), IMG);
        assert_eq!(overlay, OverlayState::Shown(Coordinate::new(-5.5, 3.0)));
    }

    #[test]
    fn closer_hides_and_suppresses_default_in_every_state() {
        let mut overlay = OverlayState::Shown(Coordinate::new(10.0, 20.0));
        assert!(!handle_closer(&mut overlay));
        assert_eq!(overlay.position(), None);
        assert!(!handle_closer(&mut overlay));
        assert_eq!(overlay, OverlayState::Hidden);
    }

    fn rect(left: f64, top: f64, right: f64, bottom: f64) -> PixelRect {
        PixelRect {
            left,
            top,
            right,
            bottom,
        }
    }

    #[test]
    fn autopan_is_zero_when_popup_fits() {
        let map = rect(0.0, 0.0, 800.0, 600.0);
        assert_eq!(autopan_delta(map, rect(100.0, 100.0, 300.0, 200.0), 20.0), (0.0, 0.0));
    }

    #[test]
    fn autopan_pulls_popup_back_inside_margin() {
        let map = rect(0.0, 0.0, 800.0, 600.0);
        assert_eq!(
            autopan_delta(map, rect(700.0, -50.0, 900.0, 100.0), 20.0),
            (-120.0, 70.0)
        );
        assert_eq!(
            autopan_delta(map, rect(-10.0, 500.0, 100.0, 650.0), 20.0),
            (30.0, -70.0)
        );
    }
}
