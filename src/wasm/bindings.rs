//! Browser pedigree viewer.
//!
//! [`PedigreeViewer`] holds one tree view plus its camera, and produces render
//! commands in screen coordinates. On wasm32 it is wrapped for JavaScript; the
//! struct itself builds everywhere so it can be tested natively.

use chrono::{DateTime, Utc};

use crate::access::{Navigation, resolve_path};
use crate::api::Generation;
use crate::models::AncestryPayload;
use crate::session::decode_session;
use crate::view::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, Margin, Orientation, PedigreeLayout, Position, RenderCommand,
    TreeLayout, TreeView, render_layout, render_message,
};
use crate::{Error, Result};

/// Smallest zoom factor
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom factor
pub const MAX_ZOOM: f64 = 5.0;

const LOADING_MESSAGE: &str = "Loading pedigree…";
const EMPTY_MESSAGE: &str = "No pedigree loaded";

/// Viewer state for one pedigree canvas.
#[derive(Debug)]
pub struct PedigreeViewer {
    view: TreeView,
    tree_layout: TreeLayout,
    /// Layout fitted to the surface, in world coordinates
    layout: Option<PedigreeLayout>,
    pub width: f64,
    pub height: f64,
    /// World point shown at the center of the surface
    pub camera: Position,
    /// Zoom level (1.0 = 100%)
    pub zoom: f64,
}

impl Default for PedigreeViewer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl PedigreeViewer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            view: TreeView::new(),
            tree_layout: TreeLayout::default(),
            layout: None,
            width,
            height,
            camera: Position::new(width / 2.0, height / 2.0),
            zoom: 1.0,
        }
    }

    /// Start loading a new pedigree; earlier outstanding loads become stale.
    pub fn begin_fetch(&mut self) -> Generation {
        self.view.begin_fetch()
    }

    /// Show `payload` if `generation` is still current.
    pub fn apply(&mut self, generation: Generation, payload: &AncestryPayload) -> bool {
        let applied = self.view.apply(generation, payload);
        if applied {
            self.relayout();
        }
        applied
    }

    /// Parse and show an ancestry JSON document if `generation` is still current.
    ///
    /// A stale response is dropped unparsed. An unreadable current response is
    /// recorded as the view's failure and returned as an error.
    pub fn apply_json(&mut self, generation: Generation, json: &str) -> Result<bool> {
        if !self.view.is_current(generation) {
            return Ok(false);
        }
        match serde_json::from_str::<AncestryPayload>(json) {
            Ok(payload) => Ok(self.apply(generation, &payload)),
            Err(e) => {
                let err = Error::from(e);
                self.fail(generation, &err.to_string());
                Err(err)
            }
        }
    }

    /// Record a failed load if `generation` is still current.
    pub fn fail(&mut self, generation: Generation, message: &str) -> bool {
        let applied = self.view.fail(generation, message);
        if applied {
            self.layout = None;
        }
        applied
    }

    /// Load a payload immediately, superseding any outstanding fetch.
    pub fn load(&mut self, payload: &AncestryPayload) {
        let generation = self.begin_fetch();
        self.apply(generation, payload);
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.tree_layout.orientation = orientation;
        self.relayout();
    }

    /// Change the surface size and refit the tree.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = self.view.layout(&self.tree_layout).map(|mut layout| {
            layout.fit(self.width, self.height, Margin::default());
            layout
        });
        self.camera = Position::new(self.width / 2.0, self.height / 2.0);
        self.zoom = 1.0;
    }

    /// Pan the camera by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.x -= dx / self.zoom;
        self.camera.y -= dy / self.zoom;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Center the camera on the first appearance of `id`. Returns false if absent.
    pub fn focus_node(&mut self, id: &str) -> bool {
        match self.layout.as_ref().and_then(|l| l.find(id)) {
            Some(node) => {
                self.camera = node.position;
                true
            }
            None => false,
        }
    }

    /// Map a world position to the surface.
    pub fn to_screen(&self, world: Position) -> Position {
        Position::new(
            (world.x - self.camera.x) * self.zoom + self.width / 2.0,
            (world.y - self.camera.y) * self.zoom + self.height / 2.0,
        )
    }

    pub fn node_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.nodes.len())
    }

    pub fn link_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.links.len())
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.view.error()
    }

    /// Commands drawing the current state in screen coordinates.
    pub fn render(&self) -> Vec<RenderCommand> {
        if let Some(error) = self.view.error() {
            return render_message(self.width, self.height, error, true);
        }
        if self.view.is_loading() {
            return render_message(self.width, self.height, LOADING_MESSAGE, false);
        }
        let Some(layout) = &self.layout else {
            return render_message(self.width, self.height, EMPTY_MESSAGE, false);
        };

        let mut screen = layout.clone();
        for node in &mut screen.nodes {
            node.position = self.to_screen(node.position);
        }
        render_layout(&screen)
    }

    /// The current drawing as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        crate::view::to_svg(&self.render(), self.width, self.height)
    }
}

/// Resolve a navigation for a raw token at `now`.
///
/// A missing, malformed or expired token counts as no session.
pub fn route_decision(token: Option<&str>, path: &str, now: DateTime<Utc>) -> Navigation {
    let session = token
        .and_then(|t| decode_session(t, None).ok())
        .filter(|s| !s.token_expired(now));
    resolve_path(session.as_ref(), path, now)
}

/// Convert a JavaScript millisecond timestamp.
pub fn timestamp_from_millis(now_ms: f64) -> Result<DateTime<Utc>> {
    if !now_ms.is_finite() {
        return Err(Error::InvalidInput(format!("invalid timestamp {}", now_ms)));
    }
    DateTime::from_timestamp_millis(now_ms as i64)
        .ok_or_else(|| Error::InvalidInput(format!("timestamp out of range: {}", now_ms)))
}

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod js {
    use wasm_bindgen::prelude::*;

    use super::{PedigreeViewer, route_decision, timestamp_from_millis};
    use crate::api::Generation;
    use crate::view::Orientation;

    fn js_error(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    /// JavaScript handle to a [`PedigreeViewer`].
    #[wasm_bindgen(js_name = PedigreeViewer)]
    pub struct JsPedigreeViewer {
        inner: PedigreeViewer,
    }

    #[wasm_bindgen(js_class = PedigreeViewer)]
    impl JsPedigreeViewer {
        #[wasm_bindgen(constructor)]
        pub fn new(width: f64, height: f64) -> JsPedigreeViewer {
            Self {
                inner: PedigreeViewer::new(width, height),
            }
        }

        /// Build a viewer showing an ancestry JSON document.
        #[wasm_bindgen(js_name = fromAncestryJson)]
        pub fn from_ancestry_json(
            json: &str,
            width: f64,
            height: f64,
        ) -> Result<JsPedigreeViewer, JsValue> {
            let mut inner = PedigreeViewer::new(width, height);
            let generation = inner.begin_fetch();
            inner.apply_json(generation, json).map_err(js_error)?;
            Ok(Self { inner })
        }

        #[wasm_bindgen(js_name = beginFetch)]
        pub fn begin_fetch(&mut self) -> f64 {
            self.inner.begin_fetch().value() as f64
        }

        #[wasm_bindgen(js_name = applyJson)]
        pub fn apply_json(&mut self, generation: f64, json: &str) -> Result<bool, JsValue> {
            self.inner
                .apply_json(Generation::from_value(generation as u64), json)
                .map_err(js_error)
        }

        pub fn fail(&mut self, generation: f64, message: &str) -> bool {
            self.inner.fail(Generation::from_value(generation as u64), message)
        }

        #[wasm_bindgen(js_name = setOrientation)]
        pub fn set_orientation(&mut self, orientation: &str) -> bool {
            match Orientation::parse(orientation) {
                Some(o) => {
                    self.inner.set_orientation(o);
                    true
                }
                None => false,
            }
        }

        pub fn resize(&mut self, width: f64, height: f64) {
            self.inner.resize(width, height);
        }

        pub fn pan(&mut self, dx: f64, dy: f64) {
            self.inner.pan(dx, dy);
        }

        #[wasm_bindgen(js_name = setZoom)]
        pub fn set_zoom(&mut self, zoom: f64) {
            self.inner.set_zoom(zoom);
        }

        #[wasm_bindgen(js_name = focusNode)]
        pub fn focus_node(&mut self, id: &str) -> bool {
            self.inner.focus_node(id)
        }

        #[wasm_bindgen(js_name = nodeCount)]
        pub fn node_count(&self) -> usize {
            self.inner.node_count()
        }

        /// Render commands as a JSON array.
        #[wasm_bindgen(js_name = renderCommands)]
        pub fn render_commands(&self) -> Result<String, JsValue> {
            serde_json::to_string(&self.inner.render()).map_err(js_error)
        }

        #[wasm_bindgen(js_name = toSvg)]
        pub fn to_svg(&self) -> String {
            self.inner.to_svg()
        }
    }

    /// Route guard decision for `path`, as JSON.
    #[wasm_bindgen(js_name = routeDecision)]
    pub fn route_decision_json(
        token: Option<String>,
        path: &str,
        now_ms: f64,
    ) -> Result<String, JsValue> {
        let now = timestamp_from_millis(now_ms).map_err(js_error)?;
        let navigation = route_decision(token.as_deref(), path, now);
        serde_json::to_string(&navigation).map_err(js_error)
    }
}
