//! WASM module for the browser pedigree viewer.
//!
//! The browser viewer reuses the same tree builder, layout and render
//! commands as the CLI's SVG output; JavaScript only executes the commands on
//! a canvas.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            JavaScript Layer              │
//! │  - fetches ancestry JSON with the token  │
//! │  - draws render commands on a canvas     │
//! └────────────────┬─────────────────────────┘
//!                  │ wasm-bindgen
//! ┌────────────────▼─────────────────────────┐
//! │              WASM Module                 │
//! │  - stale-response guard per viewer       │
//! │  - tree build, layout, camera            │
//! │  - route guard decisions                 │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```javascript
//! import init, { PedigreeViewer, routeDecision } from './studbook.js';
//!
//! await init();
//! const viewer = new PedigreeViewer(900, 600);
//! const generation = viewer.beginFetch();
//! const body = await (await fetch(`/api/v1/animals/${id}/tree`)).text();
//! viewer.applyJson(generation, body);
//! draw(JSON.parse(viewer.renderCommands()));
//! ```

mod bindings;

pub use bindings::*;

/// Initialize WASM panic hook for better error messages in browser console
///
/// This should be called once at startup to convert Rust panics into
/// readable JavaScript errors with stack traces.
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Version information for the WASM module
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
