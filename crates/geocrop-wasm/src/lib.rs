//! Geocrop WASM - WebAssembly bindings for Geocrop
//!
//! This crate exposes the geocrop-core editing session to a
//! JavaScript/TypeScript canvas host. The host decodes the raster into
//! RGB, constructs a [`JsCropEditor`], forwards pointer, wheel and
//! keyboard events, and blits the resampled buffers the editor hands
//! back.
//!
//! # Module Structure
//!
//! - `session` - The editor session binding and its event methods
//! - `types` - JavaScript-friendly wrappers for pixel buffers
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropEditor } from '@geocrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new JsCropEditor(width, height, rgbPixels, geotransform, 800, 600);
//! canvas.onpointermove = (e) => {
//!   if (editor.pointer_move(e.offsetX, e.offsetY) > 0) redraw(editor.render());
//! };
//! ```

use wasm_bindgen::prelude::*;

mod session;
mod types;

// Re-export public types
pub use session::JsCropEditor;
pub use types::{JsCropResult, JsRenderedView};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
