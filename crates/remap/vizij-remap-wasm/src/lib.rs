//! wasm-bindgen surface for the remap session.
//!
//! A web editor loads a clip, drives preview/apply/discard, and reads the edited
//! clip back with `export_clip`. The active clip lives inside the session adapter.

use js_sys::JSON;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use vizij_remap_core::{
    parse_clip_json, ClipSession, Config, DiscardReport, PreviewEntry, RemapError, RemapSession,
    RewriteMode, Status,
};

#[wasm_bindgen]
pub struct VizijRemap {
    core: RemapSession<ClipSession>,
}

#[derive(Serialize)]
struct PreviewResult<'a> {
    entries: &'a [PreviewEntry],
    summary: &'a str,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Serialize through JSON so flattened structs arrive as plain JS objects.
fn to_js<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsError> {
    let s = serde_json::to_string(value)
        .map_err(|e| JsError::new(&format!("{what} error: {e}")))?;
    JSON::parse(&s).map_err(|e| JsError::new(&format!("{what} parse error: {:?}", e)))
}

fn js_err(e: RemapError) -> JsError {
    JsError::new(&Status::from(&e).message)
}

#[wasm_bindgen]
impl VizijRemap {
    /// Create a session. Pass a JSON config object or undefined/null for defaults.
    /// Example:
    ///   new VizijRemap({ collisions: "overwrite", reload: "reject" })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<VizijRemap, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        Ok(VizijRemap {
            core: RemapSession::new(ClipSession::new(), cfg),
        })
    }

    /// Open a clip (JS object) and capture its bindings. Returns the captured count.
    #[wasm_bindgen(js_name = load_clip)]
    pub fn load_clip(&mut self, clip_json: JsValue) -> Result<u32, JsError> {
        if jsvalue_is_undefined_or_null(&clip_json) {
            return Err(JsError::new("load_clip: clip_json is null/undefined"));
        }
        // Stringify so the core parser (and its validation) can be reused
        let s = JSON::stringify(&clip_json)
            .map_err(|e| JsError::new(&format!("load_clip stringify error: {:?}", e)))?
            .as_string()
            .ok_or_else(|| JsError::new("load_clip: stringify produced non-string"))?;
        let clip =
            parse_clip_json(&s).map_err(|e| JsError::new(&format!("load_clip parse error: {e}")))?;
        let report = self.core.open_clip(clip).map_err(js_err)?;
        Ok(report.captured as u32)
    }

    /// Re-capture the bindings of the open clip.
    #[wasm_bindgen]
    pub fn reload(&mut self) -> Result<u32, JsError> {
        let report = self.core.load().map_err(js_err)?;
        Ok(report.captured as u32)
    }

    /// Compute the rename preview. `mode` is "prefix", "infix" (or "between") or "suffix".
    /// Returns `{ entries: [{ index, source, target }], summary }`.
    #[wasm_bindgen]
    pub fn preview(
        &mut self,
        text: String,
        search: String,
        mode: String,
    ) -> Result<JsValue, JsError> {
        let mode: RewriteMode = mode.parse().map_err(|e: String| JsError::new(&e))?;
        let entries = self.core.preview(&text, &search, mode).to_vec();
        let result = PreviewResult {
            entries: &entries,
            summary: &self.core.status().message,
        };
        to_js(&result, "preview")
    }

    /// Commit the preview to the open clip. Returns the number of renamed bindings.
    #[wasm_bindgen]
    pub fn apply(&mut self) -> Result<u32, JsError> {
        let report = self.core.apply().map_err(js_err)?;
        Ok(report.applied as u32)
    }

    /// Revert every applied rename. Returns the number of restored bindings.
    #[wasm_bindgen]
    pub fn discard(&mut self) -> Result<u32, JsError> {
        match self.core.discard().map_err(js_err)? {
            DiscardReport::Reverted(n) => Ok(n as u32),
            DiscardReport::NothingToRevert => Ok(0),
        }
    }

    /// True while an applied rename can still be discarded.
    #[wasm_bindgen(js_name = is_dirty)]
    pub fn is_dirty(&self) -> bool {
        self.core.engine().is_dirty()
    }

    /// Last status line: `{ level, message }`.
    #[wasm_bindgen]
    pub fn status(&self) -> Result<JsValue, JsError> {
        swb::to_value(self.core.status()).map_err(|e| JsError::new(&format!("status error: {e}")))
    }

    /// The open clip as a JS object, or undefined when none is open.
    #[wasm_bindgen(js_name = export_clip)]
    pub fn export_clip(&self) -> Result<JsValue, JsError> {
        match self.core.adapter().clip() {
            Some(clip) => to_js(clip, "export"),
            None => Ok(JsValue::UNDEFINED),
        }
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
