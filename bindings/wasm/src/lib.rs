//! Browser binding: converts an encoded photo buffer into a PNG portrait.
//!
//! The host loads the SeetaFace cascade once with [`load_face_model`]
//! (typically fetched alongside the wasm module), then calls
//! [`convert_portrait`] per image. Conversion resolves to a PNG-encoded
//! `Uint8Array` or rejects with an `Error` carrying a machine-readable
//! `code` property.

use std::sync::OnceLock;

use portraitize::{PortraitConfig, PortraitConverter, PortraitError};
use wasm_bindgen::prelude::*;

static CONVERTER: OnceLock<PortraitConverter> = OnceLock::new();

/// Create a JS `Error` with a `code` property.
fn make_error(code: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    let _ = js_sys::Reflect::set(&err, &"code".into(), &JsValue::from_str(code));
    JsValue::from(err)
}

/// Convert a `PortraitError` into a JS `Error` with a machine-readable
/// `code` property.
fn to_js_error(e: PortraitError) -> JsValue {
    let code = match &e {
        PortraitError::FaceUndetected => "FACE_UNDETECTED",
        PortraitError::RotatedFaceUndetected => "ROTATED_FACE_UNDETECTED",
        PortraitError::PupilsUndetected => "PUPILS_UNDETECTED",
        PortraitError::Decode(_) => "DECODE_ERROR",
        PortraitError::Encode(_) => "ENCODE_ERROR",
        PortraitError::Model(_) => "MODEL_ERROR",
        PortraitError::ZeroDimensions => "ZERO_DIMENSIONS",
        PortraitError::InvalidAspectRatio(_)
        | PortraitError::InvalidMaxWidthRatio(_)
        | PortraitError::InvalidGamma(_) => "INVALID_CONFIG",
        PortraitError::Io(_) | PortraitError::WorkerPool(_) => "INTERNAL_ERROR",
    };
    make_error(code, &e.to_string())
}

/// Load the SeetaFace frontal-face cascade model. Must be called once
/// before [`convert_portrait`]; later calls are rejected.
#[wasm_bindgen(js_name = "loadFaceModel")]
pub fn load_face_model(model: &[u8]) -> Result<(), JsValue> {
    let converter = PortraitConverter::from_model_bytes(model).map_err(to_js_error)?;
    CONVERTER
        .set(converter)
        .map_err(|_| make_error("MODEL_ALREADY_LOADED", "face model is already loaded"))
}

/// Convert an encoded image (JPEG, PNG, ...) into a PNG-encoded portrait.
///
/// Decodes with EXIF orientation correction and converts with the default
/// portrait configuration. Resolves to the PNG bytes as a `Uint8Array`.
#[wasm_bindgen(js_name = "convertPortrait")]
pub async fn convert_portrait(input: Vec<u8>) -> Result<js_sys::Uint8Array, JsValue> {
    let converter = CONVERTER.get().ok_or_else(|| {
        make_error(
            "MODEL_NOT_LOADED",
            "call loadFaceModel before convertPortrait",
        )
    })?;

    let png = converter
        .portrait_png(&input, &PortraitConfig::default())
        .map_err(to_js_error)?;
    Ok(js_sys::Uint8Array::from(&png[..]))
}
