use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum GalaxyError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("mount point `{0}` not found")]
    MountPointMissing(String),

    #[error("WebGL context unavailable")]
    ContextUnavailable,

    #[error("shader compilation failed: {0}")]
    Shader(String),

    #[error("program link failed: {0}")]
    Link(String),

    #[error("failed to create {0}")]
    Resource(&'static str),

    #[error("JavaScript error: {0}")]
    Js(String),

    #[error("invalid config: {0}")]
    Config(String),
}

impl From<JsValue> for GalaxyError {
    fn from(value: JsValue) -> Self {
        GalaxyError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<serde_json::Error> for GalaxyError {
    fn from(err: serde_json::Error) -> Self {
        GalaxyError::Config(err.to_string())
    }
}

impl From<GalaxyError> for JsValue {
    fn from(err: GalaxyError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
