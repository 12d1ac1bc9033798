use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("element not found: {0}")]
    MissingElement(&'static str),
    #[error("could not place cursor: {0}")]
    Selection(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("dom call failed: {0}")]
    Dom(String),
}

impl From<JsValue> for EngineError {
    fn from(value: JsValue) -> Self {
        EngineError::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<EngineError> for JsValue {
    fn from(error: EngineError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}
