use thiserror::Error;

/// One manifest entry failed; the whole registry load fails with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load asset `{filename}`: {reason}")]
pub struct AssetLoadError {
    pub filename: String,
    pub reason: String,
}

/// Failures around the immersive session. These relabel or disable the VR
/// button and are logged; they never abort the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("immersive session request rejected: {0}")]
    RequestRejected(String),
    #[error("immersive session support query failed: {0}")]
    NotAllowed(String),
    #[error("WebXR is not available (secure context: {secure_context})")]
    CapabilityUnavailable { secure_context: bool },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that abort scene start-up.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unknown scene `{0}`")]
    UnknownScene(String),
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
    #[error("asset `{0}` is not in the manifest")]
    MissingAsset(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("host error: {0}")]
    Host(String),
}

#[cfg(target_arch = "wasm32")]
impl From<SceneError> for wasm_bindgen::JsValue {
    fn from(err: SceneError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for SceneError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        SceneError::Host(describe_js(&value))
    }
}

/// Human-readable text for a thrown JS value.
#[cfg(target_arch = "wasm32")]
pub(crate) fn describe_js(value: &wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_names_file() {
        let err = AssetLoadError {
            filename: "torch.glb".into(),
            reason: "HTTP 404".into(),
        };
        assert_eq!(err.to_string(), "failed to load asset `torch.glb`: HTTP 404");
    }

    #[test]
    fn test_scene_error_is_transparent_over_asset_error() {
        let err: SceneError = AssetLoadError {
            filename: "a.glb".into(),
            reason: "boom".into(),
        }
        .into();
        assert!(err.to_string().contains("a.glb"));
    }
}
