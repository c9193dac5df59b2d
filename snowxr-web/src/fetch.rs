use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::assets::{AssetLoader, ModelAsset};
use crate::error::describe_js;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Host(String),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("invalid glTF: {0}")]
    Parse(#[from] gltf::Error),
}

impl From<wasm_bindgen::JsValue> for FetchError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        FetchError::Host(describe_js(&value))
    }
}

/// Loads glTF binaries over HTTP with `window.fetch`.
pub struct FetchLoader {
    base_path: String,
}

impl FetchLoader {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let window = web_sys::window().ok_or_else(|| FetchError::Host("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url)).await?.dyn_into()?;
        if !response.ok() {
            return Err(FetchError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }
        let buffer = JsFuture::from(response.array_buffer()?).await?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

impl AssetLoader for FetchLoader {
    type Artifact = ModelAsset;
    type Error = FetchError;

    async fn load(&self, path: &str) -> Result<ModelAsset, FetchError> {
        let url = format!("{}{}", self.base_path, path);
        let bytes = self.fetch_bytes(&url).await?;
        let model = ModelAsset::from_slice(&bytes)?;
        log::info!("{url}: {} bytes, {} nodes", bytes.len(), model.node_count());
        Ok(model)
    }
}
