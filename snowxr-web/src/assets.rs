use std::collections::HashMap;
use std::fmt::Display;

use crate::error::AssetLoadError;
use crate::progress::{LoadingProgress, ProgressDisplay};

/// Fixed, ordered list of model files to load at start-up.
/// Duplicate filenames are dropped, keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    models_dir: String,
    filenames: Vec<String>,
}

impl AssetManifest {
    pub fn new<I, S>(models_dir: impl Into<String>, filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in filenames {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self {
            models_dir: models_dir.into(),
            filenames: unique,
        }
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    /// Loader path for a manifest entry.
    pub fn path_of(&self, filename: &str) -> String {
        format!("{}{}", self.models_dir, filename)
    }
}

/// Capability that turns a path into a loaded artifact.
#[allow(async_fn_in_trait)]
pub trait AssetLoader {
    type Artifact;
    type Error: Display;

    async fn load(&self, path: &str) -> Result<Self::Artifact, Self::Error>;
}

/// Queries scene construction needs from a loaded model.
pub trait ModelInfo {
    fn has_material(&self, name: &str) -> bool;
}

/// Immutable filename → artifact mapping. Only obtainable from a fully
/// successful [`load_all`].
#[derive(Debug)]
pub struct AssetRegistry<A> {
    models: HashMap<String, A>,
}

impl<A> Default for AssetRegistry<A> {
    /// The registry of an empty manifest.
    fn default() -> Self {
        Self {
            models: HashMap::new(),
        }
    }
}

impl<A> AssetRegistry<A> {
    pub fn get(&self, filename: &str) -> Option<&A> {
        self.models.get(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.models.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &A)> {
        self.models.iter()
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (String, A)>) -> Self {
        Self {
            models: entries.into_iter().collect(),
        }
    }
}

/// Load every manifest entry, one after another, reporting progress as each
/// completes. The first failure aborts the whole load.
pub async fn load_all<L, D>(
    loader: &L,
    manifest: &AssetManifest,
    progress: &mut LoadingProgress<D>,
) -> Result<AssetRegistry<L::Artifact>, AssetLoadError>
where
    L: AssetLoader,
    D: ProgressDisplay,
{
    let total = manifest.len();
    let mut models = HashMap::with_capacity(total);

    if total == 0 {
        progress.on_item_loaded(0, 0);
    }

    for (index, filename) in manifest.filenames().iter().enumerate() {
        let path = manifest.path_of(filename);
        log::debug!("Loading model {path}");
        match loader.load(&path).await {
            Ok(artifact) => {
                models.insert(filename.clone(), artifact);
                progress.on_item_loaded(index + 1, total);
            }
            Err(err) => return Err(progress.on_error(filename, &path, err.to_string())),
        }
    }

    log::info!("Loaded {} model assets", models.len());
    Ok(AssetRegistry { models })
}

/// The document of a parsed glTF binary. The binary chunk is not kept.
pub struct ModelAsset {
    pub document: gltf::Document,
}

impl ModelAsset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, gltf::Error> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        Ok(Self {
            document: gltf.document,
        })
    }

    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.document.materials().filter_map(|m| m.name())
    }

    pub fn node_count(&self) -> usize {
        self.document.nodes().len()
    }
}

impl ModelInfo for ModelAsset {
    fn has_material(&self, name: &str) -> bool {
        self.material_names().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::tests::RecordingDisplay;
    use std::cell::RefCell;

    /// In-memory loader: succeeds for every path except those listed in `failing`.
    struct FakeLoader {
        failing: Vec<String>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeLoader {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl AssetLoader for FakeLoader {
        type Artifact = String;
        type Error = String;

        async fn load(&self, path: &str) -> Result<String, String> {
            self.requested.borrow_mut().push(path.to_string());
            if self.failing.iter().any(|f| f == path) {
                Err(format!("HTTP 404 for {path}"))
            } else {
                Ok(format!("artifact:{path}"))
            }
        }
    }

    fn manifest(names: &[&str]) -> AssetManifest {
        AssetManifest::new("models/", names.iter().copied())
    }

    #[test]
    fn test_all_loads_succeed() {
        let loader = FakeLoader::new(&[]);
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        let m = manifest(&["a.glb", "b.glb"]);

        let registry = pollster::block_on(load_all(&loader, &m, &mut progress)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a.glb").map(String::as_str), Some("artifact:models/a.glb"));
        assert!(registry.contains("b.glb"));
        assert_eq!(
            progress.display().reports.last(),
            Some(&("100%".to_string(), "Loaded 2 of 2 files.".to_string()))
        );
    }

    #[test]
    fn test_loads_sequentially_in_manifest_order() {
        let loader = FakeLoader::new(&[]);
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        let m = manifest(&["snowScene.glb", "torch.glb", "extra.glb"]);

        pollster::block_on(load_all(&loader, &m, &mut progress)).unwrap();

        assert_eq!(
            *loader.requested.borrow(),
            vec!["models/snowScene.glb", "models/torch.glb", "models/extra.glb"]
        );
        let percents: Vec<_> = progress.display().reports.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(percents, vec!["33%", "67%", "100%"]);
    }

    #[test]
    fn test_single_failure_rejects_whole_load() {
        let loader = FakeLoader::new(&["models/b.glb"]);
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        let m = manifest(&["a.glb", "b.glb", "c.glb"]);

        let err = pollster::block_on(load_all(&loader, &m, &mut progress)).unwrap_err();

        assert_eq!(err.filename, "b.glb");
        assert!(err.reason.contains("404"));
        assert_eq!(progress.state().last_error_url.as_deref(), Some("models/b.glb"));
        // Nothing after the failure is requested.
        assert_eq!(loader.requested.borrow().len(), 2);
    }

    #[test]
    fn test_failure_on_first_item() {
        let loader = FakeLoader::new(&["models/a.glb"]);
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        let result = pollster::block_on(load_all(&loader, &manifest(&["a.glb"]), &mut progress));
        assert!(result.is_err());
        assert!(progress.display().reports.is_empty());
    }

    #[test]
    fn test_empty_manifest_resolves_empty() {
        let loader = FakeLoader::new(&[]);
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        let registry = pollster::block_on(load_all(&loader, &manifest(&[]), &mut progress)).unwrap();
        assert!(registry.is_empty());
        assert_eq!(
            progress.display().reports,
            vec![("100%".to_string(), "Loaded 0 of 0 files.".to_string())]
        );
    }

    #[test]
    fn test_manifest_dedups_filenames() {
        let m = manifest(&["a.glb", "b.glb", "a.glb"]);
        assert_eq!(m.filenames(), &["a.glb".to_string(), "b.glb".to_string()]);
        assert_eq!(m.path_of("a.glb"), "models/a.glb");
    }

    #[test]
    fn test_model_asset_reads_material_names() {
        let json = br#"{
            "asset": { "version": "2.0" },
            "materials": [ { "name": "Bark" }, { "name": "Snow" }, {} ]
        }"#;
        let model = ModelAsset::from_slice(json).unwrap();
        assert!(model.has_material("Snow"));
        assert!(!model.has_material("Ice"));
        assert_eq!(model.material_names().count(), 2);
        assert_eq!(model.node_count(), 0);
    }

    #[test]
    fn test_model_asset_rejects_garbage() {
        assert!(ModelAsset::from_slice(b"not a model").is_err());
    }
}
