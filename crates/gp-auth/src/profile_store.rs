use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::device::DeviceProfile;
use crate::errors::{GpAuthError, Result};

/// Device profiles shipped with the crate
const BUNDLED_PROFILES: &str = include_str!("../resources/devices.toml");

/// Name of the profile used when the caller does not pick one
pub const DEFAULT_PROFILE: &str = "default";

/// Source of named device profiles
///
/// Each profile is a flat string-to-string section with lowercase keys;
/// typing and validation happen in [`DeviceProfile::from_attributes`].
pub trait ProfileStore: Send + Sync {
    /// Raw attributes of a named profile
    fn attributes(&self, name: &str) -> Option<HashMap<String, String>>;

    /// Names of every stored profile
    fn profile_names(&self) -> Vec<String>;

    /// Look up and validate a named profile
    fn resolve(&self, name: &str) -> Result<DeviceProfile> {
        let attributes = self
            .attributes(name)
            .ok_or_else(|| GpAuthError::ProfileNotFound(name.to_string()))?;
        DeviceProfile::from_attributes(name, &attributes)
    }
}

/// In-memory profile store for testing and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: HashMap<String, HashMap<String, String>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a profile; attribute keys are matched case-insensitively
    pub fn insert(&mut self, name: impl Into<String>, attributes: HashMap<String, String>) {
        let attributes = attributes
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();
        self.profiles.insert(name.into(), attributes);
    }
}

impl ProfileStore for MemoryProfileStore {
    fn attributes(&self, name: &str) -> Option<HashMap<String, String>> {
        self.profiles.get(name).cloned()
    }

    fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

/// Profile store backed by a TOML document
///
/// Every top-level table is one profile. Keys may be quoted
/// (`"build.fingerprint" = ...`) or dotted (`build.fingerprint = ...`); nested
/// tables are flattened back to dotted keys. Keys are case-insensitive and
/// stored lowercase. Scalars are stringified and arrays are joined with commas.
///
/// ```toml
/// [default]
/// "build.fingerprint" = "google/walleye/walleye:8.1.0/..."
/// "screen.width" = 1080
/// platforms = ["arm64-v8a", "armeabi-v7a"]
/// ```
#[derive(Debug, Clone)]
pub struct TomlProfileStore {
    source: Option<PathBuf>,
    profiles: HashMap<String, HashMap<String, String>>,
}

impl TomlProfileStore {
    /// Parse profiles from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: toml::Table =
            toml::from_str(content).map_err(|e| GpAuthError::ProfileParse(e.to_string()))?;

        let mut profiles = HashMap::new();
        for (name, value) in document {
            let toml::Value::Table(section) = value else {
                return Err(GpAuthError::ProfileParse(format!(
                    "top-level key '{}' is not a profile table",
                    name
                )));
            };
            let mut attributes = HashMap::new();
            flatten_section("", &section, &mut attributes);
            profiles.insert(name, attributes);
        }

        Ok(Self {
            source: None,
            profiles,
        })
    }

    /// Load profiles from a TOML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let mut store = Self::from_toml_str(&content)?;
        store.source = Some(path.to_path_buf());
        tracing::debug!(
            "Loaded {} device profiles from {}",
            store.profiles.len(),
            path.display()
        );
        Ok(store)
    }

    /// Profiles compiled into the crate
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_PROFILES)
    }

    /// File the profiles were read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl ProfileStore for TomlProfileStore {
    fn attributes(&self, name: &str) -> Option<HashMap<String, String>> {
        self.profiles.get(name).cloned()
    }

    fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

fn flatten_section(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.to_lowercase()
        } else {
            format!("{}.{}", prefix, key.to_lowercase())
        };

        match value {
            toml::Value::Table(nested) => flatten_section(&key, nested, out),
            toml::Value::Array(items) => {
                let joined = items.iter().map(scalar_to_string).collect::<Vec<_>>();
                out.insert(key, joined.join(","));
            }
            scalar => {
                out.insert(key, scalar_to_string(scalar));
            }
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::sample_attributes;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_resolve() {
        let mut store = MemoryProfileStore::new();
        store.insert("walleye", sample_attributes());

        let profile = store.resolve("walleye").unwrap();
        assert_eq!(profile.name, "walleye");
        assert_eq!(profile.build.model, "Pixel 2");
    }

    #[test]
    fn test_unknown_profile_fails() {
        let store = MemoryProfileStore::new();
        assert!(matches!(
            store.resolve("nexus"),
            Err(GpAuthError::ProfileNotFound(name)) if name == "nexus"
        ));
    }

    #[test]
    fn test_bundled_default_profile_is_complete() {
        let store = TomlProfileStore::bundled().unwrap();
        assert!(store.profile_names().contains(&DEFAULT_PROFILE.to_string()));

        let profile = store.resolve(DEFAULT_PROFILE).unwrap();
        assert!(!profile.build.fingerprint.is_empty());
        assert!(!profile.platforms.is_empty());
        assert!(profile.timezone.is_some());
    }

    #[test]
    fn test_toml_flattens_dotted_keys_and_arrays() {
        let store = TomlProfileStore::from_toml_str(
            r#"
            [tablet]
            build.fingerprint = "vendor/tablet:12/ABC"
            "screen.width" = 1200
            hashardkeyboard = false
            platforms = ["x86_64", "arm64-v8a"]
            "#,
        )
        .unwrap();

        let attrs = store.attributes("tablet").unwrap();
        assert_eq!(attrs["build.fingerprint"], "vendor/tablet:12/ABC");
        assert_eq!(attrs["screen.width"], "1200");
        assert_eq!(attrs["hashardkeyboard"], "false");
        assert_eq!(attrs["platforms"], "x86_64,arm64-v8a");
    }

    #[test]
    fn test_memory_store_ignores_key_case() {
        let mixed = sample_attributes()
            .into_iter()
            .map(|(key, value)| match key.as_str() {
                "build.fingerprint" => ("Build.FINGERPRINT".to_string(), value),
                "sharedlibraries" => ("SharedLibraries".to_string(), value),
                _ => (key.to_uppercase(), value),
            })
            .collect();

        let mut store = MemoryProfileStore::new();
        store.insert("walleye", mixed);

        let attrs = store.attributes("walleye").unwrap();
        assert!(attrs.contains_key("build.fingerprint"));
        assert!(!attrs.contains_key("Build.FINGERPRINT"));
        assert_eq!(
            store.resolve("walleye").unwrap(),
            DeviceProfile::from_attributes("walleye", &sample_attributes()).unwrap()
        );
    }

    #[test]
    fn test_toml_ignores_key_case() {
        let mut content =
            String::from("[Walleye]\nBuild.FINGERPRINT = \"vendor/walleye:8.1.0/XYZ\"\n");
        for (key, value) in sample_attributes() {
            if key != "build.fingerprint" {
                content.push_str(&format!("\"{}\" = \"{}\"\n", key.to_uppercase(), value));
            }
        }

        let store = TomlProfileStore::from_toml_str(&content).unwrap();
        // profile names keep their case
        assert!(store.attributes("walleye").is_none());

        let profile = store.resolve("Walleye").unwrap();
        assert_eq!(profile.build.fingerprint, "vendor/walleye:8.1.0/XYZ");
        assert_eq!(profile.build.model, "Pixel 2");
    }

    #[test]
    fn test_toml_rejects_non_table_profile() {
        let result = TomlProfileStore::from_toml_str("default = \"pixel\"");
        assert!(matches!(result, Err(GpAuthError::ProfileParse(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("devices.toml");
        let mut content = String::from("[walleye]\n");
        for (key, value) in sample_attributes() {
            content.push_str(&format!("\"{}\" = \"{}\"\n", key, value));
        }
        tokio::fs::write(&path, content).await.unwrap();

        let store = TomlProfileStore::load(&path).await.unwrap();
        assert_eq!(store.source(), Some(path.as_path()));
        assert_eq!(store.resolve("walleye").unwrap(), {
            DeviceProfile::from_attributes("walleye", &sample_attributes()).unwrap()
        });
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let result = TomlProfileStore::load("/nonexistent/devices.toml").await;
        assert!(matches!(result, Err(GpAuthError::Io(_))));
    }
}
