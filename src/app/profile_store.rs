// relayctl - app/profile_store.rs
//
// Durable mapping of profile name -> ConfigRecord plus the active-profile
// pointer.
//
// Layout:
//   <root>/profiles/<name>.toml   one ConfigRecord per file
//   <root>/active_profile         the active profile name
//
// Design principles:
// - Nothing is cached. Every operation re-reads what it needs, so the store
//   always reflects what is on disk.
// - Every write goes through platform::fs::write_atomic: a crash mid-write
//   leaves the previous file intact.
// - Multi-file operations order their writes so an interruption between
//   steps never leaves the active pointer naming a missing profile.
// - Concurrent relayctl processes are not coordinated.

use crate::core::filter;
use crate::core::model::ConfigRecord;
use crate::platform::config::PlatformPaths;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::{ConfigError, Subject};
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, ConfigError>;

/// File-backed profile store.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles_dir: PathBuf,
    active_file: PathBuf,
}

impl ProfileStore {
    /// Store rooted at `root` (profiles/ and active_profile beneath it).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::from_paths(&PlatformPaths::under(root.as_ref()))
    }

    /// Store at the resolved platform paths.
    pub fn from_paths(paths: &PlatformPaths) -> Self {
        Self {
            profiles_dir: paths.profiles_dir.clone(),
            active_file: paths.active_profile_file.clone(),
        }
    }

    /// Path of the document backing profile `name`.
    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir
            .join(format!("{name}.{}", constants::PROFILE_FILE_EXTENSION))
    }

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    /// Upsert `record` under `name`.
    ///
    /// The stored record's `name` is always `name`. The first profile saved
    /// into a store without a valid active pointer becomes active.
    pub fn save(&self, name: &str, record: &ConfigRecord) -> Result<()> {
        check_name(name)?;

        let mut record = record.clone();
        record.name = name.to_string();
        self.write_record(name, &record)?;

        if self.read_active_pointer()?.map_or(true, |a| !self.exists(&a)) {
            self.write_active_pointer(name)?;
            tracing::info!(profile = %name, "Profile set as active");
        }
        Ok(())
    }

    /// Load the record stored under `name`.
    ///
    /// A dangling `current_environment` (hand-edited file) is repaired in the
    /// returned record; the file itself is left alone until the next save.
    pub fn load(&self, name: &str) -> Result<ConfigRecord> {
        if filter::validate_profile_name(name).is_err() {
            return Err(ConfigError::profile_not_found(name));
        }

        let path = self.profile_path(name);
        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::profile_not_found(name));
            }
            Err(e) => return Err(ConfigError::io(&path, "stat profile", e)),
        };
        if metadata.len() > constants::MAX_PROFILE_FILE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "profile file",
                value: path.display().to_string(),
                expected: format!("at most {} bytes", constants::MAX_PROFILE_FILE_SIZE),
            });
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::io(&path, "read profile", e))?;
        let mut record: ConfigRecord =
            toml::from_str(&content).map_err(|source| ConfigError::InvalidFormat {
                path: path.clone(),
                source,
            })?;

        record.name = name.to_string();
        if record.repair_current_environment() {
            tracing::warn!(
                profile = %name,
                current = ?record.current_environment,
                "Profile named a missing current environment; repaired"
            );
        }
        Ok(record)
    }

    /// All saved profile names, in lexical order.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.profiles_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ConfigError::io(&self.profiles_dir, "list profiles", e)),
        };

        let mut names = Vec::new();
        for entry_result in entries {
            let entry =
                entry_result.map_err(|e| ConfigError::io(&self.profiles_dir, "list profiles", e))?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some(constants::PROFILE_FILE_EXTENSION)
            {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Skips stray files that could never have been written by save().
            if filter::validate_profile_name(stem).is_ok() && path.is_file() {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// True if a profile named `name` is saved.
    pub fn exists(&self, name: &str) -> bool {
        filter::validate_profile_name(name).is_ok() && self.profile_path(name).is_file()
    }

    // -------------------------------------------------------------------------
    // Active pointer
    // -------------------------------------------------------------------------

    /// Name of the active profile.
    ///
    /// Fails with `NotFound` when no profile exists. A missing or dangling
    /// pointer while profiles exist is repaired to the lexically first one.
    pub fn get_active_name(&self) -> Result<String> {
        if let Some(active) = self.read_active_pointer()? {
            if self.exists(&active) {
                return Ok(active);
            }
            tracing::warn!(profile = %active, "Active profile pointer is dangling");
        }

        let names = self.list()?;
        let first = names
            .into_iter()
            .next()
            .ok_or_else(|| ConfigError::NotFound {
                subject: Subject::Profile,
                name: "<active>".to_string(),
            })?;
        self.write_active_pointer(&first)?;
        tracing::info!(profile = %first, "Active profile pointer repaired");
        Ok(first)
    }

    /// Load the active profile's record.
    pub fn load_active(&self) -> Result<ConfigRecord> {
        let name = self.get_active_name()?;
        self.load(&name)
    }

    /// Make `name` the active profile.
    pub fn switch_active(&self, name: &str) -> Result<()> {
        if !self.exists(name) {
            return Err(ConfigError::profile_not_found(name));
        }
        self.write_active_pointer(name)?;
        tracing::info!(profile = %name, "Switched active profile");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Structural changes
    // -------------------------------------------------------------------------

    /// Delete profile `name`.
    ///
    /// The only remaining profile cannot be deleted. Deleting the active
    /// profile re-points to the lexically first survivor; the pointer is
    /// rewritten before the file is removed.
    pub fn delete(&self, name: &str) -> Result<()> {
        let names = self.list()?;
        if !names.iter().any(|n| n == name) {
            return Err(ConfigError::profile_not_found(name));
        }
        if names.len() == 1 {
            return Err(ConfigError::LastProfile {
                name: name.to_string(),
            });
        }

        let active = self.read_active_pointer()?;
        let active_is_live = active.as_deref().is_some_and(|a| names.iter().any(|n| n == a));
        if active.as_deref() == Some(name) || !active_is_live {
            // names has >= 2 entries, so a survivor exists.
            if let Some(next) = names.iter().find(|n| n.as_str() != name) {
                self.write_active_pointer(next)?;
                tracing::info!(deleted = %name, active = %next, "Active profile re-assigned");
            }
        }

        let path = self.profile_path(name);
        fs::remove_if_exists(&path).map_err(|e| ConfigError::io(&path, "delete profile", e))?;
        tracing::info!(profile = %name, "Profile deleted");
        Ok(())
    }

    /// Rename profile `old` to `new`, keeping every other field and the
    /// active pointer.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        let mut record = self.load(old)?;
        if self.exists(new) {
            return Err(ConfigError::AlreadyExists {
                subject: Subject::Profile,
                name: new.to_string(),
            });
        }
        check_name(new)?;

        let was_active = self.read_active_pointer()?.as_deref() == Some(old);

        // Write new, move the pointer, then drop old: every intermediate
        // state has a valid active profile.
        record.name = new.to_string();
        self.write_record(new, &record)?;

        if was_active {
            self.write_active_pointer(new)?;
        }

        let old_path = self.profile_path(old);
        fs::remove_if_exists(&old_path)
            .map_err(|e| ConfigError::io(&old_path, "delete profile", e))?;

        tracing::info!(old = %old, new = %new, active = was_active, "Profile renamed");
        Ok(())
    }

    /// Remove every profile and the active pointer. Idempotent.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.profiles_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ConfigError::io(&self.profiles_dir, "clear profiles", e)),
        }
        fs::remove_if_exists(&self.active_file)
            .map_err(|e| ConfigError::io(&self.active_file, "clear active profile", e))?;
        tracing::info!("All profiles cleared");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Serialise `record` and write it atomically as profile `name`.
    fn write_record(&self, name: &str, record: &ConfigRecord) -> Result<()> {
        let toml = toml::to_string_pretty(record).map_err(|e| ConfigError::InvalidValue {
            field: "record",
            value: name.to_string(),
            expected: format!("a TOML-serialisable record ({e})"),
        })?;

        let path = self.profile_path(name);
        fs::write_atomic(&path, toml.as_bytes())
            .map_err(|e| ConfigError::io(&path, "write profile", e))?;
        tracing::debug!(profile = %name, path = %path.display(), "Profile written");
        Ok(())
    }

    fn read_active_pointer(&self) -> Result<Option<String>> {
        let content = fs::read_optional(&self.active_file)
            .map_err(|e| ConfigError::io(&self.active_file, "read active profile", e))?;
        Ok(content
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    fn write_active_pointer(&self, name: &str) -> Result<()> {
        fs::write_atomic(&self.active_file, format!("{name}\n").as_bytes())
            .map_err(|e| ConfigError::io(&self.active_file, "write active profile", e))
    }
}

fn check_name(name: &str) -> Result<()> {
    filter::validate_profile_name(name).map_err(|e| ConfigError::InvalidValue {
        field: "profile name",
        value: name.to_string(),
        expected: e.to_string(),
    })
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(name: &str) -> ConfigRecord {
        let mut r = ConfigRecord::new(name);
        r.email = format!("{name}@example.com");
        r.user_id = "u_123".to_string();
        r.user_name = "Jane".to_string();
        r.api_key = Some("sk_test_abc".to_string());
        r.api_url = "https://relay.example.com".to_string();
        r.permanent_url = Some("https://relay.example.com/hooks/u_123".to_string());
        r.set_endpoint("dev", "http://localhost:3000/hook").unwrap();
        r.set_endpoint("prod", "https://prod.example.com/hook").unwrap();
        r
    }

    fn store_with(dir: &TempDir, names: &[&str]) -> ProfileStore {
        let store = ProfileStore::new(dir.path());
        for n in names {
            store.save(n, &sample(n)).unwrap();
        }
        store
    }

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(dir.path());
        let original = sample("work");

        store.save("work", &original).unwrap();
        assert_eq!(store.load("work").unwrap(), original);
    }

    #[test]
    fn round_trip_preserves_absent_optionals() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(dir.path());
        let bare = ConfigRecord::new("bare");

        store.save("bare", &bare).unwrap();
        let loaded = store.load("bare").unwrap();
        assert_eq!(loaded, bare);
        assert!(loaded.api_key.is_none());
        assert!(loaded.current_environment.is_none());
    }

    #[test]
    fn load_missing_profile_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a"]);
        assert!(matches!(
            store.load("b"),
            Err(ConfigError::NotFound {
                subject: Subject::Profile,
                ..
            })
        ));
    }

    #[test]
    fn load_malformed_profile_is_invalid_format() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a"]);
        std::fs::write(store.profile_path("a"), "endpoints = [[[").unwrap();
        assert!(matches!(
            store.load("a"),
            Err(ConfigError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn first_saved_profile_becomes_active() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(dir.path());
        assert!(matches!(
            store.get_active_name(),
            Err(ConfigError::NotFound { .. })
        ));

        store.save("b", &sample("b")).unwrap();
        store.save("a", &sample("a")).unwrap();
        assert_eq!(store.get_active_name().unwrap(), "b");
        assert_eq!(store.list().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn switch_active_requires_existing_profile() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b"]);
        store.switch_active("b").unwrap();
        assert_eq!(store.get_active_name().unwrap(), "b");

        assert!(matches!(
            store.switch_active("zzz"),
            Err(ConfigError::NotFound { .. })
        ));
        assert_eq!(store.get_active_name().unwrap(), "b");
    }

    #[test]
    fn deleting_sole_profile_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["only"]);
        assert!(matches!(
            store.delete("only"),
            Err(ConfigError::LastProfile { .. })
        ));
        assert_eq!(store.list().unwrap(), vec!["only"]);
        assert_eq!(store.get_active_name().unwrap(), "only");
    }

    /// profiles ["a","b"], active "a"; delete("a") => active "b", list ["b"].
    #[test]
    fn deleting_active_profile_reassigns_pointer() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b"]);
        assert_eq!(store.get_active_name().unwrap(), "a");

        store.delete("a").unwrap();
        assert_eq!(store.get_active_name().unwrap(), "b");
        assert_eq!(store.list().unwrap(), vec!["b"]);
    }

    #[test]
    fn deleting_inactive_profile_keeps_pointer() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b", "c"]);
        store.switch_active("c").unwrap();

        store.delete("a").unwrap();
        assert_eq!(store.get_active_name().unwrap(), "c");
        assert_eq!(store.list().unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn delete_missing_profile_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b"]);
        assert!(matches!(
            store.delete("nope"),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn rename_preserves_fields_and_active_pointer() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b"]);
        let before = store.load("a").unwrap();

        store.rename("a", "alpha").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "b"]);
        assert_eq!(store.get_active_name().unwrap(), "alpha");
        let after = store.load("alpha").unwrap();
        assert_eq!(after.name, "alpha");
        assert_eq!(
            ConfigRecord {
                name: "a".to_string(),
                ..after
            },
            before
        );
    }

    #[test]
    fn renamed_document_matches_a_plain_save() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b"]);
        store.rename("a", "alpha").unwrap();
        let renamed = std::fs::read_to_string(store.profile_path("alpha")).unwrap();

        let mut record = store.load("alpha").unwrap();
        record.name = "ignored".to_string();
        store.save("alpha", &record).unwrap();
        let saved = std::fs::read_to_string(store.profile_path("alpha")).unwrap();

        assert_eq!(renamed, saved);
        assert!(renamed.contains("name = \"alpha\""));
    }

    #[test]
    fn rename_onto_existing_name_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b"]);
        let a = store.load("a").unwrap();
        let b = store.load("b").unwrap();

        assert!(matches!(
            store.rename("a", "b"),
            Err(ConfigError::AlreadyExists { .. })
        ));
        assert_eq!(store.list().unwrap(), vec!["a", "b"]);
        assert_eq!(store.load("a").unwrap(), a);
        assert_eq!(store.load("b").unwrap(), b);
        assert_eq!(store.get_active_name().unwrap(), "a");
    }

    #[test]
    fn rename_missing_profile_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a"]);
        assert!(matches!(
            store.rename("x", "y"),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a", "b"]);
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.get_active_name().is_err());

        let empty = ProfileStore::new(dir.path().join("never-created"));
        empty.clear().unwrap();
    }

    #[test]
    fn dangling_active_pointer_is_repaired() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["b", "c"]);
        std::fs::write(dir.path().join("active_profile"), "ghost\n").unwrap();
        assert_eq!(store.get_active_name().unwrap(), "b");
    }

    #[test]
    fn save_rejects_unsafe_names() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(dir.path());
        assert!(matches!(
            store.save("../escape", &sample("x")),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(store.list().unwrap().is_empty());
    }

    /// A leftover temp file from an interrupted write is ignored by list()
    /// and does not disturb the next save.
    #[test]
    fn stray_temp_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a"]);
        std::fs::write(dir.path().join("profiles").join(".tmpXYZ"), b"garbage").unwrap();

        let mut updated = sample("a");
        updated.user_name = "Renamed".to_string();
        store.save("a", &updated).unwrap();

        assert_eq!(store.list().unwrap(), vec!["a"]);
        assert_eq!(store.load("a").unwrap().user_name, "Renamed");
    }

    #[test]
    fn persisted_document_uses_record_field_names() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["a"]);
        let text = std::fs::read_to_string(store.profile_path("a")).unwrap();
        for key in [
            "name",
            "email",
            "user_id",
            "user_name",
            "api_key",
            "api_url",
            "permanent_url",
            "current_environment",
            "[endpoints]",
        ] {
            assert!(text.contains(key), "missing {key} in:\n{text}");
        }
    }
}
