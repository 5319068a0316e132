//! Recovery key entry form
//!
//! Holds the text field, its error and whether submit is enabled. The key
//! itself is decoded on submit; unlocking secret storage is left to the caller.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::key::{RecoveryKey, RecoveryKeyError};

/// Error from the entry flow
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("Nothing to submit")]
    Empty,
    #[error(transparent)]
    InvalidKey(#[from] RecoveryKeyError),
    #[error("Failed to read recovery key file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default)]
pub struct KeyEntryForm {
    text: String,
    error: Option<String>,
    submit_enabled: bool,
}

impl KeyEntryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn on_text_changed(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.error = None;
        self.submit_enabled = !self.text.trim().is_empty();
    }

    /// Decode the entered key, setting the field error on failure
    ///
    /// Submit stays disabled until the text changes again.
    pub fn submit(&mut self) -> Result<RecoveryKey, EntryError> {
        if !self.submit_enabled {
            return Err(EntryError::Empty);
        }
        self.submit_enabled = false;
        match RecoveryKey::decode(&self.text) {
            Ok(key) => {
                debug!("Recovery key accepted");
                Ok(key)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Replace the field with the contents of a key file
    pub fn import_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EntryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            warn!("Cannot import recovery key from {:?}: {}", path, e);
            e
        })?;
        self.on_text_changed(content.trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_key() -> RecoveryKey {
        RecoveryKey::from_bytes([42u8; 32])
    }

    #[test]
    fn test_submit_enabled_only_for_non_blank_text() {
        let mut form = KeyEntryForm::new();
        assert!(!form.submit_enabled());

        form.on_text_changed("   ");
        assert!(!form.submit_enabled());
        assert!(matches!(form.submit(), Err(EntryError::Empty)));

        form.on_text_changed("Es");
        assert!(form.submit_enabled());
    }

    #[test]
    fn test_invalid_key_sets_error_until_text_changes() {
        let mut form = KeyEntryForm::new();
        form.on_text_changed("EsTc not a key");
        assert!(form.submit().is_err());
        assert!(form.error().is_some());

        form.on_text_changed(valid_key().encode());
        assert!(form.error().is_none());
        assert_eq!(form.submit().unwrap(), valid_key());
    }

    #[test]
    fn test_submit_disabled_until_text_changes() {
        let mut form = KeyEntryForm::new();
        form.on_text_changed(valid_key().encode());
        assert_eq!(form.submit().unwrap(), valid_key());

        assert!(!form.submit_enabled());
        assert!(matches!(form.submit(), Err(EntryError::Empty)));

        form.on_text_changed(valid_key().encode());
        assert!(form.submit_enabled());
        assert_eq!(form.submit().unwrap(), valid_key());
    }

    #[test]
    fn test_failed_submit_also_disables_submit() {
        let mut form = KeyEntryForm::new();
        form.on_text_changed("EsTc not a key");
        assert!(matches!(form.submit(), Err(EntryError::InvalidKey(_))));
        assert!(!form.submit_enabled());
        assert!(matches!(form.submit(), Err(EntryError::Empty)));
        assert!(form.error().is_some());
    }

    #[test]
    fn test_import_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", valid_key().encode()).unwrap();

        let mut form = KeyEntryForm::new();
        form.on_text_changed("garbage");
        let _ = form.submit();
        form.import_from_file(file.path()).unwrap();

        assert!(form.error().is_none());
        assert!(form.submit_enabled());
        assert_eq!(form.submit().unwrap(), valid_key());
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = KeyEntryForm::new();
        let err = form.import_from_file(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, EntryError::Io(_)));
        assert_eq!(form.text(), "");
    }
}
