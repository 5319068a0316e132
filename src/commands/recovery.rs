//! Recovery key command

use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::debug;

use crate::recovery::{EntryError, KeyEntryForm};

/// Handle `recovery-key [KEY] [--file PATH]`
pub fn handle(key: Option<String>, file: Option<PathBuf>) -> Result<(), EntryError> {
    let mut form = KeyEntryForm::new();

    match (key, file) {
        (_, Some(path)) => {
            form.import_from_file(&path)?;
            debug!("Imported {} characters from {:?}", form.text().len(), path);
        }
        (Some(text), None) => form.on_text_changed(text),
        (None, None) => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            while !form.submit_enabled() {
                println!("Enter your recovery key:");
                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    return Err(EntryError::Empty);
                }
                form.on_text_changed(line.trim_end());
            }
        }
    }

    match form.submit() {
        Ok(key) => {
            println!("✅ Recovery key is valid: {}", key.encode());
            Ok(())
        }
        Err(e) => {
            if let Some(message) = form.error() {
                println!("❌ {}", message);
            }
            Err(e)
        }
    }
}
