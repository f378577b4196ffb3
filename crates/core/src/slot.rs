//! Named persisted slots for the dashboard mirror.
//!
//! A slot holds one JSON document and is always written as a full replacement. File slots live
//! at `<data_dir>/<name>.json` and are replaced atomically (temporary file, then rename) so a
//! crash never leaves a half-written roster behind.

use crate::{SlotError, SlotResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Storage for a single named document.
pub trait SlotStore: Send {
    /// Returns the stored document, or `None` if nothing has been written yet.
    fn load(&self) -> SlotResult<Option<String>>;

    /// Replaces the stored document.
    fn save(&mut self, contents: &str) -> SlotResult<()>;
}

#[derive(Clone, Debug)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(data_dir: &Path, name: &str) -> Self {
        Self {
            path: data_dir.join(format!("{name}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlotStore for FileSlot {
    fn load(&self) -> SlotResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SlotError::FileRead(e)),
        }
    }

    fn save(&mut self, contents: &str) -> SlotResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(SlotError::DirCreation)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(SlotError::FileWrite)?;
        fs::rename(&tmp, &self.path).map_err(SlotError::FileWrite)
    }
}

/// Slot held in memory only; contents are lost with the process.
#[derive(Clone, Debug, Default)]
pub struct MemorySlot {
    contents: Option<String>,
}

impl MemorySlot {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl SlotStore for MemorySlot {
    fn load(&self) -> SlotResult<Option<String>> {
        Ok(self.contents.clone())
    }

    fn save(&mut self, contents: &str) -> SlotResult<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}
