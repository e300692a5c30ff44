//! per document result directory
//!
//! `api.md` writes into `.result/api/` next to it. A previous result is kept by renaming it to the
//! first free `.result/api_<n>/`.
use crate::context::ResolvedContext;
use crate::document::{document_dir, Document};
use std::path::{Path, PathBuf};

pub const RESULT_FOLDER: &str = ".result";
pub const VARS_FILE: &str = ".vars";

#[derive(Debug, Clone, PartialEq)]
pub struct ResultDir {
    /// Directory of the document
    pub current_dir: PathBuf,
    /// Document file name without extension
    pub current_file: String,
    pub path: PathBuf,
}

impl ResultDir {
    pub fn for_document(document_path: &Path) -> Self {
        let current_dir = document_dir(document_path).to_path_buf();
        let current_file = document_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = current_dir.join(RESULT_FOLDER).join(&current_file);

        Self {
            current_dir,
            current_file,
            path,
        }
    }

    /// Context holding `CURDIR`, `CURFILE` and `RESULTDIR`
    pub fn seed(&self) -> ResolvedContext {
        ResolvedContext::seeded(
            &self.current_dir.to_string_lossy(),
            &self.current_file,
            &self.path.to_string_lossy(),
        )
    }

    /// Move a previous result aside and create an empty result directory
    pub fn prepare(&self) -> std::io::Result<()> {
        if self.path.exists() {
            let parent = self.current_dir.join(RESULT_FOLDER);
            let mut counter = 1;
            let backup = loop {
                let candidate = parent.join(format!("{}_{counter}", self.current_file));
                if !candidate.exists() {
                    break candidate;
                }
                counter += 1;
            };

            tracing::info!(from = %self.path.display(), to = %backup.display(), "keeping previous result");
            std::fs::rename(&self.path, &backup)?;
        }

        std::fs::create_dir_all(&self.path)
    }

    /// Store the resolved context as json
    pub fn write_vars(&self, context: &ResolvedContext) -> std::io::Result<()> {
        let file = std::fs::File::create(self.path.join(VARS_FILE))?;
        serde_json::to_writer_pretty(file, context)?;
        Ok(())
    }

    /// One file per after variable, named after it
    pub fn write_after(&self, document: &Document, context: &ResolvedContext) -> std::io::Result<()> {
        for component in &document.after_variables {
            let value = context.get(&component.name).unwrap_or_default();
            std::fs::write(self.path.join(&component.name), value)?;
        }
        Ok(())
    }
}
