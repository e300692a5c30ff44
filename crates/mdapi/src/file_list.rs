//! materialize `file_list` / `abs_file_list` declarations into `list` declarations
use crate::document::{ComponentKind, TypedComponent, Value};
use std::path::{Path, PathBuf};

/// Rewrite every file list component as a list of the referenced file's lines
///
/// `file_list` paths are relative to `base_dir`, `abs_file_list` paths are used as they are.
/// All other components pass through unchanged.
pub fn expand(
    components: Vec<TypedComponent>,
    base_dir: &Path,
) -> Result<Vec<TypedComponent>, FileListError> {
    components
        .into_iter()
        .map(|component| {
            let path = match component.kind {
                ComponentKind::FileList => base_dir.join(component.first_content()),
                ComponentKind::AbsoluteFileList => PathBuf::from(component.first_content()),
                _ => return Ok(component),
            };

            let values = read_lines(&path)?
                .into_iter()
                .map(Value::text)
                .collect::<Vec<_>>();
            tracing::debug!(name = %component.name, path = %path.display(), values = values.len(), "file list expanded");

            Ok(TypedComponent {
                kind: ComponentKind::List,
                values,
                ..component
            })
        })
        .collect()
}

fn read_lines(path: &Path) -> Result<Vec<String>, FileListError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FileListError::MissingFile {
        path: path.to_owned(),
        source,
    })?;

    let contents = contents.trim();
    if contents.is_empty() {
        return Err(FileListError::EmptyFile {
            path: path.to_owned(),
        });
    }

    Ok(contents
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect())
}

#[derive(thiserror::Error, Debug)]
pub enum FileListError {
    #[error("Unable to read file list {}", path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File list {} is empty", path.display())]
    EmptyFile { path: PathBuf },
}
