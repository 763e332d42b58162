use crate::error::{ExtractorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// How `move_all` reacts when a single file cannot be moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Abort on the first failing file.
    #[default]
    Strict,
    /// Record the failure and keep moving the remaining files.
    BestEffort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Ascii,
}

impl TextEncoding {
    pub fn encode(&self, content: &str) -> std::result::Result<Vec<u8>, String> {
        match self {
            TextEncoding::Utf8 => Ok(content.as_bytes().to_vec()),
            TextEncoding::Utf16Le => Ok(content
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect()),
            TextEncoding::Ascii => match content.char_indices().find(|(_, c)| !c.is_ascii()) {
                Some((offset, c)) => Err(format!(
                    "character {:?} at byte {} cannot be encoded as ASCII",
                    c, offset
                )),
                None => Ok(content.as_bytes().to_vec()),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoveSummary {
    pub moved: Vec<PathBuf>,
    pub failures: Vec<String>,
}

impl MoveSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Filesystem operations used by the extraction pipeline.
///
/// Nothing here locks. Two extractions merging into overlapping directories
/// at the same time can delete each other's files; callers must serialize
/// runs that share an output directory.
pub trait FileHandler {
    /// Creates `path` unless a directory is already there. `mode` is applied
    /// to newly created directories on Unix.
    fn create_directory(&self, path: &Path, create_intermediates: bool, mode: Option<u32>)
        -> Result<()>;

    /// Moves every file below `from` (recursively) into the root of `to`,
    /// keyed by base name. An existing file with the same name is deleted
    /// first, then replaced.
    fn move_all(&self, from: &Path, to: &Path) -> Result<MoveSummary>;

    /// Removes a file, or a directory and everything in it.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Writes `content` to `path`. With `atomic` set the bytes go to a temporary
    /// file in the same directory which is then renamed over `path`.
    fn write_text(&self, content: &str, path: &Path, atomic: bool, encoding: TextEncoding)
        -> Result<()>;
}

pub struct FileOperations {
    merge_mode: MergeMode,
}

impl FileOperations {
    pub fn new() -> Self {
        Self {
            merge_mode: MergeMode::Strict,
        }
    }

    pub fn with_merge_mode(mut self, merge_mode: MergeMode) -> Self {
        self.merge_mode = merge_mode;
        self
    }

    fn move_file(&self, source: &Path, destination_root: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ExtractorError::InvalidPath {
                path: format!("No file name in {}", source.display()),
            })?;
        let destination = destination_root.join(file_name);

        // Explicit delete, then rename: overwrite-on-rename is not uniform across platforms
        if destination.symlink_metadata().is_ok() {
            self.remove(&destination)?;
        }

        fs::rename(source, &destination).map_err(|e| ExtractorError::Move {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;

        Ok(destination)
    }

    fn write_atomic(&self, bytes: &[u8], path: &Path) -> Result<()> {
        let write_error = |message: String| ExtractorError::Write {
            path: path.to_path_buf(),
            message,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp_file = NamedTempFile::new_in(parent)
            .map_err(|e| write_error(format!("cannot create temporary file: {}", e)))?;
        temp_file
            .write_all(bytes)
            .map_err(|e| write_error(e.to_string()))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| write_error(e.to_string()))?;

        // Dropping the temp file on any earlier error deletes it
        temp_file
            .persist(path)
            .map_err(|e| write_error(e.error.to_string()))?;

        Ok(())
    }
}

impl Default for FileOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler for FileOperations {
    fn create_directory(
        &self,
        path: &Path,
        create_intermediates: bool,
        mode: Option<u32>,
    ) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(create_intermediates);

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            if let Some(mode) = mode {
                builder.mode(mode);
            }
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder
            .create(path)
            .map_err(|e| ExtractorError::DirectoryCreation {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn move_all(&self, from: &Path, to: &Path) -> Result<MoveSummary> {
        if !from.is_dir() {
            return Err(ExtractorError::Enumeration {
                path: from.to_path_buf(),
                message: "not a readable directory".to_string(),
            });
        }

        // Enumerate everything before touching anything
        let entries = WalkDir::new(from)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ExtractorError::Enumeration {
                path: from.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut summary = MoveSummary::default();

        for entry in entries.iter().filter(|e| !e.file_type().is_dir()) {
            match self.move_file(entry.path(), to) {
                Ok(destination) => summary.moved.push(destination),
                Err(e) => match self.merge_mode {
                    MergeMode::Strict => return Err(e),
                    MergeMode::BestEffort => summary.failures.push(e.to_string()),
                },
            }
        }

        Ok(summary)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let removal_error = |e| ExtractorError::Removal {
            path: path.to_path_buf(),
            source: e,
        };

        let metadata = fs::symlink_metadata(path).map_err(removal_error)?;
        if metadata.is_dir() {
            fs::remove_dir_all(path).map_err(removal_error)
        } else {
            fs::remove_file(path).map_err(removal_error)
        }
    }

    fn write_text(
        &self,
        content: &str,
        path: &Path,
        atomic: bool,
        encoding: TextEncoding,
    ) -> Result<()> {
        // Encode up front so an encoding failure never touches the destination
        let bytes = encoding
            .encode(content)
            .map_err(|message| ExtractorError::Write {
                path: path.to_path_buf(),
                message,
            })?;

        if atomic {
            self.write_atomic(&bytes, path)
        } else {
            fs::write(path, bytes).map_err(|e| ExtractorError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_create_directory_with_intermediates() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a").join("b").join("c");

        FileOperations::new()
            .create_directory(&target, true, None)
            .unwrap();

        assert!(target.is_dir());
    }

    #[test]
    fn test_create_existing_directory_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out");
        fs::create_dir(&target).unwrap();
        write(&target.join("keep.txt"), "keep");

        FileOperations::new()
            .create_directory(&target, false, None)
            .unwrap();

        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "keep");
    }

    #[test]
    fn test_create_directory_without_intermediates_fails() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("missing").join("out");

        let result = FileOperations::new().create_directory(&target, false, None);
        assert!(matches!(result, Err(ExtractorError::DirectoryCreation { .. })));
    }

    #[test]
    fn test_create_directory_over_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        write(&blocker, "not a directory");

        let operations = FileOperations::new();
        assert!(matches!(
            operations.create_directory(&blocker, true, None),
            Err(ExtractorError::DirectoryCreation { .. })
        ));
        assert!(matches!(
            operations.create_directory(&blocker.join("nested"), true, None),
            Err(ExtractorError::DirectoryCreation { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_create_directory_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("private");

        FileOperations::new()
            .create_directory(&target, true, Some(0o700))
            .unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_move_all_flattens_tree() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        write(&source.path().join("top.txt"), "top");
        write(&source.path().join("nested").join("deep").join("inner.log"), "inner");

        let summary = FileOperations::new()
            .move_all(source.path(), destination.path())
            .unwrap();

        assert_eq!(summary.moved.len(), 2);
        assert!(summary.is_complete());
        assert_eq!(
            fs::read_to_string(destination.path().join("top.txt")).unwrap(),
            "top"
        );
        assert_eq!(
            fs::read_to_string(destination.path().join("inner.log")).unwrap(),
            "inner"
        );
        assert!(!source.path().join("top.txt").exists());
        assert!(!source.path().join("nested").join("deep").join("inner.log").exists());
    }

    #[test]
    fn test_move_all_replaces_existing_file() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        write(&source.path().join("build.log"), "new");
        write(&destination.path().join("build.log"), "old content that is much longer");

        FileOperations::new()
            .move_all(source.path(), destination.path())
            .unwrap();

        assert_eq!(
            fs::read_to_string(destination.path().join("build.log")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_move_all_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("dest");
        fs::create_dir(&destination).unwrap();

        let result = FileOperations::new()
            .move_all(&temp_dir.path().join("missing"), &destination);

        assert!(matches!(result, Err(ExtractorError::Enumeration { .. })));
        assert_eq!(fs::read_dir(&destination).unwrap().count(), 0);
    }

    #[test]
    fn test_move_all_strict_stops_on_first_failure() {
        let source = TempDir::new().unwrap();
        let temp_dir = TempDir::new().unwrap();
        write(&source.path().join("a.txt"), "a");
        write(&source.path().join("b.txt"), "b");

        // Destination does not exist, so the first rename fails
        let destination = temp_dir.path().join("missing");
        let result = FileOperations::new().move_all(source.path(), &destination);

        assert!(matches!(result, Err(ExtractorError::Move { .. })));
        assert!(source.path().join("a.txt").exists());
        assert!(source.path().join("b.txt").exists());
    }

    #[test]
    fn test_move_all_best_effort_collects_failures() {
        let source = TempDir::new().unwrap();
        let temp_dir = TempDir::new().unwrap();
        write(&source.path().join("a.txt"), "a");
        write(&source.path().join("b.txt"), "b");

        let destination = temp_dir.path().join("missing");
        let summary = FileOperations::new()
            .with_merge_mode(MergeMode::BestEffort)
            .move_all(source.path(), &destination)
            .unwrap();

        assert!(summary.moved.is_empty());
        assert_eq!(summary.failures.len(), 2);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_remove_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        let dir = temp_dir.path().join("dir");
        write(&file, "x");
        write(&dir.join("sub").join("inner.txt"), "y");

        let operations = FileOperations::new();
        operations.remove(&file).unwrap();
        operations.remove(&dir).unwrap();

        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_remove_missing_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileOperations::new().remove(&temp_dir.path().join("nothing"));
        assert!(matches!(result, Err(ExtractorError::Removal { .. })));
    }

    #[test]
    fn test_write_text_atomic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("graph.txt");
        write(&path, "previous");

        FileOperations::new()
            .write_text("* raw\n", &path, true, TextEncoding::Utf8)
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "* raw\n");
        // Only the destination remains, no stray temporary file
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_text_encoding_failure_keeps_previous_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        write(&path, "previous");

        let result =
            FileOperations::new().write_text("caf\u{e9}", &path, true, TextEncoding::Ascii);

        assert!(matches!(result, Err(ExtractorError::Write { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn test_write_text_atomic_failure_leaves_destination_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("graph.txt");

        let result = FileOperations::new().write_text("data", &path, true, TextEncoding::Utf8);

        assert!(matches!(result, Err(ExtractorError::Write { .. })));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_text_atomic_failure_keeps_previous_content() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        let path = locked.join("graph.txt");
        write(&path, "previous");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users ignore directory modes
        if fs::File::create(locked.join("access-check")).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = FileOperations::new().write_text("* raw\n", &path, true, TextEncoding::Utf8);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(ExtractorError::Write { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
        assert_eq!(fs::read_dir(&locked).unwrap().count(), 1);
    }

    #[test]
    fn test_write_text_utf16() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wide.txt");

        FileOperations::new()
            .write_text("ok", &path, false, TextEncoding::Utf16Le)
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![b'o', 0, b'k', 0]);
    }
}
