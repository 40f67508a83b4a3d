use std::path::{Path, PathBuf};

/// How per-submission scratch files are isolated within an exercise
/// directory. `Shared` is the default: submissions overwrite the same
/// on-disk files in the corpus directory, which is safe only when a single
/// worker process owns that corpus mount at a time. `Overlay` copies the
/// exercise directory into a fresh temp directory per grading call, trading
/// a copy for safety against concurrent writers sharing the same mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchMode {
    Shared,
    Overlay,
}

/// A prepared working directory for one exercise's test run. Holds the
/// `TempDir` guard alive for `Overlay` mode so it isn't cleaned up before
/// the sandbox runs finish.
pub struct ScratchDir {
    path: PathBuf,
    _overlay: Option<tempfile::TempDir>,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Prepares the working directory for `exercise_dir` per `mode`.
pub fn prepare(mode: ScratchMode, exercise_dir: &Path) -> std::io::Result<ScratchDir> {
    match mode {
        ScratchMode::Shared => Ok(ScratchDir {
            path: exercise_dir.to_path_buf(),
            _overlay: None,
        }),
        ScratchMode::Overlay => {
            let tmp = tempfile::tempdir()?;
            copy_dir_contents(exercise_dir, tmp.path())?;
            Ok(ScratchDir {
                path: tmp.path().to_path_buf(),
                _overlay: Some(tmp),
            })
        }
    }
}

fn copy_dir_contents(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            std::fs::copy(&path, dst.join(entry.file_name()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_mode_reuses_exercise_dir_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = prepare(ScratchMode::Shared, dir.path()).unwrap();
        assert_eq!(scratch.path(), dir.path());
    }

    #[test]
    fn overlay_mode_copies_files_into_a_fresh_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Add_test.py"), b"pass").unwrap();

        let scratch = prepare(ScratchMode::Overlay, dir.path()).unwrap();
        assert_ne!(scratch.path(), dir.path());
        assert!(scratch.path().join("Add_test.py").exists());
    }
}
