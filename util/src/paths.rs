use std::path::{Path, PathBuf};

/// `<corpus_root>/<assignment_id>/`
pub fn assignment_dir(corpus_root: &Path, assignment_id: &str) -> PathBuf {
    corpus_root.join(assignment_id)
}

/// `<corpus_root>/<assignment_id>/<exercise_id>/`
pub fn exercise_dir(corpus_root: &Path, assignment_id: &str, exercise_id: &str) -> PathBuf {
    assignment_dir(corpus_root, assignment_id).join(exercise_id)
}

/// The staged submission file for an exercise: `submission.<ext>`.
pub fn submission_path(exercise_dir: &Path, file_extension: &str) -> PathBuf {
    exercise_dir.join(format!("submission.{file_extension}"))
}

/// The staged submission-as-string-literal file: `submission_source.<ext>`.
pub fn submission_source_path(exercise_dir: &Path, file_extension: &str) -> PathBuf {
    exercise_dir.join(format!("submission_source.{file_extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_two_level_layout() {
        let root = Path::new("/corpus");
        assert_eq!(
            exercise_dir(root, "hw1", "ex1"),
            PathBuf::from("/corpus/hw1/ex1")
        );
        assert_eq!(
            submission_path(Path::new("/corpus/hw1/ex1"), "py"),
            PathBuf::from("/corpus/hw1/ex1/submission.py")
        );
    }
}
