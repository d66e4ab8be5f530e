//! Common test utilities and helpers.

use indoc::indoc;
use relaxed::collection_integration::{collect_tests_rust, CollectedTests};
use relaxed::config::RelaxedConfig;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary project with relaxed-style test modules.
///
/// Returns the directory handle (keep it alive for the test's duration) and
/// the project path inside it.
#[allow(dead_code)]
pub fn create_test_project() -> (TempDir, PathBuf) {
    let mut files = HashMap::new();
    files.insert(
        "behaviors.py",
        indoc! {r#"
            from os.path import join

            def module_level_behavior():
                pass

            def _helper():
                pass

            class Behaviors:
                def behavior_one(self):
                    pass

                def behavior_two(self):
                    pass

                class _Private:
                    def never_collected(self):
                        pass
        "#},
    );
    files.insert(
        "nested.py",
        indoc! {r#"
            class Outer:
                outer_data = 5

                def setup(self):
                    self.outer_attr = 1

                def _outer_helper(self):
                    return "outer"

                def outer_test(self):
                    assert self.outer_attr == 1

                class Inner:
                    def setup(self):
                        self.inner_attr = 2

                    def inner_test(self):
                        assert self._outer_helper() == "outer"
                        assert self.outer_data == 5
                        assert self.inner_attr == 2
        "#},
    );
    files.insert(
        "_support.py",
        indoc! {r#"
            def looks_like_a_test():
                pass
        "#},
    );
    create_test_project_with_files(files)
}

/// Creates a temporary directory holding the given files.
///
/// Keys are paths relative to the project root, values the file contents.
/// The project lives in a subdirectory so its own name never starts with a
/// dot.
#[allow(dead_code)]
pub fn create_test_project_with_files(files: HashMap<&str, &str>) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project_path = temp_dir.path().join("project");
    fs::create_dir_all(&project_path).expect("Failed to create project directory");

    for (file_path, content) in files {
        let full_path = project_path.join(file_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file {file_path}: {e}"));
    }

    (temp_dir, project_path)
}

/// Creates a test project with a single Python file
#[allow(dead_code)]
pub fn create_test_file(filename: &str, content: &str) -> (TempDir, PathBuf) {
    let mut files = HashMap::new();
    files.insert(filename, content);
    create_test_project_with_files(files)
}

/// Collects everything below `project_path` with default settings
#[allow(dead_code)]
pub fn collect(project_path: &PathBuf, files: &[&str]) -> CollectedTests {
    let args: Vec<String> = files.iter().map(|f| f.to_string()).collect();
    collect_tests_rust(project_path.clone(), &args, &RelaxedConfig::default())
        .expect("Collection should succeed")
}
