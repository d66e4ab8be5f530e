//! Integration between collection and pytest execution.

use crate::collection::error::{CollectionError, CollectionOutcome, CollectionWarning};
use crate::collection::instance::check_self_attributes;
use crate::collection::nodes::{ScopeEntry, ScopeTree};
use crate::collection::report::collect_one_node;
use crate::collection::session::{relative_nodeid, Collected, Session};
use crate::collection::types::{Collector, ScopeId};
use crate::config::RelaxedConfig;
use crate::reporter::stats::separator;
use crate::trap;
use log::debug;
use std::io::{self, Write};
use std::path::PathBuf;

/// Holds errors and warnings encountered during collection
#[derive(Debug, Default)]
pub struct CollectionErrors {
    pub errors: Vec<(String, CollectionError)>,
    pub warnings: Vec<CollectionWarning>,
}

/// Everything collection produced for a run
#[derive(Debug, Default)]
pub struct CollectedTests {
    /// Resolved modules, in collection order
    pub modules: Vec<ScopeTree>,
    pub errors: CollectionErrors,
}

impl CollectedTests {
    /// Node ids of every test, depth-first in declaration order
    pub fn test_node_ids(&self) -> Vec<String> {
        self.modules
            .iter()
            .flat_map(|tree| tree.leaves())
            .map(|leaf| leaf.qualified_id.clone())
            .collect()
    }
}

/// Run collection below `rootpath` and return the resolved modules
pub fn collect_tests_rust(
    rootpath: PathBuf,
    args: &[String],
    config: &RelaxedConfig,
) -> Result<CollectedTests, CollectionError> {
    let session = Session::new(rootpath, config.clone())?;
    let paths = session.perform_collect(args);

    let mut collected = CollectedTests::default();
    for (path, error) in paths.errors {
        let nodeid = relative_nodeid(&path, &session.rootpath);
        collected.errors.errors.push((nodeid, error));
    }
    collected.errors.warnings.extend(paths.warnings);

    for collector in &paths.collectors {
        collect_items_recursive(collector, &session, &mut collected);
    }

    debug!(
        "collected {} tests from {} modules",
        collected.test_node_ids().len(),
        collected.modules.len()
    );
    Ok(collected)
}

/// Recursively collect all modules below `collector`
fn collect_items_recursive(collector: &Collector, session: &Session, collected: &mut CollectedTests) {
    let report = collect_one_node(collector, session);
    match (report.outcome, report.result) {
        (CollectionOutcome::Passed, Some(Collected::Children(children))) => {
            for child in &children {
                collect_items_recursive(child, session, collected);
            }
        }
        (CollectionOutcome::Passed, Some(Collected::Module(tree))) => {
            collected
                .errors
                .warnings
                .extend(check_self_attributes(&tree));
            collected.modules.push(tree);
        }
        (_, _) => {
            if let Some(error) = report.error_type {
                collected.errors.errors.push((report.nodeid, error));
            }
        }
    }
}

/// Display collection results in a format similar to pytest
pub fn display_collection_results(
    test_nodes: &[String],
    errors: &CollectionErrors,
    colors: bool,
) -> io::Result<()> {
    let (red, bold_red, yellow, reset) = if colors {
        ("\x1b[31m", "\x1b[1;31m", "\x1b[33m", "\x1b[0m")
    } else {
        ("", "", "", "")
    };
    let mut out = trap::stdout();

    if !errors.errors.is_empty() {
        writeln!(out, "{}", separator('=', "ERRORS"))?;
        for (nodeid, error) in &errors.errors {
            let header = separator('_', &format!("ERROR collecting {nodeid}"));
            writeln!(out, "{bold_red}{header}{reset}")?;
            match error {
                CollectionError::ParseError(msg) => writeln!(out, "{red}E   {msg}{reset}")?,
                CollectionError::IoError(e) => writeln!(out, "{red}E   IO Error: {e}{reset}")?,
                CollectionError::ConfigError { .. } => {
                    writeln!(out, "{red}E   {error}{reset}")?
                }
            }
        }
        let count = errors.errors.len();
        writeln!(
            out,
            "{}",
            separator(
                '!',
                &format!("Interrupted: {count} error{} during collection", plural(count))
            )
        )?;
    }

    let item_count = test_nodes.len();
    let error_count = errors.errors.len();
    let warning_count = errors.warnings.len();

    if item_count == 0 && error_count == 0 {
        writeln!(out, "No tests collected.")?;
    } else {
        let mut summary_parts = Vec::new();
        summary_parts.push(format!("collected {item_count} item{}", plural(item_count)));
        if error_count > 0 {
            summary_parts.push(format!("{error_count} error{}", plural(error_count)));
        }
        if warning_count > 0 {
            summary_parts.push(format!("{warning_count} warning{}", plural(warning_count)));
        }
        writeln!(out, "{}", summary_parts.join(" / "))?;
    }

    if !errors.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", separator('=', "warnings summary"))?;
        for warning in &errors.warnings {
            writeln!(out, "{yellow}{warning}{reset}")?;
        }
    }

    Ok(())
}

/// Print the collected scopes as an indented tree, as `--collect-only` does
pub fn display_collection_tree(modules: &[ScopeTree], indent: &str) -> io::Result<()> {
    let mut out = trap::stdout();
    for tree in modules {
        if tree.leaves().is_empty() {
            continue;
        }
        writeln!(out, "<Module {}>", tree.root().nodeid)?;
        write_scope(&mut out, tree, tree.root().id, 1, indent)?;
    }
    Ok(())
}

fn write_scope(
    out: &mut impl Write,
    tree: &ScopeTree,
    scope: ScopeId,
    depth: usize,
    indent: &str,
) -> io::Result<()> {
    let node = tree.get(scope);
    let pad = indent.repeat(depth);
    for entry in &node.entries {
        match entry {
            ScopeEntry::Leaf(index) => writeln!(out, "{pad}<Function {}>", node.leaves[*index].name)?,
            ScopeEntry::Child(child) => {
                writeln!(out, "{pad}<Class {}>", tree.get(*child).name)?;
                write_scope(out, tree, *child, depth + 1, indent)?;
            }
        }
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trap::trap;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_collects_nested_directories_in_order() {
        let dir = project(&[
            ("b_module.py", "def second():\n    pass\n"),
            ("a_pkg/inner.py", "def first():\n    pass\n"),
            ("_private/hidden.py", "def hidden():\n    pass\n"),
        ]);

        let collected =
            collect_tests_rust(dir.path().to_path_buf(), &[], &RelaxedConfig::default()).unwrap();

        assert_eq!(
            collected.test_node_ids(),
            vec!["a_pkg/inner.py::first", "b_module.py::second"]
        );
        assert!(collected.errors.errors.is_empty());
    }

    #[test]
    fn test_parse_errors_do_not_stop_other_files() {
        let dir = project(&[
            ("broken.py", "def broken(:\n"),
            ("fine.py", "def works():\n    pass\n"),
        ]);

        let collected =
            collect_tests_rust(dir.path().to_path_buf(), &[], &RelaxedConfig::default()).unwrap();

        assert_eq!(collected.test_node_ids(), vec!["fine.py::works"]);
        assert_eq!(collected.errors.errors.len(), 1);
        assert_eq!(collected.errors.errors[0].0, "broken.py");
    }

    #[test]
    fn test_display_collection_results() {
        let errors = CollectionErrors {
            errors: vec![(
                "broken.py".into(),
                CollectionError::ParseError("Failed to parse broken.py".into()),
            )],
            warnings: vec![CollectionWarning::UnresolvedSelfAttribute {
                nodeid: "a.py::Outer::t".into(),
                attribute: "missing".into(),
                line: 3,
            }],
        };

        let trapped = trap(|| display_collection_results(&["a.py::Outer::t".into()], &errors, false));
        trapped.value.unwrap();

        assert!(trapped.stdout.contains("ERROR collecting broken.py"));
        assert!(trapped.stdout.contains("E   Failed to parse broken.py"));
        assert!(trapped.stdout.contains("Interrupted: 1 error during collection"));
        assert!(trapped
            .stdout
            .contains("collected 1 item / 1 error / 1 warning\n"));
        assert!(trapped.stdout.contains("a.py::Outer::t:3: reads self.missing"));
    }

    #[test]
    fn test_nothing_collected() {
        let trapped = trap(|| display_collection_results(&[], &CollectionErrors::default(), false));
        assert_eq!(trapped.stdout, "No tests collected.\n");
    }

    #[test]
    fn test_collection_tree() {
        let dir = project(&[(
            "behaviors.py",
            indoc! {r#"
                class Behaviors:
                    def behavior_one(self):
                        pass

                    class More:
                        def an_behavior(self):
                            pass

                def trailing():
                    pass
            "#},
        )]);
        let collected =
            collect_tests_rust(dir.path().to_path_buf(), &[], &RelaxedConfig::default()).unwrap();

        let trapped = trap(|| display_collection_tree(&collected.modules, "  "));
        trapped.value.unwrap();

        assert_eq!(
            trapped.stdout,
            indoc! {"
                <Module behaviors.py>
                  <Class Behaviors>
                    <Function behavior_one>
                    <Class More>
                      <Function an_behavior>
                  <Function trailing>
            "}
        );
    }
}
