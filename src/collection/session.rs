//! Session-based collection implementation.
//!
//! This module implements the file-level half of collection:
//! - Resolving the paths to collect
//! - Directory traversal and file acceptance
//! - Parsing and resolving accepted modules

use super::error::{CollectionError, CollectionResult, CollectionWarning};
use super::nodes::ScopeTree;
use super::types::{Collector, Directory, Module};
use crate::config::RelaxedConfig;
use crate::python_discovery::{discover_scopes, path_to_module_path};
use glob::Pattern;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const CONFTEST: &str = "conftest.py";
const PYCACHE: &str = "__pycache__";

/// What collecting a single node produced
#[derive(Debug)]
pub enum Collected {
    /// Entries of a directory, in name order
    Children(Vec<Collector>),
    /// The resolved scopes of a module
    Module(ScopeTree),
}

/// Paths resolved from the command line and configuration
#[derive(Debug, Default)]
pub struct PathCollection {
    pub collectors: Vec<Collector>,
    pub errors: Vec<(PathBuf, CollectionError)>,
    pub warnings: Vec<CollectionWarning>,
}

/// Root of the collection tree
#[derive(Debug)]
pub struct Session {
    pub rootpath: PathBuf,
    pub config: RelaxedConfig,
    ignore: Vec<Pattern>,
    host_test_files: Vec<Pattern>,
}

impl Session {
    pub fn new(rootpath: PathBuf, config: RelaxedConfig) -> CollectionResult<Self> {
        let compile = |patterns: &[String]| -> CollectionResult<Vec<Pattern>> {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern).map_err(|e| CollectionError::ConfigError {
                        path: rootpath.clone(),
                        message: format!("invalid pattern {pattern:?}: {e}"),
                    })
                })
                .collect()
        };
        let ignore = compile(&config.ignore)?;
        let host_test_files = compile(&config.host_test_files)?;

        Ok(Self {
            rootpath,
            config,
            ignore,
            host_test_files,
        })
    }

    pub fn perform_collect(&self, args: &[String]) -> PathCollection {
        let mut collection = PathCollection::default();

        for path in self.resolve_paths(args) {
            if !path.exists() {
                let error = std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("file or directory not found: {}", path.display()),
                );
                collection.errors.push((path, error.into()));
            } else if path.is_dir() {
                // Explicit directories skip the naming rules but not ignore globs
                if self.is_ignored(&path) {
                    debug!("ignoring {}", path.display());
                    continue;
                }
                collection
                    .collectors
                    .push(Collector::Directory(Directory::new(&path, &self.rootpath)));
            } else if self.should_collect_file(&path) {
                collection
                    .collectors
                    .push(Collector::Module(Module::new(&path, &self.rootpath)));
            } else {
                warn!("{} is not a collectable module", path.display());
                collection.warnings.push(CollectionWarning::NotCollectable {
                    path,
                    reason: "not a relaxed test module".into(),
                });
            }
        }

        collection
    }

    fn resolve_paths(&self, args: &[String]) -> Vec<PathBuf> {
        let relative = |arg: &String| {
            let path = PathBuf::from(arg);
            if path.is_absolute() {
                path
            } else {
                self.rootpath.join(path)
            }
        };

        if !args.is_empty() {
            args.iter().map(relative).collect()
        } else if !self.config.testpaths.is_empty() {
            self.config.testpaths.iter().map(relative).collect()
        } else {
            vec![self.rootpath.clone()]
        }
    }

    /// Whether `path` is a module this crate collects.
    ///
    /// Accepts `.py` files not starting with `_` other than `conftest.py`.
    /// With `skip_host_test_files` on, files matching the host's own test file
    /// patterns are left to the host.
    pub fn should_collect_file(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !filename.ends_with(".py") || filename.starts_with('_') || filename == CONFTEST {
            return false;
        }
        if self.config.skip_host_test_files
            && self.host_test_files.iter().any(|p| p.matches(filename))
        {
            return false;
        }
        !self.is_ignored(path)
    }

    /// Whether traversal should skip the directory at `path`
    pub fn should_ignore_dir(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if path != self.rootpath && (name.starts_with('_') || name.starts_with('.') || name == PYCACHE)
        {
            return true;
        }
        self.is_ignored(path)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let relative = relative_nodeid(path, &self.rootpath);
        self.ignore
            .iter()
            .any(|pattern| pattern.matches(name) || pattern.matches(&relative))
    }

    pub fn collect_node(&self, node: &Collector) -> CollectionResult<Collected> {
        match node {
            Collector::Directory(d) => self.collect_directory(d).map(Collected::Children),
            Collector::Module(m) => self.collect_module(m).map(Collected::Module),
        }
    }

    fn collect_directory(&self, dir: &Directory) -> CollectionResult<Vec<Collector>> {
        let mut children = Vec::new();

        for entry in WalkDir::new(&dir.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    {
                        warn!("permission denied below {}", dir.path.display());
                        continue;
                    }
                    return Err(err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory loop"))
                        .into());
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                if !self.should_ignore_dir(path) {
                    children.push(Collector::Directory(Directory::new(path, &self.rootpath)));
                }
            } else if self.should_collect_file(path) {
                children.push(Collector::Module(Module::new(path, &self.rootpath)));
            }
        }

        Ok(children)
    }

    fn collect_module(&self, module: &Module) -> CollectionResult<ScopeTree> {
        debug!("collecting {}", module.nodeid);
        let source = std::fs::read_to_string(&module.path)?;
        discover_scopes(&module.path, &module.nodeid, &module.name, &source)
    }
}

/// Node id of `path`: its path relative to the root, `/`-separated
pub fn relative_nodeid(path: &Path, rootpath: &Path) -> String {
    path.strip_prefix(rootpath)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl Directory {
    fn new(path: &Path, rootpath: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            nodeid: relative_nodeid(path, rootpath),
        }
    }
}

impl Module {
    fn new(path: &Path, rootpath: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            nodeid: relative_nodeid(path, rootpath),
            name: path_to_module_path(path, rootpath).join("."),
        }
    }
}
