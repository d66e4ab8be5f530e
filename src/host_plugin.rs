//! Runtime side of nested scope inheritance.
//!
//! The host engine builds plain Python instances of each test class, so a
//! nested class never sees what its enclosing classes define. The merge
//! resolved at collection time is written out as a JSON payload next to a
//! small pytest plugin; the plugin binds the inherited names onto each test
//! instance and runs the scope's `setup`/`teardown` around the test.

use crate::collection::{ScopeKind, ScopeNode, ScopeTree};
use crate::python_discovery::pattern::{SETUP, TEARDOWN};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use thiserror::Error;

/// Import name of the plugin, as passed to `-p`
pub const PLUGIN_MODULE: &str = "relaxed_host";
/// Environment variable naming the payload file
pub const PAYLOAD_ENV: &str = "RELAXED_HOST_SCOPES";
pub const PLUGIN_SOURCE: &str = include_str!("host_plugin/relaxed_host.py");

const PAYLOAD_FILE: &str = "scopes.json";
const PYTHONPATH: &str = "PYTHONPATH";

#[derive(Debug, Error)]
pub enum HostPluginError {
    #[error("failed to write host plugin: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode scope payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("cannot add host plugin to PYTHONPATH: {0}")]
    PythonPath(#[from] env::JoinPathsError),
}

/// Every class scope of a run, keyed by node id
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct HostPayload {
    pub scopes: BTreeMap<String, ScopePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopePayload {
    /// Class names from the module down to this scope
    pub path: Vec<String>,
    pub inherited: Vec<InheritedName>,
    pub setup: bool,
    pub teardown: bool,
}

/// A name visible in a scope only through an enclosing class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritedName {
    pub name: String,
    /// Path of the class defining it
    pub owner: Vec<String>,
}

pub fn build_payload(modules: &[ScopeTree]) -> HostPayload {
    let mut payload = HostPayload::default();
    for tree in modules {
        for node in tree.nodes().filter(|node| node.kind == ScopeKind::Class) {
            payload
                .scopes
                .insert(node.nodeid.clone(), scope_payload(tree, node));
        }
    }
    payload
}

fn scope_payload(tree: &ScopeTree, node: &ScopeNode) -> ScopePayload {
    let classes: Vec<&ScopeNode> = tree
        .ancestors(node.id)
        .filter(|ancestor| ancestor.kind == ScopeKind::Class)
        .collect();

    let inherited = node
        .effective_members
        .iter()
        .filter(|(name, _)| !node.raw_members.contains(name))
        .filter_map(|(name, _)| {
            let owner = classes
                .iter()
                .find(|class| class.raw_members.contains(name))?;
            Some(InheritedName {
                name: name.to_string(),
                owner: class_path(tree, owner),
            })
        })
        .collect();

    let defines = |name: &str| {
        node.effective_members
            .get(name)
            .is_some_and(|value| value.is_callable())
    };

    ScopePayload {
        path: class_path(tree, node),
        inherited,
        setup: defines(SETUP),
        teardown: defines(TEARDOWN),
    }
}

fn class_path(tree: &ScopeTree, node: &ScopeNode) -> Vec<String> {
    let mut path: Vec<String> = tree
        .ancestors(node.id)
        .filter(|ancestor| ancestor.kind == ScopeKind::Class)
        .map(|ancestor| ancestor.name.clone())
        .collect();
    path.reverse();
    path.push(node.name.clone());
    path
}

/// The plugin and its payload, written out for one run. Both files are
/// removed when this is dropped.
pub struct HostPlugin {
    dir: TempDir,
}

impl HostPlugin {
    pub fn install(payload: &HostPayload) -> Result<Self, HostPluginError> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(format!("{PLUGIN_MODULE}.py")),
            PLUGIN_SOURCE,
        )?;
        fs::write(
            dir.path().join(PAYLOAD_FILE),
            serde_json::to_vec(payload)?,
        )?;
        debug!(
            "installed host plugin with {} scopes in {}",
            payload.scopes.len(),
            dir.path().display()
        );
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn payload_path(&self) -> PathBuf {
        self.dir.path().join(PAYLOAD_FILE)
    }

    /// Load the plugin into a host command
    pub fn configure(&self, cmd: &mut Command) -> Result<(), HostPluginError> {
        // Older hosts call a plain `setup` themselves through the nose plugin
        cmd.args(["-p", PLUGIN_MODULE, "-p", "no:nose"]);

        let existing = cmd
            .get_envs()
            .find(|(key, _)| *key == PYTHONPATH)
            .and_then(|(_, value)| value.map(OsString::from))
            .or_else(|| env::var_os(PYTHONPATH));
        let mut paths = vec![self.dir().to_path_buf()];
        if let Some(existing) = existing {
            paths.extend(env::split_paths(&existing));
        }
        cmd.env(PYTHONPATH, env::join_paths(paths)?);
        cmd.env(PAYLOAD_ENV, self.payload_path());
        Ok(())
    }
}
