//! Relaxed test collection and hierarchical reporting for pytest.
//!
//! Python test modules are parsed statically. Every non-private function is a
//! test and every non-private class a scope, nested classes inherit the helpers
//! and data of the classes enclosing them, and results are shown as an
//! indented tree of those scopes.

pub mod cli;
pub mod collection;
pub mod collection_integration;
pub mod config;
pub mod fixtures;
pub mod host_plugin;
pub mod pytest_executor;
pub mod python_discovery;
pub mod raises;
pub mod reporter;
pub mod runner;
pub mod trap;

pub use collection_integration::{
    collect_tests_rust, display_collection_results, display_collection_tree, CollectedTests,
    CollectionErrors,
};
pub use fixtures::{environ, with_environ, Environ};
pub use pytest_executor::execute_tests;
pub use raises::{check_raises, raises, ExpectationFailed};
pub use runner::PytestRunner;
pub use trap::{trap, Trapped};

use cli::Args;
use config::read_config;
use host_plugin::{build_payload, HostPlugin};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

/// Collect, then run through pytest, returning the process exit code
pub fn run(args: Args, rootpath: PathBuf) -> anyhow::Result<i32> {
    let colors = !args.no_color && std::io::stdout().is_terminal();

    let collection = read_config(&rootpath).and_then(|mut config| {
        // Command line flags win over pyproject.toml
        config.skip_host_test_files |= args.skip_host_test_files;
        if let Some(indent) = args.indent {
            config.indent = indent;
        }
        let collected = collect_tests_rust(rootpath.clone(), &args.files, &config)?;
        Ok((config, collected))
    });

    let (config, collected) = match collection {
        Ok(collection) => collection,
        Err(error) => {
            let errors = CollectionErrors {
                errors: vec![(config::PYPROJECT.to_string(), error)],
                warnings: Vec::new(),
            };
            display_collection_results(&[], &errors, colors)?;
            return Ok(1);
        }
    };

    let test_nodes = collected.test_node_ids();
    display_collection_results(&test_nodes, &collected.errors, colors)?;

    // Exit early if there are collection errors to prevent test execution
    if !collected.errors.errors.is_empty() {
        return Ok(1);
    }

    if test_nodes.is_empty() {
        writeln!(trap::stdout(), "No tests found.")?;
        return Ok(0);
    }

    if args.collect_only {
        display_collection_tree(&collected.modules, &config.indent_unit())?;
        return Ok(0);
    }

    // Lives until the host exits; dropping it removes the plugin files
    let plugin = HostPlugin::install(&build_payload(&collected.modules))?;
    let runner = PytestRunner::new(args.package_manager, args.env);
    let mut printer =
        reporter::printer_for(args.verbose, trap::stdout(), &config.indent_unit(), colors);
    let exit_code = execute_tests(
        &runner,
        &test_nodes,
        &args.pytest_args,
        &rootpath,
        &plugin,
        printer.as_mut(),
    )?;

    Ok(exit_code)
}
