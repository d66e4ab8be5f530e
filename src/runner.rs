//! Host engine command selection.

use log::{info, warn};
use std::process::Command;

pub struct PytestRunner {
    pub program: String,
    pub initial_args: Vec<String>,
    pub env_vars: Vec<(String, String)>,
}

impl PytestRunner {
    pub fn new(package_manager: String, env_vars: Vec<String>) -> Self {
        let mut program = "python3".to_string();
        let mut initial_args = vec!["-m".to_string(), "pytest".to_string()];

        match package_manager.as_str() {
            "uv" | "pipenv" | "poetry" => {
                program = package_manager.clone();
                initial_args = vec![
                    "run".to_string(),
                    "python".to_string(),
                    "-m".to_string(),
                    "pytest".to_string(),
                ];
            }
            _ => {}
        }

        let env_vars = env_vars
            .iter()
            .filter_map(|env_var| match env_var.split_once('=') {
                Some((key, value)) if !key.is_empty() => Some((key.to_string(), value.to_string())),
                _ => {
                    warn!("ignoring malformed environment variable {env_var:?}, expected KEY=VALUE");
                    None
                }
            })
            .collect();

        info!("Pytest command: {} {}", program, initial_args.join(" "));

        PytestRunner {
            program,
            initial_args,
            env_vars,
        }
    }

    /// Command running the host engine, before any per-run arguments
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.initial_args);
        cmd.envs(self.env_vars.iter().map(|(k, v)| (k, v)));
        cmd
    }
}
