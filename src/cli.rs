use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Files or directories to collect tests from
    pub files: Vec<String>,

    /// Show results as an indented tree of nested scopes
    #[arg(long, short)]
    pub verbose: bool,

    /// Only collect tests, don't execute them
    #[arg(long)]
    pub collect_only: bool,

    /// Leave files matching pytest's own test file patterns to pytest
    #[arg(long)]
    pub skip_host_test_files: bool,

    /// Package manager to use (e.g., 'uv', 'pipenv', 'poetry')
    #[arg(long, default_value = "python")]
    pub package_manager: String,

    /// Environment variable to set for pytest (e.g., 'KEY=VALUE'), repeatable
    #[arg(long, short, num_args = 1)]
    pub env: Vec<String>,

    /// Columns per nesting level in verbose output
    #[arg(long)]
    pub indent: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Arguments to pass directly to pytest
    #[arg(last = true)]
    pub pytest_args: Vec<String>,
}
