//! htmlp CLI
//!
//! Usage:
//!   htmlp [OPTIONS] <INPUT>...
//!
//! Options:
//!   -o, --output-file <FILE>  Write the output here instead of stdout
//!   -w, --watch [<DIR>]       Recompile when files under DIR change
//!   -m, --minify              Minify the output
//!   -I, --include-dir <DIR>   Component include directory
//!   -c, --config <FILE>       Project config (TOML format)
//!   --styles-out <FILE>       Write the bundled component stylesheets here
//!   -v, --verbose             More logging (repeatable)
//!   -h, --help                Print help

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use htmlp::config::DEFAULT_CONFIG_FILE;
use htmlp::watch::Watcher;
use htmlp::{CompileConfig, ProjectConfig, Session};

#[derive(Parser)]
#[command(name = "htmlp")]
#[command(about = "Compile HTML components into plain HTML")]
struct Cli {
    /// Input files, compiled in order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (writes to stdout if not provided)
    #[arg(short, long)]
    output_file: Option<PathBuf>,

    /// Watch a directory and recompile on changes
    #[arg(short, long, num_args = 0..=1, default_missing_value = ".")]
    watch: Option<PathBuf>,

    /// Minify the output
    #[arg(short, long)]
    minify: bool,

    /// Directory import paths are relative to
    #[arg(short = 'I', long)]
    include_dir: Option<PathBuf>,

    /// Project config file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the bundled component stylesheets to this file
    #[arg(long)]
    styles_out: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Settings for one invocation, after merging the config file with the flags
struct Options {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    styles_output: Option<PathBuf>,
    watch: Option<PathBuf>,
    compile: CompileConfig,
}

impl Options {
    fn merge(cli: Cli, project: ProjectConfig) -> Self {
        let include_dir = cli
            .include_dir
            .or(project.include_dir)
            .unwrap_or_else(|| PathBuf::from("./"));
        Self {
            inputs: cli.inputs,
            output: cli.output_file.or(project.output),
            styles_output: cli.styles_out.or(project.styles_output),
            watch: cli.watch.or(project.watch),
            compile: CompileConfig::new()
                .with_include_dir(include_dir)
                .with_minify(cli.minify || project.minify),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let project = match load_project_config(cli.config.as_deref()) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let options = Options::merge(cli, project);
    let mut session = Session::new(options.compile.clone());

    match &options.watch {
        Some(dir) => watch(&mut session, &options, dir),
        None => {
            if !run(&mut session, &options) {
                std::process::exit(1);
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_project_config(path: Option<&Path>) -> Result<ProjectConfig, String> {
    match path {
        Some(path) => ProjectConfig::from_file(path)
            .map_err(|e| format!("loading config '{}': {}", path.display(), e)),
        None => ProjectConfig::load_default(Path::new("."))
            .map_err(|e| format!("loading config '{}': {}", DEFAULT_CONFIG_FILE, e)),
    }
}

/// Compile every input from scratch and write the results
///
/// Returns `false` if anything failed; the failure has been reported.
fn run(session: &mut Session, options: &Options) -> bool {
    session.reset();

    let mut outputs = Vec::with_capacity(options.inputs.len());
    for input in &options.inputs {
        match session.compile_file(input) {
            Ok(html) => outputs.push(html),
            Err(e) => {
                eprintln!("{}", e.report());
                return false;
            }
        }
    }
    let html = outputs.join("\n");

    match &options.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &html) {
                eprintln!("Error writing file '{}': {}", path.display(), e);
                return false;
            }
            info!(path = %path.display(), "Wrote output");
        }
        None => println!("{}", html),
    }

    if let Some(path) = &options.styles_output {
        if let Err(e) = fs::write(path, session.bundle_stylesheets()) {
            eprintln!("Error writing file '{}': {}", path.display(), e);
            return false;
        }
        info!(path = %path.display(), "Wrote stylesheet bundle");
    }

    true
}

/// Recompile whenever a file under `dir` changes; never returns
fn watch(session: &mut Session, options: &Options, dir: &Path) {
    let mut watcher = Watcher::new(dir);
    for path in options.output.iter().chain(&options.styles_output) {
        watcher = watcher.ignore(path);
    }
    info!(dir = %watcher.root().display(), "Watching for changes");

    run(session, options);
    loop {
        let changed = watcher.wait_for_change();
        info!(files = changed.len(), "Recompiling");
        if !run(session, options) {
            error!("Compilation failed, waiting for the next change");
        }
    }
}
