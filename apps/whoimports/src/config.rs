use anyhow::Result;
use clap::Parser;
use log::debug;
use std::{env, path::PathBuf};
use whoimports_core::{CollectorConfig, find_git_root};

#[derive(Debug, Clone, Parser)]
#[command(name = "whoimports")]
#[command(about = "Find the files that import a JavaScript/TypeScript file or directory")]
pub struct Config {
    /// File or directory whose importers to list
    pub target: PathBuf,

    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat the target as a directory and report importers of any file in it
    #[arg(long)]
    pub dir: bool,

    /// Number of files to scan at once
    #[arg(long, default_value = "1")]
    pub concurrency: usize,

    /// Gitignore-style glob for paths to skip (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Maximum directory depth to descend from the root
    #[arg(long)]
    pub max_depth: Option<usize>,
}

impl Config {
    /// Settles the scan root: `--root` if given, else the git root, else the
    /// current directory.
    pub fn initialize(&mut self) -> Result<PathBuf> {
        let root = match self.root.take() {
            Some(r) => {
                debug!("Using provided root directory: {:?}", r);
                r.canonicalize().unwrap_or(r)
            }
            None => match find_git_root() {
                Ok(r) => r,
                Err(e) => {
                    debug!("{}, falling back to the current directory", e);
                    env::current_dir()?
                }
            },
        };
        self.root = Some(root.clone());
        Ok(root)
    }

    pub fn collector_config(&self, root: PathBuf) -> CollectorConfig {
        CollectorConfig { root, ignore_patterns: self.ignore.clone(), max_depth: self.max_depth }
    }
}
