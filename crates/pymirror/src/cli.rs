use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::Overrides;

#[derive(Clone, Debug, Parser)]
#[command(name = "pymirror", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Requirements file to mirror (default: ./requirements.txt)
    #[arg(value_name = "REQUIREMENTS", conflicts_with = "requirement")]
    pub requirements: Option<PathBuf>,

    #[arg(short = 'r', long = "requirement", value_name = "FILE", help = "Requirements file (alternative to the positional argument)")]
    pub requirement: Option<PathBuf>,

    #[arg(long, help = "Only plan downloads and write the URL list")]
    pub dry_run: bool,

    #[arg(long, value_name = "N", help = "Maximum concurrent downloads")]
    pub concurrency: Option<usize>,

    #[arg(long, value_name = "DIR", help = "Directory to save downloads (default: ./pypi)")]
    pub download_dir: Option<PathBuf>,

    #[arg(long, alias = "cn", help = "Use the built-in proxy mirrors with fallback to the official index")]
    pub mirrors: bool,

    #[arg(long = "mirror", value_name = "URL", help = "Proxy mirror to try before the official index (repeatable)")]
    pub mirror: Vec<String>,

    #[arg(long, help = "Build a simple index over the download directory afterwards")]
    pub build_index: bool,

    #[arg(long, value_name = "TAGS", help = "Python tag filter, e.g. cp311, py3, py2.py3")]
    pub python_version: Option<String>,

    #[arg(long, value_name = "TAGS", help = "ABI tag filter, e.g. cp311, abi3, none")]
    pub abi: Option<String>,

    #[arg(long, value_name = "TAGS", help = "Platform tag filter, e.g. manylinux_2_17_x86_64, win_amd64, any")]
    pub platform: Option<String>,

    #[arg(long, conflicts_with = "latest_patch", help = "Mirror every Python 3 version, ignoring pins")]
    pub all_versions: bool,

    #[arg(long, help = "Mirror only the newest patch release of each minor version")]
    pub latest_patch: bool,

    #[arg(long, value_name = "FILE", help = "Write planned download URLs here (default in dry-run: ./url_list.txt)")]
    pub url_list: Option<PathBuf>,

    #[arg(long, help = "Use the requirements file as-is, without the resolver")]
    pub no_resolve: bool,

    #[arg(long, value_name = "FILE", help = "Trace log file, rotated at 10 MB (default: ./pymirror.log)")]
    pub log_file: Option<PathBuf>,

    #[arg(long, conflicts_with = "log_file", help = "Do not write a log file")]
    pub no_log_file: bool,

    #[arg(long, value_name = "FILE", help = "Settings file (default: ./pymirror.toml if present)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::Count, help = "Raise log verbosity (-v debug, -vv trace)")]
    pub verbose: u8,
}

fn flag(set: bool) -> Option<bool> { set.then_some(true) }

impl Cli {
    /// Settings layer for everything given on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            requirements:   self.requirement.clone().or_else(|| self.requirements.clone()),
            download_dir:   self.download_dir.clone(),
            concurrency:    self.concurrency,
            dry_run:        flag(self.dry_run),
            mirrors:        flag(self.mirrors),
            mirror_urls:    (!self.mirror.is_empty()).then(|| self.mirror.clone()),
            build_index:    flag(self.build_index),
            python_version: self.python_version.clone(),
            abi:            self.abi.clone(),
            platform:       self.platform.clone(),
            all_versions:   flag(self.all_versions),
            latest_patch:   flag(self.latest_patch),
            url_list:       self.url_list.clone(),
            no_resolve:     flag(self.no_resolve),
            log_file:       self.log_file.clone(),
            log_to_file:    self.no_log_file.then_some(false),
        }
    }
}
