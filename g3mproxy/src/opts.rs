/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::builder::ArgPredicate;
use clap::{Arg, ArgAction, Command, ValueHint, value_parser};
use clap_complete::Shell;

const ARGS_COMPLETION: &str = "completion";
const ARGS_VERSION: &str = "version";
const ARGS_VERBOSE: &str = "verbose";
const ARGS_TEST_CONFIG: &str = "test-config";
const ARGS_CONFIG_FILE: &str = "config-file";

const DEFAULT_CONFIG_FILE: &str = "/etc/g3mproxy/main.yaml";

#[derive(Debug)]
pub struct ProcArgs {
    pub verbose_level: u8,
    pub test_config: bool,
    pub config_file: PathBuf,
}

fn build_cli_args() -> Command {
    Command::new(crate::build::PKG_NAME)
        .disable_version_flag(true)
        .arg(
            Arg::new(ARGS_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .long("verbose"),
        )
        .arg(
            Arg::new(ARGS_VERSION)
                .help("Show version")
                .action(ArgAction::SetTrue)
                .short('V')
                .long("version"),
        )
        .arg(
            Arg::new(ARGS_TEST_CONFIG)
                .help("Test the format of config file and exit")
                .action(ArgAction::SetTrue)
                .short('t')
                .long("test-config"),
        )
        .arg(
            Arg::new(ARGS_CONFIG_FILE)
                .help("Config file path")
                .num_args(1)
                .value_name("CONFIG FILE")
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_CONFIG_FILE)
                .default_value_if(ARGS_COMPLETION, ArgPredicate::IsPresent, None)
                .short('c')
                .long("config-file"),
        )
}

fn guess_config_file(dir: &Path) -> anyhow::Result<PathBuf> {
    const GUESS_EXT: &[&str] = &["yml", "yaml", "conf"];

    let rdir = dir
        .read_dir()
        .map_err(|e| anyhow!("failed to open {}: {e}", dir.display()))?;
    for v in rdir {
        let Ok(v) = v else {
            continue;
        };
        let path = v.path();
        for ext in GUESS_EXT {
            if path.ends_with(format!("main.{ext}")) {
                return Ok(path);
            }
            if path.ends_with(format!("{}.{ext}", crate::build::PKG_NAME)) {
                return Ok(path);
            }
        }
    }
    Err(anyhow!(
        "no main config file found in dir {}",
        dir.display()
    ))
}

/// Resolve the given path to an absolute config file path.
///
/// A directory is searched for `main.yaml` or `g3mproxy.yaml`.
pub fn validate_config_file(path: &Path) -> anyhow::Result<PathBuf> {
    let metadata = fs::metadata(path)
        .map_err(|e| anyhow!("failed to get metadata of path {}: {e}", path.display()))?;

    let path = if metadata.is_dir() {
        guess_config_file(path)?
    } else {
        path.to_path_buf()
    };
    path.canonicalize()
        .map_err(|e| anyhow!("failed to canonicalize path {}: {e}", path.display()))
}

pub fn parse_clap() -> anyhow::Result<Option<ProcArgs>> {
    let args_parser = build_cli_args();
    let args = args_parser.get_matches();

    if let Some(target) = args.get_one::<Shell>(ARGS_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(None);
    }

    let verbose_level = args.get_one::<u8>(ARGS_VERBOSE).copied().unwrap_or(0);
    if args.get_flag(ARGS_VERSION) {
        crate::build::print_version(verbose_level);
        return Ok(None);
    }

    let Some(config_file) = args.get_one::<PathBuf>(ARGS_CONFIG_FILE) else {
        return Err(anyhow!("no config file given"));
    };
    let config_file = validate_config_file(config_file).context(format!(
        "failed to load config file {}",
        config_file.display()
    ))?;

    Ok(Some(ProcArgs {
        verbose_level,
        test_config: args.get_flag(ARGS_TEST_CONFIG),
        config_file,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args() {
        build_cli_args().debug_assert();

        let args = build_cli_args()
            .try_get_matches_from(["g3mproxy", "-vv", "-t", "-c", "/tmp/main.yaml"])
            .unwrap();
        assert_eq!(args.get_one::<u8>(ARGS_VERBOSE), Some(&2));
        assert!(args.get_flag(ARGS_TEST_CONFIG));
        assert_eq!(
            args.get_one::<PathBuf>(ARGS_CONFIG_FILE).unwrap(),
            Path::new("/tmp/main.yaml")
        );

        let args = build_cli_args()
            .try_get_matches_from(["g3mproxy"])
            .unwrap();
        assert_eq!(
            args.get_one::<PathBuf>(ARGS_CONFIG_FILE).unwrap(),
            Path::new(DEFAULT_CONFIG_FILE)
        );
    }

    #[test]
    fn config_file_in_dir() {
        let dir = std::env::temp_dir().join(format!("g3mproxy-opts-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.yaml"), "{}").unwrap();

        let path = validate_config_file(&dir).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("main.yaml"));

        assert!(validate_config_file(&dir.join("missing.yaml")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
