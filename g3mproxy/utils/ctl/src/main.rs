/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use clap_complete::Shell;

use g3mproxy::rpc::{RpcClient, RpcMethod};

const ARGS_COMPLETION: &str = "completion";
const ARGS_CONNECT: &str = "connect";
const ARGS_TIMEOUT: &str = "timeout";
const ARGS_LIST: &str = "list";
const ARGS_METHOD: &str = "method";
const ARGS_PARAMS: &str = "params";

const DEFAULT_CONNECT: &str = "127.0.0.1:19095";
const DEFAULT_TIMEOUT: &str = "30s";

fn build_cli_args() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .arg(
            Arg::new(ARGS_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(ARGS_CONNECT)
                .help("Address of the rpc server")
                .num_args(1)
                .value_name("HOST:PORT")
                .default_value(DEFAULT_CONNECT)
                .short('c')
                .long("connect"),
        )
        .arg(
            Arg::new(ARGS_TIMEOUT)
                .help("Timeout for the whole call")
                .num_args(1)
                .value_name("TIMEOUT")
                .default_value(DEFAULT_TIMEOUT)
                .long("timeout"),
        )
        .arg(
            Arg::new(ARGS_LIST)
                .help("List the supported methods")
                .action(ArgAction::SetTrue)
                .short('l')
                .long("list"),
        )
        .arg(
            Arg::new(ARGS_METHOD)
                .help("Method name")
                .num_args(1)
                .required_unless_present_any([ARGS_COMPLETION, ARGS_LIST]),
        )
        .arg(
            Arg::new(ARGS_PARAMS)
                .help("String parameters of the method")
                .num_args(0..)
                .action(ArgAction::Append),
        )
}

fn list_methods() {
    for m in RpcMethod::ALL {
        let ret = if m.has_ret() { " -> string" } else { "" };
        println!("{}({}){ret}", m.name(), m.params().join(", "));
        println!("    {}", m.description());
    }
}

async fn call(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let Some(method) = args.get_one::<String>(ARGS_METHOD) else {
        return Err(anyhow!("no method given"));
    };
    let params: Vec<&str> = args
        .get_many::<String>(ARGS_PARAMS)
        .map(|v| v.map(|s| s.as_str()).collect())
        .unwrap_or_default();
    let connect = args
        .get_one::<String>(ARGS_CONNECT)
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_CONNECT);
    let timeout = match args.get_one::<String>(ARGS_TIMEOUT) {
        Some(s) => humanize_rs::duration::parse(s)
            .map_err(|e| anyhow!("invalid timeout value {s}: {e:?}"))?,
        None => Duration::from_secs(30),
    };

    let rsp = tokio::time::timeout(timeout, async {
        let mut client = RpcClient::connect(connect).await?;
        client.call(method, &params).await
    })
    .await
    .map_err(|_| anyhow!("timed out after {timeout:?}"))?
    .context(format!("failed to call {method}"))?;

    if let Some(e) = rsp.error {
        eprintln!("error {}: {}", e.code, e.message);
        return Ok(ExitCode::FAILURE);
    }
    for s in rsp.ret {
        if s.ends_with('\n') {
            print!("{s}");
        } else {
            println!("{s}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = build_cli_args().get_matches();

    if let Some(target) = args.get_one::<Shell>(ARGS_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    if args.get_flag(ARGS_LIST) {
        list_methods();
        return Ok(ExitCode::SUCCESS);
    }

    call(&args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args() {
        build_cli_args().debug_assert();

        let args = build_cli_args()
            .try_get_matches_from([
                "g3mproxy-ctl",
                "getAllMetricNamesForService",
                "searchnode",
                "default",
            ])
            .unwrap();
        assert_eq!(
            args.get_one::<String>(ARGS_METHOD).unwrap(),
            "getAllMetricNamesForService"
        );
        let params: Vec<&String> = args.get_many::<String>(ARGS_PARAMS).unwrap().collect();
        assert_eq!(params, ["searchnode", "default"]);

        assert!(build_cli_args().try_get_matches_from(["g3mproxy-ctl"]).is_err());
        assert!(
            build_cli_args()
                .try_get_matches_from(["g3mproxy-ctl", "-l"])
                .is_ok()
        );
    }
}
