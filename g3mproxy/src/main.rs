/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::{debug, error, info};

use g3mproxy::config::ProxyConfig;
use g3mproxy::consumer::ConsumersHandle;
use g3mproxy::external::ExternalMetrics;
use g3mproxy::manager::MetricsManager;
use g3mproxy::opts::ProcArgs;
use g3mproxy::rpc::{RpcHandler, RpcServer};
use g3mproxy::service::ServiceRegistry;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) =
        g3mproxy::opts::parse_clap().context("failed to parse command line options")?
    else {
        return Ok(());
    };

    // set up process logger early, only proc args is used inside
    let _log_guard = g3mproxy::log::setup(proc_args.verbose_level)?;

    let config = g3mproxy::config::load(&proc_args.config_file)
        .context(format!("failed to load config, opts: {:?}", &proc_args))?;
    debug!("loaded config from {}", proc_args.config_file.display());
    if config.server.is_none() {
        return Err(anyhow!("no rpc server configured"));
    }

    if proc_args.test_config {
        info!("the format of the config file is ok");
        return Ok(());
    }

    let ret = tokio_run(&proc_args, config);

    match ret {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("{e:?}");
            Err(e)
        }
    }
}

fn tokio_run(args: &ProcArgs, mut config: ProxyConfig) -> anyhow::Result<()> {
    let rt = config
        .runtime
        .start()
        .context("failed to start runtime")?;
    rt.block_on(async {
        let server_config = config
            .server
            .take()
            .ok_or_else(|| anyhow!("no rpc server configured"))?;

        let services = config.services.iter().map(|s| s.build()).collect();
        let services = Arc::new(ServiceRegistry::new(services));
        let consumers = ConsumersHandle::new(config.metrics_consumers());
        let external = Arc::new(ExternalMetrics::new(consumers.clone()));
        let manager = MetricsManager::new(services, consumers.clone(), external)
            .with_global_dimensions(config.global_dimensions.clone());

        let handler = Arc::new(RpcHandler::new(
            Arc::new(manager),
            server_config.log_spent_time_limit,
        ));
        let server = RpcServer::new(server_config, handler);
        server.start().await?;

        let quit = g3mproxy::signal::register(args.config_file.clone(), consumers)
            .context("failed to setup signal handler")?;
        quit.notified().await;

        server.stop().await;
        Ok(())
    })
}
