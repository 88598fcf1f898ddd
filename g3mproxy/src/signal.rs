/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use log::{info, warn};
use tokio::sync::{Mutex, Notify};

use crate::consumer::ConsumersHandle;

static RELOAD_MUTEX: Mutex<()> = Mutex::const_new(());

trait AsyncSignalAction: Clone {
    fn run(&self) -> impl Future<Output = ()> + Send;
}

/// Reload the consumer definitions from the config file.
///
/// The running generation is kept if the new config fails to load.
pub async fn do_reload(config_file: PathBuf, consumers: &ConsumersHandle) -> anyhow::Result<()> {
    let _guard = RELOAD_MUTEX.lock().await;
    info!("reloading config from {}", config_file.display());

    let new_consumers = tokio::task::spawn_blocking(move || {
        crate::config::load(&config_file).map(|c| c.metrics_consumers())
    })
    .await
    .map_err(|e| anyhow!("failed to join config load task: {e}"))??;
    consumers.store(new_consumers);

    info!("reload finished");
    Ok(())
}

#[derive(Clone)]
struct ReloadAction {
    config_file: Arc<PathBuf>,
    consumers: ConsumersHandle,
}

impl AsyncSignalAction for ReloadAction {
    async fn run(&self) {
        let config_file = self.config_file.as_ref().clone();
        if let Err(e) = do_reload(config_file, &self.consumers).await {
            warn!("error reloading config: {e:?}");
            warn!("reload aborted");
        }
    }
}

#[derive(Clone)]
struct QuitAction {
    quit: Arc<Notify>,
}

impl AsyncSignalAction for QuitAction {
    async fn run(&self) {
        self.quit.notify_one();
    }
}

#[cfg(unix)]
fn register_quit<QUIT>(do_quit: QUIT) -> anyhow::Result<()>
where
    QUIT: AsyncSignalAction + Send + 'static,
{
    use tokio::signal::unix::{SignalKind, signal};

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::quit(), "SIGQUIT"),
    ] {
        let mut sig =
            signal(kind).map_err(|e| anyhow!("failed to create {name} listener: {e}"))?;
        let do_quit = do_quit.clone();
        tokio::spawn(async move {
            if sig.recv().await.is_some() {
                info!("got quit signal {name}");
                do_quit.run().await;
            }
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn register_quit<QUIT>(do_quit: QUIT) -> anyhow::Result<()>
where
    QUIT: AsyncSignalAction + Send + 'static,
{
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("got quit signal");
            do_quit.run().await;
        }
    });
    Ok(())
}

#[cfg(unix)]
fn register_reload<RELOAD>(call_reload: RELOAD) -> anyhow::Result<()>
where
    RELOAD: AsyncSignalAction + Send + 'static,
{
    use tokio::signal::unix::{SignalKind, signal};

    let mut hup_sig = signal(SignalKind::hangup())
        .map_err(|e| anyhow!("failed to create SIGHUP listener: {e}"))?;
    tokio::spawn(async move {
        while hup_sig.recv().await.is_some() {
            info!("got reload signal");
            call_reload.run().await;
        }
    });
    Ok(())
}

/// Install the signal handlers, the returned notify fires on quit signals.
pub fn register(config_file: PathBuf, consumers: ConsumersHandle) -> anyhow::Result<Arc<Notify>> {
    let quit = Arc::new(Notify::new());

    #[cfg(unix)]
    register_reload(ReloadAction {
        config_file: Arc::new(config_file),
        consumers,
    })?;
    #[cfg(not(unix))]
    let _ = (config_file, consumers);

    register_quit(QuitAction {
        quit: Arc::clone(&quit),
    })?;
    Ok(quit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::config::ProxyConfig;
    use crate::types::ConsumerId;

    #[test]
    fn reload() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let dir = std::env::temp_dir().join(format!("g3mproxy-reload-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("main.yaml");

        let consumers = ConsumersHandle::new(ProxyConfig::default().metrics_consumers());
        assert!(!consumers.load().contains(&ConsumerId::new("my-consumer")));

        fs::write(&path, "consumer:\n  - name: my-consumer\n").unwrap();
        rt.block_on(do_reload(path.clone(), &consumers)).unwrap();
        assert!(consumers.load().contains(&ConsumerId::new("my-consumer")));

        fs::write(&path, "foo: bar\n").unwrap();
        assert!(rt.block_on(do_reload(path.clone(), &consumers)).is_err());
        assert!(consumers.load().contains(&ConsumerId::new("my-consumer")));

        fs::remove_dir_all(&dir).unwrap();
    }
}
