/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use log::{info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{RpcHandler, RpcTask};
use crate::config::RpcServerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RpcServerCommand {
    QuitRuntime,
}

/// The RPC server, which keeps no per-client state between calls.
pub struct RpcServer {
    config: Arc<RpcServerConfig>,
    handler: Arc<RpcHandler>,
    quit_sender: broadcast::Sender<RpcServerCommand>,
    runtime: Mutex<Option<JoinHandle<()>>>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: Arc<RpcHandler>) -> Self {
        let (quit_sender, _) = broadcast::channel(1);
        RpcServer {
            config: Arc::new(config),
            handler,
            quit_sender,
            runtime: Mutex::new(None),
        }
    }

    /// Bind the listen address and start accepting connections.
    ///
    /// Returns the bound local address.
    pub async fn start(&self) -> anyhow::Result<SocketAddr> {
        let listener = TcpListener::bind(self.config.listen)
            .await
            .context(format!("failed to listen on {}", self.config.listen))?;
        let local_addr = listener
            .local_addr()
            .context("failed to get local address of the listen socket")?;

        let runtime = RpcServerRuntime {
            config: Arc::clone(&self.config),
            handler: Arc::clone(&self.handler),
            quit_sender: self.quit_sender.clone(),
            local_addr,
        };
        let quit_receiver = self.quit_sender.subscribe();
        let handle = tokio::spawn(runtime.run(listener, quit_receiver));

        let mut guard = self.runtime.lock().unwrap();
        if let Some(old) = guard.replace(handle) {
            old.abort();
        }
        Ok(local_addr)
    }

    /// Close the listen socket and all open connections
    pub async fn stop(&self) {
        let _ = self.quit_sender.send(RpcServerCommand::QuitRuntime);
        let handle = self.runtime.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

struct RpcServerRuntime {
    config: Arc<RpcServerConfig>,
    handler: Arc<RpcHandler>,
    quit_sender: broadcast::Sender<RpcServerCommand>,
    local_addr: SocketAddr,
}

impl RpcServerRuntime {
    async fn run(
        self,
        listener: TcpListener,
        mut quit_receiver: broadcast::Receiver<RpcServerCommand>,
    ) {
        use broadcast::error::RecvError;

        info!("started rpc server on {}", self.local_addr);
        loop {
            tokio::select! {
                biased;

                ev = quit_receiver.recv() => {
                    match ev {
                        Ok(RpcServerCommand::QuitRuntime) => {}
                        Err(RecvError::Closed) => {}
                        Err(RecvError::Lagged(dropped)) => {
                            warn!("rpc server quit channel overflowed, {dropped} msg dropped");
                            continue;
                        }
                    }
                    info!("stopping rpc server on {}", self.local_addr);
                    break;
                }
                r = listener.accept() => {
                    match r {
                        Ok((stream, peer_addr)) => self.run_task(stream, peer_addr),
                        Err(e) => warn!("rpc server {} accept: {e:?}", self.local_addr),
                    }
                }
            }
        }
        drop(listener);
        info!("stopped rpc server on {}", self.local_addr);
    }

    fn run_task(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let task = RpcTask::new(
            Arc::clone(&self.handler),
            self.config.max_request_size,
            peer_addr,
            self.quit_sender.subscribe(),
        );
        tokio::spawn(async move {
            let (r, w) = stream.into_split();
            task.into_running(r, w).await;
        });
    }
}
