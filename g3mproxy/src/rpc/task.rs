/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info};
use memchr::memchr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Semaphore, broadcast, mpsc};

use super::{
    RpcFailure, RpcHandler, RpcMethod, RpcRequest, RpcResponse, RpcServerCommand,
    ServerTaskError,
};

const RESPONSE_QUEUE_DEPTH: usize = 64;
const MAX_DETACHED_REQUESTS: usize = 8;

pub(crate) struct RpcTask {
    handler: Arc<RpcHandler>,
    max_request_size: usize,
    peer_addr: SocketAddr,
    quit_receiver: broadcast::Receiver<RpcServerCommand>,
    detach_permits: Arc<Semaphore>,
}

impl RpcTask {
    pub(crate) fn new(
        handler: Arc<RpcHandler>,
        max_request_size: usize,
        peer_addr: SocketAddr,
        quit_receiver: broadcast::Receiver<RpcServerCommand>,
    ) -> Self {
        RpcTask {
            handler,
            max_request_size,
            peer_addr,
            quit_receiver,
            detach_permits: Arc::new(Semaphore::new(MAX_DETACHED_REQUESTS)),
        }
    }

    pub(crate) async fn into_running<R, W>(mut self, reader: R, mut writer: W)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (msg_sender, mut msg_receiver) = mpsc::channel::<RpcResponse>(RESPONSE_QUEUE_DEPTH);

        let write_handle = tokio::spawn(async move {
            let mut write_error: Result<(), ServerTaskError> = Ok(());

            'outer: while let Some(rsp) = msg_receiver.recv().await {
                if let Err(e) = writer.write_all(&rsp.encode()).await {
                    write_error = Err(ServerTaskError::WriteFailed(e));
                    break;
                }

                while let Ok(rsp) = msg_receiver.try_recv() {
                    if let Err(e) = writer.write_all(&rsp.encode()).await {
                        write_error = Err(ServerTaskError::WriteFailed(e));
                        break 'outer;
                    }
                }

                if let Err(e) = writer.flush().await {
                    write_error = Err(ServerTaskError::WriteFailed(e));
                    break;
                }
            }
            msg_receiver.close();
            write_error
        });

        let mut log_ok = true;
        if let Err(e) = self.read_spawn_till_end(reader, &msg_sender).await {
            self.log_task_err(e);
            log_ok = false;
        }

        drop(msg_sender);
        match write_handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                self.log_task_err(e);
                return;
            }
            Err(_) => {}
        }

        if log_ok {
            debug!("rpc connection from {} closed", self.peer_addr);
        }
    }

    fn log_task_err(&self, e: ServerTaskError) {
        info!("rpc connection from {} error: {e}", self.peer_addr);
    }

    async fn read_spawn_till_end<R>(
        &mut self,
        reader: R,
        msg_sender: &mpsc::Sender<RpcResponse>,
    ) -> Result<(), ServerTaskError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut buf_reader = BufReader::new(reader);
        let mut line = Vec::with_capacity(1024);

        loop {
            tokio::select! {
                biased;

                r = read_line(&mut buf_reader, &mut line, self.max_request_size) => {
                    if !r? {
                        return Ok(());
                    }
                    self.handle_request(&line, msg_sender).await;
                }
                r = self.quit_receiver.recv() => {
                    match r {
                        Ok(RpcServerCommand::QuitRuntime) => {
                            return Err(ServerTaskError::ServerForceQuit);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(ServerTaskError::ServerForceQuit);
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                    }
                }
            }
        }
    }

    async fn handle_request(&self, line: &[u8], msg_sender: &mpsc::Sender<RpcResponse>) {
        let req = match RpcRequest::parse(line) {
            Ok(req) => req,
            Err(e) => {
                let failure = RpcFailure::BadRequest(format!("invalid request frame: {e}"));
                let _ = msg_sender
                    .send(RpcResponse::with_failure(0, &failure, false))
                    .await;
                return;
            }
        };

        let method = match RpcMethod::from_str(&req.method) {
            Ok(method) => method,
            Err(e) => {
                let _ = msg_sender
                    .send(RpcResponse::with_failure(req.id, &e, false))
                    .await;
                return;
            }
        };
        let params = match method.check_params(&req.params) {
            Ok(params) => params,
            Err(e) => {
                let _ = msg_sender
                    .send(RpcResponse::with_failure(req.id, &e, false))
                    .await;
                return;
            }
        };

        let handler = Arc::clone(&self.handler);
        let msg_sender = msg_sender.clone();
        let id = req.id;
        let fut = async move {
            let rsp = handler.serve(id, method, params).await;
            let _ = msg_sender.send(rsp).await;
        };
        if !method.is_detached() {
            fut.await;
            return;
        }
        // reading pauses while all permits of this connection are in use
        match Arc::clone(&self.detach_permits).acquire_owned().await {
            Ok(permit) => {
                tokio::spawn(async move {
                    fut.await;
                    drop(permit);
                });
            }
            Err(_) => fut.await,
        }
    }
}

/// Read one `\n` terminated line into `buf`, without the terminator.
///
/// Returns false if the connection was closed cleanly before a new line.
async fn read_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_size: usize,
) -> Result<bool, ServerTaskError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let data = reader.fill_buf().await.map_err(ServerTaskError::ReadFailed)?;
        if data.is_empty() {
            return if buf.is_empty() {
                Ok(false)
            } else {
                Err(ServerTaskError::ClosedEarly)
            };
        }

        match memchr(b'\n', data) {
            Some(p) => {
                if buf.len() + p > max_size {
                    return Err(ServerTaskError::RequestTooLarge(max_size));
                }
                buf.extend_from_slice(&data[..p]);
                reader.consume(p + 1);
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                return Ok(true);
            }
            None => {
                let len = data.len();
                if buf.len() + len > max_size {
                    return Err(ServerTaskError::RequestTooLarge(max_size));
                }
                buf.extend_from_slice(data);
                reader.consume(len);
            }
        }
    }
}
