/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use super::{RpcRequest, RpcResponse};

/// A client that runs one call at a time over a single connection.
pub struct RpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
    buf: String,
}

impl RpcClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .context("failed to connect to rpc server")?;
        let (r, w) = stream.into_split();
        Ok(RpcClient {
            reader: BufReader::new(r),
            writer: w,
            next_id: 1,
            buf: String::with_capacity(1024),
        })
    }

    pub async fn call(&mut self, method: &str, params: &[&str]) -> anyhow::Result<RpcResponse> {
        let id = self.next_id;
        self.next_id += 1;

        let req = RpcRequest::new(id, method, params);
        self.writer
            .write_all(&req.encode())
            .await
            .context("failed to send request")?;
        self.writer.flush().await.context("failed to send request")?;

        loop {
            self.buf.clear();
            let n = self
                .reader
                .read_line(&mut self.buf)
                .await
                .context("failed to read response")?;
            if n == 0 {
                return Err(anyhow!("connection closed by server"));
            }
            let rsp = RpcResponse::parse(self.buf.trim_end().as_bytes())
                .context("invalid response frame")?;
            // id 0 is used for requests that could not be decoded
            if rsp.id == id || rsp.id == 0 {
                return Ok(rsp);
            }
        }
    }
}
