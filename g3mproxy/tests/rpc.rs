/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::anyhow;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use g3mproxy::config::RpcServerConfig;
use g3mproxy::consumer::{
    ConsumerConfig, ConsumerMetricConfig, ConsumersConfig, ConsumersHandle, MetricsConsumers,
};
use g3mproxy::external::ExternalMetrics;
use g3mproxy::manager::MetricsManager;
use g3mproxy::rpc::{
    BAD_REQUEST, DEFAULT_LOG_SPENT_TIME_LIMIT, METHOD_FAILED, NO_SUCH_METHOD, RpcClient,
    RpcHandler, RpcResponse, RpcServer, WRONG_PARAMS,
};
use g3mproxy::service::{
    Health, HealthStatus, MetricsSource, MonitoredService, PlaceholderSource, ServiceMetrics,
    ServiceRegistry, StaticSource,
};

struct FailingSource;

impl MetricsSource for FailingSource {
    fn metrics(&self) -> anyhow::Result<ServiceMetrics> {
        Err(anyhow!("connection refused"))
    }

    fn health(&self) -> Health {
        Health::new(HealthStatus::Unknown, "")
    }
}

struct PanickingSource;

impl MetricsSource for PanickingSource {
    fn metrics(&self) -> anyhow::Result<ServiceMetrics> {
        panic!("boom")
    }

    fn health(&self) -> Health {
        Health::up()
    }
}

async fn start_server() -> (RpcServer, SocketAddr) {
    let down = StaticSource::new(
        Health::new(HealthStatus::Down, "no response"),
        0,
        Vec::new(),
    );
    start_server_with(vec![
        MonitoredService::new("searchnode", "searchnode", "search/0", Arc::new(down)),
        MonitoredService::new("container", "container", "container/0", Arc::new(PlaceholderSource)),
    ])
    .await
}

async fn start_server_with(services: Vec<MonitoredService>) -> (RpcServer, SocketAddr) {
    let config = ConsumersConfig::from(vec![ConsumerConfig {
        name: "vespa-consumer".to_string(),
        metric: vec![ConsumerMetricConfig {
            name: "metric1".to_string(),
            outputname: "m1".to_string(),
            description: String::new(),
            dimension: Vec::new(),
        }],
    }]);
    let consumers = ConsumersHandle::new(MetricsConsumers::new(&config));
    let services = ServiceRegistry::new(services);
    let external = Arc::new(ExternalMetrics::new(consumers.clone()));
    let manager = MetricsManager::new(Arc::new(services), consumers, external);
    let handler = Arc::new(RpcHandler::new(
        Arc::new(manager),
        DEFAULT_LOG_SPENT_TIME_LIMIT,
    ));

    let listen = SocketAddr::from(([127, 0, 0, 1], 0));
    let server = RpcServer::new(RpcServerConfig::new(listen), handler);
    let addr = server.start().await.unwrap();
    (server, addr)
}

#[tokio::test]
async fn unknown_service() {
    let (server, addr) = start_server().await;
    let mut client = RpcClient::connect(addr).await.unwrap();

    let rsp = client
        .call("getMetricsForYamas", &["nonexistent"])
        .await
        .unwrap();
    let e = rsp.error.unwrap();
    assert_eq!(e.code, BAD_REQUEST);
    assert_eq!(e.message, "No service with name 'nonexistent'");
    assert_eq!(rsp.ret, [""]);

    let rsp = client
        .call("getHealthMetricsForYamas", &["nonexistent"])
        .await
        .unwrap();
    assert_eq!(rsp.ret, [""]);
    let e = rsp.error.unwrap();
    assert_eq!(e.code, BAD_REQUEST);
    assert_eq!(e.message, "No service with name 'nonexistent'");

    server.stop().await;
}

#[tokio::test]
async fn collect_failures() {
    let (server, addr) = start_server_with(vec![
        MonitoredService::new("broken", "broken", "broken/0", Arc::new(FailingSource)),
        MonitoredService::new("crash", "crash", "crash/0", Arc::new(PanickingSource)),
    ])
    .await;
    let mut client = RpcClient::connect(addr).await.unwrap();

    let rsp = client.call("getMetricsForYamas", &["broken"]).await.unwrap();
    assert_eq!(rsp.ret, [""]);
    let e = rsp.error.unwrap();
    assert_eq!(e.code, METHOD_FAILED);
    assert!(
        e.message
            .starts_with("Request failed due to internal error: MetricsCollectError: ")
    );
    assert!(e.message.contains("connection refused"));

    let rsp = client.call("getMetricsForYamas", &["crash"]).await.unwrap();
    assert_eq!(rsp.ret, [""]);
    let e = rsp.error.unwrap();
    assert_eq!(e.code, METHOD_FAILED);
    assert!(e.message.starts_with("Request failed due to internal error: Panic: "));

    let rsp = client.call("getMetricsById", &["crash/0"]).await.unwrap();
    assert_eq!(rsp.ret, [""]);
    assert_eq!(rsp.error.unwrap().code, METHOD_FAILED);

    // the connection still serves later calls
    let rsp = client.call("getServices", &[]).await.unwrap();
    assert!(!rsp.is_error());
    assert_eq!(rsp.ret, ["broken crash"]);

    server.stop().await;
}

#[tokio::test]
async fn extra_metrics() {
    let (server, addr) = start_server().await;
    let mut client = RpcClient::connect(addr).await.unwrap();

    let rsp = client
        .call(
            "setExtraMetrics",
            &[r#"[{"timestamp":1000,"metrics":{"metric1":5,"other":1}}]"#],
        )
        .await
        .unwrap();
    assert!(!rsp.is_error());
    assert!(rsp.ret.is_empty());

    let rsp = client.call("getMetricsForYamas", &["all"]).await.unwrap();
    assert_eq!(
        rsp.ret,
        [r#"[{"service":"vespa.node","timestamp":1000,"metrics":{"m1":5},"routing":["vespa-consumer"]}]"#]
    );

    // a second connection sees the same snapshot
    let mut other = RpcClient::connect(addr).await.unwrap();
    let rsp2 = other.call("getMetricsForYamas", &["all"]).await.unwrap();
    assert_eq!(rsp2.ret, rsp.ret);

    let rsp = client
        .call("setExtraMetrics", &["not json"])
        .await
        .unwrap();
    assert_eq!(rsp.error.unwrap().code, METHOD_FAILED);
    assert_eq!(rsp.ret, [""]);

    server.stop().await;
}

#[tokio::test]
async fn health() {
    let (server, addr) = start_server().await;
    let mut client = RpcClient::connect(addr).await.unwrap();

    let rsp = client
        .call("getHealthMetricsForYamas", &["searchnode"])
        .await
        .unwrap();
    assert_eq!(rsp.ret.len(), 1);
    let s = &rsp.ret[0];
    assert!(s.starts_with(r#"[{"service":"vespa.searchnode","timestamp":"#));
    assert!(s.contains(r#""status_code":1,"status_msg":"no response""#));
    assert!(s.contains(r#""metrics":{"alive":0}"#));
    assert!(!s.contains("routing"));

    let rsp = client.call("getServices", &[]).await.unwrap();
    assert_eq!(rsp.ret, ["searchnode container"]);

    server.stop().await;
}

#[tokio::test]
async fn bad_requests() {
    let (server, addr) = start_server().await;
    let mut client = RpcClient::connect(addr).await.unwrap();

    let rsp = client.call("noSuchMethod", &[]).await.unwrap();
    assert_eq!(rsp.error.unwrap().code, NO_SUCH_METHOD);

    let rsp = client.call("getMetricsForYamas", &[]).await.unwrap();
    assert_eq!(rsp.error.unwrap().code, WRONG_PARAMS);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"{not a frame}\n").await.unwrap();
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    let rsp = RpcResponse::parse(line.trim_end().as_bytes()).unwrap();
    assert_eq!(rsp.id, 0);
    assert_eq!(rsp.error.unwrap().code, BAD_REQUEST);

    server.stop().await;
}
