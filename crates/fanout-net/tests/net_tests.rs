//! End-to-end tests for the echo server and the sender.

use std::net::SocketAddr;
use std::time::Duration;

use fanout_net::{
    EchoConfig, EchoServer, NetError, SendConfig, Sender, ServeStats, Threading,
    send_message_and_wait_for_reply,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

async fn start_server(threading: Threading) -> (SocketAddr, CancellationToken, JoinHandle<ServeStats>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = EchoConfig::builder()
        .addr(addr)
        .echo_wait(Duration::from_millis(5))
        .threading(threading)
        .workers(4usize)
        .build()
        .unwrap();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(async move { EchoServer::new(config).serve(listener, token).await });
    (addr, shutdown, handle)
}

/// An address nothing is listening on.
async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn send_config(addr: SocketAddr, threading: Threading, count: usize) -> SendConfig {
    SendConfig::builder()
        .addr(addr)
        .message_count(count)
        .message_root("hello")
        .threading(threading)
        .workers(3usize)
        .build()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_round_trip() {
    let (addr, shutdown, server) = start_server(Threading::Virtual).await;

    let reply = send_message_and_wait_for_reply(addr, "fOo bAR 7").await.unwrap();
    assert_eq!(reply, "fOo bAR 7");

    shutdown.cancel();
    let stats = server.await.unwrap();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.echoed, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_strategy_pairing() {
    for server_threading in [Threading::Pooled, Threading::Virtual] {
        for sender_threading in [Threading::Pooled, Threading::Virtual] {
            let (addr, shutdown, server) = start_server(server_threading).await;

            let report = Sender::new(send_config(addr, sender_threading, 20))
                .send_messages()
                .await
                .unwrap();
            assert_eq!(report.sent, 20, "{server_threading} server, {sender_threading} sender");
            assert_eq!(report.failed, 0);

            shutdown.cancel();
            let stats = server.await.unwrap();
            assert_eq!(stats.accepted, 20);
            assert_eq!(stats.echoed, 20);
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_survives_bad_connection() {
    let (addr, shutdown, server) = start_server(Threading::Pooled).await;

    // Connect and hang up without sending a line.
    drop(tokio::net::TcpStream::connect(addr).await.unwrap());
    let reply = send_message_and_wait_for_reply(addr, "still here").await.unwrap();
    assert_eq!(reply, "still here");

    shutdown.cancel();
    let stats = server.await.unwrap();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.echoed, 1);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_virtual_sender_fails_fast() {
    let addr = closed_addr().await;
    let result = Sender::new(send_config(addr, Threading::Virtual, 10))
        .send_messages()
        .await;
    assert!(matches!(result, Err(NetError::Io(_))));
}

#[tokio::test]
async fn test_pooled_sender_counts_failures() {
    let addr = closed_addr().await;
    let report = Sender::new(send_config(addr, Threading::Pooled, 6))
        .send_messages()
        .await
        .unwrap();
    assert_eq!(report.sent, 0);
    assert_eq!(report.failed, 6);
}

#[tokio::test]
async fn test_shutdown_with_no_connections() {
    let (_, shutdown, server) = start_server(Threading::Virtual).await;
    shutdown.cancel();
    assert_eq!(server.await.unwrap(), ServeStats::default());
}
