//! Integration tests for the connection lifecycle.
//!
//! Each test runs a real `ConnectionManager` worker against a scripted
//! server on localhost.

mod common;

use std::sync::Arc;

use common::{FakeServer, join, shutdown, wait_for_state};
use ircore::manager::ConnectionManager;
use ircore::{ConnectionError, ConnectionState, HookRegistry};

fn manager() -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::new(HookRegistry::new()))
}

#[tokio::test]
async fn test_registration_handshake_and_autojoin() {
    let server = FakeServer::bind().await.unwrap();
    let mut config = server.config("core");
    config.username = "corebot".to_string();
    config.realname = "core 2 duo".to_string();
    config.channels = vec!["#home".to_string(), "#ops".to_string()];

    let manager = manager();
    let conns = manager.start([config]).unwrap();
    let conn = conns[0].clone();
    let mut peer = server.accept().await.unwrap();

    let nick = peer.recv().await.unwrap();
    assert_eq!(nick.raw(), "NICK core");
    let user = peer.recv().await.unwrap();
    assert_eq!(user.params(), ["corebot", "*", "*", "core 2 duo"]);
    assert_eq!(conn.state(), ConnectionState::AwaitingRegistration);

    peer.send_raw(":irc.test 001 core :Welcome").await.unwrap();
    assert_eq!(peer.recv().await.unwrap().raw(), "JOIN #home");
    assert_eq!(peer.recv().await.unwrap().raw(), "JOIN #ops");
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();

    peer.send_raw(":core!~corebot@host JOIN #home").await.unwrap();
    peer.send_raw(":irc.test PING :sync").await.unwrap();
    peer.recv_command("PONG").await.unwrap();
    assert_eq!(conn.channels(), ["#home"]);

    let exits = shutdown(&manager).await.unwrap();
    let quit = peer.recv_command("QUIT").await.unwrap();
    assert_eq!(quit.text(), "test over");
    assert!(peer.closed().await.unwrap());

    assert_eq!(exits.len(), 1);
    assert!(exits[0].result.is_ok(), "{:?}", exits[0].result);
    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert!(manager.peers().is_empty());
}

#[tokio::test]
async fn test_nick_collision_retries_with_suffix() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();

    peer.recv_command("USER").await.unwrap();
    peer.send_raw(":irc.test 433 * core :Nickname is already in use")
        .await
        .unwrap();
    assert_eq!(peer.recv().await.unwrap().raw(), "NICK core_");

    peer.send_raw(":irc.test 001 core_ :Welcome").await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();
    assert_eq!(conn.nick(), "core_");

    shutdown(&manager).await.unwrap();
}

#[tokio::test]
async fn test_send_before_welcome_is_rejected() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();
    peer.recv_command("USER").await.unwrap();

    assert!(matches!(
        conn.say("#home", "too early"),
        Err(ConnectionError::NotRegistered)
    ));

    peer.send_raw(":irc.test 001 core :Welcome").await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();
    conn.say("#home", "on time").unwrap();
    assert_eq!(peer.recv().await.unwrap().raw(), "PRIVMSG #home :on time");

    shutdown(&manager).await.unwrap();
}

#[tokio::test]
async fn test_connect_failure_is_reported() {
    let server = FakeServer::bind().await.unwrap();
    let config = server.config("core");
    drop(server);

    let manager = manager();
    manager.start([config]).unwrap();
    let exits = join(&manager).await.unwrap();

    assert_eq!(exits.len(), 1);
    assert!(
        matches!(exits[0].result, Err(ConnectionError::Io(_))),
        "{:?}",
        exits[0].result
    );
}

#[tokio::test]
async fn test_server_error_ends_worker() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();
    peer.register().await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();

    peer.send_raw("ERROR :Closing Link: core (K-Lined)").await.unwrap();
    let exits = join(&manager).await.unwrap();

    match &exits[0].result {
        Err(ConnectionError::Server(text)) => assert_eq!(text, "Closing Link: core (K-Lined)"),
        other => panic!("expected server error, got {other:?}"),
    }
    assert!(matches!(conn.say("#home", "late"), Err(ConnectionError::Closed)));
}

#[tokio::test]
async fn test_quit_then_error_is_a_clean_exit() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();
    peer.register().await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();

    conn.quit("see you").unwrap();
    assert_eq!(peer.recv().await.unwrap().raw(), "QUIT :see you");
    peer.send_raw("ERROR :Closing Link: core (Quit: see you)").await.unwrap();

    let exits = join(&manager).await.unwrap();
    assert!(exits[0].result.is_ok(), "{:?}", exits[0].result);
}

#[tokio::test]
async fn test_unexpected_eof_is_an_error() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();
    peer.register().await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();

    drop(peer);
    let exits = join(&manager).await.unwrap();
    assert!(matches!(exits[0].result, Err(ConnectionError::Closed)));
}

#[tokio::test]
async fn test_nick_collision_gives_up_after_retries() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    manager.start([server.config("core")]).unwrap();
    let mut peer = server.accept().await.unwrap();
    peer.recv_command("USER").await.unwrap();

    let mut nick = "core".to_string();
    for _ in 0..5 {
        peer.send_raw(&format!(":irc.test 433 * {nick} :Nickname is already in use"))
            .await
            .unwrap();
        nick.push('_');
        assert_eq!(peer.recv().await.unwrap().raw(), format!("NICK {nick}"));
    }
    peer.send_raw(&format!(":irc.test 433 * {nick} :Nickname is already in use"))
        .await
        .unwrap();

    let exits = join(&manager).await.unwrap();
    assert!(
        matches!(exits[0].result, Err(ConnectionError::Registration(_))),
        "{:?}",
        exits[0].result
    );
}

#[tokio::test]
async fn test_oversized_ping_does_not_drop_the_connection() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();
    peer.register().await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();

    // the PONG echo would exceed the outbound line limit
    peer.send_raw(&format!("PING :{}", "x".repeat(600))).await.unwrap();
    peer.send_raw("PING :ok").await.unwrap();
    assert_eq!(peer.recv().await.unwrap().raw(), "PONG :ok");
    assert_eq!(conn.state(), ConnectionState::Registered);

    let exits = shutdown(&manager).await.unwrap();
    assert!(exits[0].result.is_ok(), "{:?}", exits[0].result);
}

#[tokio::test]
async fn test_unparsable_line_is_skipped() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();
    peer.register().await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();

    peer.send_raw(": PRIVMSG #c :x").await.unwrap();
    peer.send_raw("PING :after").await.unwrap();
    assert_eq!(peer.recv().await.unwrap().raw(), "PONG :after");
    assert_eq!(conn.state(), ConnectionState::Registered);

    let exits = shutdown(&manager).await.unwrap();
    assert!(exits[0].result.is_ok(), "{:?}", exits[0].result);
}

#[tokio::test]
async fn test_duplicate_connection_rejected() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let err = manager
        .start([server.config("core"), server.config("core")])
        .unwrap_err();
    assert!(matches!(err, ircore::ManagerError::DuplicateConnection(_)));
    assert!(manager.peers().is_empty());
    assert!(join(&manager).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_of_live_connection_starts_nothing() {
    let server = FakeServer::bind().await.unwrap();
    let manager = manager();
    let conn = manager.start([server.config("core")]).unwrap().remove(0);
    let mut peer = server.accept().await.unwrap();
    peer.register().await.unwrap();
    wait_for_state(&conn, ConnectionState::Registered).await.unwrap();

    let err = manager
        .start([server.config("other"), server.config("core")])
        .unwrap_err();
    assert!(matches!(err, ircore::ManagerError::DuplicateConnection(id) if id == conn.id()));
    assert_eq!(manager.connections().len(), 1);

    let exits = shutdown(&manager).await.unwrap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].id, conn.id());
}
