//! The blocking `Adapter` handle as the game loop uses it.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use tui_boulder::adapter::{Adapter, InboundCommand, InboundPayload, ServerConfig};
use tui_boulder::core::{LevelPlan, MemoryLevels, MemoryScores, Session};
use tui_boulder::types::GameAction;

fn wait_for<T>(mut poll: impl FnMut() -> Option<T>) -> T {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(v) = poll() {
            return v;
        }
        assert!(Instant::now() < deadline, "timed out");
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn read_json(reader: &mut BufReader<TcpStream>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    serde_json::from_str(&line).unwrap()
}

#[test]
fn adapter_handle_round_trip() {
    let mut adapter = Adapter::start(ServerConfig {
        port: 0,
        ..ServerConfig::default()
    })
    .unwrap();
    assert_eq!(adapter.status().client_count, 0);

    let mut stream = TcpStream::connect(adapter.local_addr()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    writeln!(
        stream,
        r#"{{"type":"hello","seq":1,"client":{{"name":"sync","version":"0.1"}},"protocol_version":"1.2"}}"#
    )
    .unwrap();
    assert_eq!(read_json(&mut reader)["type"], "welcome");

    let status = wait_for(|| Some(adapter.status()).filter(|s| s.controller_id.is_some()));
    assert_eq!(status.client_count, 1);
    assert_eq!(status.streaming_count, 1);

    let levels = MemoryLevels::new(vec![LevelPlan::new("demo", &["P.*"])]);
    let mut session = Session::new(levels, MemoryScores::default(), 1);
    session.start(1);

    let InboundCommand {
        client_id, payload, ..
    } = wait_for(|| adapter.try_recv());
    assert_eq!(payload, InboundPayload::SnapshotRequest);
    adapter.observe_to(client_id, &session.snapshot());
    let obs = read_json(&mut reader);
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["board"]["cells"][0], "P.*");

    writeln!(
        stream,
        r#"{{"type":"command","seq":2,"actions":["moveRight","pause","moveRight"]}}"#
    )
    .unwrap();
    let cmd = wait_for(|| adapter.try_recv());
    let InboundPayload::Actions(actions) = cmd.payload else {
        panic!("expected actions");
    };
    let mut applied = 0;
    for action in actions {
        if session.apply_action(action) {
            applied += 1;
        }
    }
    // The move after the pause is refused.
    assert_eq!(applied, 2);
    assert_eq!(session.snapshot().score, 50);
    adapter.ack(cmd.client_id, cmd.seq, applied);

    let ack = read_json(&mut reader);
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["applied"], 2);

    adapter.broadcast(&session.snapshot());
    let obs = read_json(&mut reader);
    assert_eq!(obs["paused"], true);
    assert_eq!(obs["playable"], false);
    assert_eq!(obs["seq"], 2);

    assert!(session.apply_action(GameAction::Pause));
}

#[test]
fn adapter_start_reports_bind_failure() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let result = Adapter::start(ServerConfig {
        port,
        ..ServerConfig::default()
    });
    assert!(result.is_err());
}
