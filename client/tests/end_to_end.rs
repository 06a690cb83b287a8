//! Two controllers negotiating through a real relay on loopback.

mod common;

use std::net::SocketAddr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use common::{FakeDevices, FakePeerFactory, PeerBehavior, PeerJournal};
use strangerlink_client::config::RelayConfig;
use strangerlink_client::infrastructure::TcpRelayConnector;
use strangerlink_client::lifecycle::{ControllerParts, SessionController};
use strangerlink_client::{ClientEvent, ClientUpdate, EndReason, NegotiationState, Status, UserCommand};
use strangerlink_server::{Storage, TcpServer};

fn start_relay() -> SocketAddr {
    let bound = TcpServer::new(Storage::new())
        .with_read_timeout(Duration::from_millis(20))
        .bind("127.0.0.1:0")
        .expect("bind relay");
    let addr = bound.local_addr().expect("local addr");
    thread::spawn(move || {
        let _ = bound.serve();
    });
    addr
}

struct Visitor {
    commands: Sender<ClientEvent>,
    updates: Receiver<ClientUpdate>,
    peers: Arc<Mutex<PeerJournal>>,
    thread: Option<JoinHandle<()>>,
}

impl Visitor {
    fn spawn(addr: SocketAddr, auto_requeue: bool) -> Self {
        let (events, events_rx) = mpsc::channel();
        let (updates_tx, updates) = mpsc::channel();
        let peers = Arc::new(Mutex::new(PeerJournal::default()));

        let parts = ControllerParts {
            devices: Box::new(FakeDevices {
                journal: Arc::default(),
                deny: Arc::default(),
            }),
            peers: Box::new(FakePeerFactory {
                journal: Arc::clone(&peers),
                behavior: PeerBehavior {
                    connect_on_remote: true,
                    ..Default::default()
                },
            }),
            connector: Box::new(TcpRelayConnector::new(RelayConfig {
                address: addr.to_string(),
                poll_interval_ms: 10,
                ..Default::default()
            })),
            events: events.clone(),
            updates: updates_tx,
        };
        let controller = SessionController::new(parts).with_auto_requeue(auto_requeue);
        let thread = thread::spawn(move || controller.run(events_rx));

        Visitor {
            commands: events,
            updates,
            peers,
            thread: Some(thread),
        }
    }

    fn command(&self, command: UserCommand) {
        self.commands.send(command.into()).expect("controller alive");
    }

    /// Waits up to five seconds for a status matching `wanted`
    fn wait_for(&self, wanted: impl Fn(&Status) -> bool) -> Status {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.updates.recv_timeout(remaining) {
                Ok(ClientUpdate::Status(status)) if wanted(&status) => return status,
                Ok(_) => continue,
                Err(e) => panic!("No matching status: {}", e),
            }
        }
    }
}

impl Drop for Visitor {
    fn drop(&mut self) {
        let _ = self.commands.send(UserCommand::Shutdown.into());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn connected(status: &Status) -> bool {
    status.state == NegotiationState::Connected
}

#[test]
fn test_pair_negotiates_then_partner_leaves() {
    let addr = start_relay();
    let alice = Visitor::spawn(addr, false);
    let bob = Visitor::spawn(addr, false);

    alice.command(UserCommand::Start);
    bob.command(UserCommand::Start);

    let a = alice.wait_for(connected);
    let b = bob.wait_for(connected);
    assert!(a.partner.is_some());
    assert!(b.partner.is_some());
    assert_ne!(a.partner, b.partner);

    // Exactly one side offered
    let offers = [&alice, &bob]
        .iter()
        .filter(|v| v.peers.lock().unwrap().calls.contains(&"local:offer".to_string()))
        .count();
    assert_eq!(offers, 1);

    alice.command(UserCommand::End);
    let ended = bob.wait_for(|s| s.state == NegotiationState::Ended);
    assert_eq!(ended.reason, Some(EndReason::PartnerLeft));
    assert_eq!(bob.peers.lock().unwrap().closed, 1);
}

#[test]
fn test_auto_requeue_finds_next_partner() {
    let addr = start_relay();
    let alice = Visitor::spawn(addr, true);
    let bob = Visitor::spawn(addr, false);

    alice.command(UserCommand::Start);
    bob.command(UserCommand::Start);
    alice.wait_for(connected);
    bob.wait_for(connected);

    bob.command(UserCommand::End);
    let requeued = alice.wait_for(|s| s.state == NegotiationState::Waiting);
    assert_eq!(requeued.reason, Some(EndReason::PartnerLeft));

    let carol = Visitor::spawn(addr, false);
    carol.command(UserCommand::Start);
    let again = alice.wait_for(connected);
    let theirs = carol.wait_for(connected);
    assert!(again.partner.is_some());
    assert!(theirs.partner.is_some());
    assert_eq!(alice.peers.lock().unwrap().created, 2);
}

#[test]
fn test_unreachable_relay_ends_attempt() {
    // Bind and drop to get a port nobody listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("probe port");
    let visitor = Visitor::spawn(addr, true);

    visitor.command(UserCommand::Start);
    let ended = visitor.wait_for(|s| s.state == NegotiationState::Ended);
    assert_eq!(ended.reason, Some(EndReason::RelayUnavailable));
}
