//! In-memory media, peer and relay fakes plus a harness that drives a
//! `SessionController` one event at a time.

#![allow(dead_code)]

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use signal_protocol::{MatchedMsg, Message, SignalMsg, WelcomeMsg};
use strangerlink_client::events::{ClientEvent, ClientUpdate, UserCommand};
use strangerlink_client::lifecycle::{ControllerParts, SessionController};
use strangerlink_client::media::{LocalMedia, MediaConstraints, MediaDevices, MediaError};
use strangerlink_client::negotiation::{IceCandidate, SessionDescription};
use strangerlink_client::peer::{
    PeerConfig, PeerConnection, PeerConnectionFactory, PeerError, PeerEvent, PeerEventSink,
};
use strangerlink_client::relay::{LinkId, RelayConnector, RelayError, RelayLink};
use strangerlink_client::{NegotiationState, Status};

// ===== Media =====

#[derive(Debug, Default)]
pub struct MediaJournal {
    pub acquired: usize,
    pub stopped: usize,
    pub audio: bool,
    pub video: bool,
    pub last_constraints: Option<MediaConstraints>,
}

pub struct FakeMedia {
    journal: Arc<Mutex<MediaJournal>>,
}

impl LocalMedia for FakeMedia {
    fn audio_enabled(&self) -> bool {
        self.journal.lock().unwrap().audio
    }

    fn set_audio_enabled(&mut self, enabled: bool) {
        self.journal.lock().unwrap().audio = enabled;
    }

    fn video_enabled(&self) -> bool {
        self.journal.lock().unwrap().video
    }

    fn set_video_enabled(&mut self, enabled: bool) {
        self.journal.lock().unwrap().video = enabled;
    }

    fn stop(&mut self) {
        self.journal.lock().unwrap().stopped += 1;
    }
}

pub struct FakeDevices {
    pub journal: Arc<Mutex<MediaJournal>>,
    pub deny: Arc<Mutex<bool>>,
}

impl MediaDevices for FakeDevices {
    fn acquire(&mut self, constraints: &MediaConstraints) -> Result<Box<dyn LocalMedia>, MediaError> {
        if *self.deny.lock().unwrap() {
            return Err(MediaError::PermissionDenied("user refused".to_string()));
        }
        let mut journal = self.journal.lock().unwrap();
        journal.acquired += 1;
        journal.audio = constraints.audio;
        journal.video = constraints.video;
        journal.last_constraints = Some(*constraints);
        Ok(Box::new(FakeMedia {
            journal: Arc::clone(&self.journal),
        }))
    }
}

// ===== Peer =====

#[derive(Debug, Default)]
pub struct PeerJournal {
    pub created: usize,
    pub closed: usize,
    /// Calls in order, e.g. `remote:offer`, `cand:c1`, `local:answer`
    pub calls: Vec<String>,
    pub sinks: Vec<PeerEventSink>,
    pub ice_servers: usize,
}

impl PeerJournal {
    pub fn candidates(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("cand:").map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeerBehavior {
    pub fail_remote: bool,
    /// Report `Connected` as soon as a remote description is applied
    pub connect_on_remote: bool,
}

pub struct FakePeer {
    journal: Arc<Mutex<PeerJournal>>,
    behavior: PeerBehavior,
    sink: PeerEventSink,
}

fn kind(d: &SessionDescription) -> &'static str {
    match d.sdp_type {
        strangerlink_client::negotiation::SdpType::Offer => "offer",
        strangerlink_client::negotiation::SdpType::Answer => "answer",
    }
}

impl PeerConnection for FakePeer {
    fn create_offer(&mut self) -> Result<SessionDescription, PeerError> {
        Ok(SessionDescription::offer("v=0\r\ns=fake-offer\r\n"))
    }

    fn create_answer(&mut self) -> Result<SessionDescription, PeerError> {
        Ok(SessionDescription::answer("v=0\r\ns=fake-answer\r\n"))
    }

    fn set_local_description(&mut self, d: &SessionDescription) -> Result<(), PeerError> {
        self.journal
            .lock()
            .unwrap()
            .calls
            .push(format!("local:{}", kind(d)));
        Ok(())
    }

    fn set_remote_description(&mut self, d: &SessionDescription) -> Result<(), PeerError> {
        if self.behavior.fail_remote {
            return Err(PeerError::Apply("rejected by engine".to_string()));
        }
        self.journal
            .lock()
            .unwrap()
            .calls
            .push(format!("remote:{}", kind(d)));
        if self.behavior.connect_on_remote {
            self.sink.emit(PeerEvent::ConnectionState(
                strangerlink_client::peer::PeerConnectionState::Connected,
            ));
        }
        Ok(())
    }

    fn add_ice_candidate(&mut self, c: &IceCandidate) -> Result<(), PeerError> {
        self.journal
            .lock()
            .unwrap()
            .calls
            .push(format!("cand:{}", c.candidate));
        Ok(())
    }

    fn close(&mut self) {
        self.journal.lock().unwrap().closed += 1;
    }
}

pub struct FakePeerFactory {
    pub journal: Arc<Mutex<PeerJournal>>,
    pub behavior: PeerBehavior,
}

impl PeerConnectionFactory for FakePeerFactory {
    fn create(
        &mut self,
        config: &PeerConfig,
        events: PeerEventSink,
        _media: &dyn LocalMedia,
    ) -> Result<Box<dyn PeerConnection>, PeerError> {
        let mut journal = self.journal.lock().unwrap();
        journal.created += 1;
        journal.ice_servers = config.ice_servers.len();
        journal.sinks.push(events.clone());
        Ok(Box::new(FakePeer {
            journal: Arc::clone(&self.journal),
            behavior: self.behavior.clone(),
            sink: events,
        }))
    }
}

// ===== Relay =====

#[derive(Debug, Default)]
pub struct RelayJournal {
    pub connects: usize,
    pub closes: usize,
    pub sent: Vec<Message>,
}

impl RelayJournal {
    pub fn count(&self, wanted: &Message) -> usize {
        self.sent.iter().filter(|m| *m == wanted).count()
    }

    pub fn signals(&self) -> Vec<SignalMsg> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Message::Signal(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeLink {
    id: LinkId,
    journal: Arc<Mutex<RelayJournal>>,
    closed: bool,
}

impl RelayLink for FakeLink {
    fn id(&self) -> LinkId {
        self.id
    }

    fn send(&mut self, message: &Message) -> Result<(), RelayError> {
        if self.closed {
            return Err(RelayError::Closed);
        }
        self.journal.lock().unwrap().sent.push(message.clone());
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.journal.lock().unwrap().closes += 1;
        }
    }
}

pub struct FakeConnector {
    pub journal: Arc<Mutex<RelayJournal>>,
    pub refuse: bool,
    next_link: LinkId,
}

impl RelayConnector for FakeConnector {
    fn connect(&mut self, _events: Sender<ClientEvent>) -> Result<Box<dyn RelayLink>, RelayError> {
        if self.refuse {
            return Err(RelayError::Connect {
                addr: "fake:0".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        self.journal.lock().unwrap().connects += 1;
        let id = self.next_link;
        self.next_link += 1;
        Ok(Box::new(FakeLink {
            id,
            journal: Arc::clone(&self.journal),
            closed: false,
        }))
    }
}

// ===== Harness =====

#[derive(Debug, Clone, Default)]
pub struct HarnessOptions {
    pub deny_media: bool,
    pub refuse_relay: bool,
    pub auto_requeue: bool,
    pub peer: PeerBehavior,
}

pub struct Harness {
    pub controller: SessionController,
    pub events: Sender<ClientEvent>,
    events_rx: Receiver<ClientEvent>,
    pub updates: Receiver<ClientUpdate>,
    pub media: Arc<Mutex<MediaJournal>>,
    pub deny_media: Arc<Mutex<bool>>,
    pub peers: Arc<Mutex<PeerJournal>>,
    pub relay: Arc<Mutex<RelayJournal>>,
}

pub const SELF_ID: &str = "v_100_aaaaaaaa";
pub const PARTNER_ID: &str = "v_200_bbbbbbbb";

impl Harness {
    pub fn new(options: HarnessOptions) -> Self {
        let (events, events_rx) = mpsc::channel();
        let (updates_tx, updates) = mpsc::channel();
        let media = Arc::new(Mutex::new(MediaJournal::default()));
        let deny_media = Arc::new(Mutex::new(options.deny_media));
        let peers = Arc::new(Mutex::new(PeerJournal::default()));
        let relay = Arc::new(Mutex::new(RelayJournal::default()));

        let parts = ControllerParts {
            devices: Box::new(FakeDevices {
                journal: Arc::clone(&media),
                deny: Arc::clone(&deny_media),
            }),
            peers: Box::new(FakePeerFactory {
                journal: Arc::clone(&peers),
                behavior: options.peer.clone(),
            }),
            connector: Box::new(FakeConnector {
                journal: Arc::clone(&relay),
                refuse: options.refuse_relay,
                next_link: 1,
            }),
            events: events.clone(),
            updates: updates_tx,
        };
        let config = strangerlink_client::ClientConfig {
            auto_requeue: options.auto_requeue,
            ..Default::default()
        };

        Harness {
            controller: SessionController::from_config(&config, parts),
            events,
            events_rx,
            updates,
            media,
            deny_media,
            peers,
            relay,
        }
    }

    /// Dispatches `event`, then everything the fakes posted in response
    pub fn send(&mut self, event: ClientEvent) {
        self.controller.dispatch(event);
        self.pump();
    }

    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.controller.dispatch(event);
        }
    }

    pub fn command(&mut self, command: UserCommand) {
        self.send(ClientEvent::Command(command));
    }

    /// Message from the relay on the current (first) link
    pub fn relay_msg(&mut self, message: Message) {
        self.relay_msg_on(1, message);
    }

    pub fn relay_msg_on(&mut self, link: LinkId, message: Message) {
        self.send(ClientEvent::Relay { link, message });
    }

    pub fn peer_event(&mut self, generation: u64, event: PeerEvent) {
        self.send(ClientEvent::Peer { generation, event });
    }

    /// Start, receive an identity and get matched with the given flag
    pub fn start_and_match(&mut self, initiator: Option<bool>) {
        self.command(UserCommand::Start);
        self.relay_msg(Message::Welcome(WelcomeMsg {
            visitor_id: SELF_ID.to_string(),
        }));
        self.relay_msg(Message::Waiting);
        self.relay_msg(Message::Matched(MatchedMsg {
            partner_id: PARTNER_ID.to_string(),
            initiator,
        }));
    }

    pub fn signal_from_partner(&mut self, data: serde_json::Value) {
        self.relay_msg(Message::Signal(SignalMsg {
            to: SELF_ID.to_string(),
            from: Some(PARTNER_ID.to_string()),
            data,
        }));
    }

    pub fn state(&self) -> NegotiationState {
        self.controller.state()
    }

    pub fn updates(&self) -> Vec<ClientUpdate> {
        self.updates.try_iter().collect()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                ClientUpdate::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}
