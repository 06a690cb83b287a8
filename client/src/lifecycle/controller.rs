//! Event-driven session controller.
//!
//! All inputs (relay messages, peer callbacks, user commands) arrive on one
//! channel and are handled one at a time, so the controller needs no locks.
//! Every path out of a session goes through [`SessionController::teardown`].

use std::sync::mpsc::{Receiver, Sender};

use signal_protocol::{ChatMsg, MatchedMsg, Message, SignalMsg};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::events::{ClientEvent, ClientUpdate, UserCommand};
use crate::media::{LocalMedia, MediaConstraints, MediaDevices, MediaError};
use crate::negotiation::{
    CandidateOutcome, EndReason, IceCandidate, NegotiationPayload, NegotiationState, PayloadError,
    Role, SdpType, SessionContext, SessionDescription, Status, resolve_role,
};
use crate::peer::{
    PeerConfig, PeerConnectionFactory, PeerConnectionState, PeerError, PeerEvent, PeerEventSink,
    PeerGeneration, RemoteTrack,
};
use crate::relay::{LinkId, RelayConnector, RelayLink};

/// Collaborators and channels the controller is built from
pub struct ControllerParts {
    pub devices: Box<dyn MediaDevices>,
    pub peers: Box<dyn PeerConnectionFactory>,
    pub connector: Box<dyn RelayConnector>,
    /// Sending half of the channel passed to [`SessionController::run`]
    pub events: Sender<ClientEvent>,
    pub updates: Sender<ClientUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub struct SessionController {
    devices: Box<dyn MediaDevices>,
    peers: Box<dyn PeerConnectionFactory>,
    connector: Box<dyn RelayConnector>,
    events: Sender<ClientEvent>,
    updates: Sender<ClientUpdate>,

    peer_config: PeerConfig,
    constraints: MediaConstraints,
    auto_requeue: bool,

    state: NegotiationState,
    last_reason: Option<EndReason>,
    self_id: Option<String>,
    media: Option<Box<dyn LocalMedia>>,
    relay: Option<Box<dyn RelayLink>>,
    session: Option<SessionContext>,
    next_generation: PeerGeneration,
}

impl SessionController {
    pub fn new(parts: ControllerParts) -> Self {
        SessionController {
            devices: parts.devices,
            peers: parts.peers,
            connector: parts.connector,
            events: parts.events,
            updates: parts.updates,
            peer_config: PeerConfig::default(),
            constraints: MediaConstraints::default(),
            auto_requeue: false,
            state: NegotiationState::Idle,
            last_reason: None,
            self_id: None,
            media: None,
            relay: None,
            session: None,
            next_generation: 1,
        }
    }

    pub fn from_config(config: &ClientConfig, parts: ControllerParts) -> Self {
        Self::new(parts)
            .with_peer_config(config.peer_config())
            .with_constraints(config.media)
            .with_auto_requeue(config.auto_requeue)
    }

    pub fn with_peer_config(mut self, peer_config: PeerConfig) -> Self {
        self.peer_config = peer_config;
        self
    }

    pub fn with_constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_auto_requeue(mut self, auto_requeue: bool) -> Self {
        self.auto_requeue = auto_requeue;
        self
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn status(&self) -> Status {
        Status {
            state: self.state,
            reason: self.last_reason,
            partner: self.session.as_ref().map(|s| s.partner().to_string()),
        }
    }

    pub fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    pub fn has_relay(&self) -> bool {
        self.relay.is_some()
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    /// Handles events until `Shutdown` or until every sender is gone.
    ///
    /// The controller keeps its own sender for relay and peer callbacks, so
    /// in practice the loop ends on `Shutdown`.
    pub fn run(mut self, events: Receiver<ClientEvent>) {
        info!("Session controller started");
        for event in events.iter() {
            if self.handle_event(event) == Flow::Stop {
                break;
            }
        }
        self.teardown(EndReason::ManualEnd);
        info!("Session controller stopped");
    }

    /// Handles one event; returns false once the controller should stop
    pub fn dispatch(&mut self, event: ClientEvent) -> bool {
        self.handle_event(event) == Flow::Continue
    }

    fn handle_event(&mut self, event: ClientEvent) -> Flow {
        match event {
            ClientEvent::Command(command) => return self.handle_command(command),
            ClientEvent::Relay { link, message } => {
                if self.is_current_link(link) {
                    self.handle_relay_message(message);
                } else {
                    debug!(link, "Ignoring message from stale relay link");
                }
            }
            ClientEvent::RelayClosed { link, reason } => {
                if self.is_current_link(link) {
                    warn!(link, reason = %reason, "Relay connection lost");
                    // Nothing can be sent on a dead link
                    if let Some(mut relay) = self.relay.take() {
                        relay.close();
                    }
                    self.teardown(EndReason::RelayUnavailable);
                }
            }
            ClientEvent::Peer { generation, event } => {
                let current = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.is_current(generation));
                if current {
                    self.handle_peer_event(event);
                } else {
                    debug!(generation, "Ignoring event from stale peer connection");
                }
            }
        }
        Flow::Continue
    }

    fn is_current_link(&self, link: LinkId) -> bool {
        self.relay.as_ref().is_some_and(|r| r.id() == link)
    }

    // ===== Commands =====

    fn handle_command(&mut self, command: UserCommand) -> Flow {
        match command {
            UserCommand::Start => self.start(),
            UserCommand::End => {
                if self.state.is_live() {
                    self.teardown(EndReason::ManualEnd);
                }
            }
            UserCommand::ToggleMute => self.toggle_media(true),
            UserCommand::ToggleCamera => self.toggle_media(false),
            UserCommand::SendChat(text) => self.send_chat(text),
            UserCommand::SetAutoRequeue(enabled) => {
                info!(enabled, "Auto-requeue changed");
                self.auto_requeue = enabled;
            }
            UserCommand::Shutdown => {
                self.teardown(EndReason::ManualEnd);
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn start(&mut self) {
        if self.state.is_live() {
            debug!(state = ?self.state, "Start ignored, already running");
            return;
        }

        self.last_reason = None;
        self.set_state(NegotiationState::AcquiringMedia);

        match self.devices.acquire(&self.constraints) {
            Ok(media) => self.media = Some(media),
            Err(e) => {
                match &e {
                    MediaError::PermissionDenied(_) => warn!(error = %e, "Media permission denied"),
                    MediaError::DeviceUnavailable(_) => warn!(error = %e, "No usable media device"),
                }
                self.finish(EndReason::PermissionDenied);
                return;
            }
        }

        match self.connector.connect(self.events.clone()) {
            Ok(link) => {
                info!(link = link.id(), "Connected to relay");
                self.relay = Some(link);
            }
            Err(e) => {
                error!(error = %e, "Relay unavailable");
                self.teardown(EndReason::RelayUnavailable);
                return;
            }
        }

        self.join_queue();
    }

    fn join_queue(&mut self) {
        self.set_state(NegotiationState::Waiting);
        if !self.send(&Message::Join) {
            self.teardown(EndReason::RelayUnavailable);
        }
    }

    fn toggle_media(&mut self, audio: bool) {
        let Some(media) = self.media.as_deref_mut() else {
            debug!("No local media to toggle");
            return;
        };

        if audio {
            let enabled = !media.audio_enabled();
            media.set_audio_enabled(enabled);
        } else {
            let enabled = !media.video_enabled();
            media.set_video_enabled(enabled);
        }

        let update = ClientUpdate::MediaToggled {
            audio: media.audio_enabled(),
            video: media.video_enabled(),
        };
        self.publish(update);
    }

    fn send_chat(&mut self, text: String) {
        let Some(partner) = self.session.as_ref().map(|s| s.partner().to_string()) else {
            debug!("Chat ignored, no partner");
            return;
        };

        self.send(&Message::Chat(ChatMsg {
            to: partner,
            from: None,
            text,
        }));
    }

    // ===== Relay messages =====

    fn handle_relay_message(&mut self, message: Message) {
        match message {
            Message::Welcome(welcome) => {
                info!(visitor = %welcome.visitor_id, "Identity assigned by relay");
                self.self_id = Some(welcome.visitor_id);
            }
            Message::Waiting => debug!("Relay confirmed we are queued"),
            Message::Matched(matched) => self.on_matched(matched),
            Message::Signal(signal) => self.on_signal(signal),
            Message::PartnerLeft => {
                if self.session.is_some() {
                    info!("Partner left");
                    self.teardown(EndReason::PartnerLeft);
                } else {
                    debug!("Stale partner-left ignored");
                }
            }
            Message::Chat(chat) => self.on_chat(chat),
            Message::Error(err) => {
                warn!(code = err.code, message = %err.message, "Relay reported an error");
            }
            other @ (Message::Join | Message::Leave) => {
                warn!(message_type = ?other.message_type(), "Unexpected client message from relay");
            }
        }
    }

    fn on_matched(&mut self, matched: MatchedMsg) {
        if self.state != NegotiationState::Waiting {
            warn!(state = ?self.state, partner = %matched.partner_id, "Unexpected match ignored");
            return;
        }

        let role = resolve_role(&matched, self.self_id.as_deref());
        info!(partner = %matched.partner_id, role = ?role, "Matched");

        // The session exists server-side even if we cannot take part in it
        self.session = Some(SessionContext::new(
            matched.partner_id,
            role.unwrap_or(Role::Responder),
        ));
        self.set_state(NegotiationState::Matched);

        match role {
            Some(Role::Initiator) => {
                if let Err(e) = self.start_offer() {
                    error!(error = %e, "Failed to start offer");
                    self.teardown(EndReason::NegotiationFailed);
                }
            }
            Some(Role::Responder) => self.set_state(NegotiationState::Answering),
            None => {
                error!("Cannot decide initiator: no flag from relay and no own id");
                self.teardown(EndReason::NegotiationFailed);
            }
        }
    }

    fn start_offer(&mut self) -> Result<(), PeerError> {
        self.create_peer()?;
        let offer = {
            let peer = self.current_peer()?;
            let offer = peer.create_offer()?;
            peer.set_local_description(&offer)?;
            offer
        };
        self.set_state(NegotiationState::Offering);
        self.send_payload(&NegotiationPayload::Description(offer));
        Ok(())
    }

    fn on_signal(&mut self, signal: SignalMsg) {
        let Some(partner) = self.session.as_ref().map(|s| s.partner().to_string()) else {
            debug!("Signal outside a session ignored");
            return;
        };
        if signal.from.as_deref().is_some_and(|from| from != partner) {
            debug!(from = ?signal.from, "Signal from former partner ignored");
            return;
        }

        match NegotiationPayload::from_value(&signal.data) {
            Ok(NegotiationPayload::Description(description)) => match description.sdp_type {
                SdpType::Offer => self.on_offer(description),
                SdpType::Answer => self.on_answer(description),
            },
            Ok(NegotiationPayload::Candidate(candidate)) => self.on_remote_candidate(candidate),
            Err(e @ PayloadError::MalformedDescription(_)) => {
                error!(error = %e, "Unusable session description");
                self.teardown(EndReason::NegotiationFailed);
            }
            Err(e @ PayloadError::MalformedCandidate(_)) => {
                warn!(error = %e, "Skipping candidate");
            }
            Err(PayloadError::Unrecognized) => debug!("Unrecognized signal payload dropped"),
        }
    }

    fn on_offer(&mut self, offer: SessionDescription) {
        match self.state {
            NegotiationState::Answering => {
                if let Err(e) = self.answer_offer(&offer) {
                    error!(error = %e, "Failed to answer offer");
                    self.teardown(EndReason::NegotiationFailed);
                }
            }
            NegotiationState::Offering | NegotiationState::Connected => {
                warn!(state = ?self.state, "Offer received in a state that cannot take one");
                self.teardown(EndReason::NegotiationFailed);
            }
            state => debug!(state = ?state, "Offer ignored"),
        }
    }

    fn answer_offer(&mut self, offer: &SessionDescription) -> Result<(), PeerError> {
        if !self.session.as_ref().is_some_and(|s| s.has_peer()) {
            self.create_peer()?;
        }

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| PeerError::Apply("no session".to_string()))?;
        let replayed = session.apply_remote_description(offer)?;
        debug!(replayed, "Offer applied");

        let answer = {
            let peer = self.current_peer()?;
            let answer = peer.create_answer()?;
            peer.set_local_description(&answer)?;
            answer
        };
        self.send_payload(&NegotiationPayload::Description(answer));
        Ok(())
    }

    fn on_answer(&mut self, answer: SessionDescription) {
        if self.state != NegotiationState::Offering {
            debug!(state = ?self.state, "Answer ignored");
            return;
        }

        let result = match self.session.as_mut() {
            Some(session) => session.apply_remote_description(&answer),
            None => return,
        };

        match result {
            Ok(replayed) => {
                debug!(replayed, "Answer applied");
                self.set_state(NegotiationState::Connected);
            }
            Err(e) => {
                error!(error = %e, "Failed to apply answer");
                self.teardown(EndReason::NegotiationFailed);
            }
        }
    }

    fn on_remote_candidate(&mut self, candidate: IceCandidate) {
        if let Some(session) = self.session.as_mut() {
            match session.add_remote_candidate(candidate) {
                CandidateOutcome::Buffered => {
                    debug!(pending = session.pending_candidates(), "Candidate buffered")
                }
                CandidateOutcome::Applied | CandidateOutcome::Skipped => {}
            }
        }
    }

    fn on_chat(&mut self, chat: ChatMsg) {
        let from_partner = match (&self.session, &chat.from) {
            (Some(session), Some(from)) => session.partner() == from,
            _ => false,
        };
        if !from_partner {
            debug!("Chat from non-partner ignored");
            return;
        }

        let from = chat.from.unwrap_or_default();
        self.publish(ClientUpdate::Chat {
            from,
            text: chat.text,
        });
    }

    // ===== Peer events =====

    fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::LocalCandidate(candidate) => {
                self.send_payload(&NegotiationPayload::Candidate(candidate));
            }
            PeerEvent::RemoteTrack(track) => self.on_remote_track(track),
            PeerEvent::ConnectionState(state) => {
                debug!(peer_state = ?state, "Peer connection state changed");
                if state == PeerConnectionState::Connected {
                    self.mark_connected();
                } else if state.is_fatal() && self.state.in_session() {
                    warn!(peer_state = ?state, "Peer connection lost");
                    self.teardown(EndReason::PeerDisconnected);
                }
            }
        }
    }

    fn on_remote_track(&mut self, track: RemoteTrack) {
        if let Some(session) = self.session.as_mut() {
            session.add_remote_track(track.clone());
        }
        self.publish(ClientUpdate::RemoteTrack(track));
        self.mark_connected();
    }

    fn mark_connected(&mut self) {
        if self.state == NegotiationState::Answering {
            self.set_state(NegotiationState::Connected);
        }
    }

    // ===== Teardown =====

    /// Ends the current attempt; safe to call any number of times.
    ///
    /// Sends `leave` when the server still considers us paired or queued,
    /// closes the peer connection, releases remote media and then either
    /// re-enters the queue (auto mode, partner-side departures) or releases
    /// media and relay and rests in `Ended`.
    pub fn teardown(&mut self, reason: EndReason) {
        if !self.state.is_live() {
            return;
        }
        info!(reason = %reason, state = ?self.state, "Tearing down");

        let in_session = self.session.is_some();
        let release_server = match reason {
            EndReason::ManualEnd => true,
            EndReason::PeerDisconnected | EndReason::NegotiationFailed => in_session,
            EndReason::PartnerLeft
            | EndReason::RelayUnavailable
            | EndReason::PermissionDenied => false,
        };
        if release_server && self.relay.is_some() {
            self.send(&Message::Leave);
        }

        if let Some(mut session) = self.session.take() {
            session.close();
            self.publish(ClientUpdate::RemoteMediaReleased);
        }

        let can_requeue = self.auto_requeue
            && reason.allows_requeue()
            && self.media.is_some()
            && self.relay.is_some();
        if can_requeue {
            info!(reason = %reason, "Re-entering the queue");
            self.last_reason = Some(reason);
            self.join_queue();
            return;
        }

        self.finish(reason);
    }

    /// Releases everything and rests in `Ended`
    fn finish(&mut self, reason: EndReason) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        if let Some(mut media) = self.media.take() {
            media.stop();
        }
        if let Some(mut relay) = self.relay.take() {
            relay.close();
        }
        self.self_id = None;
        self.last_reason = Some(reason);
        self.set_state(NegotiationState::Ended);
    }

    // ===== Helpers =====

    fn create_peer(&mut self) -> Result<(), PeerError> {
        let media = self
            .media
            .as_deref()
            .ok_or_else(|| PeerError::Create("no local media".to_string()))?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| PeerError::Create("no session".to_string()))?;

        let generation = self.next_generation;
        self.next_generation += 1;

        let sink = PeerEventSink::new(generation, self.events.clone());
        let peer = self.peers.create(&self.peer_config, sink, media)?;
        session.attach_peer(peer, generation);
        debug!(generation, "Peer connection created");
        Ok(())
    }

    fn current_peer(
        &mut self,
    ) -> Result<&mut (dyn crate::peer::PeerConnection + 'static), PeerError> {
        self.session
            .as_mut()
            .and_then(|s| s.peer_mut())
            .ok_or_else(|| PeerError::Create("no peer connection".to_string()))
    }

    fn send_payload(&mut self, payload: &NegotiationPayload) {
        let Some(partner) = self.session.as_ref().map(|s| s.partner().to_string()) else {
            return;
        };
        match payload.to_value() {
            Ok(data) => {
                debug!(kind = ?payload.kind(), "Sending negotiation payload");
                self.send(&Message::Signal(SignalMsg::to_partner(partner, data)));
            }
            Err(e) => error!(error = %e, "Failed to encode negotiation payload"),
        }
    }

    /// Returns false if there is no relay or the write failed
    fn send(&mut self, message: &Message) -> bool {
        let Some(relay) = self.relay.as_mut() else {
            return false;
        };
        match relay.send(message) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, message_type = ?message.message_type(), "Relay send failed");
                false
            }
        }
    }

    fn set_state(&mut self, state: NegotiationState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "State transition");
        }
        self.state = state;
        let status = self.status();
        self.publish(ClientUpdate::Status(status));
    }

    fn publish(&self, update: ClientUpdate) {
        // Observer may be gone; the session keeps going without one
        let _ = self.updates.send(update);
    }
}
