//! Loopback helpers: a real relay on an ephemeral port and a blocking test client.

#![allow(dead_code)]

use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use signal_protocol::{Message, read_message, write_message};
use strangerlink_server::{Storage, TcpServer};

pub fn start_server() -> SocketAddr {
    start_server_with(TcpServer::new(Storage::new()).with_read_timeout(Duration::from_millis(20)))
}

pub fn start_server_with(server: TcpServer) -> SocketAddr {
    let bound = server.bind("127.0.0.1:0").expect("bind relay");
    let addr = bound.local_addr().expect("local addr");
    thread::spawn(move || {
        let _ = bound.serve();
    });
    addr
}

pub struct TestClient {
    stream: TcpStream,
    pub visitor_id: String,
}

impl TestClient {
    /// Connects and consumes the welcome frame
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set timeout");
        let mut client = TestClient {
            stream,
            visitor_id: String::new(),
        };
        match client.recv() {
            Message::Welcome(w) => client.visitor_id = w.visitor_id,
            other => panic!("Expected welcome, got {:?}", other),
        }
        client
    }

    pub fn send(&mut self, message: &Message) {
        write_message(&mut self.stream, message).expect("send");
    }

    pub fn recv(&mut self) -> Message {
        read_message(&mut self.stream).expect("recv")
    }

    /// Asserts nothing arrives within `window`
    pub fn expect_silence(&mut self, window: Duration) {
        self.stream
            .set_read_timeout(Some(window))
            .expect("set timeout");
        let result = read_message(&mut self.stream);
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set timeout");
        match result {
            Err(e) if e.is_timeout() => {}
            other => panic!("Expected silence, got {:?}", other),
        }
    }

    pub fn join_and_wait(&mut self) {
        self.send(&Message::Join);
        assert_eq!(self.recv(), Message::Waiting);
    }
}

/// Polls `condition` until it holds or two seconds pass
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
