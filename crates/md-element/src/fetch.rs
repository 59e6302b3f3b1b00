//! Asynchronous fetch carrier.
//!
//! A fetch runs [`Transport::send`] on a worker thread and hands the result
//! back over a channel. The owner polls for completion on its own thread.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::transport::{FetchRequest, FetchResponse, Transport, TransportError};

/// Progress of the current fetch carrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    /// No request has been sent.
    Unsent,
    /// Request sent, response pending.
    Opened,
    /// Response (or failure) delivered.
    Done,
}

/// Finished fetch.
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) url: String,
    pub(crate) result: Result<FetchResponse, TransportError>,
}

struct InFlight {
    url: String,
    rx: Receiver<Result<FetchResponse, TransportError>>,
}

/// Owns the transport and at most one in-flight request.
pub(crate) struct Fetcher {
    transport: Arc<dyn Transport>,
    in_flight: Option<InFlight>,
    state: ReadyState,
}

impl Fetcher {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            in_flight: None,
            state: ReadyState::Unsent,
        }
    }

    pub(crate) fn state(&self) -> ReadyState {
        self.state
    }

    /// URL of the in-flight request.
    pub(crate) fn pending_url(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.url.as_str())
    }

    /// Start fetching `url`.
    ///
    /// Returns `false` without doing anything while another request is in
    /// flight. The running request is not cancelled.
    pub(crate) fn start(&mut self, url: &str) -> bool {
        if self.state == ReadyState::Opened {
            debug!(
                url,
                pending = self.pending_url().unwrap_or_default(),
                "Refusing fetch: request already in flight"
            );
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        let request = FetchRequest::markdown(url);

        info!(url, "Requesting markdown source");
        let spawned = thread::Builder::new()
            .name("md-fetch".to_owned())
            .spawn(move || {
                let result = transport.send(&request);
                // Receiver may be gone if the element was dropped.
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            // Sender was dropped with the closure; completion reports Disconnected.
            warn!(url, error = %e, "Failed to spawn fetch worker");
        }

        self.in_flight = Some(InFlight {
            url: url.to_owned(),
            rx,
        });
        self.state = ReadyState::Opened;
        true
    }

    /// Take the completion if the worker has finished.
    pub(crate) fn try_complete(&mut self) -> Option<Completion> {
        let in_flight = self.in_flight.as_ref()?;
        let result = match in_flight.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        };
        Some(self.finish(result))
    }

    /// Block until the in-flight request completes.
    pub(crate) fn wait(&mut self) -> Option<Completion> {
        let in_flight = self.in_flight.as_ref()?;
        let result = in_flight
            .rx
            .recv()
            .unwrap_or(Err(TransportError::Disconnected));
        Some(self.finish(result))
    }

    fn finish(&mut self, result: Result<FetchResponse, TransportError>) -> Completion {
        let url = self
            .in_flight
            .take()
            .map(|f| f.url)
            .unwrap_or_default();
        self.state = ReadyState::Done;
        Completion { url, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::sync::Mutex;

    /// Transport that blocks until released.
    struct GatedTransport {
        gate: Mutex<Receiver<()>>,
    }

    impl Transport for GatedTransport {
        fn send(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
            self.gate.lock().unwrap().recv().unwrap();
            Ok(FetchResponse {
                status: 200,
                body: request.url.clone(),
            })
        }
    }

    #[test]
    fn test_initial_state() {
        let fetcher = Fetcher::new(Arc::new(MockTransport::new()));
        assert_eq!(fetcher.state(), ReadyState::Unsent);
        assert_eq!(fetcher.pending_url(), None);
    }

    #[test]
    fn test_fetch_completes() {
        let transport = MockTransport::new().with_response("a.md", 200, "# A");
        let mut fetcher = Fetcher::new(Arc::new(transport));

        assert!(fetcher.start("a.md"));
        assert_eq!(fetcher.state(), ReadyState::Opened);

        let completion = fetcher.wait().unwrap();
        assert_eq!(completion.url, "a.md");
        assert_eq!(completion.result.unwrap().body, "# A");
        assert_eq!(fetcher.state(), ReadyState::Done);
        assert!(fetcher.wait().is_none());
        assert!(fetcher.try_complete().is_none());
    }

    #[test]
    fn test_sends_accept_header() {
        let transport = Arc::new(MockTransport::new());
        let mut fetcher = Fetcher::new(Arc::clone(&transport) as Arc<dyn Transport>);
        fetcher.start("https://example.com/a.md");
        fetcher.wait();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("Accept"), Some("text/markdown"));
    }

    #[test]
    fn test_refuses_while_in_flight() {
        let (release, gate) = mpsc::channel();
        let transport = GatedTransport {
            gate: Mutex::new(gate),
        };
        let mut fetcher = Fetcher::new(Arc::new(transport));

        assert!(fetcher.start("first.md"));
        assert!(!fetcher.start("second.md"));
        assert_eq!(fetcher.pending_url(), Some("first.md"));
        assert!(fetcher.try_complete().is_none());

        release.send(()).unwrap();
        let completion = fetcher.wait().unwrap();
        assert_eq!(completion.result.unwrap().body, "first.md");

        // A finished carrier is replaced by a fresh one.
        assert!(fetcher.start("third.md"));
        release.send(()).unwrap();
        assert_eq!(fetcher.wait().unwrap().url, "third.md");
    }

    #[test]
    fn test_try_complete_eventually_returns() {
        let transport = MockTransport::new().with_response("a.md", 200, "x");
        let mut fetcher = Fetcher::new(Arc::new(transport));
        fetcher.start("a.md");

        let completion = loop {
            if let Some(c) = fetcher.try_complete() {
                break c;
            }
            thread::yield_now();
        };
        assert_eq!(completion.result.unwrap().status, 200);
    }
}
