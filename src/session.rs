use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::{ChatClient, ChatError, ChunkStream};
use crate::decode::StreamDecoder;
use crate::message::{Conversation, Message, reconcile};

/// Fixed assistant reply shown when an exchange fails.
pub const ERROR_REPLY: &str =
    "Sorry, something went wrong while handling your request. Please try again later.";

/// Events emitted while an exchange runs. Cancellation emits nothing: an
/// aborted or superseded exchange ends silently.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Exchange started; show a thinking indicator until `Answering`.
    Thinking { trace_id: Uuid },
    /// First chunk arrived; the growing message is the indicator from here.
    Answering { trace_id: Uuid },
    /// Newly decoded response text (the conversation already reflects it).
    Delta { trace_id: Uuid, text: String },
    /// Stream finished normally.
    Done { trace_id: Uuid },
    /// Exchange failed; the error reply has been reconciled in.
    Failed { trace_id: Uuid },
}

/// One in-flight chat call: the cancellation token and the trace id it
/// belongs to. At most one handle is live per session.
struct RequestHandle {
    trace_id: Uuid,
    cancel: CancellationToken,
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

/// Drives one chat exchange at a time and keeps the conversation's last
/// assistant message consistent with everything received so far.
///
/// Submitting while a stream is active supersedes it: the old exchange is
/// cancelled before the new one may touch the conversation, so content from
/// two exchanges never interleaves.
pub struct ChatSession {
    client: ChatClient,
    conversation: Arc<Mutex<Conversation>>,
    /// Trace id of the exchange currently allowed to mutate the
    /// conversation. Doubles as the busy flag.
    active: Arc<Mutex<Option<Uuid>>>,
    current: Option<RequestHandle>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ChatSession {
    pub fn new(client: ChatClient) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            client,
            conversation: Arc::new(Mutex::new(Vec::new())),
            active: Arc::new(Mutex::new(None)),
            current: None,
            events,
        };
        (session, rx)
    }

    /// Start a new exchange. Empty or whitespace-only input is a no-op. An
    /// exchange still in flight is cancelled before the new one begins.
    ///
    /// The user message is appended synchronously, before any network
    /// activity; the response streams in on a background task.
    pub fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        // Supersede: the old token is cancelled before the new exchange
        // exists, so a late chunk from the stale request never lands.
        if let Some(previous) = self.current.take() {
            previous.cancel.cancel();
        }

        let trace_id = Uuid::new_v4();
        *self.active.lock() = Some(trace_id);
        self.conversation.lock().push(Message::user(trace_id, text));
        let _ = self.events.send(SessionEvent::Thinking { trace_id });

        let cancel = CancellationToken::new();
        let exchange = Exchange {
            client: self.client.clone(),
            conversation: Arc::clone(&self.conversation),
            active: Arc::clone(&self.active),
            events: self.events.clone(),
            trace_id,
            cancel: cancel.clone(),
        };
        let question = text.to_string();
        let task = tokio::spawn(async move { exchange.run(&question).await });

        self.current = Some(RequestHandle {
            trace_id,
            cancel,
            task,
        });
    }

    /// Abort the in-flight exchange, if any. Silent: no message is appended
    /// and no error surfaces.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel.cancel();
            let mut active = self.active.lock();
            if *active == Some(previous.trace_id) {
                *active = None;
            }
        }
    }

    /// True from submit until the exchange completes, fails or is cancelled.
    pub fn is_busy(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Snapshot of the conversation, oldest message first.
    pub fn conversation(&self) -> Conversation {
        self.conversation.lock().clone()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        // Teardown must not leave a task writing to the conversation.
        if let Some(handle) = &self.current {
            handle.cancel.cancel();
        }
    }
}

/// State owned by one exchange task.
struct Exchange {
    client: ChatClient,
    conversation: Arc<Mutex<Conversation>>,
    active: Arc<Mutex<Option<Uuid>>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    trace_id: Uuid,
    cancel: CancellationToken,
}

impl Exchange {
    async fn run(self, question: &str) {
        // Biased: an abort must win over a ready response.
        let stream = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            result = self.client.ask(question) => match result {
                Ok(stream) => stream,
                Err(err) => {
                    self.fail(err);
                    return;
                }
            },
        };

        if let Err(err) = self.pump(stream).await {
            self.fail(err);
        }
    }

    /// Consume the response body chunk by chunk, reconciling after each one.
    /// Returns early and silently when cancelled.
    async fn pump(&self, mut stream: ChunkStream) -> Result<(), ChatError> {
        let mut decoder = StreamDecoder::new();
        let mut buffer = String::new();
        let mut first_chunk = true;

        loop {
            // Biased: once cancelled, no further chunk is processed even
            // if one is already buffered.
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if first_chunk {
                        first_chunk = false;
                        let _ = self.events.send(SessionEvent::Answering {
                            trace_id: self.trace_id,
                        });
                    }
                    // A chunk may end mid-character and decode to nothing;
                    // the assistant message is only created once there is
                    // actual text.
                    let text = decoder.decode(&chunk);
                    if !text.is_empty() {
                        buffer.push_str(&text);
                        if !self.apply(&buffer) {
                            return Ok(());
                        }
                        let _ = self.events.send(SessionEvent::Delta {
                            trace_id: self.trace_id,
                            text,
                        });
                    }
                }
                Some(Err(err)) => return Err(err),
                None => break,
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            buffer.push_str(&tail);
            if !self.apply(&buffer) {
                return Ok(());
            }
        }

        self.complete();
        Ok(())
    }

    /// Reconcile under the active-exchange guard. Returns false when this
    /// exchange has been superseded and must stop.
    fn apply(&self, accumulated: &str) -> bool {
        let active = self.active.lock();
        if *active != Some(self.trace_id) {
            log::debug!("exchange {} superseded, dropping chunk", self.trace_id);
            return false;
        }
        reconcile(&mut self.conversation.lock(), self.trace_id, accumulated);
        true
    }

    fn complete(&self) {
        let mut active = self.active.lock();
        if *active == Some(self.trace_id) {
            *active = None;
            let _ = self.events.send(SessionEvent::Done {
                trace_id: self.trace_id,
            });
        }
    }

    fn fail(&self, err: ChatError) {
        log::warn!("chat exchange {} failed: {err}", self.trace_id);
        let mut active = self.active.lock();
        if *active != Some(self.trace_id) {
            return;
        }
        // One error reply per trace id, replacing any partial answer.
        reconcile(&mut self.conversation.lock(), self.trace_id, ERROR_REPLY);
        *active = None;
        let _ = self.events.send(SessionEvent::Failed {
            trace_id: self.trace_id,
        });
    }
}
