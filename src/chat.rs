//! Conversational Q&A grounded in a transcript.
//!
//! Conversation state lives in a [`ChatSession`] owned by the caller and
//! passed into every call. The HTTP server keeps one per client-supplied
//! session id in a [`SessionStore`].

use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatTurn, Completer};
use crate::transcript::{format_for_context, TranscriptSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Maximum number of turns kept in a session.
pub const MAX_HISTORY_TURNS: usize = 20;

/// Context shown to the model when no transcript can be loaded.
const NO_TRANSCRIPT: &str = "No transcript available.";

/// Conversation history for one chat session.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    id: String,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Clear conversation history.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, question: &str, answer: &str) {
        self.history.push(ChatTurn::user(question));
        self.history.push(ChatTurn::assistant(answer));
        if self.history.len() > MAX_HISTORY_TURNS {
            let excess = self.history.len() - MAX_HISTORY_TURNS;
            self.history.drain(..excess);
        }
    }
}

/// Default number of sessions kept by a [`SessionStore`].
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct StoredSession {
    session: Arc<Mutex<ChatSession>>,
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<String, StoredSession>,
    clock: u64,
}

/// In-memory sessions keyed by session id. Lost on restart.
///
/// Holds at most `capacity` sessions; opening a new one past that evicts the
/// least recently used.
pub struct SessionStore {
    sessions: Mutex<Sessions>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            capacity: capacity.max(1),
        }
    }

    /// Get the session for `id`, creating it on first use.
    pub async fn session(&self, id: &str) -> Arc<Mutex<ChatSession>> {
        let mut sessions = self.sessions.lock().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if let Some(stored) = sessions.entries.get_mut(id) {
            stored.last_used = now;
            return stored.session.clone();
        }

        if sessions.entries.len() >= self.capacity {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, stored)| stored.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                debug!("Evicting chat session {}", key);
                sessions.entries.remove(&key);
            }
        }

        let session = Arc::new(Mutex::new(ChatSession::new(id)));
        sessions.entries.insert(
            id.to_string(),
            StoredSession {
                session: session.clone(),
                last_used: now,
            },
        );
        session
    }
}

/// Answers questions about a transcript.
pub struct ChatEngine {
    transcripts: Arc<dyn TranscriptSource>,
    completer: Arc<dyn Completer>,
    prompts: Prompts,
}

impl ChatEngine {
    pub fn new(transcripts: Arc<dyn TranscriptSource>, completer: Arc<dyn Completer>) -> Self {
        Self {
            transcripts,
            completer,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer `message` within `session`, recording the exchange on success.
    ///
    /// A missing transcript is not an error: the model is told none is available.
    #[instrument(skip(self, session), fields(session = %session.id()))]
    pub async fn ask(
        &self,
        session: &mut ChatSession,
        message: &str,
        transcript_id: Option<&str>,
    ) -> Result<String> {
        info!("Chat message: {}", message);

        let context = match self.transcripts.fetch(transcript_id) {
            Ok(chunks) if !chunks.is_empty() => format_for_context(&chunks),
            Ok(_) => NO_TRANSCRIPT.to_string(),
            Err(e) => {
                warn!("Chatting without transcript: {}", e);
                NO_TRANSCRIPT.to_string()
            }
        };

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        let system = self.prompts.render_with_custom(&self.prompts.chat.system, &vars);

        let mut turns = session.history().to_vec();
        turns.push(ChatTurn::user(message));

        let answer = self.completer.converse(&system, &turns).await?;
        session.record(message, &answer);

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClipscoutError;
    use crate::transcript::TranscriptChunk;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct OneChunk(bool);

    impl TranscriptSource for OneChunk {
        fn fetch(&self, _id: Option<&str>) -> Result<Vec<TranscriptChunk>> {
            if self.0 {
                Ok(vec![TranscriptChunk::new(135.0, 155.0, "Pricing starts at ten dollars.")])
            } else {
                Err(ClipscoutError::TranscriptUnavailable("none".to_string()))
            }
        }
    }

    /// Records the prompts it receives and answers with a counter.
    #[derive(Default)]
    struct Recorder {
        prompts: StdMutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Completer for Recorder {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if self.fail {
                return Err(ClipscoutError::LlmService("down".to_string()));
            }
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("answer {}", prompts.len()))
        }
    }

    #[tokio::test]
    async fn test_answer_uses_transcript_and_history() {
        let llm = Arc::new(Recorder::default());
        let engine = ChatEngine::new(Arc::new(OneChunk(true)), llm.clone());
        let mut session = ChatSession::new("s1");

        let first = engine.ask(&mut session, "How much is it?", None).await.unwrap();
        let second = engine.ask(&mut session, "Say that again", None).await.unwrap();

        assert_eq!(first, "answer 1");
        assert_eq!(second, "answer 2");
        assert_eq!(session.history().len(), 4);

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("[02:15] Pricing starts at ten dollars."));
        assert!(prompts[1].contains("User: How much is it?\n\nAssistant: answer 1\n\nUser: Say that again"));
    }

    #[tokio::test]
    async fn test_missing_transcript_still_answers() {
        let llm = Arc::new(Recorder::default());
        let engine = ChatEngine::new(Arc::new(OneChunk(false)), llm.clone());
        let mut session = ChatSession::new("s1");

        engine.ask(&mut session, "Hello?", None).await.unwrap();
        assert!(llm.prompts.lock().unwrap()[0].contains(NO_TRANSCRIPT));
    }

    #[tokio::test]
    async fn test_failure_leaves_history_untouched() {
        let llm = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let engine = ChatEngine::new(Arc::new(OneChunk(true)), llm);
        let mut session = ChatSession::new("s1");

        assert!(engine.ask(&mut session, "Hello?", None).await.is_err());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        let mut session = ChatSession::new("s1");
        for i in 0..15 {
            session.record(&format!("q{}", i), &format!("a{}", i));
        }

        assert_eq!(session.history().len(), MAX_HISTORY_TURNS);
        assert_eq!(session.history()[0], ChatTurn::user("q5"));
        assert_eq!(session.history().last(), Some(&ChatTurn::assistant("a14")));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::default();

        store.session("a").await.lock().await.record("q", "a");
        assert_eq!(store.session("a").await.lock().await.history().len(), 2);
        assert!(store.session("b").await.lock().await.history().is_empty());
        assert_eq!(store.sessions.lock().await.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_store_evicts_least_recently_used() {
        let store = SessionStore::with_capacity(3);

        for id in ["a", "b", "c"] {
            store.session(id).await.lock().await.record("q", "a");
        }
        // Touch "a" so "b" becomes the oldest.
        store.session("a").await;
        store.session("d").await;

        {
            let sessions = store.sessions.lock().await;
            let mut ids: Vec<&str> = sessions.entries.keys().map(String::as_str).collect();
            ids.sort();
            assert_eq!(ids, vec!["a", "c", "d"]);
        }
        assert_eq!(store.session("a").await.lock().await.history().len(), 2);

        for i in 0..50 {
            store.session(&format!("client-{}", i)).await;
        }
        assert_eq!(store.sessions.lock().await.entries.len(), 3);
    }
}
