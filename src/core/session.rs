//! In-memory session store: one in-flight request per chat user.
//!
//! A session links a user to the URL they sent, the scratch directory
//! yt-dlp works in and the state of the request. Nothing is persisted; a
//! restart forgets every session and the hourly sweep removes whatever
//! directories they left behind.
//!
//! # Concurrency policy
//!
//! Handlers for the same user may run concurrently, so every mutation goes
//! through [`SessionManager`]:
//!
//! - A new URL while the user's request is probing or downloading is
//!   rejected ([`BeginOutcome::Busy`]).
//! - A new URL while the quality menu is shown replaces the old session
//!   (last writer wins) and hands the replaced one back for cleanup.
//! - Each `begin` stamps a fresh generation. Later transitions carry the
//!   generation they started with and are ignored once the entry has been
//!   cancelled or replaced, so a slow flow can never write into somebody
//!   else's session.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::core::metrics;
use crate::core::validation::Platform;
use crate::telegram::keyboard::UrlRef;

/// Chat user identifier as used by the Bot API.
pub type UserKey = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// Scratch dir created, `yt-dlp -F` running
    Probing,
    /// Quality menu shown, waiting for a button press
    AwaitingSelection,
    /// `yt-dlp` download or upload in progress
    Downloading,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub url: String,
    pub scratch_dir: PathBuf,
    pub platform: Platform,
    /// Output of the format listing. Advisory only: the menu is fixed.
    pub format_lines: Vec<String>,
    pub state: SessionState,
    pub generation: u64,
}

/// Handle a flow keeps to prove it still owns the session it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub user: UserKey,
    pub generation: u64,
}

#[derive(Debug)]
pub enum BeginOutcome {
    /// Session created. `replaced` holds a session that was awaiting selection.
    Started { ticket: Ticket, replaced: Option<Session> },
    /// The user already has a request probing or downloading.
    Busy(SessionState),
}

#[derive(Debug)]
pub enum ClaimOutcome {
    /// Moved to `Downloading`; the session snapshot drives the download.
    Claimed { ticket: Ticket, session: Session },
    /// Same request is already downloading.
    InProgress,
    /// No session, or the button belongs to an older request.
    Expired,
}

#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<UserKey, Session>,
    next_generation: AtomicU64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request in the `Probing` state.
    pub fn begin(&self, user: UserKey, url: &str, platform: Platform, scratch_dir: PathBuf) -> BeginOutcome {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Session {
            url: url.to_string(),
            scratch_dir,
            platform,
            format_lines: Vec::new(),
            state: SessionState::Probing,
            generation,
        };

        let outcome = match self.sessions.entry(user) {
            Entry::Occupied(mut occupied) => match occupied.get().state {
                SessionState::Probing | SessionState::Downloading => BeginOutcome::Busy(occupied.get().state),
                SessionState::AwaitingSelection => {
                    let replaced = occupied.insert(session);
                    BeginOutcome::Started {
                        ticket: Ticket { user, generation },
                        replaced: Some(replaced),
                    }
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(session);
                BeginOutcome::Started {
                    ticket: Ticket { user, generation },
                    replaced: None,
                }
            }
        };
        self.publish_gauge();
        outcome
    }

    /// `Probing → AwaitingSelection`. Returns false if the ticket is stale.
    pub fn commit_probe(&self, ticket: Ticket, format_lines: Vec<String>) -> bool {
        match self.sessions.get_mut(&ticket.user) {
            Some(mut session) if session.generation == ticket.generation && session.state == SessionState::Probing => {
                session.format_lines = format_lines;
                session.state = SessionState::AwaitingSelection;
                true
            }
            _ => false,
        }
    }

    /// `AwaitingSelection → Downloading` when the button refers to the current URL.
    pub fn claim_for_download(&self, user: UserKey, url_ref: &UrlRef) -> ClaimOutcome {
        match self.sessions.get_mut(&user) {
            Some(mut session) if url_ref.matches(&session.url) => match session.state {
                SessionState::AwaitingSelection => {
                    session.state = SessionState::Downloading;
                    ClaimOutcome::Claimed {
                        ticket: Ticket {
                            user,
                            generation: session.generation,
                        },
                        session: session.clone(),
                    }
                }
                SessionState::Downloading => ClaimOutcome::InProgress,
                SessionState::Probing => ClaimOutcome::Expired,
            },
            _ => ClaimOutcome::Expired,
        }
    }

    /// Ends the session owned by `ticket`. Returns it if the ticket was current.
    pub fn finish(&self, ticket: Ticket) -> Option<Session> {
        let removed = self
            .sessions
            .remove_if(&ticket.user, |_, session| session.generation == ticket.generation)
            .map(|(_, session)| session);
        self.publish_gauge();
        removed
    }

    /// Whether `ticket` still owns the user's session.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.sessions
            .get(&ticket.user)
            .map(|session| session.generation == ticket.generation)
            .unwrap_or(false)
    }

    /// Removes the user's session in any state. Running subprocesses are left alone.
    pub fn cancel(&self, user: UserKey) -> Option<Session> {
        let removed = self.sessions.remove(&user).map(|(_, session)| session);
        self.publish_gauge();
        removed
    }

    pub fn get(&self, user: UserKey) -> Option<Session> {
        self.sessions.get(&user).map(|session| session.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn publish_gauge(&self) {
        metrics::ACTIVE_SESSIONS.set(self.sessions.len() as i64);
    }
}
