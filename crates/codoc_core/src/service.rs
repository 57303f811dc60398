//! The document service: command routing and the single-queue loop.
//!
//! One service instance owns one [`Document`]. Every input - network
//! commands, session attach/detach, watcher notifications, shutdown - goes
//! through a single ordered queue and runs to completion before the next is
//! considered, so edits from different sessions and reconciled filesystem
//! changes are serialized without locks. History order is arrival order, and
//! the version counter is its proof.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use tokio::sync::{broadcast, mpsc};

use crate::config::ServiceConfig;
use crate::cursor::Cursor;
use crate::diff::diff_ops;
use crate::document::Document;
use crate::error::{CodocError, Result};
use crate::fs::FileSystem;
use crate::op::{checksum, Author, EditStep, GHOSTWRITER_USER_ID, UNKNOWN_USER_ID};
use crate::protocol::{Command, Outbound, OutboundMessage, StatusSnapshot};
use crate::session::{SessionId, SessionMap, Target, UserInfo};
use crate::watch::{FileWatcher, WatchEvent};

/// Messages delivered to a document service, in arrival order.
///
/// Network-origin and reconciliation-origin inputs share this one queue;
/// that is the whole concurrency model.
#[derive(Debug)]
pub enum ServiceMessage {
    /// A session joined: register its outbound queue and resolved identity.
    Attach {
        /// The joining session.
        session: SessionId,
        /// Identity resolved by the transport, cached for edit attribution.
        user: UserInfo,
        /// Where to deliver this session's outbound events.
        sender: mpsc::UnboundedSender<OutboundMessage>,
    },

    /// A session left.
    Detach {
        /// The leaving session.
        session: SessionId,
    },

    /// A command from a connected session.
    Command {
        /// The sending session.
        session: SessionId,
        /// Request reference, echoed on replies.
        reference: Option<String>,
        /// The command itself.
        command: Command,
    },

    /// The watcher observed a change to the linked file.
    FileChanged {
        /// Path the watcher reported (the linked path is re-read either way).
        path: PathBuf,
    },

    /// Stop the service loop.
    Shutdown,
}

/// The per-document command processor.
///
/// # Example
///
/// ```ignore
/// use codoc_core::config::ServiceConfig;
/// use codoc_core::fs::RealFileSystem;
/// use codoc_core::service::{DocumentService, ServiceMessage};
/// use tokio::sync::mpsc;
///
/// let (tx, rx) = mpsc::unbounded_channel();
/// let service = DocumentService::new(RealFileSystem, ServiceConfig::default(), tx.clone());
/// tokio::spawn(service.run(rx));
///
/// // The transport now feeds ServiceMessage values through `tx`.
/// ```
pub struct DocumentService<FS> {
    document: Document,
    sessions: SessionMap,
    users: HashMap<SessionId, UserInfo>,
    fs: FS,
    config: ServiceConfig,
    watcher: Option<FileWatcher>,
    /// Handle to the service's own queue, used to feed watcher notifications
    /// back into the serialized path.
    queue: mpsc::UnboundedSender<ServiceMessage>,
}

impl<FS: FileSystem> DocumentService<FS> {
    /// Create a service around an unlinked document.
    ///
    /// `queue` must be the sender half of the channel whose receiver is
    /// passed to [`run`](Self::run); the watcher forwards change
    /// notifications through it.
    pub fn new(fs: FS, config: ServiceConfig, queue: mpsc::UnboundedSender<ServiceMessage>) -> Self {
        Self {
            document: Document::new(),
            sessions: SessionMap::new(),
            users: HashMap::new(),
            fs,
            config,
            watcher: None,
            queue,
        }
    }

    /// Drain the queue until `Shutdown` arrives or every sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ServiceMessage>) {
        while let Some(message) = rx.recv().await {
            match message {
                ServiceMessage::Attach {
                    session,
                    user,
                    sender,
                } => self.handle_attach(session, user, sender),
                ServiceMessage::Detach { session } => self.handle_detach(session),
                ServiceMessage::Command {
                    session,
                    reference,
                    command,
                } => self.handle_command(session, reference, command),
                ServiceMessage::FileChanged { path } => self.handle_file_changed(&path),
                ServiceMessage::Shutdown => break,
            }
        }

        if let Some(watcher) = self.watcher.take() {
            watcher.shutdown();
        }
    }

    fn handle_attach(
        &mut self,
        session: SessionId,
        user: UserInfo,
        sender: mpsc::UnboundedSender<OutboundMessage>,
    ) {
        debug!("Session {} attached as '{}'", session, user.username);
        self.users.insert(session, user);
        self.sessions.attach(session, sender);

        let snapshot = if self.document.is_linked() {
            StatusSnapshot {
                contents: Some(self.document.text()),
                version: Some(self.document.version()),
                path: self.document.path().map(Path::to_path_buf),
                cursors: self.document.cursors().snapshot(),
            }
        } else {
            StatusSnapshot::default()
        };
        self.sessions
            .send_to(session, None, Outbound::Status(snapshot));
    }

    fn handle_detach(&mut self, session: SessionId) {
        debug!("Session {} detached", session);
        self.sessions.detach(session);
        self.users.remove(&session);
    }

    fn handle_command(
        &mut self,
        session: SessionId,
        reference: Option<String>,
        command: Command,
    ) {
        let result = match command {
            Command::Link { path } => self.handle_link(session, reference.clone(), path),
            Command::Edit { ops, author } => {
                self.handle_edit(Some(session), reference.clone(), ops, author)
            }
            Command::NewCursor { cursor } => self.handle_new_cursor(session, cursor),
            Command::DeleteCursor { id } => self.handle_delete_cursor(session, id),
            Command::Fetch {
                version_from,
                version_to,
            } => {
                let entries = self
                    .document
                    .history()
                    .range(version_from, version_to)
                    .to_vec();
                self.sessions
                    .send_to(session, reference.clone(), Outbound::History { entries });
                Ok(())
            }
            Command::Flush => {
                self.sessions
                    .send_to(session, reference.clone(), Outbound::Ok);
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            // A command before link is a client bug, not a server fault:
            // logged, never surfaced.
            Err(CodocError::NotLinked) => {
                warn!("Session {} sent a command before a file was linked", session);
            }
            Err(
                err @ (CodocError::EditOutOfBounds { .. }
                | CodocError::AlreadyLinked(_)
                | CodocError::FileRead { .. }),
            ) => {
                self.sessions.send_to(
                    session,
                    reference,
                    Outbound::Error {
                        message: err.to_string(),
                    },
                );
            }
            Err(err) => {
                error!("Error handling command from session {}: {}", session, err);
            }
        }
    }

    fn handle_link(
        &mut self,
        session: SessionId,
        reference: Option<String>,
        path: PathBuf,
    ) -> Result<()> {
        if let Some(linked) = self.document.path()
            && linked != path
        {
            return Err(CodocError::AlreadyLinked(linked.to_path_buf()));
        }

        let contents = self
            .fs
            .read_to_string(&path)
            .map_err(|source| CodocError::FileRead {
                path: path.clone(),
                source,
            })?;

        self.document.link(path.clone(), contents.clone());
        self.start_watcher(&path);
        debug!("Linked '{}' ({} chars)", path.display(), contents.chars().count());

        self.sessions.send_to(
            session,
            reference,
            Outbound::Linked {
                version: self.document.version(),
                path,
                contents,
            },
        );
        Ok(())
    }

    /// Apply an edit and fan out the resulting history entry.
    ///
    /// Shared by network edits (`origin` is the sending session) and
    /// reconciled filesystem edits (`origin` is `None`): both go through the
    /// same apply, append, broadcast and persist steps.
    fn handle_edit(
        &mut self,
        origin: Option<SessionId>,
        reference: Option<String>,
        ops: Vec<EditStep>,
        author: Author,
    ) -> Result<()> {
        let user_id = match (author, origin) {
            (Author::Ghostwriter, _) => GHOSTWRITER_USER_ID,
            (Author::User, Some(session)) => self
                .users
                .get(&session)
                .map(|user| user.id)
                .unwrap_or(UNKNOWN_USER_ID),
            (Author::User, None) => UNKNOWN_USER_ID,
        };

        let entry = self.document.apply_edit(ops, author, user_id)?;
        debug!(
            "Applied edit: version {} by {} (user {})",
            entry.version, entry.author, entry.user_id
        );

        // Everyone gets the entry; the sender's copy echoes the request
        // reference so it doubles as the acknowledgement.
        for session in self.sessions.ids() {
            let echo = if origin == Some(session) {
                reference.clone()
            } else {
                None
            };
            self.sessions.send_to(session, echo, Outbound::Ot(entry.clone()));
        }

        self.persist();
        Ok(())
    }

    fn handle_new_cursor(&mut self, session: SessionId, cursor: Cursor) -> Result<()> {
        if !self.document.is_linked() {
            return Err(CodocError::NotLinked);
        }

        self.document.cursors_mut().upsert(cursor.clone());
        self.sessions
            .send(Target::EveryoneExcept(session), Outbound::NewCursor(cursor));
        Ok(())
    }

    fn handle_delete_cursor(&mut self, session: SessionId, id: String) -> Result<()> {
        if !self.document.is_linked() {
            return Err(CodocError::NotLinked);
        }

        self.document.cursors_mut().remove(&id);
        self.sessions
            .send(Target::EveryoneExcept(session), Outbound::DeleteCursor { id });
        Ok(())
    }

    /// Reconcile an externally observed change to the linked file.
    ///
    /// The on-disk content is re-read and diffed against the in-memory
    /// content; any drift is submitted through the same path as a network
    /// edit, attributed to the unknown-origin sentinel user. A read failure
    /// drops the notification (the next one retries from scratch) and never
    /// touches the version counter.
    fn handle_file_changed(&mut self, event_path: &Path) {
        let Some(path) = self.document.path().map(Path::to_path_buf) else {
            return;
        };
        debug!("Change notification for '{}'", event_path.display());

        let disk = match self.fs.read_to_string(&path) {
            Ok(disk) => disk,
            Err(err) => {
                warn!(
                    "Dropping change notification for '{}': {}",
                    path.display(),
                    err
                );
                return;
            }
        };

        // The service's own writes come back through the watcher; an
        // unchanged checksum means no external drift.
        let current_crc = self
            .document
            .history()
            .last()
            .map(|entry| entry.crc32)
            .unwrap_or_default();
        if checksum(&disk) == current_crc {
            return;
        }

        let ops = diff_ops(&self.document.text(), &disk);
        if ops.is_empty() {
            return;
        }

        if let Err(err) = self.handle_edit(None, None, ops, Author::User) {
            error!(
                "Failed to apply reconciled edit for '{}': {}",
                path.display(),
                err
            );
        }
    }

    /// Write the current content to the linked file.
    ///
    /// A write failure is logged and the in-memory state stays
    /// authoritative; the next successful write catches the file up.
    fn persist(&mut self) {
        if !self.config.autosave {
            return;
        }
        let Some(path) = self.document.path().map(Path::to_path_buf) else {
            return;
        };
        if let Err(err) = self.fs.write_file(&path, &self.document.text()) {
            warn!("Failed to persist '{}': {}", path.display(), err);
        }
    }

    /// (Re)start the watcher on the linked path and forward its
    /// modification events into the service queue.
    ///
    /// Watch failures are logged, not fatal: the document still works, it
    /// just will not pick up external edits.
    fn start_watcher(&mut self, path: &Path) {
        if let Some(old) = self.watcher.take() {
            old.shutdown();
        }

        let mut watcher = match FileWatcher::new(self.config.debounce()) {
            Ok(watcher) => watcher,
            Err(err) => {
                warn!("Failed to start file watcher: {}", err);
                return;
            }
        };
        if let Err(err) = watcher.watch(path) {
            warn!("Failed to watch '{}': {}", path.display(), err);
            return;
        }

        let mut events = watcher.subscribe();
        let queue = self.queue.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(WatchEvent::Modified(path)) => {
                        if queue.send(ServiceMessage::FileChanged { path }).is_err() {
                            break;
                        }
                    }
                    Ok(WatchEvent::Error(err)) => error!("File watcher error: {}", err),
                    Ok(event) => debug!("Ignoring watcher event: {:?}", event),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Watcher events lagged by {}", missed);
                    }
                }
            }
        });

        self.watcher = Some(watcher);
    }
}
