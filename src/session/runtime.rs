//! Session actor
//!
//! One tokio task per editing session owns every piece of mutable session
//! state: the cursor, the protection state and the last-saved reference.
//! Everything that can touch them — user commands, the auto-save interval,
//! and the rendering surface's asynchronous replies — arrives on this
//! task's channels, so no two session operations ever run concurrently and
//! no locks are needed.
//!
//! Appends are awaited inline by the actor (tokio::fs, non-blocking for
//! the executor), which serializes durable writes per session: a second
//! append cannot start before the first's rename has completed, keeping
//! the live sequence strictly increasing and gap-free.
//!
//! Sessions for different images are fully independent; each owns a
//! disjoint namespace under the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::annotations::{compare, AnnotationState};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::navigation::{ConfirmOutcome, NavigationController};
use crate::session::status::SessionStatus;
use crate::store::{BookmarkIndex, SessionPaths, SnapshotStore};
use crate::surface::{RenderSurface, SurfaceEvent};

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// User-initiated session operations
#[derive(Debug)]
pub enum Command {
    /// Load the previous live state
    Undo,
    /// Load the next live state
    Redo,
    /// Jump to the nearest bookmark before the current position
    JumpPrevBookmark,
    /// Jump to the nearest bookmark after the current position
    JumpNextBookmark,
    /// Bookmark the state currently shown (also marks the session done)
    MarkBookmark,
    /// Set the session's done flag
    SetDone(bool),
    /// Report a summary of the session's state
    Query(oneshot::Sender<SessionInfo>),
    Shutdown,
}

/// Point-in-time summary of a session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
    pub cursor: Option<u64>,
    pub snapshot_count: usize,
    pub bookmark_count: usize,
    pub protected: bool,
    pub done: bool,
}

/// Cheap cloneable handle for sending commands to a session task
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub async fn undo(&self) -> Result<()> {
        self.send(Command::Undo).await
    }

    pub async fn redo(&self) -> Result<()> {
        self.send(Command::Redo).await
    }

    pub async fn jump_to_prev_bookmark(&self) -> Result<()> {
        self.send(Command::JumpPrevBookmark).await
    }

    pub async fn jump_to_next_bookmark(&self) -> Result<()> {
        self.send(Command::JumpNextBookmark).await
    }

    pub async fn mark_bookmark(&self) -> Result<()> {
        self.send(Command::MarkBookmark).await
    }

    pub async fn set_done(&self, done: bool) -> Result<()> {
        self.send(Command::SetDone(done)).await
    }

    pub async fn query(&self) -> Result<SessionInfo> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Query(tx)).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| Error::SessionClosed)
    }
}

enum NavKind {
    Undo,
    Redo,
    PrevBookmark,
    NextBookmark,
}

impl NavKind {
    fn label(&self) -> &'static str {
        match self {
            NavKind::Undo => "undo",
            NavKind::Redo => "redo",
            NavKind::PrevBookmark => "previous bookmark",
            NavKind::NextBookmark => "next bookmark",
        }
    }
}

/// The per-session actor: storage, bookmarks, status and the navigation
/// state machine, driven by commands, surface events and the auto-save
/// interval.
pub struct SessionRuntime {
    session_id: String,
    config: SessionConfig,
    store: SnapshotStore,
    bookmarks: BookmarkIndex,
    status: SessionStatus,
    status_path: PathBuf,
    nav: NavigationController,
    surface: Arc<dyn RenderSurface>,
    cmd_rx: mpsc::Receiver<Command>,
    event_rx: mpsc::Receiver<SurfaceEvent>,
}

impl SessionRuntime {
    /// Open (or create) the session's storage namespace and build the
    /// actor. `event_rx` is the receiving end of the channel the rendering
    /// surface emits its replies on.
    pub async fn open(
        session_id: &str,
        data_dir: &Path,
        config: SessionConfig,
        surface: Arc<dyn RenderSurface>,
        event_rx: mpsc::Receiver<SurfaceEvent>,
    ) -> Result<(SessionHandle, SessionRuntime)> {
        let paths = SessionPaths::new(data_dir, session_id);
        paths.ensure().await?;

        let store = SnapshotStore::open(&paths.live_dir).await?;
        let bookmarks = BookmarkIndex::open(&paths.bookmarks_file).await?;
        let status = SessionStatus::load(&paths.status_file).await?;

        // The session starts Idle at its most recent snapshot; seeding the
        // last-saved reference from it keeps an unchanged reopened session
        // from re-appending its latest state on the first tick.
        let cursor = store.latest();
        let last_saved = match cursor {
            Some(index) => match store.read(index).await {
                Ok(snapshot) => Some(snapshot.state),
                Err(e) => {
                    tracing::warn!(index, error = %e, "could not seed last-saved state");
                    None
                }
            },
            None => None,
        };

        tracing::info!(
            session_id,
            snapshots = store.len(),
            bookmarks = bookmarks.len(),
            cursor = ?cursor,
            "session opened"
        );

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let runtime = SessionRuntime {
            session_id: session_id.to_string(),
            config,
            store,
            bookmarks,
            status,
            status_path: paths.status_file,
            nav: NavigationController::new(cursor, last_saved),
            surface,
            cmd_rx,
            event_rx,
        };

        Ok((SessionHandle { cmd_tx }, runtime))
    }

    /// Run the session loop on its own task until `Shutdown`.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// The session loop: ticks, commands and surface events, all handled
    /// sequentially on one task.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.autosave_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.handle_tick().await,
                Some(command) = self.cmd_rx.recv() => {
                    if matches!(command, Command::Shutdown) {
                        tracing::info!(session_id = %self.session_id, "session shutting down");
                        break;
                    }
                    self.handle_command(command).await;
                }
                Some(event) = self.event_rx.recv() => self.handle_event(event).await,
                else => break,
            }
        }
    }

    // ========================================================================
    // Auto-save scheduler
    // ========================================================================

    /// One auto-save tick. While protected this does no I/O and no
    /// comparison at all.
    async fn handle_tick(&mut self) {
        if let Some(target) = self.nav.expire_if_stalled(self.config.load_timeout()) {
            tracing::warn!(
                session_id = %self.session_id,
                target,
                "navigation load never confirmed; resuming auto-save"
            );
        }

        if self.nav.is_protected(self.config.grace_window()) {
            return;
        }

        // The reply arrives later as SurfaceEvent::CurrentState.
        self.surface.request_current_state().await;
    }

    async fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::CurrentState(state) => self.handle_current_state(state).await,
            SurfaceEvent::LoadConfirmed { index } => match self.nav.on_confirmed(index) {
                ConfirmOutcome::Applied { target } => {
                    tracing::info!(
                        session_id = %self.session_id,
                        target,
                        "navigation load confirmed"
                    );
                }
                ConfirmOutcome::Stale => {
                    tracing::debug!(index, "stale load confirmation discarded");
                }
            },
        }
    }

    /// The surface answered a tick with the current state: append it iff
    /// unprotected and structurally changed.
    async fn handle_current_state(&mut self, state: AnnotationState) {
        // Protection may have started between the tick and this reply.
        if self.nav.is_protected(self.config.grace_window()) {
            tracing::debug!("state report during navigation ignored");
            return;
        }

        if !compare::should_save(&state, self.nav.last_saved()) {
            return;
        }

        match self.store.append(state.clone()).await {
            Ok(index) => {
                self.nav.record_append(index, state);
                tracing::info!(session_id = %self.session_id, index, "auto-saved changed state");
            }
            Err(e) => {
                // The same change is still detected next tick; natural retry.
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    "auto-save append failed"
                );
            }
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Undo => self.navigate(NavKind::Undo).await,
            Command::Redo => self.navigate(NavKind::Redo).await,
            Command::JumpPrevBookmark => self.navigate(NavKind::PrevBookmark).await,
            Command::JumpNextBookmark => self.navigate(NavKind::NextBookmark).await,
            Command::MarkBookmark => self.mark_bookmark().await,
            Command::SetDone(done) => self.set_done(done).await,
            Command::Query(reply) => {
                let _ = reply.send(self.info());
            }
            // Intercepted in run(); nothing to do here.
            Command::Shutdown => {}
        }
    }

    /// Issue a navigation load: compute the target, enter protection, read
    /// the snapshot and hand it to the rendering surface.
    async fn navigate(&mut self, kind: NavKind) {
        // A chained request navigates relative to the still-pending target,
        // not the unmoved cursor, so rapid undo-undo walks backwards.
        let base = self.nav.pending_target().or(self.nav.cursor());

        let target = match self.resolve_target(&kind, base) {
            Ok(target) => target,
            Err(e) if e.is_no_such_transition() => {
                // Normal boundary condition (e.g. undo at the oldest state).
                tracing::debug!(kind = kind.label(), "no navigation target");
                return;
            }
            Err(e) => {
                tracing::warn!(kind = kind.label(), error = %e, "navigation target lookup failed");
                return;
            }
        };

        let snapshot = match self.store.read(target).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Fail safe: resume auto-save, leave the cursor alone.
                self.nav.on_load_failed();
                match &e {
                    Error::Serialization { .. } => tracing::error!(
                        session_id = %self.session_id,
                        target,
                        error = %e,
                        "corrupt snapshot record"
                    ),
                    _ => tracing::warn!(target, error = %e, "navigation load failed"),
                }
                return;
            }
        };

        // Protection goes up before the load command leaves, superseding
        // any previous pending request.
        self.nav.begin_load(target, snapshot.state.clone());
        self.surface.load_state(target, snapshot.state).await;

        tracing::info!(
            session_id = %self.session_id,
            kind = kind.label(),
            target,
            "navigation load issued"
        );
    }

    fn resolve_target(&self, kind: &NavKind, base: Option<u64>) -> Result<u64> {
        let base = base.ok_or(Error::NoSuchTransition("history"))?;
        match kind {
            NavKind::Undo => self
                .store
                .predecessor_of(base)
                .ok_or(Error::NoSuchTransition("undo")),
            NavKind::Redo => self
                .store
                .successor_of(base)
                .ok_or(Error::NoSuchTransition("redo")),
            NavKind::PrevBookmark => self.bookmarks.predecessor_of(base),
            NavKind::NextBookmark => self.bookmarks.successor_of(base),
        }
    }

    /// Bookmark the currently shown state and mark the session done.
    async fn mark_bookmark(&mut self) {
        let Some(cursor) = self.nav.cursor() else {
            tracing::debug!("nothing to bookmark yet");
            return;
        };

        match self.bookmarks.mark(&self.store, cursor).await {
            Ok(true) => {
                tracing::info!(session_id = %self.session_id, index = cursor, "bookmarked");
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(index = cursor, error = %e, "bookmark failed");
                return;
            }
        }

        self.set_done(true).await;
    }

    async fn set_done(&mut self, done: bool) {
        self.status.set_done(done);
        if let Err(e) = self.status.save(&self.status_path).await {
            tracing::warn!(error = %e, "status save failed");
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            cursor: self.nav.cursor(),
            snapshot_count: self.store.len(),
            bookmark_count: self.bookmarks.len(),
            protected: self.nav.is_protected(self.config.grace_window()),
            done: self.status.done,
        }
    }
}
