// Chunk: docs/chunks/buffer_file_watching - Per-buffer file watching
//!
//! Watches the one file that is currently open for editing.
//!
//! # Architecture
//!
//! Each session runs on its own driver thread that exclusively owns the
//! `notify` handle and the [`WatchSession`] state. Everything that can change
//! that state arrives as a [`Command`] on a single channel:
//!
//! - filesystem events forwarded from the `notify` callback,
//! - `suppress_next()` calls from the owner's thread,
//! - the stop request.
//!
//! Timers are not separate threads: the driver blocks on the channel until
//! the session's next deadline, then polls the session. Debounce firing,
//! reconnect probes and suppression therefore never race each other.
//!
//! The target file itself is watched (not its parent directory), so an
//! atomic save that renames a new file over it shows up as a removal. The
//! driver then drops the handle and probes for the path until it can attach
//! to the new inode.
//!
//! # Stopping
//!
//! [`FileWatcher::stop`] joins the driver thread, so no callback can run
//! after it returns. When `stop` is reached from inside the change callback
//! (which runs on the driver thread) it cannot join; a shared flag checked
//! before every callback gives the same guarantee.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use crate::watch_session::{WatchAction, WatchSession, WatchState};

/// Invoked after a debounced external change, and once after the target
/// reappears. Runs on the driver thread; hand the work to the presentation
/// context rather than doing it here, and never block on the watcher's owner.
pub type ChangeCallback = Box<dyn Fn() + Send>;

/// Messages processed by the driver thread, in arrival order.
enum Command {
    /// An event from the `notify` handle attached at `epoch`.
    Fs {
        epoch: u64,
        event: notify::Result<Event>,
    },
    SuppressNext,
    Stop,
}

/// What a filesystem event means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FsSignal {
    Write,
    Detach,
    Ignore,
}

/// Cloneable handle that marks the next change of the watched file as
/// self-inflicted. Safe to use from any thread.
///
/// A suppressor belongs to one session; once that session is stopped or
/// replaced, calls are silently dropped.
#[derive(Clone)]
pub struct Suppressor {
    commands: Sender<Command>,
}

impl Suppressor {
    /// Call immediately before writing the watched file.
    pub fn suppress_next(&self) {
        let _ = self.commands.send(Command::SuppressNext);
    }
}

/// Single-file watcher. Owns at most one session at a time.
pub struct FileWatcher {
    config: WatchConfig,
    running: Option<RunningSession>,
}

struct RunningSession {
    target: PathBuf,
    commands: Sender<Command>,
    /// Set before the stop request; checked before every callback.
    stopped: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FileWatcher {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }

    /// Begins watching `path`, replacing any session already running.
    ///
    /// The initial attach happens before this returns, so a write made right
    /// after `start` is observed. A missing target is not an error: the
    /// session starts out reconnecting.
    pub fn start<F>(&mut self, path: impl Into<PathBuf>, on_change: F)
    where
        F: Fn() + Send + 'static,
    {
        self.stop();

        let target = path.into();
        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let stopped = Arc::new(AtomicBool::new(false));

        let initial = attach(&target, &commands_tx, 0);
        if let Err(e) = &initial {
            tracing::debug!(target = %target.display(), "initial attach failed: {e}");
        }

        let driver = Driver {
            target: target.clone(),
            config: self.config,
            on_change: Box::new(on_change),
            commands_tx: commands_tx.clone(),
            commands_rx,
            stopped: Arc::clone(&stopped),
        };
        let thread = thread::spawn(move || driver.run(initial.ok()));

        self.running = Some(RunningSession {
            target,
            commands: commands_tx,
            stopped,
            thread: Some(thread),
        });
    }

    /// Ends the current session, if any. Idempotent.
    ///
    /// No change callback runs after this returns.
    pub fn stop(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };

        running.stopped.store(true, Ordering::SeqCst);
        let _ = running.commands.send(Command::Stop);

        if let Some(thread) = running.thread.take() {
            if thread.thread().id() == thread::current().id() {
                // Called from the change callback; the driver exits on its own.
                return;
            }
            if thread.join().is_err() {
                tracing::warn!(target = %running.target.display(), "watch driver panicked");
            }
        }
    }

    /// Swallows the change notification caused by our own next write.
    pub fn suppress_next(&self) {
        if let Some(running) = &self.running {
            let _ = running.commands.send(Command::SuppressNext);
        }
    }

    /// A [`Suppressor`] for the current session, for use from other threads.
    pub fn suppressor(&self) -> Option<Suppressor> {
        self.running.as_ref().map(|running| Suppressor {
            commands: running.commands.clone(),
        })
    }

    /// The file being watched, if a session exists.
    pub fn target(&self) -> Option<&Path> {
        self.running.as_ref().map(|running| running.target.as_path())
    }

    /// False once stopped, or once the session gave up reconnecting.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .and_then(|running| running.thread.as_ref())
            .map_or(false, |thread| !thread.is_finished())
    }
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new(WatchConfig::default())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the driver thread.
struct Driver {
    target: PathBuf,
    config: WatchConfig,
    on_change: ChangeCallback,
    /// Cloned into every `notify` handle we attach.
    commands_tx: Sender<Command>,
    commands_rx: Receiver<Command>,
    stopped: Arc<AtomicBool>,
}

impl Driver {
    fn run(self, initial: Option<RecommendedWatcher>) {
        let mut session = WatchSession::new(&self.config);
        let mut epoch = 0;
        let mut handle = initial;
        session.start(handle.is_some(), Instant::now());

        loop {
            let command = match session.next_deadline() {
                Some(deadline) => match self.commands_rx.recv_deadline(deadline) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match self.commands_rx.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                },
            };

            match command {
                Some(Command::Stop) => {
                    session.stop();
                    break;
                }
                Some(Command::SuppressNext) => session.suppress_next(),
                Some(Command::Fs { epoch: from, event }) if from == epoch => {
                    let signal = match &event {
                        Ok(event) => classify(&event.kind),
                        Err(e) => {
                            tracing::debug!(target = %self.target.display(), "watch revoked: {e}");
                            FsSignal::Detach
                        }
                    };
                    match signal {
                        FsSignal::Write => session.record_write(Instant::now()),
                        FsSignal::Detach => {
                            handle = None;
                            session.detach(Instant::now());
                        }
                        FsSignal::Ignore => {}
                    }
                }
                // Left over from a handle we already dropped.
                Some(Command::Fs { .. }) => {}
                None => {}
            }

            let now = Instant::now();
            let target = &self.target;
            for action in session.poll(now, || File::open(target).is_ok()) {
                match action {
                    WatchAction::Reattach => {
                        epoch += 1;
                        match attach(&self.target, &self.commands_tx, epoch) {
                            Ok(watcher) => handle = Some(watcher),
                            Err(e) => {
                                tracing::debug!("reattach failed: {e}");
                                session.detach(now);
                            }
                        }
                    }
                    WatchAction::Notify => {
                        if !self.stopped.load(Ordering::SeqCst) {
                            (self.on_change)();
                        }
                    }
                }
            }

            if session.state() == WatchState::Stopped {
                break;
            }
        }

        drop(handle);
        tracing::debug!(target = %self.target.display(), "watch session ended");
    }
}

/// Creates a `notify` handle on `target` whose events carry `epoch`.
fn attach(target: &Path, commands: &Sender<Command>, epoch: u64) -> Result<RecommendedWatcher> {
    let tx = commands.clone();
    let mut watcher = RecommendedWatcher::new(
        move |event: notify::Result<Event>| {
            let _ = tx.send(Command::Fs { epoch, event });
        },
        Config::default(),
    )
    .map_err(WatchError::Create)?;

    watcher
        .watch(target, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Attach {
            path: target.to_path_buf(),
            source,
        })?;

    Ok(watcher)
}

/// Maps a `notify` event kind onto what the session cares about.
///
/// Renames are treated as detaches whichever side of the rename we saw:
/// either way the inode we were watching is no longer at the target path.
fn classify(kind: &EventKind) -> FsSignal {
    match kind {
        EventKind::Modify(ModifyKind::Name(_)) | EventKind::Remove(_) => FsSignal::Detach,
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => FsSignal::Write,
        _ => FsSignal::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tempfile::TempDir;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn fast_config() -> WatchConfig {
        WatchConfig {
            debounce_ms: 50,
            reconnect_interval_ms: 20,
            max_reconnect_attempts: 3,
        }
    }

    /// Polls `condition` every 10ms until it holds or `timeout` passes.
    fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        condition()
    }

    #[test]
    fn test_classify_writes() {
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            FsSignal::Write
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Any))),
            FsSignal::Write
        );
        assert_eq!(classify(&EventKind::Modify(ModifyKind::Any)), FsSignal::Write);
    }

    #[test]
    fn test_classify_detaches() {
        assert_eq!(classify(&EventKind::Remove(RemoveKind::File)), FsSignal::Detach);
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            FsSignal::Detach
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            FsSignal::Detach
        );
    }

    #[test]
    fn test_classify_ignored() {
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Any)),
            FsSignal::Ignore
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            FsSignal::Ignore
        );
        assert_eq!(classify(&EventKind::Create(CreateKind::File)), FsSignal::Ignore);
    }

    #[test]
    fn test_new_watcher_has_no_session() {
        let watcher = FileWatcher::default();
        assert!(watcher.target().is_none());
        assert!(!watcher.is_running());
        assert!(watcher.suppressor().is_none());
    }

    #[test]
    fn test_suppress_without_session_is_noop() {
        let watcher = FileWatcher::default();
        watcher.suppress_next();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        std::fs::write(&file, "a").unwrap();
        let mut watcher = FileWatcher::default();

        watcher.start(&file, || {});
        assert!(watcher.is_running());
        assert_eq!(watcher.target(), Some(file.as_path()));

        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_running());
        assert!(watcher.target().is_none());
    }

    #[test]
    fn test_start_replaces_previous_session() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.txt");
        let second = temp.path().join("second.txt");
        std::fs::write(&first, "1").unwrap();
        std::fs::write(&second, "2").unwrap();
        let mut watcher = FileWatcher::default();

        watcher.start(&first, || {});
        let old_suppressor = watcher.suppressor().unwrap();
        watcher.start(&second, || {});

        assert_eq!(watcher.target(), Some(second.as_path()));
        // The stale handle goes nowhere, and must not panic.
        old_suppressor.suppress_next();
    }

    #[test]
    fn test_missing_target_gives_up_silently() {
        let temp = TempDir::new().unwrap();
        let (count, on_change) = counter();
        let mut watcher = FileWatcher::new(fast_config());

        watcher.start(temp.path().join("missing.txt"), on_change);

        // 4 ticks of 20ms, then the driver exits on its own.
        assert!(wait_for(Duration::from_secs(5), || !watcher.is_running()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        // Stopping a session that already gave up is fine.
        watcher.stop();
    }

    #[test]
    fn test_missing_target_reappearing_notifies_once() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("late.txt");
        let (count, on_change) = counter();
        let config = WatchConfig {
            max_reconnect_attempts: 500,
            ..fast_config()
        };
        let mut watcher = FileWatcher::new(config);

        watcher.start(&file, on_change);
        thread::sleep(Duration::from_millis(50));
        // Appear fully written, so the reattached watch sees no later write.
        let staging = temp.path().join("late.txt.tmp");
        std::fs::write(&staging, "hello").unwrap();
        std::fs::rename(&staging, &file).unwrap();

        assert!(wait_for(Duration::from_secs(5), || count.load(Ordering::SeqCst) >= 1));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(watcher.is_running());
    }

    #[test]
    fn test_no_callback_after_stop() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("late.txt");
        let (count, on_change) = counter();
        let mut watcher = FileWatcher::new(WatchConfig {
            max_reconnect_attempts: 500,
            ..fast_config()
        });

        watcher.start(&file, on_change);
        watcher.stop();
        std::fs::write(&file, "hello").unwrap();
        thread::sleep(Duration::from_millis(200));

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[ignore] // Timing-sensitive: filesystem events may take time to propagate
    fn test_external_write_detected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("watched.txt");
        std::fs::write(&file, "initial").unwrap();
        let (count, on_change) = counter();
        let mut watcher = FileWatcher::new(fast_config());

        watcher.start(&file, on_change);
        std::fs::write(&file, "modified").unwrap();

        assert!(wait_for(Duration::from_secs(2), || count.load(Ordering::SeqCst) == 1));
    }

    #[test]
    #[ignore] // Timing-sensitive: filesystem events may take time to propagate
    fn test_burst_of_writes_fires_once() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("watched.txt");
        std::fs::write(&file, "initial").unwrap();
        let (count, on_change) = counter();
        let mut watcher = FileWatcher::new(WatchConfig {
            debounce_ms: 200,
            ..fast_config()
        });

        watcher.start(&file, on_change);
        for i in 0..5 {
            std::fs::write(&file, format!("write {i}")).unwrap();
            thread::sleep(Duration::from_millis(10));
        }
        thread::sleep(Duration::from_millis(600));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[ignore] // Timing-sensitive: filesystem events may take time to propagate
    fn test_suppressed_self_write_is_swallowed() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("watched.txt");
        std::fs::write(&file, "initial").unwrap();
        let (count, on_change) = counter();
        let mut watcher = FileWatcher::new(fast_config());

        watcher.start(&file, on_change);
        watcher.suppress_next();
        std::fs::write(&file, "ours").unwrap();
        thread::sleep(Duration::from_millis(300));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        std::fs::write(&file, "theirs").unwrap();
        assert!(wait_for(Duration::from_secs(2), || count.load(Ordering::SeqCst) == 1));
    }

    #[test]
    #[ignore] // Timing-sensitive: filesystem events may take time to propagate
    fn test_atomic_replace_reconnects() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("watched.txt");
        let staging = temp.path().join("watched.txt.tmp");
        std::fs::write(&file, "initial").unwrap();
        let (count, on_change) = counter();
        let mut watcher = FileWatcher::new(WatchConfig {
            max_reconnect_attempts: 100,
            ..fast_config()
        });

        watcher.start(&file, on_change);
        std::fs::write(&staging, "replaced").unwrap();
        std::fs::rename(&staging, &file).unwrap();

        // One notification from the reattach.
        assert!(wait_for(Duration::from_secs(2), || count.load(Ordering::SeqCst) >= 1));

        // The new inode is being watched.
        let before = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        std::fs::write(&file, "after replace").unwrap();
        assert!(wait_for(Duration::from_secs(2), || count.load(Ordering::SeqCst) > before));
    }

    #[test]
    fn test_stop_from_inside_callback() {
        use std::sync::Mutex;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("late.txt");
        let watcher = Arc::new(Mutex::new(FileWatcher::new(WatchConfig {
            max_reconnect_attempts: 500,
            ..fast_config()
        })));
        let (count, bump) = counter();

        let inner = Arc::clone(&watcher);
        watcher.lock().unwrap().start(&file, move || {
            bump();
            // Same thread as the driver: must not deadlock.
            inner.lock().unwrap().stop();
        });
        std::fs::write(&file, "hello").unwrap();

        assert!(wait_for(Duration::from_secs(5), || count.load(Ordering::SeqCst) == 1));
        assert!(wait_for(Duration::from_secs(5), || !watcher.lock().unwrap().is_running()));
    }
}
