//! Debounced file watching for the reconciliation path.
//!
//! The watcher observes the linked file and fans out [`WatchEvent`]s over a
//! broadcast channel. Debouncing collapses editor write bursts (truncate +
//! write + rename dances) into a single notification, so one external save
//! triggers one reconciliation pass.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, event::ModifyKind, Event, EventKind, RecommendedWatcher, Watcher},
    DebounceEventResult, Debouncer, FileIdMap,
};
use tokio::sync::broadcast;

use crate::error::Result;

/// A filesystem change observed on a watched path.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A file appeared.
    Created(PathBuf),
    /// A file's content changed.
    Modified(PathBuf),
    /// A file disappeared.
    Removed(PathBuf),
    /// A file was renamed.
    Renamed(PathBuf, PathBuf),
    /// The watcher backend reported an error.
    Error(String),
}

/// Debounced, non-recursive watcher over individual files.
pub struct FileWatcher {
    debouncer: Debouncer<RecommendedWatcher, FileIdMap>,
    sender: broadcast::Sender<WatchEvent>,
}

impl FileWatcher {
    /// Start a watcher with the given debounce window.
    pub fn new(debounce: Duration) -> Result<Self> {
        let (sender, _) = broadcast::channel(16);

        let tx = sender.clone();
        let debouncer = new_debouncer(
            debounce,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events.iter() {
                        if let Some(mapped) = map_event(event) {
                            // A send error just means nobody is subscribed.
                            let _ = tx.send(mapped);
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let _ = tx.send(WatchEvent::Error(error.to_string()));
                    }
                }
            },
        )?;

        Ok(Self { debouncer, sender })
    }

    /// Watch a single file.
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        self.debouncer
            .watcher()
            .watch(path, notify::RecursiveMode::NonRecursive)?;
        self.debouncer
            .cache()
            .add_root(path, notify::RecursiveMode::NonRecursive);
        Ok(())
    }

    /// Subscribe to watch events.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.sender.subscribe()
    }

    /// Stop watching and close the event channel.
    pub fn shutdown(self) {
        self.debouncer.stop_nonblocking();
        drop(self.sender);
    }
}

fn map_event(event: &Event) -> Option<WatchEvent> {
    let path = event.paths.first()?.clone();
    match event.kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path)),
        EventKind::Modify(ModifyKind::Name(notify::event::RenameMode::Both)) => {
            Some(WatchEvent::Renamed(path, event.paths.get(1)?.clone()))
        }
        EventKind::Modify(ModifyKind::Name(notify::event::RenameMode::From)) => {
            Some(WatchEvent::Removed(path))
        }
        EventKind::Modify(ModifyKind::Name(notify::event::RenameMode::To)) => {
            Some(WatchEvent::Created(path))
        }
        EventKind::Modify(_) => Some(WatchEvent::Modified(path)),
        EventKind::Remove(_) => Some(WatchEvent::Removed(path)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn next_modify(
        receiver: &mut broadcast::Receiver<WatchEvent>,
    ) -> Option<PathBuf> {
        let deadline = tokio::time::Duration::from_secs(10);
        tokio::time::timeout(deadline, async {
            loop {
                match receiver.recv().await {
                    Ok(WatchEvent::Modified(path)) => return Some(path),
                    Ok(_) => continue,
                    Err(_) => return None,
                }
            }
        })
        .await
        .ok()
        .flatten()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_modify_event_is_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watched.txt");
        std::fs::write(&path, "before").unwrap();

        let mut watcher = FileWatcher::new(Duration::from_millis(100)).unwrap();
        watcher.watch(&path).unwrap();
        let mut events = watcher.subscribe();

        // Give the backend a moment to establish the watch.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, " after").unwrap();
        file.sync_all().unwrap();
        drop(file);

        let modified = next_modify(&mut events).await;
        assert!(modified.is_some(), "expected a Modified event");

        watcher.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_closes_channel() {
        let watcher = FileWatcher::new(Duration::from_millis(50)).unwrap();
        let mut events = watcher.subscribe();
        watcher.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), events.recv()).await;
        assert!(matches!(
            result,
            Ok(Err(broadcast::error::RecvError::Closed))
        ));
    }
}
