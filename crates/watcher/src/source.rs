//! notify-backed notification source
//!
//! The notify callback runs on the backend's own thread and pushes
//! translated events into a bounded tokio channel with `blocking_send`, so a
//! slow dispatcher applies backpressure to the backend rather than growing a
//! queue without limit.

use crate::WatchEvent;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use savevault_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Live recursive watch on the root; dropping it stops notifications and
/// closes the channel
pub struct EventSource {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl EventSource {
    /// Start watching `root` recursively, sending events into `tx`
    pub fn start(root: &Path, tx: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.need_rescan() {
                    warn!("notification backend overflowed, some changes were not seen");
                }
                for watch_event in translate(&event) {
                    if tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!(error = %e, "file watcher error"),
        })
        .map_err(|e| Error::Watch(e.to_string()))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("{}: {}", root.display(), e)))?;

        info!(root = %root.display(), "watching for profile changes");

        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Reduce a notify event to change/delete notifications
pub fn translate(event: &Event) -> Vec<WatchEvent> {
    use notify::EventKind as Kind;

    match &event.kind {
        Kind::Create(kind) => {
            let is_dir = match kind {
                CreateKind::Folder => Some(true),
                CreateKind::File => Some(false),
                _ => None,
            };
            each(event, |p| WatchEvent::changed(p).with_is_dir(is_dir))
        }
        Kind::Remove(kind) => {
            let is_dir = match kind {
                RemoveKind::Folder => Some(true),
                RemoveKind::File => Some(false),
                _ => None,
            };
            each(event, |p| WatchEvent::deleted(p).with_is_dir(is_dir))
        }
        Kind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => each(event, WatchEvent::deleted),
            RenameMode::To => each(event, WatchEvent::changed),
            RenameMode::Both => match event.paths.as_slice() {
                [from, to, ..] => vec![WatchEvent::deleted(from.clone()), WatchEvent::changed(to.clone())],
                _ => each(event, WatchEvent::changed),
            },
            // Direction unknown: a departed path reads as a delete, an
            // arrived one as a change, and the dispatcher drops whichever
            // does not apply
            _ => event
                .paths
                .iter()
                .flat_map(|p| [WatchEvent::deleted(p.clone()), WatchEvent::changed(p.clone())])
                .collect(),
        },
        Kind::Modify(_) => each(event, WatchEvent::changed),
        Kind::Access(_) | Kind::Any | Kind::Other => Vec::new(),
    }
}

fn each<F>(event: &Event, f: F) -> Vec<WatchEvent>
where
    F: Fn(PathBuf) -> WatchEvent,
{
    event.paths.iter().cloned().map(f).collect()
}
