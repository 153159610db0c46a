//! The background writer
//!
//! A single processor task owns every destination's rotation state and the
//! open file handles, so writes to a destination happen strictly in queue
//! order.

use crate::destination::{Destination, Router};
use crate::queue::LogQueue;
use crate::text::TextBuilder;
use crate::{LogEntry, Result};
use chrono::{DateTime, Local};
use proven_file_store::{FileStore, LogFile};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[cfg(windows)]
const NEWLINE: &str = "\r\n";
#[cfg(not(windows))]
const NEWLINE: &str = "\n";

/// Lifecycle of a provider's processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorState {
    /// Constructed, not yet started
    Idle,
    /// Accepting and writing records
    Running,
    /// No longer accepting records, writing out what is queued
    Draining,
    /// Queue drained and every file closed
    Closed,
}

#[derive(Default)]
struct RotationState {
    file: Option<Box<dyn LogFile>>,
    base_path: Option<String>,
    counter: u32,
}

pub(crate) struct Processor {
    queue: Arc<LogQueue>,
    router: Arc<Router>,
    store: Arc<dyn FileStore>,
    text_builder: Arc<dyn TextBuilder>,
    include_scopes: bool,
    base_dir: PathBuf,
    rotations: Vec<RotationState>,
    state: Arc<watch::Sender<ProcessorState>>,
}

impl Processor {
    pub(crate) fn new(
        queue: Arc<LogQueue>,
        router: Arc<Router>,
        store: Arc<dyn FileStore>,
        text_builder: Arc<dyn TextBuilder>,
        include_scopes: bool,
        base_dir: PathBuf,
        state: Arc<watch::Sender<ProcessorState>>,
    ) -> Self {
        let rotations = router
            .destinations()
            .iter()
            .map(|_| RotationState::default())
            .collect();
        Self {
            queue,
            router,
            store,
            text_builder,
            include_scopes,
            base_dir,
            rotations,
            state,
        }
    }

    /// Write entries until the queue is closed and drained, or until `abort`
    /// fires. `shutdown` closes the queue without discarding queued entries.
    pub(crate) async fn run(mut self, shutdown: CancellationToken, abort: CancellationToken) {
        let mut draining = false;

        loop {
            let next = tokio::select! {
                biased;
                () = abort.cancelled() => break,
                () = shutdown.cancelled(), if !draining => {
                    debug!("shutdown requested, draining log queue");
                    draining = true;
                    self.queue.close();
                    begin_draining(&self.state);
                    continue;
                }
                entry = self.queue.pop() => entry,
            };

            let Some(entry) = next else {
                break;
            };

            tokio::select! {
                biased;
                () = abort.cancelled() => break,
                () = self.process(&entry) => {}
            }
        }

        if abort.is_cancelled() {
            // Dropping the handles releases them without waiting on storage.
            self.rotations.clear();
            return;
        }

        for rotation in &mut self.rotations {
            if let Some(file) = rotation.file.take() {
                let path = file.path().to_path_buf();
                if let Err(error) = file.close().await {
                    warn!(path = %path.display(), %error, "failed to close log file");
                }
            }
        }

        self.state.send_replace(ProcessorState::Closed);
        debug!("log processor closed");
    }

    async fn process(&mut self, entry: &LogEntry) {
        let category = entry.record.category.as_ref();
        let selected: Vec<usize> = self.router.select(category, entry.record.level).collect();
        if selected.is_empty() {
            return;
        }

        let mut text = String::new();
        for line in self.text_builder.build(entry, self.include_scopes) {
            text.push_str(&line);
            text.push_str(NEWLINE);
        }

        let local = entry.timestamp.with_timezone(&Local);
        for index in selected {
            let destination = &self.router.destinations()[index];
            let rotation = &mut self.rotations[index];
            if let Err(error) = write(
                self.store.as_ref(),
                &self.base_dir,
                destination,
                rotation,
                &local,
                &text,
            )
            .await
            {
                warn!(
                    path = destination.template.as_str(),
                    category,
                    %error,
                    "failed to write log entry"
                );
            }
        }
    }
}

pub(crate) fn begin_draining(state: &watch::Sender<ProcessorState>) {
    state.send_if_modified(|state| {
        if matches!(state, ProcessorState::Idle | ProcessorState::Running) {
            *state = ProcessorState::Draining;
            true
        } else {
            false
        }
    });
}

async fn write(
    store: &dyn FileStore,
    base_dir: &std::path::Path,
    destination: &Destination,
    rotation: &mut RotationState,
    instant: &DateTime<Local>,
    text: &str,
) -> Result<()> {
    let base_path = destination.template.base_path(instant);
    if rotation.base_path.as_deref() != Some(base_path.as_str()) {
        rotation.counter = 0;
        rotation.base_path = Some(base_path);
        if let Some(file) = rotation.file.take() {
            let path = file.path().to_path_buf();
            if let Err(error) = file.close().await {
                warn!(path = %path.display(), %error, "failed to close rotated log file");
            }
        }
    }

    // A failed write leaves the handle taken, so the next entry reopens it.
    let mut file = match rotation.file.take() {
        Some(file) => file,
        None => {
            let mut path = base_dir.join(destination.template.resolve(instant, rotation.counter));
            if let Some(limit) = destination.rotation_size() {
                while store.len(&path).await?.is_some_and(|len| len > limit) {
                    rotation.counter += 1;
                    path = base_dir.join(destination.template.resolve(instant, rotation.counter));
                }
            }
            store.open(&path, destination.access_mode).await?
        }
    };

    if file.is_empty() {
        let preamble = destination.encoding.preamble();
        if !preamble.is_empty() {
            file.append(preamble).await?;
        }
    }
    file.append(&destination.encoding.encode(text)).await?;

    match destination.rotation_size() {
        Some(limit) if file.len() > limit => {
            debug!(path = %file.path().display(), "log file exceeded its size limit");
            rotation.counter += 1;
            file.close().await?;
        }
        _ => rotation.file = Some(file),
    }

    Ok(())
}
