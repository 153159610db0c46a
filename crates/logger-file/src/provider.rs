//! The provider: entry point for producers and owner of the processor

use crate::destination::Router;
use crate::processor::{Processor, ProcessorState, begin_draining};
use crate::queue::{LogQueue, Push};
use crate::scope::current_scopes;
use crate::text::DefaultTextBuilder;
use crate::{Error, FileLogger, FileLoggerContext, FileLoggerOptions, LogEntry, LogLevel, LogRecord, Result};
use parking_lot::Mutex;
use proven_file_store::FileStore;
use proven_file_store_fs::FsFileStore;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

struct Inner {
    context: FileLoggerContext,
    router: Arc<Router>,
    queue: Arc<LogQueue>,
    processor: Mutex<Option<Processor>>,
    state: Arc<watch::Sender<ProcessorState>>,
    abort: CancellationToken,
    tracker: TaskTracker,
    dropped: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Lets a started processor drain and exit once every handle is gone.
        self.queue.close();
    }
}

/// Accepts records from any thread and writes them to rotating files on a
/// background task.
///
/// The provider is cheap to clone; clones share the queue and processor.
#[derive(Clone)]
pub struct FileLoggerProvider {
    inner: Arc<Inner>,
}

impl fmt::Debug for FileLoggerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLoggerProvider")
            .field("state", &self.state())
            .field("queued", &self.inner.queue.len())
            .field("dropped", &self.dropped_count())
            .finish_non_exhaustive()
    }
}

impl FileLoggerProvider {
    /// Validate `options` and create an idle provider.
    ///
    /// Records are accepted right away; they are written once [`start`] is
    /// called (or [`dispose`], which starts an idle provider first).
    ///
    /// [`start`]: Self::start
    /// [`dispose`]: Self::dispose
    pub fn new(context: FileLoggerContext, options: FileLoggerOptions) -> Result<Self> {
        let router = Arc::new(Router::new(&options)?);
        let queue = Arc::new(LogQueue::new(options.max_queue_size, options.overflow_policy));
        let (state, _) = watch::channel(ProcessorState::Idle);
        let state = Arc::new(state);

        let store: Arc<dyn FileStore> = options
            .file_store
            .clone()
            .unwrap_or_else(|| Arc::new(FsFileStore::new(".")));
        let text_builder = options
            .text_builder
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultTextBuilder));

        let processor = Processor::new(
            Arc::clone(&queue),
            Arc::clone(&router),
            store,
            text_builder,
            options.include_scopes,
            options.base_path.clone(),
            Arc::clone(&state),
        );

        debug!(
            destinations = router.destinations().len(),
            base_path = %options.base_path.display(),
            "file logger provider created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                context,
                router,
                queue,
                processor: Mutex::new(Some(processor)),
                state,
                abort: CancellationToken::new(),
                tracker: TaskTracker::new(),
                dropped: AtomicU64::new(0),
            }),
        })
    }

    /// Spawn the processor on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] if the processor was already spawned.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        let processor = self.inner.processor.lock().take().ok_or(Error::AlreadyStarted)?;

        self.inner.state.send_if_modified(|state| {
            if *state == ProcessorState::Idle {
                *state = ProcessorState::Running;
                true
            } else {
                false
            }
        });

        let shutdown = self.inner.context.shutdown_token().clone();
        let abort = self.inner.abort.clone();
        let handle = self.inner.tracker.spawn(processor.run(shutdown, abort));

        info!("file logger started");
        Ok(handle)
    }

    /// Offer a record. Never fails and never blocks longer than the
    /// configured overflow policy allows.
    ///
    /// The timestamp and the caller's scopes are captured here.
    pub fn enqueue(&self, record: LogRecord) {
        self.enqueue_with_scopes(record, current_scopes());
    }

    pub(crate) fn enqueue_with_scopes(&self, record: LogRecord, scopes: Vec<Arc<str>>) {
        if let Some(entry) = self.admit(record, scopes) {
            self.settle(self.inner.queue.push(entry));
        }
    }

    /// Offer a record from async code.
    ///
    /// Identical to [`enqueue`] except under [`OverflowPolicy::Block`], where
    /// the calling task is suspended while the queue is full instead of
    /// blocking its thread.
    ///
    /// [`enqueue`]: Self::enqueue
    /// [`OverflowPolicy::Block`]: crate::OverflowPolicy::Block
    pub async fn enqueue_async(&self, record: LogRecord) {
        if let Some(entry) = self.admit(record, current_scopes()) {
            let outcome = self.inner.queue.push_async(entry).await;
            self.settle(outcome);
        }
    }

    fn admit(&self, record: LogRecord, scopes: Vec<Arc<str>>) -> Option<LogEntry> {
        if !self.is_enabled(&record.category, record.level) {
            return None;
        }

        if self.inner.context.shutdown_token().is_cancelled() {
            self.inner.queue.close();
        }

        Some(LogEntry::new(record, self.inner.context.clock().now(), scopes))
    }

    fn settle(&self, outcome: Push) {
        match outcome {
            Push::Accepted => {}
            Push::Displaced | Push::Dropped => {
                let dropped = self.inner.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(dropped, "log queue full, entry dropped");
            }
            Push::Closed => trace!("log queue closed, entry discarded"),
        }
    }

    /// Whether any destination would write a record of `level` in `category`.
    pub fn is_enabled(&self, category: &str, level: LogLevel) -> bool {
        level != LogLevel::None && self.inner.router.is_enabled(category, level)
    }

    /// A logger handle bound to `category`.
    pub fn create_logger(&self, category: impl Into<Cow<'static, str>>) -> FileLogger {
        FileLogger::new(category, self.clone())
    }

    /// Number of records discarded by the overflow policy so far.
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Number of entries waiting to be written.
    pub fn queued_count(&self) -> usize {
        self.inner.queue.len()
    }

    /// Current processor state.
    pub fn state(&self) -> ProcessorState {
        *self.inner.state.borrow()
    }

    /// Completion signal, resolved once the queue is drained and every file
    /// is closed.
    pub fn completion(&self) -> Completion {
        Completion {
            state: self.inner.state.subscribe(),
        }
    }

    /// Stop accepting records, write out what is queued and close every
    /// file.
    ///
    /// Waits at most the context's completion timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CompletionTimeout`] when the timeout elapses first; the
    /// remaining entries are then discarded and the processor stopped.
    pub async fn dispose(&self) -> Result<()> {
        if self.inner.abort.is_cancelled() {
            return Ok(());
        }

        match self.start() {
            Ok(_) | Err(Error::AlreadyStarted) => {}
            Err(error) => return Err(error),
        }

        self.inner.queue.close();
        begin_draining(&self.inner.state);
        self.inner.tracker.close();

        let completion = self.completion();
        let finished = match self.inner.context.completion_timeout() {
            None => {
                completion.wait().await;
                true
            }
            Some(timeout) => tokio::time::timeout(timeout, completion.wait()).await.is_ok(),
        };

        if !finished {
            let abandoned = self.inner.queue.abandon();
            self.inner.abort.cancel();
            self.inner.tracker.wait().await;
            warn!(abandoned, "file logger did not drain in time");
            return Err(Error::CompletionTimeout { abandoned });
        }

        self.inner.tracker.wait().await;
        info!("file logger disposed");
        Ok(())
    }
}

/// Resolves when a provider's processor has drained the queue and closed
/// its files.
#[derive(Debug, Clone)]
pub struct Completion {
    state: watch::Receiver<ProcessorState>,
}

impl Completion {
    /// Whether completion has been reached.
    pub fn is_completed(&self) -> bool {
        *self.state.borrow() == ProcessorState::Closed
    }

    /// Wait for completion.
    pub async fn wait(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|state| *state == ProcessorState::Closed).await;
    }
}
