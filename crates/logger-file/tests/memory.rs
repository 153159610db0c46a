use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use encoding_rs::UTF_8;
use proven_file_store_memory::MemoryFileStore;
use proven_logger_file::text::{body_lines, error_lines, local_timestamp};
use proven_logger_file::{
    FileAccessMode, FileEncoding, FileLoggerContext, FileLoggerOptions, FileLoggerProvider,
    FileStore, FixedClock, LogEntry, LogFile, LogFileOptions, LogLevel, Logger, LoggerExt, TextBuilder,
};

const NEWLINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };
const OWN_CATEGORY: &str = "Proven.Logging.File.Test.LoggingTest";

#[derive(Debug, thiserror::Error)]
#[error("synthetic failure")]
struct SyntheticFailure;

/// Same layout as the default one, with the level tag in brackets.
#[derive(Debug)]
struct BracketedTextBuilder;

impl TextBuilder for BracketedTextBuilder {
    fn build(&self, entry: &LogEntry, include_scopes: bool) -> Vec<String> {
        let prefix = format!("[{}]: ", entry.record.level.short_name());
        let indent = " ".repeat(prefix.len());
        let mut lines = vec![format!(
            "{prefix}{}[{}] @ {}",
            entry.record.category,
            entry.record.event_id,
            local_timestamp(entry)
        )];
        lines.extend(body_lines(entry, include_scopes, &indent));
        lines.extend(error_lines(entry));
        lines
    }
}

fn start_of_2017() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap()
}

fn local(instant: DateTime<Utc>, format: &str) -> String {
    instant.with_timezone(&Local).format(format).to_string()
}

fn stamp(instant: DateTime<Utc>) -> String {
    local(instant, "%Y-%m-%dT%H:%M:%S%.6f%:z")
}

fn lines(store: &MemoryFileStore, path: &str) -> Vec<String> {
    let (text, encoding) = store
        .read_to_string(path)
        .unwrap_or_else(|| panic!("{path} was not written; files: {:?}", store.file_paths()));
    assert_eq!(encoding, UTF_8);
    text.split(NEWLINE).map(str::to_string).collect()
}

fn provider_at(
    store: &MemoryFileStore,
    clock: &Arc<FixedClock>,
    options: FileLoggerOptions,
) -> FileLoggerProvider {
    let context = FileLoggerContext::new()
        .with_clock(clock.clone())
        .with_completion_timeout(None);
    FileLoggerProvider::new(context, options.with_file_store(store.clone())).unwrap()
}

async fn logging_to_memory(access_mode: FileAccessMode) {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));

    let options = FileLoggerOptions::new()
        .with_base_path("Logs")
        .with_access_mode(access_mode)
        .with_file_encoding(FileEncoding::utf8())
        .with_max_queue_size(100, Default::default())
        .with_date_format("yyMMdd")
        .with_counter_format("000")
        .with_max_file_size(10)
        .with_include_scopes(true)
        .with_text_builder(BracketedTextBuilder)
        .with_file(
            LogFileOptions::new("<date>/<date:MM>/logger.log")
                .with_date_format("yyyy")
                .with_min_level("Proven.Logging.File", LogLevel::None)
                .with_min_level("Default", LogLevel::Information),
        )
        .with_file(
            LogFileOptions::new("test-<date>-<counter>.log")
                .with_min_level("Proven.Logging.File", LogLevel::Information)
                .with_min_level("Default", LogLevel::None),
        );

    let provider = provider_at(&store, &clock, options);
    let completion = provider.completion();
    provider.start().unwrap();

    let logger1 = provider.create_logger(OWN_CATEGORY);
    logger1.info("This is a nice logger.");
    {
        let _scope = logger1.begin_scope("SCOPE");
        logger1.log_event(LogLevel::Warning, 1, "This is a smart logger.");
        logger1.trace("This won't make it.");
        {
            let _nested = logger1.begin_scope("NESTED SCOPE");
            let logger2 = provider.create_logger("X");
            logger2.warn("Some warning.");
            logger2.log(
                logger2
                    .record(LogLevel::Error, "Some failure!")
                    .with_error(SyntheticFailure),
            );
        }
    }

    provider.dispose().await.unwrap();
    assert!(completion.is_completed());

    let t = start_of_2017();
    let day = local(t, "%y%m%d");

    assert_eq!(
        lines(&store, &format!("Logs/test-{day}-000.log")),
        [
            format!("[info]: {OWN_CATEGORY}[0] @ {}", stamp(t)),
            "        This is a nice logger.".to_string(),
            String::new(),
        ],
        "{access_mode:?}"
    );

    assert_eq!(
        lines(&store, &format!("Logs/test-{day}-001.log")),
        [
            format!("[warn]: {OWN_CATEGORY}[1] @ {}", stamp(t)),
            "        => SCOPE".to_string(),
            "        This is a smart logger.".to_string(),
            String::new(),
        ],
        "{access_mode:?}"
    );

    let nested = format!("Logs/{}/{}/logger.log", local(t, "%Y"), local(t, "%m"));
    assert!(store.is_dir(format!("Logs/{}", local(t, "%Y"))));
    assert_eq!(
        lines(&store, &nested),
        [
            format!("[warn]: X[0] @ {}", stamp(t)),
            "        => SCOPE => NESTED SCOPE".to_string(),
            "        Some warning.".to_string(),
            format!("[fail]: X[0] @ {}", stamp(t)),
            "        => SCOPE => NESTED SCOPE".to_string(),
            "        Some failure!".to_string(),
            "synthetic failure".to_string(),
            String::new(),
        ],
        "{access_mode:?}"
    );

    assert_eq!(store.file_paths().len(), 3);
}

#[tokio::test]
async fn test_logging_to_memory() {
    for access_mode in [FileAccessMode::Exclusive, FileAccessMode::Shared] {
        logging_to_memory(access_mode).await;
    }
}

#[tokio::test]
async fn test_size_rotation() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_date_format("yyMMdd")
            .with_counter_format("000")
            .with_max_file_size(10)
            .with_file(LogFileOptions::new("test-<date>-<counter>.log")),
    );

    let logger = provider.create_logger("App");
    logger.info("first");
    logger.info("second");
    provider.dispose().await.unwrap();

    let day = local(start_of_2017(), "%y%m%d");
    let first = lines(&store, &format!("test-{day}-000.log"));
    let second = lines(&store, &format!("test-{day}-001.log"));
    assert_eq!(first[1], "      first");
    assert_eq!(second[1], "      second");
    assert_eq!(store.file_paths().len(), 2);
}

#[tokio::test]
async fn test_size_limit_without_counter_accumulates() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_max_file_size(10)
            .with_file(LogFileOptions::new("app.log")),
    );

    let logger = provider.create_logger("App");
    for i in 0..5 {
        logger.info(format!("entry {i}"));
    }
    provider.dispose().await.unwrap();

    assert_eq!(store.file_paths().len(), 1);
    assert_eq!(lines(&store, "app.log").len(), 5 * 2 + 1);
}

#[tokio::test]
async fn test_date_rotation_resets_counter() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_date_format("yyyyMMdd")
            .with_counter_format("00")
            .with_max_file_size(10)
            .with_file(LogFileOptions::new("app-<date>-<counter>.log")),
    );

    let logger = provider.create_logger("App");
    logger.info("day one, first");
    logger.info("day one, second");
    let next_day = start_of_2017() + Duration::days(1);
    clock.set(next_day);
    logger.info("day two");
    provider.dispose().await.unwrap();

    let one = local(start_of_2017(), "%Y%m%d");
    let two = local(next_day, "%Y%m%d");
    assert_eq!(
        store.file_paths(),
        [
            format!("app-{one}-00.log"),
            format!("app-{one}-01.log"),
            format!("app-{two}-00.log"),
        ]
        .map(std::path::PathBuf::from)
    );

    let day_two = lines(&store, &format!("app-{two}-00.log"));
    assert_eq!(day_two[0], format!("info: App[0] @ {}", stamp(next_day)));
}

/// A store whose files write normally but fail to close.
#[derive(Debug, Clone)]
struct CloseFailsStore(MemoryFileStore);

#[derive(Debug)]
struct CloseFailsFile(Box<dyn LogFile>);

#[async_trait]
impl FileStore for CloseFailsStore {
    async fn len(&self, path: &Path) -> proven_file_store::Result<Option<u64>> {
        self.0.len(path).await
    }

    async fn open(
        &self,
        path: &Path,
        mode: FileAccessMode,
    ) -> proven_file_store::Result<Box<dyn LogFile>> {
        Ok(Box::new(CloseFailsFile(self.0.open(path, mode).await?)))
    }
}

#[async_trait]
impl LogFile for CloseFailsFile {
    fn path(&self) -> &Path {
        self.0.path()
    }

    fn len(&self) -> u64 {
        self.0.len()
    }

    async fn append(&mut self, bytes: &[u8]) -> proven_file_store::Result<()> {
        self.0.append(bytes).await
    }

    async fn flush(&mut self) -> proven_file_store::Result<()> {
        self.0.flush().await
    }

    async fn close(self: Box<Self>) -> proven_file_store::Result<()> {
        Err(proven_file_store::Error::Io(
            "error closing file",
            std::io::Error::other("disk went away"),
        ))
    }
}

#[tokio::test]
async fn test_date_rotation_survives_close_failure() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let context = FileLoggerContext::new()
        .with_clock(clock.clone())
        .with_completion_timeout(None);
    let options = FileLoggerOptions::new()
        .with_date_format("yyyyMMdd")
        .with_access_mode(FileAccessMode::Shared)
        .with_file_store(CloseFailsStore(store.clone()))
        .with_file(LogFileOptions::new("app-<date>.log"));
    let provider = FileLoggerProvider::new(context, options).unwrap();

    let logger = provider.create_logger("App");
    logger.info("day one");
    let next_day = start_of_2017() + Duration::days(1);
    clock.set(next_day);
    logger.info("day two");
    provider.dispose().await.unwrap();

    let one = lines(&store, &format!("app-{}.log", local(start_of_2017(), "%Y%m%d")));
    let two = lines(&store, &format!("app-{}.log", local(next_day, "%Y%m%d")));
    assert_eq!(one[1], "      day one");
    assert_eq!(two[1], "      day two");
}

#[tokio::test]
async fn test_restart_skips_full_files() {
    let store = MemoryFileStore::new();
    let day = local(start_of_2017(), "%y%m%d");
    store.write(format!("Logs/app-{day}-0.log"), "x".repeat(20)).unwrap();
    store.write(format!("Logs/app-{day}-1.log"), "x".repeat(10)).unwrap();
    store.write(format!("Logs/app-{day}-2.log"), "x".repeat(3)).unwrap();

    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_base_path("Logs")
            .with_date_format("yyMMdd")
            .with_max_file_size(10)
            .with_file(LogFileOptions::new("app-<date>-<counter>.log")),
    );
    provider.create_logger("App").info("resumed");
    provider.dispose().await.unwrap();

    // Only files over the limit are skipped; one exactly at it still takes writes.
    let resumed = lines(&store, &format!("Logs/app-{day}-1.log"));
    assert!(resumed[0].starts_with("xxxxxxxxxxinfo: App[0] @ "));
    assert_eq!(store.read(format!("Logs/app-{day}-0.log")).unwrap().len(), 20);
    assert_eq!(store.read(format!("Logs/app-{day}-2.log")).unwrap().len(), 3);
}

/// One line per record, padded to nine characters.
#[derive(Debug)]
struct FixedWidthTextBuilder;

impl TextBuilder for FixedWidthTextBuilder {
    fn build(&self, entry: &LogEntry, _include_scopes: bool) -> Vec<String> {
        vec![format!("{:<9}", entry.record.message)]
    }
}

#[tokio::test]
async fn test_file_exactly_at_limit_keeps_writing() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let record_len = 9 + NEWLINE.len();
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_counter_format("000")
            .with_max_file_size(record_len as u64)
            .with_text_builder(FixedWidthTextBuilder)
            .with_file(LogFileOptions::new("t-<counter>.log")),
    );

    let logger = provider.create_logger("App");
    for message in ["one", "two", "three"] {
        logger.info(message);
    }
    provider.dispose().await.unwrap();

    assert_eq!(store.read("t-000.log").unwrap().len(), 2 * record_len);
    assert_eq!(store.read("t-001.log").unwrap().len(), record_len);
    assert_eq!(lines(&store, "t-000.log"), ["one      ", "two      ", ""]);
    assert_eq!(lines(&store, "t-001.log"), ["three    ", ""]);
}

#[tokio::test]
async fn test_routing() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_file(
                LogFileOptions::new("filtered.log")
                    .with_min_level("X", LogLevel::None)
                    .with_min_level("Default", LogLevel::Information),
            )
            .with_file(
                LogFileOptions::new("errors.log")
                    .with_min_level("Default", LogLevel::Error),
            ),
    );

    provider.create_logger("X").error("from x");
    provider.create_logger("Y").info("from y");
    provider.create_logger("Y").debug("too verbose");
    provider.create_logger("Y.Sub").critical("bad");
    provider.dispose().await.unwrap();

    let filtered = lines(&store, "filtered.log").join("\n");
    assert!(!filtered.contains("from x"));
    assert!(filtered.contains("from y"));
    assert!(!filtered.contains("too verbose"));
    assert!(filtered.contains("crit: Y.Sub[0]"));

    let errors = lines(&store, "errors.log").join("\n");
    assert!(errors.contains("fail: X[0]"));
    assert!(errors.contains("crit: Y.Sub[0]"));
    assert!(!errors.contains("from y"));
}

#[tokio::test]
async fn test_scopes_only_when_enabled() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(&store, &clock, FileLoggerOptions::new().with_file(LogFileOptions::new("app.log")));

    {
        let logger = provider.create_logger("App");
        let _scope = logger.begin_scope("SCOPE");
        logger.info("scoped");
    }
    provider.dispose().await.unwrap();

    assert_eq!(lines(&store, "app.log")[1], "      scoped");
}

#[tokio::test]
async fn test_utf8_with_bom() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_file_encoding(FileEncoding::utf8_bom())
            .with_file(LogFileOptions::new("bom.log")),
    );

    let logger = provider.create_logger("App");
    logger.info("one");
    logger.info("two");
    provider.dispose().await.unwrap();

    let bytes = store.read("bom.log").unwrap();
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
    assert_eq!(bytes.windows(3).filter(|w| *w == [0xEF, 0xBB, 0xBF]).count(), 1);
}

#[tokio::test]
async fn test_ordering_per_producer() {
    let store = MemoryFileStore::new();
    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(&store, &clock, FileLoggerOptions::new().with_file(LogFileOptions::new("order.log")));
    provider.start().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let logger = provider.create_logger(format!("P{producer}"));
            std::thread::spawn(move || {
                for i in 0..250 {
                    logger.info(i.to_string());
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    provider.dispose().await.unwrap();

    let lines = lines(&store, "order.log");
    let mut last = [None::<u32>; 4];
    let mut count = 0;
    for pair in lines.chunks(2).filter(|pair| pair.len() == 2) {
        let producer: usize = pair[0][7..8].parse().unwrap();
        let value: u32 = pair[1].trim().parse().unwrap();
        assert!(last[producer].is_none_or(|previous| previous < value));
        last[producer] = Some(value);
        count += 1;
    }
    assert_eq!(count, 1000);
    assert_eq!(last, [Some(249); 4]);
}

#[tokio::test]
async fn test_write_failure_does_not_stop_processing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = MemoryFileStore::new();
    store.write("bad.log/obstacle", b"".to_vec()).unwrap();

    let clock = Arc::new(FixedClock::new(start_of_2017()));
    let provider = provider_at(
        &store,
        &clock,
        FileLoggerOptions::new()
            .with_file(LogFileOptions::new("bad.log"))
            .with_file(LogFileOptions::new("good.log")),
    );

    let logger = provider.create_logger("App");
    logger.info("one");
    logger.info("two");
    provider.dispose().await.unwrap();

    let good = lines(&store, "good.log");
    assert_eq!(good.len(), 5);
    assert!(store.is_dir("bad.log"));
}
