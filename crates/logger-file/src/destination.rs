//! Destinations and record routing

use crate::filter::CategoryFilter;
use crate::template::{CounterFormat, DateFormat, PathTemplate};
use crate::{FileEncoding, FileLoggerOptions, LogFileOptions, LogLevel, Result};
use proven_file_store::FileAccessMode;
use tracing::debug;

/// One configured output file family.
#[derive(Debug, Clone)]
pub(crate) struct Destination {
    pub(crate) template: PathTemplate,
    pub(crate) filter: CategoryFilter,
    pub(crate) max_file_size: Option<u64>,
    pub(crate) encoding: FileEncoding,
    pub(crate) access_mode: FileAccessMode,
}

impl Destination {
    /// Build a destination, filling unset fields from the provider options.
    pub(crate) fn new(file: &LogFileOptions, options: &FileLoggerOptions) -> Result<Self> {
        let date_format = DateFormat::parse(file.date_format.as_deref().unwrap_or(&options.date_format))?;
        let counter_format =
            CounterFormat::parse(file.counter_format.as_deref().unwrap_or(&options.counter_format))?;
        let template = PathTemplate::parse(&file.path, date_format, counter_format)?;
        let filter = CategoryFilter::new(&file.min_level, &file.path)?;

        let max_file_size = Some(file.max_file_size.unwrap_or(options.max_file_size)).filter(|size| *size > 0);
        if max_file_size.is_some() && !template.has_counter() {
            debug!(path = %file.path, "no <counter> placeholder, size limit is not enforced");
        }

        Ok(Self {
            template,
            filter,
            max_file_size,
            encoding: file.file_encoding.unwrap_or(options.file_encoding),
            access_mode: file.access_mode.unwrap_or(options.access_mode),
        })
    }

    /// The size at which the current file is rotated, if rotation by size
    /// applies to this destination.
    pub(crate) fn rotation_size(&self) -> Option<u64> {
        self.max_file_size.filter(|_| self.template.has_counter())
    }
}

/// Selects the destinations that accept a record.
#[derive(Debug, Clone)]
pub(crate) struct Router {
    destinations: Vec<Destination>,
}

impl Router {
    pub(crate) fn new(options: &FileLoggerOptions) -> Result<Self> {
        let destinations = options
            .files
            .iter()
            .map(|file| Destination::new(file, options))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { destinations })
    }

    pub(crate) fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Indices of the destinations accepting `level` in `category`, in
    /// configuration order.
    pub(crate) fn select<'a>(
        &'a self,
        category: &'a str,
        level: LogLevel,
    ) -> impl Iterator<Item = usize> + 'a {
        self.destinations
            .iter()
            .enumerate()
            .filter(move |(_, destination)| destination.filter.accepts(category, level))
            .map(|(index, _)| index)
    }

    /// Whether any destination accepts `level` in `category`.
    pub(crate) fn is_enabled(&self, category: &str, level: LogLevel) -> bool {
        self.select(category, level).next().is_some()
    }
}
