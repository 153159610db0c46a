//! Path templates with date and counter placeholders
//!
//! A template such as `logs/<date>/app-<date:HH>-<counter>.log` is parsed
//! once and then resolved for an explicit instant and counter value.
//! Resolution never reads the clock.

use crate::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Write as _};

/// A compiled date format.
///
/// Accepts either a `strftime` string (anything containing `%`) or the
/// custom tokens `yyyy`, `yy`, `MM`, `dd`, `HH`, `hh`, `mm`, `ss`, `f` to
/// `fffffffff`, `tt`, `zzz` and friends, with `'quoted'` or `\`-escaped
/// literals. A run of `f` renders that many leading digits of the fraction
/// of a second, truncated rather than rounded.
#[derive(Clone)]
pub struct DateFormat {
    source: String,
    parts: Vec<Part>,
}

#[derive(Clone)]
enum Part {
    Items(Vec<Item<'static>>),
    Fraction(usize),
}

impl DateFormat {
    /// Compile `format`.
    pub fn parse(format: &str) -> Result<Self> {
        let invalid = || Error::InvalidDateFormat {
            format: format.to_string(),
        };

        if format.is_empty() {
            return Err(invalid());
        }

        let parts = if format.contains('%') {
            vec![Part::Items(compile_items(format).ok_or_else(invalid)?)]
        } else {
            translate_custom(format).ok_or_else(invalid)?
        };

        let compiled = Self {
            source: format.to_string(),
            parts,
        };

        // Items that parse but cannot be rendered (e.g. `%Z` names) show up here.
        let epoch = DateTime::<Utc>::default();
        for part in &compiled.parts {
            if let Part::Items(items) = part {
                let mut probe = String::new();
                write!(probe, "{}", epoch.format_with_items(items.iter())).map_err(|_| invalid())?;
            }
        }

        Ok(compiled)
    }

    /// The format as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render `instant` in its own time zone.
    pub fn format<Tz>(&self, instant: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Items(items) => {
                    let _ = write!(out, "{}", instant.format_with_items(items.iter()));
                }
                Part::Fraction(digits) => {
                    // Leap seconds report more than a second of nanos.
                    let nanos = instant.timestamp_subsec_nanos() % 1_000_000_000;
                    let _ = write!(out, "{}", &format!("{nanos:09}")[..*digits]);
                }
            }
        }
        out
    }
}

impl fmt::Debug for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DateFormat").field(&self.source).finish()
    }
}

impl PartialEq for DateFormat {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

fn compile_items(strftime: &str) -> Option<Vec<Item<'static>>> {
    StrftimeItems::new(strftime).parse_to_owned().ok()
}

fn translate_custom(format: &str) -> Option<Vec<Part>> {
    let chars: Vec<char> = format.chars().collect();
    let mut parts = Vec::new();
    let mut out = String::with_capacity(format.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let spec = match (c, run) {
            ('y', 1) => "%-y",
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', 2) => "%d",
            ('d', 3) => "%a",
            ('d', _) => "%A",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('f', 1..=9) => {
                if !out.is_empty() {
                    parts.push(Part::Items(compile_items(&std::mem::take(&mut out))?));
                }
                parts.push(Part::Fraction(run));
                i += run;
                continue;
            }
            ('f', _) => return None,
            ('t', _) => "%p",
            ('z', 1 | 2) => "%z",
            ('z', _) => "%:z",
            ('\'' | '"', _) => {
                let end = chars[i + 1..].iter().position(|&q| q == c)? + i + 1;
                for &literal in &chars[i + 1..end] {
                    push_literal(&mut out, literal);
                }
                i = end + 1;
                continue;
            }
            ('\\', _) => {
                push_literal(&mut out, *chars.get(i + 1)?);
                i += 2;
                continue;
            }
            _ => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
                i += run;
                continue;
            }
        };

        out.push_str(spec);
        i += run;
    }

    if !out.is_empty() {
        parts.push(Part::Items(compile_items(&out)?));
    }
    Some(parts)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Zero-padded counter format, written as a run of `0` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterFormat {
    width: usize,
}

impl CounterFormat {
    /// Compile `format`, e.g. `"000"` for three digits.
    pub fn parse(format: &str) -> Result<Self> {
        if format.is_empty() || !format.bytes().all(|b| b == b'0') {
            return Err(Error::InvalidCounterFormat {
                format: format.to_string(),
            });
        }
        Ok(Self {
            width: format.len(),
        })
    }

    /// Minimum number of digits.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Render `counter`.
    pub fn format(&self, counter: u32) -> String {
        format!("{counter:0width$}", width = self.width)
    }
}

impl Default for CounterFormat {
    fn default() -> Self {
        Self { width: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Date(Option<DateFormat>),
    Counter,
}

/// A parsed path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
    date_format: DateFormat,
    counter_format: CounterFormat,
}

impl PathTemplate {
    /// Parse `template`; `<date>` placeholders without an explicit format use
    /// `date_format`.
    pub fn parse(
        template: &str,
        date_format: DateFormat,
        counter_format: CounterFormat,
    ) -> Result<Self> {
        let invalid = |reason| Error::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        if template.trim().is_empty() {
            return Err(invalid("template is empty"));
        }

        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find('<') {
            if rest[..start].contains('>') {
                return Err(invalid("unmatched '>'"));
            }
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 1..];
            let end = after
                .find('>')
                .ok_or_else(|| invalid("unterminated placeholder"))?;
            let placeholder = &after[..end];
            if placeholder.contains('<') {
                return Err(invalid("unterminated placeholder"));
            }

            let (name, argument) = match placeholder.split_once(':') {
                Some((name, argument)) => (name.trim(), Some(argument)),
                None => (placeholder.trim(), None),
            };

            let segment = match (name, argument) {
                ("date", None) => Segment::Date(None),
                ("date", Some(format)) => Segment::Date(Some(DateFormat::parse(format)?)),
                ("counter", None) => Segment::Counter,
                ("counter", Some(_)) => {
                    return Err(invalid("counter placeholder takes no format"));
                }
                _ => {
                    return Err(Error::UnknownPlaceholder {
                        template: template.to_string(),
                        placeholder: name.to_string(),
                    });
                }
            };
            segments.push(segment);
            rest = &after[end + 1..];
        }

        if rest.contains('>') {
            return Err(invalid("unmatched '>'"));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
            date_format,
            counter_format,
        })
    }

    /// The template as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the template contains a `<counter>` placeholder.
    pub fn has_counter(&self) -> bool {
        self.segments.contains(&Segment::Counter)
    }

    /// Resolve the template for `instant` and `counter`.
    pub fn resolve<Tz>(&self, instant: &DateTime<Tz>, counter: u32) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.render(instant, Some(counter))
    }

    /// Resolve the template with every `<counter>` removed. Two instants share
    /// a base path iff every date placeholder renders identically.
    pub fn base_path<Tz>(&self, instant: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.render(instant, None)
    }

    fn render<Tz>(&self, instant: &DateTime<Tz>, counter: Option<u32>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut path = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Date(format) => path.push_str(
                    &format
                        .as_ref()
                        .unwrap_or(&self.date_format)
                        .format(instant),
                ),
                Segment::Counter => {
                    if let Some(counter) = counter {
                        path.push_str(&self.counter_format.format(counter));
                    }
                }
            }
        }
        path
    }
}
