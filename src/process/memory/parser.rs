use log::{debug, trace, warn};
use regex::Regex;
use thiserror::Error;

use super::region::{Permissions, Region, SizeField, SizeFields};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed stanza, no {field} found:\n{stanza}")]
    MalformedStanza { field: &'static str, stanza: String },
    #[error("invalid permissions: {0}")]
    InvalidPermissions(String),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Pulls the `<Label>: <n> kB` value for one size field out of a stanza.
pub struct FieldExtractor {
    field: SizeField,
    pattern: Regex,
}

impl FieldExtractor {
    pub fn new(field: SizeField) -> Result<Self, ParseError> {
        // Anchored to the line start so `Size:` never hits `KernelPageSize:`.
        let pattern = Regex::new(&format!(
            r"(?m)^[ \t]*{}:[ \t]+([0-9]+)[ \t]+kB",
            regex::escape(field.label())
        ))?;
        Ok(Self { field, pattern })
    }

    pub fn field(&self) -> SizeField {
        self.field
    }

    /// `None` when the label is absent, which is not the same as a reported zero.
    pub fn extract(&self, stanza: &str) -> Option<u64> {
        self.pattern
            .captures(stanza)
            .and_then(|caps| caps.get(1))
            .and_then(|value| value.as_str().parse().ok())
    }
}

/// Raw text of one region, from its address line up to the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stanza<'a> {
    pub start: &'a str,
    pub end: &'a str,
    text: &'a str,
    body: &'a str,
}

impl<'a> Stanza<'a> {
    /// Everything after the `start-end ` prefix.
    pub fn body(&self) -> &'a str {
        self.body
    }

    fn malformed(&self, field: &'static str) -> ParseError {
        ParseError::MalformedStanza {
            field,
            stanza: self.text.trim_end().to_string(),
        }
    }
}

struct StanzaPatterns {
    boundary: Regex,
    name: Regex,
    permissions: Regex,
    device_inode: Regex,
}

impl StanzaPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            boundary: Regex::new(r"(?m)^([0-9a-fA-F]{4,16})-([0-9a-fA-F]{4,16})\s")?,
            name: Regex::new(r"(/.+|\[.+\])")?,
            permissions: Regex::new(r"[rwsxp\-]{4}")?,
            device_inode: Regex::new(r"([0-9a-fA-F]{2}):([0-9a-fA-F]{2})\s([0-9]+)")?,
        })
    }
}

/// Turns a whole smaps report into ordered `Region`s.
pub struct RegionParser {
    patterns: StanzaPatterns,
    extractors: Vec<FieldExtractor>,
}

impl RegionParser {
    pub fn new() -> Result<Self, ParseError> {
        let extractors = SizeField::ALL
            .into_iter()
            .map(FieldExtractor::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns: StanzaPatterns::new()?,
            extractors,
        })
    }

    pub fn stanzas<'a>(&self, report: &'a str) -> Vec<Stanza<'a>> {
        let headers: Vec<_> = self.patterns.boundary.captures_iter(report).collect();

        if let Some(first) = headers.first() {
            let leading = &report[..first.get(0).map_or(0, |m| m.start())];
            if !leading.trim().is_empty() {
                debug!("ignoring {} bytes before the first region", leading.len());
            }
        }

        headers
            .iter()
            .enumerate()
            .filter_map(|(i, caps)| {
                let whole = caps.get(0)?;
                let until = headers
                    .get(i + 1)
                    .and_then(|next| next.get(0))
                    .map_or(report.len(), |m| m.start());

                Some(Stanza {
                    start: caps.get(1)?.as_str(),
                    end: caps.get(2)?.as_str(),
                    text: &report[whole.start()..until],
                    body: &report[whole.end()..until],
                })
            })
            .collect()
    }

    pub fn parse_stanza(&self, stanza: &Stanza<'_>) -> Result<Region, ParseError> {
        let body = stanza.body();

        let name = self
            .patterns
            .name
            .find(body)
            .map(|m| m.as_str().trim_end().to_string());

        let permissions: Permissions = self
            .patterns
            .permissions
            .find(body)
            .ok_or_else(|| stanza.malformed("permissions"))?
            .as_str()
            .parse()?;

        let caps = self
            .patterns
            .device_inode
            .captures(body)
            .ok_or_else(|| stanza.malformed("device/inode"))?;
        let (major, minor, inode) = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(major), Some(minor), Some(inode)) => (major, minor, inode),
            _ => return Err(stanza.malformed("device/inode")),
        };
        let inode = inode
            .as_str()
            .parse()
            .map_err(|_| stanza.malformed("device/inode"))?;

        let mut sizes = SizeFields::default();
        for extractor in &self.extractors {
            sizes.set(extractor.field(), extractor.extract(body));
        }

        let region = Region {
            start: stanza.start.to_string(),
            end: stanza.end.to_string(),
            name,
            permissions,
            device: (major.as_str().to_string(), minor.as_str().to_string()),
            inode,
            sizes,
        };
        trace!("{region}");
        Ok(region)
    }

    /// Fails on the first malformed stanza.
    pub fn parse(&self, report: &str) -> Result<Vec<Region>, ParseError> {
        let regions = self
            .stanzas(report)
            .iter()
            .map(|stanza| self.parse_stanza(stanza))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("parsed {} regions", regions.len());
        Ok(regions)
    }

    /// Keeps every well-formed region and hands back the errors for the rest.
    pub fn parse_lenient(&self, report: &str) -> (Vec<Region>, Vec<ParseError>) {
        let mut regions = Vec::new();
        let mut errors = Vec::new();

        for stanza in self.stanzas(report) {
            match self.parse_stanza(&stanza) {
                Ok(region) => regions.push(region),
                Err(err) => {
                    warn!("skipping region {}-{}: {}", stanza.start, stanza.end, err);
                    errors.push(err);
                }
            }
        }

        debug!("parsed {} regions, skipped {}", regions.len(), errors.len());
        (regions, errors)
    }
}
