use std::collections::HashMap;
use std::io::BufRead;

use crate::types::{Span, Strand};

/// Parsing errors for GFF3 input.
///
/// Under the default lenient policy only I/O failures ever reach the caller;
/// the row-level variants are what strict mode surfaces and what the
/// diagnostics counters classify.
#[derive(Debug)]
pub enum ParseError {
    IoPath {
        path: String,
        source: std::io::Error,
    },
    Io {
        source: std::io::Error,
    },
    MalformedLine {
        line: String,
    },
    BadCoordinates {
        line: String,
    },
    MissingAttribute {
        key: &'static str,
        feature_type: String,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IoPath { path, source } => {
                write!(f, "I/O error while reading '{}': {}", path, source)
            }
            ParseError::Io { source } => write!(f, "I/O error while reading input: {}", source),
            ParseError::MalformedLine { line } => write!(f, "Malformed GFF3 line: {}", line),
            ParseError::BadCoordinates { line } => write!(f, "Bad coordinates in line: {}", line),
            ParseError::MissingAttribute { key, feature_type } => {
                write!(
                    f,
                    "Missing required attribute '{}' on '{}' row",
                    key, feature_type
                )
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::IoPath { source, .. } | ParseError::Io { source } => Some(source),
            _ => None,
        }
    }
}

/// The parsed attributes column: a strict string-to-string map.
///
/// Lookup policy is made explicit by the two accessors: `get_optional` for
/// keys whose absence changes dispatch, `get_required` for keys whose
/// absence invalidates the row (the caller decides whether that means
/// "skip" or "fail").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    map: HashMap<String, String>,
}

impl Attributes {
    /// Parse a `key=value;key2=value2` attribute string.
    ///
    /// Splits each part on the first '=' only, so values containing '=' are
    /// kept whole. Parts without '=' are ignored. Duplicate keys follow
    /// mapping insertion semantics: the last occurrence wins.
    pub fn parse(s: &str) -> Self {
        let mut map = HashMap::new();
        for part in s.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some((key, value)) = part.split_once('=') {
                map.insert(key.to_string(), value.to_string());
            }
        }
        Self { map }
    }

    pub fn get_optional(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|v| v.as_str())
    }

    /// First present key of `keys`, in preference order.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get_optional(k))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A single data row of a GFF3 file.
///
/// Coordinates stay 1-based inclusive exactly as written in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct GffRecord {
    pub chrom: String,
    pub source: String,
    pub feature_type: String,
    pub start: u32,
    pub end: u32,
    pub score: Option<f32>,
    pub strand: Strand,
    pub phase: Option<u8>,
    pub attributes: Attributes,
}

impl GffRecord {
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn get_optional(&self, key: &str) -> Option<&str> {
        self.attributes.get_optional(key)
    }

    /// Required-attribute lookup; absence is a row-level parse error.
    pub fn get_required(&self, key: &'static str) -> Result<&str, ParseError> {
        self.attributes
            .get_optional(key)
            .ok_or_else(|| ParseError::MissingAttribute {
                key,
                feature_type: self.feature_type.clone(),
            })
    }
}

/// Parse a single non-comment line into a `GffRecord`.
///
/// A data line has exactly 9 tab-separated columns:
/// chrom, source, feature type, start, end, score, strand, phase, attributes.
/// Coordinates must parse as positive integers with start <= end. Score and
/// phase are informational only and parse leniently ('.' or junk -> None).
pub fn parse_record_line(line: &str) -> Result<GffRecord, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 9 {
        return Err(ParseError::MalformedLine {
            line: line.to_string(),
        });
    }

    let start: u32 = fields[3].parse().map_err(|_| ParseError::BadCoordinates {
        line: line.to_string(),
    })?;
    let end: u32 = fields[4].parse().map_err(|_| ParseError::BadCoordinates {
        line: line.to_string(),
    })?;

    // GFF3 is 1-based: position 0 cannot occur, and a reversed interval is
    // not representable.
    if start == 0 || end < start {
        return Err(ParseError::BadCoordinates {
            line: line.to_string(),
        });
    }

    let score = match fields[5] {
        "." => None,
        s => s.parse::<f32>().ok(),
    };

    let phase = match fields[7] {
        "." => None,
        s => s.parse::<u8>().ok().filter(|p| *p <= 2),
    };

    Ok(GffRecord {
        chrom: fields[0].to_string(),
        source: fields[1].to_string(),
        feature_type: fields[2].to_string(),
        start,
        end,
        score,
        strand: Strand::from_gff3(fields[6]),
        phase,
        attributes: Attributes::parse(fields[8]),
    })
}

/// Streaming reader over GFF3 lines.
///
/// Skips blank lines and '#' comment lines (including the '##' directive
/// pragmas). Each remaining line yields a parse result; the leniency policy
/// for failed rows belongs to the consumer, not the reader.
pub struct GffReader<R: BufRead> {
    reader: R,
    buf: String,
}

impl<R: BufRead> GffReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
        }
    }

    pub fn records(mut self) -> impl Iterator<Item = Result<GffRecord, ParseError>> {
        std::iter::from_fn(move || loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(ParseError::Io { source: e })),
            }

            let line = self.buf.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            return Some(parse_record_line(line));
        })
    }
}
