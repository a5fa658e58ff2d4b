//! Path templates with named segments.
//!
//! # Syntax
//! - `/items`: literal segment, compared case-insensitively
//! - `/items/:id`: named segment, exactly one path segment
//! - `/items/:id?`: optional named segment
//! - `/files/:rest*`: zero or more segments, joined with `/`
//! - `/files/:rest+`: one or more segments
//!
//! A trailing slash on the request path is tolerated. Captured values are
//! percent-decoded.
//!
//! # Design Decisions
//! - Segment-wise matching with backtracking, no regex
//! - Prefix patterns stop at a segment boundary: `/api` matches `/api/x`
//!   but not `/apix`

use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use thiserror::Error;

/// Named parameters captured from a path or query string.
pub type Params = BTreeMap<String, String>;

/// Errors raised while compiling a path pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern does not start with `/`.
    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    /// A `:` marker without a parameter name.
    #[error("pattern {pattern:?} has an unnamed parameter")]
    UnnamedParameter { pattern: String },

    /// Parameter name with characters outside `[A-Za-z0-9_]`.
    #[error("pattern {pattern:?} has an invalid parameter name {name:?}")]
    InvalidParameterName { pattern: String, name: String },

    /// Same parameter declared twice.
    #[error("pattern {pattern:?} declares parameter {name:?} twice")]
    DuplicateParameter { pattern: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param { name: String, repeat: Repeat },
}

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Portion of the request path consumed by the pattern.
    pub path: String,
    /// Captured, percent-decoded parameters.
    pub params: Params,
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    tokens: Vec<Token>,
}

/// One raw request path segment with its byte range in the path.
struct Segment {
    decoded: String,
    end: usize,
}

impl PathPattern {
    /// Compile a pattern.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if !source.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(source.to_string()));
        }

        let mut tokens = Vec::new();
        let mut seen = Vec::new();
        for part in source.split('/').filter(|p| !p.is_empty()) {
            let Some(declared) = part.strip_prefix(':') else {
                tokens.push(Token::Literal(decode(part)));
                continue;
            };

            let (name, repeat) = match declared.as_bytes().last() {
                Some(b'?') => (&declared[..declared.len() - 1], Repeat::Optional),
                Some(b'*') => (&declared[..declared.len() - 1], Repeat::ZeroOrMore),
                Some(b'+') => (&declared[..declared.len() - 1], Repeat::OneOrMore),
                _ => (declared, Repeat::One),
            };

            if name.is_empty() {
                return Err(PatternError::UnnamedParameter {
                    pattern: source.to_string(),
                });
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(PatternError::InvalidParameterName {
                    pattern: source.to_string(),
                    name: name.to_string(),
                });
            }
            if seen.contains(&name) {
                return Err(PatternError::DuplicateParameter {
                    pattern: source.to_string(),
                    name: name.to_string(),
                });
            }
            seen.push(name);

            tokens.push(Token::Param {
                name: name.to_string(),
                repeat,
            });
        }

        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    /// The pattern as written at registration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match the whole request path.
    pub fn matches(&self, path: &str) -> Option<PatternMatch> {
        self.match_path(path, false)
    }

    /// Match a leading run of segments; the rest of the path is left over.
    pub fn matches_prefix(&self, path: &str) -> Option<PatternMatch> {
        self.match_path(path, true)
    }

    fn match_path(&self, path: &str, prefix: bool) -> Option<PatternMatch> {
        let segments = split_segments(path);
        let mut params = Params::new();
        let consumed = self.match_from(0, 0, &segments, prefix, &mut params)?;

        let matched = match consumed {
            0 => String::new(),
            n => path[..segments[n - 1].end].to_string(),
        };

        Some(PatternMatch {
            path: matched,
            params,
        })
    }

    /// Returns the number of segments consumed on success.
    fn match_from(
        &self,
        token: usize,
        segment: usize,
        segments: &[Segment],
        prefix: bool,
        params: &mut Params,
    ) -> Option<usize> {
        let Some(current) = self.tokens.get(token) else {
            return (prefix || segment == segments.len()).then_some(segment);
        };

        match current {
            Token::Literal(literal) => {
                let candidate = segments.get(segment)?;
                if !candidate.decoded.eq_ignore_ascii_case(literal) {
                    return None;
                }
                self.match_from(token + 1, segment + 1, segments, prefix, params)
            }
            Token::Param { name, repeat } => {
                let available = segments.len() - segment;
                let (min, max) = match repeat {
                    Repeat::One => (1, 1),
                    Repeat::Optional => (0, 1),
                    Repeat::ZeroOrMore => (0, available),
                    Repeat::OneOrMore => (1, available),
                };
                if available < min {
                    return None;
                }

                // Greedy first, then give segments back.
                for take in (min..=max.min(available)).rev() {
                    let mut attempt = params.clone();
                    if take > 0 {
                        let value = segments[segment..segment + take]
                            .iter()
                            .map(|s| s.decoded.as_str())
                            .collect::<Vec<_>>()
                            .join("/");
                        attempt.insert(name.clone(), value);
                    }
                    if let Some(consumed) =
                        self.match_from(token + 1, segment + take, segments, prefix, &mut attempt)
                    {
                        *params = attempt;
                        return Some(consumed);
                    }
                }
                None
            }
        }
    }
}

fn split_segments(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut offset = 0;
    for raw in path.split('/') {
        let start = offset;
        offset += raw.len() + 1;
        if raw.is_empty() {
            continue;
        }
        segments.push(Segment {
            decoded: decode(raw),
            end: start + raw.len(),
        });
    }
    segments
}

/// Percent-decode one path segment, replacing invalid UTF-8.
pub fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
