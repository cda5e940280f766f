// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public-route matching.
//!
//! Patterns are glob-like paths:
//!
//! - `*` matches characters inside a single path segment
//! - `**` matches zero or more whole segments
//! - anything else matches literally, including `?`, `[`, `]`, `{`, `}` and
//!   `\`, so `/api/users/{id}` matches only that exact path
//!
//! A path is public when it matches at least one pattern. There is no
//! precedence between patterns. The compiled set is built once at startup and
//! only read afterwards.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// Invalid public-route pattern.
#[derive(Debug, thiserror::Error)]
#[error("invalid route pattern '{pattern}': {source}")]
pub struct PatternError {
    pattern: String,
    #[source]
    source: globset::Error,
}

/// Decides whether a request path skips authentication.
pub trait RouteSource: Send + Sync {
    fn is_public(&self, path: &str) -> bool;
}

/// Compiled, immutable set of public-route patterns.
#[derive(Debug, Clone)]
pub struct RoutePatterns {
    patterns: Vec<String>,
    set: GlobSet,
}

impl RoutePatterns {
    /// Compile an ordered pattern list.
    pub fn compile<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut sources = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }

            builder.add(build_glob(pattern)?);
            // `/prefix/**` also covers `/prefix` itself.
            if let Some(prefix) = pattern.strip_suffix("/**") {
                if !prefix.is_empty() {
                    builder.add(build_glob(prefix)?);
                }
            }
            sources.push(pattern.to_string());
        }

        let set = builder.build().map_err(|source| PatternError {
            pattern: sources.join(","),
            source,
        })?;

        Ok(Self {
            patterns: sources,
            set,
        })
    }

    /// Patterns in configuration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

impl RouteSource for RoutePatterns {
    fn is_public(&self, path: &str) -> bool {
        RoutePatterns::is_public(self, path)
    }
}

/// Match `path` against `patterns` without keeping any compiled state.
///
/// Invalid patterns never match.
pub fn is_public<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|pattern| {
        RoutePatterns::compile([pattern.as_ref()])
            .map(|compiled| compiled.is_public(path))
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "skipping invalid route pattern");
                false
            })
    })
}

fn build_glob(pattern: &str) -> Result<Glob, PatternError> {
    GlobBuilder::new(&literal_except_stars(pattern))
        .literal_separator(true)
        .backslash_escape(false)
        .build()
        .map_err(|source| PatternError {
            pattern: pattern.to_string(),
            source,
        })
}

/// Wrap every glob metacharacter other than `*` in a one-character class.
fn literal_except_stars(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '?' | '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
