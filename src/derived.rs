//! Derived fields
//!
//! Micro-parsers that compute secondary values from raw extracted strings,
//! and the per-record cache that makes each computation happen at most once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::avatar;

/// How a derived field is computed from its raw source field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    /// Text after `prefix`, up to `terminator` when given (`/t/123#reply4` -> `123`)
    PathSegment {
        prefix: String,
        #[serde(default)]
        terminator: Option<char>,
    },
    /// Text after the last `/`; empty input has no value at all
    LastSegment,
    /// Avatar URL rewritten to an absolute, large-size URL
    Avatar {
        #[serde(default = "default_avatar_base")]
        base: String,
    },
    /// Short "N units ago" phrase out of a bullet separated line
    ElapsedTime {
        #[serde(default = "default_marker")]
        marker: char,
        #[serde(default = "default_separator")]
        separator: char,
    },
}

fn default_avatar_base() -> String {
    avatar::DEFAULT_BASE.to_string()
}

fn default_marker() -> char {
    '前'
}

fn default_separator() -> char {
    '•'
}

impl Derivation {
    /// Topic id out of a topic link
    pub fn topic_id() -> Self {
        Derivation::PathSegment {
            prefix: "/t/".to_string(),
            terminator: Some('#'),
        }
    }

    /// Node short name out of a node link
    pub fn tag_name() -> Self {
        Derivation::PathSegment {
            prefix: "/go/".to_string(),
            terminator: None,
        }
    }

    pub fn avatar() -> Self {
        Derivation::Avatar {
            base: default_avatar_base(),
        }
    }

    pub fn elapsed_time() -> Self {
        Derivation::ElapsedTime {
            marker: default_marker(),
            separator: default_separator(),
        }
    }

    /// Run the derivation. `None` means "no value", which only
    /// [`Derivation::LastSegment`] produces.
    pub fn apply(&self, raw: &str) -> Option<String> {
        match self {
            Derivation::PathSegment { prefix, terminator } => {
                Some(path_segment(raw, prefix, *terminator))
            }
            Derivation::LastSegment => last_segment(raw),
            Derivation::Avatar { base } => Some(avatar::normalize(raw, base)),
            Derivation::ElapsedTime { marker, separator } => {
                Some(elapsed_time(raw, *marker, *separator))
            }
        }
    }
}

/// Slice `link` between `prefix` and `terminator`.
///
/// Empty link or missing prefix gives an empty string. A missing
/// terminator takes the rest of the link.
pub fn path_segment(link: &str, prefix: &str, terminator: Option<char>) -> String {
    if link.is_empty() {
        return String::new();
    }
    let Some(start) = link.find(prefix) else {
        trace!(link, prefix, "prefix not found");
        return String::new();
    };
    let rest = &link[start + prefix.len()..];
    let segment = match terminator.and_then(|t| rest.find(t)) {
        Some(end) => &rest[..end],
        None => rest,
    };
    segment.to_string()
}

/// Everything after the last `/`, or `None` for an empty link
pub fn last_segment(link: &str) -> Option<String> {
    if link.is_empty() {
        return None;
    }
    let start = link.rfind('/').map(|i| i + 1).unwrap_or(0);
    Some(link[start..].to_string())
}

/// Extract the elapsed-time phrase from a line such as
/// `•  36 天前  •  最后回复来自`.
///
/// All whitespace is dropped first. The phrase runs from just after the
/// separator preceding the first `marker` (or the start of the line)
/// through the marker itself.
pub fn elapsed_time(raw: &str, marker: char, separator: char) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let Some(end) = compact.find(marker) else {
        return String::new();
    };
    let start = compact[..end]
        .rfind(separator)
        .map(|i| i + separator.len_utf8())
        .unwrap_or(0);
    compact[start..end + marker.len_utf8()].trim().to_string()
}

/// Write-once slots for the derived fields of one record
#[derive(Debug, Default)]
pub struct DerivedCache {
    slots: Vec<OnceLock<Option<String>>>,
    computed: AtomicUsize,
}

impl DerivedCache {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
            computed: AtomicUsize::new(0),
        }
    }

    /// Value of slot `index`, running `compute` only if the slot is empty
    pub fn get_or_compute<F>(&self, index: usize, compute: F) -> Option<&str>
    where
        F: FnOnce() -> Option<String>,
    {
        let slot = self.slots.get(index)?;
        slot.get_or_init(|| {
            self.computed.fetch_add(1, Ordering::Relaxed);
            compute()
        })
        .as_deref()
    }

    /// How many slot computations have run so far
    pub fn computations(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }
}

impl Clone for DerivedCache {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            computed: AtomicUsize::new(self.computations()),
        }
    }
}
