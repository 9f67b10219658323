//! Marker-based excerpt extraction over raw tool output.
//!
//! Tool report formats are not stable contracts, so this is plain substring
//! search. It behaves the same whether the markers sit in JSON or free text.

/// Returned when a tool produced nothing worth reporting.
pub const NO_FINDINGS: &str = "No findings.";

/// Start/end strings that bracket the interesting part of a tool's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub start: &'static str,
    /// `None` means the section runs to the end of the text.
    pub end: Option<&'static str>,
}

impl Markers {
    pub const fn open(start: &'static str) -> Self {
        Self { start, end: None }
    }

    pub const fn between(start: &'static str, end: &'static str) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }
}

/// Isolate the excerpt between `start` and the first `end` that follows it.
///
/// A missing start marker is not an error: the tool had nothing to report and
/// the [`NO_FINDINGS`] sentinel comes back. A missing end marker leaves the
/// section open, so everything from the start marker onward is returned.
pub fn extract(raw: &str, start: &str, end: Option<&str>) -> String {
    let Some(begin) = raw.find(start) else {
        return NO_FINDINGS.to_string();
    };

    let search_from = begin + start.len();
    let finish = end
        .and_then(|marker| raw[search_from..].find(marker))
        .map(|offset| search_from + offset)
        .unwrap_or(raw.len());

    raw[begin..finish].trim().to_string()
}

/// Normalize one step's output, with or without markers.
pub fn normalize(raw: &str, markers: Option<&Markers>) -> String {
    match markers {
        Some(m) => extract(raw, m.start, m.end),
        None => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                NO_FINDINGS.to_string()
            } else {
                trimmed.to_string()
            }
        }
    }
}
