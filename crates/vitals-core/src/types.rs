use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of a single report section.
///
/// The report never aborts on a degraded section: a missing tool is an
/// informational skip, unreadable input is a warning, and only the sections
/// that depend on it are dropped.
///
/// # Examples
///
/// ```
/// use vitals_core::SectionStatus;
///
/// assert!(SectionStatus::Warn > SectionStatus::Ok);
/// assert_eq!(SectionStatus::Skipped.to_string(), "skipped");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    /// Section produced its full output.
    Ok,
    /// The required tool is not installed; section skipped.
    Skipped,
    /// Input was missing or unreadable; partial or no output.
    Warn,
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionStatus::Ok => write!(f, "ok"),
            SectionStatus::Skipped => write!(f, "skipped"),
            SectionStatus::Warn => write!(f, "warn"),
        }
    }
}

/// One labelled line within a report section.
///
/// # Examples
///
/// ```
/// use vitals_core::SectionItem;
///
/// let item = SectionItem::new("workers", "14");
/// assert_eq!(item.label, "workers");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionItem {
    /// Short label, lower case.
    pub label: String,
    /// Rendered value.
    pub value: String,
}

impl SectionItem {
    /// Build an item from anything stringly.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A complete section of the health report.
///
/// # Examples
///
/// ```
/// use vitals_core::{SectionReport, SectionStatus};
///
/// let section = SectionReport::skipped("mongodb", "mongostat not installed");
/// assert_eq!(section.status, SectionStatus::Skipped);
/// assert!(section.items.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionReport {
    /// Section name as shown in the report header.
    pub name: String,
    /// Outcome of gathering this section.
    pub status: SectionStatus,
    /// Labelled detail lines.
    pub items: Vec<SectionItem>,
    /// One-line explanation for warn/skipped sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SectionReport {
    /// A fully-populated section.
    pub fn ok(name: impl Into<String>, items: Vec<SectionItem>) -> Self {
        Self {
            name: name.into(),
            status: SectionStatus::Ok,
            items,
            note: None,
        }
    }

    /// A section skipped because its tool is not installed.
    pub fn skipped(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: SectionStatus::Skipped,
            items: Vec::new(),
            note: Some(note.into()),
        }
    }

    /// A section whose input was missing or unreadable.
    pub fn warn(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: SectionStatus::Warn,
            items: Vec::new(),
            note: Some(note.into()),
        }
    }

    /// Attach detail lines that survived a degraded gather.
    #[must_use]
    pub fn with_items(mut self, items: Vec<SectionItem>) -> Self {
        self.items = items;
        self
    }
}

/// Output format for the `doctor` report.
///
/// # Examples
///
/// ```
/// use vitals_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colorized sections.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
