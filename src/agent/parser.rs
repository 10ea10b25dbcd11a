//! Descriptor file parsing and rendering.
//!
//! A descriptor file is either a `---` delimited YAML front-matter block
//! followed by free text, or a flat YAML/JSON document. Text that is neither
//! is kept whole as `instructions`, which leaves the record without a name;
//! the loader then rejects it.

use crate::agent::domain::{AgentDescriptor, RawDescriptor};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const DELIMITER: &str = "---";

/// On-disk descriptor format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorFormat {
    /// Front-matter + free-text body (`.md`).
    Markdown,
    /// Flat YAML document (`.yaml`, `.yml`).
    Yaml,
    /// Flat JSON document (`.json`).
    Json,
}

impl DescriptorFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DescriptorFormat::Markdown => "md",
            DescriptorFormat::Yaml => "yaml",
            DescriptorFormat::Json => "json",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(DescriptorFormat::Markdown),
            "yaml" | "yml" => Some(DescriptorFormat::Yaml),
            "json" => Some(DescriptorFormat::Json),
            _ => None,
        }
    }
}

impl fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DescriptorFormat::Markdown => "markdown",
            DescriptorFormat::Yaml => "yaml",
            DescriptorFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for DescriptorFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(DescriptorFormat::Markdown),
            "yaml" | "yml" => Ok(DescriptorFormat::Yaml),
            "json" => Ok(DescriptorFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid descriptor format: {} (must be markdown, yaml, or json)",
                other
            ))),
        }
    }
}

/// How the record was recovered from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    FrontMatter,
    Document,
    BodyOnly,
}

/// Raw record plus the free-text body that followed the front-matter.
#[derive(Debug, Clone)]
pub struct ParsedDescriptor {
    pub raw: RawDescriptor,
    pub body: Option<String>,
    pub mode: ParseMode,
}

/// Parse descriptor file content.
///
/// Returns an error only when a front-matter block is present but cannot be
/// parsed; every other shape produces some record.
pub fn parse_descriptor(content: &str, format: DescriptorFormat) -> Result<ParsedDescriptor, String> {
    let content = content.trim_start_matches('\u{feff}');

    if let Some((header, body)) = split_front_matter(content)? {
        let raw = if header.trim().is_empty() {
            RawDescriptor::default()
        } else {
            serde_yaml::from_str::<RawDescriptor>(header)
                .map_err(|e| format!("Invalid YAML front-matter: {}", e))?
        };
        let body = body.trim();
        return Ok(ParsedDescriptor {
            raw,
            body: (!body.is_empty()).then(|| body.to_string()),
            mode: ParseMode::FrontMatter,
        });
    }

    let document = match format {
        DescriptorFormat::Json => serde_json::from_str::<RawDescriptor>(content).ok(),
        DescriptorFormat::Markdown | DescriptorFormat::Yaml => {
            serde_yaml::from_str::<RawDescriptor>(content).ok()
        }
    };
    if let Some(raw) = document {
        return Ok(ParsedDescriptor {
            raw,
            body: None,
            mode: ParseMode::Document,
        });
    }

    Ok(ParsedDescriptor {
        raw: RawDescriptor {
            instructions: Some(content.trim().to_string()),
            ..RawDescriptor::default()
        },
        body: None,
        mode: ParseMode::BodyOnly,
    })
}

/// Split `---\n<yaml>\n---\n<body>`; `Ok(None)` when there is no opening delimiter.
fn split_front_matter(content: &str) -> Result<Option<(&str, &str)>, String> {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim_end() != DELIMITER {
        return Ok(None);
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let header = &content[header_start..offset];
            let body = &content[offset + line.len()..];
            return Ok(Some((header, body)));
        }
        offset += line.len();
    }
    Err("Missing closing --- for front-matter".to_string())
}

/// Render a descriptor in the requested on-disk format.
pub fn render_descriptor(
    descriptor: &AgentDescriptor,
    format: DescriptorFormat,
) -> Result<String, ApiError> {
    let mut raw = descriptor.to_raw();
    match format {
        DescriptorFormat::Markdown => {
            let body = raw.instructions.take();
            let header = serde_yaml::to_string(&raw)?;
            let mut out = format!("{}\n{}{}\n", DELIMITER, header, DELIMITER);
            if let Some(body) = body {
                out.push('\n');
                out.push_str(&body);
                out.push('\n');
            }
            Ok(out)
        }
        DescriptorFormat::Yaml => Ok(serde_yaml::to_string(&raw)?),
        DescriptorFormat::Json => {
            let mut json = serde_json::to_string_pretty(&raw)?;
            json.push('\n');
            Ok(json)
        }
    }
}
