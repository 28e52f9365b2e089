//! Named log formats.

use std::fmt;

/// Apache-style combined log format with an RFC 1123 date.
pub const DEFAULT: &str = ":remoteAddr - :remoteUser [:date] \":method :url HTTP/:httpVersion\" :status :response[content-length] \":referrer\" \":userAgent\"";

/// Apache combined log format.
pub const COMBINED: &str = ":remoteAddr - :remoteUser [:date[clf]] \":method :url HTTP/:httpVersion\" :status :response[content-length] \":referrer\" \":userAgent\"";

/// Apache common log format.
pub const COMMON: &str = ":remoteAddr - :remoteUser [:date[clf]] \":method :url HTTP/:httpVersion\" :status :response[content-length]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Default,
    Combined,
    Common,
}

impl Preset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Preset::Default),
            "combined" => Some(Preset::Combined),
            "common" => Some(Preset::Common),
            _ => None,
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Preset::Default => DEFAULT,
            Preset::Combined => COMBINED,
            Preset::Common => COMMON,
        }
    }
}

/// A format as configured: a preset or a user template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSpec {
    Preset(Preset),
    Template(String),
}

impl FormatSpec {
    /// Absent means the default preset; a preset name wins over a template.
    pub fn resolve(format: Option<&str>) -> Self {
        match format {
            None | Some("") => FormatSpec::Preset(Preset::Default),
            Some(name) => match Preset::from_name(name) {
                Some(preset) => FormatSpec::Preset(preset),
                None => FormatSpec::Template(name.to_string()),
            },
        }
    }

    pub fn template(&self) -> &str {
        match self {
            FormatSpec::Preset(preset) => preset.template(),
            FormatSpec::Template(template) => template,
        }
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec::Preset(Preset::Default)
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatSpec::Preset(Preset::Default) => write!(f, "default"),
            FormatSpec::Preset(Preset::Combined) => write!(f, "combined"),
            FormatSpec::Preset(Preset::Common) => write!(f, "common"),
            FormatSpec::Template(template) => write!(f, "{}", template),
        }
    }
}
