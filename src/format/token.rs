//! Built-in log tokens.
//!
//! # Responsibilities
//! - Resolve a token name (and optional argument) to a [`Token`] at compile time
//! - Extract the token value from a request/response pair at render time
//!
//! # Design Decisions
//! - Closed enum instead of a string-keyed registry; unknown names fail early
//! - Extraction never fails: missing data is `None`, rendered as `-` by the caller

use std::fmt;

use axum::http::header::{AUTHORIZATION, REFERER, USER_AGENT};
use axum::http::{HeaderName, Version};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::format::FormatError;
use crate::http::{RequestContext, ResponseView};

/// Credentials are decoded with or without padding, in either alphabet.
const LENIENT_CONFIG: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_CONFIG);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_CONFIG);

/// Sub-format of the `date` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// Common Log Format: `10/Oct/2000:13:55:36 +0000`.
    Clf,
    /// RFC 3339 with milliseconds: `2000-10-10T13:55:36.000Z`.
    Iso,
    /// RFC 1123: `Tue, 10 Oct 2000 13:55:36 GMT`.
    Web,
}

impl DateFormat {
    /// Anything other than `clf` or `iso` falls back to `web`.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("clf") => DateFormat::Clf,
            Some("iso") => DateFormat::Iso,
            _ => DateFormat::Web,
        }
    }

    pub fn format(&self, at: DateTime<Utc>) -> String {
        match self {
            DateFormat::Clf => at.format("%d/%b/%Y:%H:%M:%S +0000").to_string(),
            DateFormat::Iso => at.to_rfc3339_opts(SecondsFormat::Millis, true),
            DateFormat::Web => at.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        }
    }
}

/// A named placeholder in a log format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Method,
    Url,
    ResponseTime,
    Date(DateFormat),
    Status,
    Referrer,
    RemoteAddr,
    RemoteUser,
    HttpVersion,
    UserAgent,
    RequestHeader(HeaderName),
    ResponseHeader(HeaderName),
}

impl Token {
    /// Resolve a token by name. Arguments on tokens that take none are ignored.
    pub fn parse(name: &str, arg: Option<&str>) -> Result<Self, FormatError> {
        let token = match name {
            "method" => Token::Method,
            "url" => Token::Url,
            "responseTime" => Token::ResponseTime,
            "date" => Token::Date(DateFormat::from_arg(arg)),
            "status" => Token::Status,
            "referrer" => Token::Referrer,
            "remoteAddr" => Token::RemoteAddr,
            "remoteUser" => Token::RemoteUser,
            "httpVersion" => Token::HttpVersion,
            "userAgent" => Token::UserAgent,
            "request" => Token::RequestHeader(header_arg(name, arg)?),
            "response" => Token::ResponseHeader(header_arg(name, arg)?),
            _ => return Err(FormatError::UnknownToken(name.to_string())),
        };
        Ok(token)
    }

    /// Value of this token for one exchange, `None` when not available.
    pub fn extract(&self, request: &RequestContext, response: &ResponseView) -> Option<String> {
        match self {
            Token::Method => Some(request.method().to_string()),
            Token::Url => Some(request.url().to_string()),
            Token::ResponseTime => response.elapsed_since(request.started()).map(|elapsed| {
                format!("{:.3}", elapsed.as_secs_f64() * 1e3)
            }),
            Token::Date(format) => Some(format.format(Utc::now())),
            Token::Status => response.status().map(|s| s.as_u16().to_string()),
            Token::Referrer => request
                .header(REFERER.as_str())
                .or_else(|| request.header("referrer")),
            Token::RemoteAddr => request.remote_addr().map(|ip| ip.to_string()),
            Token::RemoteUser => request
                .header(AUTHORIZATION.as_str())
                .and_then(|value| basic_auth_user(&value)),
            Token::HttpVersion => Some(http_version(request.version()).to_string()),
            Token::UserAgent => request.header(USER_AGENT.as_str()),
            Token::RequestHeader(name) => request.header(name.as_str()),
            Token::ResponseHeader(name) => response.header(name.as_str()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Method => write!(f, ":method"),
            Token::Url => write!(f, ":url"),
            Token::ResponseTime => write!(f, ":responseTime"),
            Token::Date(DateFormat::Clf) => write!(f, ":date[clf]"),
            Token::Date(DateFormat::Iso) => write!(f, ":date[iso]"),
            Token::Date(DateFormat::Web) => write!(f, ":date[web]"),
            Token::Status => write!(f, ":status"),
            Token::Referrer => write!(f, ":referrer"),
            Token::RemoteAddr => write!(f, ":remoteAddr"),
            Token::RemoteUser => write!(f, ":remoteUser"),
            Token::HttpVersion => write!(f, ":httpVersion"),
            Token::UserAgent => write!(f, ":userAgent"),
            Token::RequestHeader(name) => write!(f, ":request[{}]", name),
            Token::ResponseHeader(name) => write!(f, ":response[{}]", name),
        }
    }
}

fn header_arg(token: &str, arg: Option<&str>) -> Result<HeaderName, FormatError> {
    let arg = arg.ok_or_else(|| FormatError::MissingArgument(token.to_string()))?;
    HeaderName::from_bytes(arg.to_ascii_lowercase().as_bytes())
        .map_err(|_| FormatError::InvalidHeader(arg.to_string()))
}

fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}

/// Username from a `Basic` credentials header; `None` if unparsable or empty.
fn basic_auth_user(header: &str) -> Option<String> {
    let header = header.trim_start_matches(' ');
    let (scheme, rest) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let encoded = rest.trim_matches(' ');
    let decoded = LENIENT_STANDARD
        .decode(encoded)
        .or_else(|_| LENIENT_URL_SAFE.decode(encoded))
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, _password) = decoded.split_once(':')?;

    if user.is_empty() {
        None
    } else {
        Some(user.to_string())
    }
}
