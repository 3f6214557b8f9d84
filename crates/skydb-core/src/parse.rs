//! Extracting skylinks out of URLs and URL-ish strings.
//!
//! A skylink can show up in four shapes:
//! - bare: `XABvi7...VdEg`
//! - prefixed: `sia:XABvi7...` or `sia://XABvi7...`
//! - as a URL path: `https://portal.example/XABvi7.../foo/bar?x=1`
//! - as a base32 subdomain: `https://bg06v2...q4g.portal.example/foo`

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{SkyError, SkyResult};
use crate::URI_SKYNET_PREFIX;

static SKYLINK_DIRECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^([a-zA-Z0-9_-]{46})$").expect("static regex")
});
static SKYLINK_PATHNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^/?([a-zA-Z0-9_-]{46})((/.*)?)$").expect("static regex")
});
static SKYLINK_SUBDOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9_-]{55})(\..*)?$").expect("static regex")
});

/// How [`parse_skylink`] interprets its input and what it returns.
///
/// `include_path` and `only_path` are mutually exclusive, as are
/// `include_path` and `from_subdomain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSkylinkOptions {
    /// Parse the skylink out of the hostname (base32 form) instead of the
    /// path.
    pub from_subdomain: bool,
    /// Return the skylink together with the path that follows it.
    pub include_path: bool,
    /// Return only the path that follows the skylink.
    pub only_path: bool,
}

/// Extract a skylink (or its path) from a URL-ish string.
///
/// Returns `Ok(None)` when the input contains no skylink in the requested
/// shape; errors only on conflicting options.
pub fn parse_skylink(
    skylink_url: &str,
    options: ParseSkylinkOptions,
) -> SkyResult<Option<String>> {
    if options.include_path && options.only_path {
        return Err(SkyError::Format(
            "The includePath and onlyPath options cannot both be set".to_string(),
        ));
    }
    if options.include_path && options.from_subdomain {
        return Err(SkyError::Format(
            "The includePath and fromSubdomain options cannot both be set".to_string(),
        ));
    }

    if options.from_subdomain {
        return Ok(parse_skylink_base32(skylink_url, options));
    }

    let trimmed = trim_uri_prefix(skylink_url, URI_SKYNET_PREFIX);

    if let Some(caps) = SKYLINK_DIRECT_RE.captures(&trimmed) {
        if options.only_path {
            return Ok(Some(String::new()));
        }
        return Ok(Some(caps[1].to_string()));
    }

    let skylink_and_path = trim_suffix_all(&url_path(&trimmed), '/');
    let caps = match SKYLINK_PATHNAME_RE.captures(&skylink_and_path) {
        Some(caps) => caps,
        None => return Ok(None),
    };

    if options.include_path {
        return Ok(Some(trim_forward_slash(&skylink_and_path)));
    }
    if options.only_path {
        return Ok(Some(caps[2].to_string()));
    }
    Ok(Some(caps[1].to_string()))
}

/// Extract the base32 skylink from a URL's subdomain, or its trailing path
/// when `only_path` is set.
pub fn parse_skylink_base32(skylink_url: &str, options: ParseSkylinkOptions) -> Option<String> {
    let url = Url::parse(skylink_url).ok()?;
    let host = url.host_str()?;
    let caps = SKYLINK_SUBDOMAIN_RE.captures(host)?;

    if options.only_path {
        return Some(trim_suffix_all(url.path(), '/'));
    }
    Some(caps[1].to_string())
}

/// Strip a `scheme://` prefix, also accepting the slash-less `scheme:` form.
/// Matching is case-insensitive; the remainder keeps its case.
pub fn trim_uri_prefix(s: &str, prefix: &str) -> String {
    let long = prefix.to_ascii_lowercase();
    let short = long.trim_end_matches('/');
    let lower = s.to_ascii_lowercase();
    if lower.starts_with(&long) {
        return s[long.len()..].to_string();
    }
    if lower.starts_with(short) {
        return s[short.len()..].to_string();
    }
    s.to_string()
}

/// The path component of a URL-ish string: a full URL parse when the input
/// has a scheme, otherwise everything before the query/fragment.
fn url_path(s: &str) -> String {
    if let Ok(url) = Url::parse(s) {
        if !url.cannot_be_a_base() {
            return url.path().to_string();
        }
    }
    let s = s.split('#').next().unwrap_or(s);
    let s = s.split('?').next().unwrap_or(s);
    s.to_string()
}

fn trim_suffix_all(s: &str, suffix: char) -> String {
    s.trim_end_matches(suffix).to_string()
}

fn trim_forward_slash(s: &str) -> String {
    s.trim_matches('/').to_string()
}
