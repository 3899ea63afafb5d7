//! yum/dnf repo file rewriting.
//!
//! A managed repo file has a single section:
//!
//! ```text
//! [tailscale-stable]
//! name=Tailscale stable
//! baseurl=https://pkgs.tailscale.com/stable/fedora/$basearch
//! enabled=1
//! gpgcheck=1
//! gpgkey=https://pkgs.tailscale.com/stable/fedora/repo.gpg
//! ```
//!
//! The section header, `name=`, `baseurl=` and `gpgkey=` lines are all moved
//! to the target track together.

use anyhow::Result;
use regex::Regex;

use super::{RewriteOutcome, lines_with_terminators};
use crate::core::UpdateError;
use crate::update::Track;

/// Naming used inside the repo file.
#[derive(Debug, Clone, Copy)]
pub struct RepoNaming<'a> {
    /// Package server root without a trailing slash
    pub base_url: &'a str,
    /// Section prefix, e.g. `tailscale` for `[tailscale-stable]`
    pub package: &'a str,
    /// Product name in `name=` lines, e.g. `Tailscale`
    pub display_name: &'a str,
}

/// Points the yum repo file at `track`.
///
/// # Errors
///
/// [`UpdateError::ConfigParse`] when the file has a section outside the
/// package's namespace, no section or more than one, or no package URL.
pub fn rewrite_yum_repo(
    content: &[u8],
    naming: RepoNaming<'_>,
    track: Track,
    path_label: &str,
) -> Result<RewriteOutcome> {
    let config_error = |reason: String| UpdateError::ConfigParse {
        path: path_label.to_string(),
        reason,
    };

    let text = std::str::from_utf8(content)
        .map_err(|_| config_error("file is not valid UTF-8".to_string()))?;
    let url_line = Regex::new(&format!(
        r"^(baseurl|gpgkey)={}/(?:un)?stable/",
        regex::escape(naming.base_url)
    ))?;
    let section_prefix = format!("[{}-", naming.package);

    let mut sections = 0usize;
    let mut urls = 0usize;
    let mut out = String::with_capacity(text.len() + 8);

    for (line, terminator) in lines_with_terminators(text.as_bytes()) {
        // Splitting happens on ASCII bytes, so each piece is still valid UTF-8.
        let line = std::str::from_utf8(line).unwrap_or_default();
        let terminator = std::str::from_utf8(terminator).unwrap_or_default();

        if line.starts_with('[') {
            if !line.starts_with(&section_prefix) {
                return Err(config_error(format!("unexpected {line:?} section")).into());
            }
            sections += 1;
            out.push_str(&format!("[{}-{}]", naming.package, track));
        } else if line.starts_with("name=") {
            out.push_str(&format!("name={} {}", naming.display_name, track));
        } else if line.starts_with("baseurl=") || line.starts_with("gpgkey=") {
            let rewritten = url_line.replace(line, |caps: &regex::Captures<'_>| {
                format!("{}={}/{}/", &caps[1], naming.base_url, track)
            });
            if url_line.is_match(line) {
                urls += 1;
            }
            out.push_str(&rewritten);
        } else {
            out.push_str(line);
        }
        out.push_str(terminator);
    }

    if sections != 1 {
        return Err(config_error(format!(
            "expected exactly one [{}-<track>] section, found {sections}",
            naming.package
        ))
        .into());
    }
    if urls == 0 {
        return Err(
            config_error(format!("no baseurl/gpgkey line points at {}", naming.base_url)).into()
        );
    }
    if out.as_bytes() == content {
        return Ok(RewriteOutcome::Unchanged);
    }
    Ok(RewriteOutcome::Rewritten(out.into_bytes()))
}
