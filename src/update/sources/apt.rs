//! apt list file rewriting.
//!
//! A managed list file looks like
//!
//! ```text
//! # Tailscale packages for ubuntu jammy
//! deb [signed-by=/usr/share/keyrings/tailscale-archive-keyring.gpg] https://pkgs.tailscale.com/stable/ubuntu jammy main
//! ```
//!
//! Exactly one `<base>/(un)stable/` URL outside comments is expected.

use anyhow::Result;
use regex::bytes::{Captures, Regex};

use super::{RewriteOutcome, lines_with_terminators};
use crate::core::UpdateError;
use crate::update::Track;

/// Points the apt list file at `track`.
///
/// * `base_url` - package server root without a trailing slash
/// * `path_label` - file name used in error messages
///
/// # Errors
///
/// [`UpdateError::ConfigParse`] when no URL, or more than one URL, would
/// need rewriting.
pub fn rewrite_apt_sources(
    content: &[u8],
    base_url: &str,
    track: Track,
    path_label: &str,
) -> Result<RewriteOutcome> {
    let comment_line = Regex::new(r"^\s*#")?;
    let track_url = Regex::new(&format!(r"\b{}/((?:un)?stable)/", regex::escape(base_url)))?;
    let desired = format!("{base_url}/{track}/");

    let mut had_correct = false;
    let mut changes = 0usize;
    let mut out = Vec::with_capacity(content.len() + 2);

    for (line, terminator) in lines_with_terminators(content) {
        if comment_line.is_match(line) {
            out.extend_from_slice(line);
        } else {
            let rewritten = track_url.replace_all(line, |caps: &Captures<'_>| {
                if &caps[1] == track.as_str().as_bytes() {
                    had_correct = true;
                } else {
                    changes += 1;
                }
                desired.as_bytes().to_vec()
            });
            out.extend_from_slice(&rewritten);
        }
        out.extend_from_slice(terminator);
    }

    if had_correct {
        return Ok(RewriteOutcome::Unchanged);
    }
    if changes != 1 {
        let reason = if changes == 0 {
            format!("no {base_url}/(un)stable/ URL found")
        } else {
            format!("found {changes} URLs to rewrite, expected 1")
        };
        return Err(UpdateError::ConfigParse {
            path: path_label.to_string(),
            reason,
        }
        .into());
    }
    if out == content {
        return Ok(RewriteOutcome::Unchanged);
    }
    Ok(RewriteOutcome::Rewritten(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://pkgs.example.com";

    fn rewrite(content: &str, track: Track) -> Result<RewriteOutcome> {
        rewrite_apt_sources(content.as_bytes(), BASE, track, "tailscale.list")
    }

    fn rewritten(content: &str, track: Track) -> String {
        match rewrite(content, track).unwrap() {
            RewriteOutcome::Rewritten(bytes) => String::from_utf8(bytes).unwrap(),
            RewriteOutcome::Unchanged => panic!("expected a rewrite of {content:?}"),
        }
    }

    #[test]
    fn test_stable_to_unstable_and_back_is_idempotent() {
        let stable = "deb https://pkgs.example.com/stable/ tailscale main\n";
        let unstable = rewritten(stable, Track::Unstable);
        assert_eq!(unstable, "deb https://pkgs.example.com/unstable/ tailscale main\n");
        assert_eq!(rewrite(&unstable, Track::Unstable).unwrap(), RewriteOutcome::Unchanged);

        assert_eq!(rewritten(&unstable, Track::Stable), stable);
        assert_eq!(rewrite(stable, Track::Stable).unwrap(), RewriteOutcome::Unchanged);
    }

    #[test]
    fn test_comments_and_other_bytes_untouched() {
        let content = "# Tailscale packages for ubuntu jammy\n\
                       # deb https://pkgs.example.com/unstable/ubuntu jammy main\n\
                       deb [signed-by=/usr/share/keyrings/tailscale-archive-keyring.gpg] https://pkgs.example.com/stable/ubuntu jammy main";
        let out = rewritten(content, Track::Unstable);
        assert_eq!(
            out,
            "# Tailscale packages for ubuntu jammy\n\
             # deb https://pkgs.example.com/unstable/ubuntu jammy main\n\
             deb [signed-by=/usr/share/keyrings/tailscale-archive-keyring.gpg] https://pkgs.example.com/unstable/ubuntu jammy main"
        );
    }

    #[test]
    fn test_crlf_preserved() {
        let out = rewritten("deb https://pkgs.example.com/unstable/debian bookworm main\r\n", Track::Stable);
        assert_eq!(out, "deb https://pkgs.example.com/stable/debian bookworm main\r\n");
    }

    #[test]
    fn test_both_tracks_present_is_unchanged() {
        let content = "deb https://pkgs.example.com/stable/ubuntu jammy main\n\
                       deb https://pkgs.example.com/unstable/ubuntu jammy main\n";
        assert_eq!(rewrite(content, Track::Stable).unwrap(), RewriteOutcome::Unchanged);
        assert_eq!(rewrite(content, Track::Unstable).unwrap(), RewriteOutcome::Unchanged);
    }

    #[test]
    fn test_no_url_is_rejected() {
        let err = rewrite("deb http://archive.ubuntu.com/ubuntu jammy main\n", Track::Stable).unwrap_err();
        assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::ConfigParse { .. })));
        assert!(err.to_string().starts_with("unexpected/unsupported tailscale.list contents"));

        let commented = "# deb https://pkgs.example.com/stable/ubuntu jammy main\n";
        assert!(rewrite(commented, Track::Unstable).is_err());
        assert!(rewrite("", Track::Unstable).is_err());
    }

    #[test]
    fn test_multiple_urls_to_change_rejected() {
        let content = "deb https://pkgs.example.com/stable/ubuntu jammy main\n\
                       deb-src https://pkgs.example.com/stable/ubuntu jammy main\n";
        let err = rewrite(content, Track::Unstable).unwrap_err();
        assert!(err.to_string().contains("found 2 URLs to rewrite"));
    }

    #[test]
    fn test_other_hosts_ignored() {
        let content = "deb https://mirror.pkgs.example.com.evil/stable/ x main\n";
        assert!(rewrite(content, Track::Unstable).is_err());
    }
}
