//! Package-manager source file rewriting.
//!
//! Both rewriters work on the raw file bytes and the desired track and
//! return a [`RewriteOutcome`]. They never produce partial output: either
//! the content is left byte-identical, replaced wholesale, or rejected with
//! [`UpdateError::ConfigParse`](crate::core::UpdateError::ConfigParse).
//!
//! Line terminators are preserved exactly, including a missing final
//! newline.

pub mod apt;
pub mod yum;

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

pub use apt::rewrite_apt_sources;
pub use yum::rewrite_yum_repo;

/// Result of a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The file already points at the desired track
    Unchanged,
    /// Replacement content for the whole file
    Rewritten(Vec<u8>),
}

/// Splits `content` into `(line, terminator)` pairs, where the terminator is
/// `"\r\n"`, `"\n"`, or empty for a final unterminated line.
pub(crate) fn lines_with_terminators(content: &[u8]) -> impl Iterator<Item = (&[u8], &[u8])> {
    content.split_inclusive(|&b| b == b'\n').map(|raw| {
        let body_len = if raw.ends_with(b"\r\n") {
            raw.len() - 2
        } else if raw.ends_with(b"\n") {
            raw.len() - 1
        } else {
            raw.len()
        };
        raw.split_at(body_len)
    })
}

/// Reads `path`, applies `rewrite`, and writes the result back in place
/// with the original permission bits.
///
/// Returns `true` when the file was rewritten.
pub async fn update_source_file<R>(path: &Path, rewrite: R) -> Result<bool>
where
    R: FnOnce(&[u8]) -> Result<RewriteOutcome>,
{
    let original = fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let permissions = fs::metadata(path)
        .await
        .with_context(|| format!("Failed to read permissions of {}", path.display()))?
        .permissions();

    match rewrite(&original)? {
        RewriteOutcome::Unchanged => {
            tracing::debug!("{} already up to date", path.display());
            Ok(false)
        }
        RewriteOutcome::Rewritten(content) => {
            fs::write(path, &content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            fs::set_permissions(path, permissions)
                .await
                .with_context(|| format!("Failed to restore permissions of {}", path.display()))?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::Track;

    #[test]
    fn test_lines_with_terminators() {
        let lines: Vec<_> = lines_with_terminators(b"a\nb\r\nc").collect();
        assert_eq!(
            lines,
            vec![(&b"a"[..], &b"\n"[..]), (&b"b"[..], &b"\r\n"[..]), (&b"c"[..], &b""[..])]
        );
        assert_eq!(lines_with_terminators(b"").count(), 0);
    }

    #[tokio::test]
    async fn test_update_source_file_rewrites_and_keeps_permissions() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("tailscale.list");
        std::fs::write(&path, "deb https://pkgs.example.com/stable/ubuntu jammy main\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();
        }

        let rewrote = update_source_file(&path, |content| {
            rewrite_apt_sources(content, "https://pkgs.example.com", Track::Unstable, "tailscale.list")
        })
        .await
        .unwrap();
        assert!(rewrote);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "deb https://pkgs.example.com/unstable/ubuntu jammy main\n"
        );
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o640);
        }

        let again = update_source_file(&path, |content| {
            rewrite_apt_sources(content, "https://pkgs.example.com", Track::Unstable, "tailscale.list")
        })
        .await
        .unwrap();
        assert!(!again);
    }

    #[tokio::test]
    async fn test_update_source_file_missing() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing.list");
        let err = update_source_file(&path, |_| Ok(RewriteOutcome::Unchanged)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
