//! Backend selection for a repository location.

use std::path::Path;

use tracing::debug;

use repolist_core::ListError;

use crate::fs::RepoFs;
use crate::local::LocalRepo;

/// Open the repository at `url`, optionally pinned to a revision.
///
/// Without a revision the working copy is read from disk; with one, a
/// read-only snapshot of that revision is used. The returned handle
/// releases its resources when dropped.
pub fn open_repository(url: &str, rev: Option<&str>) -> Result<Box<dyn RepoFs>, ListError> {
    if is_remote(url) {
        return Err(ListError::open(url, "remote repositories are not supported"));
    }

    let path = Path::new(url);
    debug!(url, rev = rev.unwrap_or("workspace"), "opening repository");
    match rev {
        None => Ok(Box::new(LocalRepo::open(path)?)),
        #[cfg(feature = "git")]
        Some(rev) => Ok(Box::new(crate::git::GitSnapshot::open(path, rev)?)),
        #[cfg(not(feature = "git"))]
        Some(_) => Err(ListError::open(url, "revisions require the `git` feature")),
    }
}

/// Check if a location refers to a remote repository.
pub fn is_remote(url: &str) -> bool {
    if url.contains("://") {
        return true;
    }
    // scp-like syntax: user@host:path
    match (url.find('@'), url.find(':')) {
        (Some(at), Some(colon)) => at < colon && !url[..colon].contains('/'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://github.com/example/repo"));
        assert!(is_remote("git@github.com:example/repo"));
        assert!(!is_remote("/home/user/repo"));
        assert!(!is_remote("relative/dir"));
        assert!(!is_remote("./dir@v2:old"));
    }

    #[test]
    fn test_open_remote_fails() {
        let err = open_repository("git@github.com:example/repo", None).err().unwrap();
        assert!(matches!(err, ListError::RepositoryOpen { .. }));
    }

    #[test]
    fn test_open_local_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();

        let repo = open_repository(temp.path().to_str().unwrap(), None).unwrap();
        assert!(repo.exists("a.txt"));
        assert!(!repo.exists("b.txt"));
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let err = open_repository("/no/such/repository", None).err().unwrap();
        assert!(matches!(err, ListError::RepositoryOpen { .. }));
    }
}
