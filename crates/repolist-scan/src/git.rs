//! Read-only snapshot of a git repository at a revision.

use std::path::Path;

use git2::{ErrorCode, ObjectType, Oid, Repository, Tree, TreeWalkMode, TreeWalkResult};
use tracing::{debug, warn};

use repolist_core::{ListError, RepoMetadata, repo_path};

use crate::fs::{RepoFs, WalkOptions, WalkStep, walk_top_down};
use crate::outputs::OutputIndex;

const EXECUTABLE_MODE: i32 = 0o100755;
const CONTROL_DIRS: [&str; 2] = [".git", ".dvc"];

enum Node {
    Tree(Oid),
    Blob { id: Oid, executable: bool },
}

/// Historical snapshot of a git repository.
///
/// Content comes from the commit tree, outputs from the `*.dvc`
/// declarations committed at that revision.
pub struct GitSnapshot {
    repo: Repository,
    location: String,
    rev: String,
    tree_id: Oid,
    outputs: OutputIndex,
}

fn git_error(err: git2::Error) -> ListError {
    ListError::Git {
        message: err.message().to_string(),
    }
}

impl GitSnapshot {
    /// Open the repository at `path` and resolve `rev` to a tree.
    pub fn open(path: impl AsRef<Path>, rev: &str) -> Result<Self, ListError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let repo = Repository::open(path).map_err(|e| ListError::open(&location, e.message()))?;
        let tree_id = repo
            .revparse_single(rev)
            .and_then(|object| object.peel_to_tree())
            .map(|tree| tree.id())
            .map_err(|e| ListError::open(&location, format!("unknown revision '{rev}': {}", e.message())))?;

        let mut snapshot = Self {
            repo,
            location,
            rev: rev.to_string(),
            tree_id,
            outputs: OutputIndex::new(),
        };
        snapshot.outputs = snapshot.index_outputs()?;
        debug!(
            location = %snapshot.location,
            rev = %snapshot.rev,
            outputs = snapshot.outputs.len(),
            "opened git snapshot"
        );
        Ok(snapshot)
    }

    /// Revision this snapshot was resolved from.
    pub fn rev(&self) -> &str {
        &self.rev
    }

    fn root_tree(&self) -> Result<Tree<'_>, ListError> {
        self.repo.find_tree(self.tree_id).map_err(git_error)
    }

    fn index_outputs(&self) -> Result<OutputIndex, ListError> {
        let tree = self.root_tree()?;
        let mut declarations = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            let name = entry.name().unwrap_or_default();
            match entry.kind() {
                Some(ObjectType::Tree) if CONTROL_DIRS.contains(&name) => TreeWalkResult::Skip,
                Some(ObjectType::Blob) if OutputIndex::is_declaration(name) => {
                    declarations.push((format!("{root}{name}"), entry.id()));
                    TreeWalkResult::Ok
                }
                _ => TreeWalkResult::Ok,
            }
        })
        .map_err(git_error)?;

        let mut index = OutputIndex::new();
        for (path, id) in declarations {
            let blob = self.repo.find_blob(id).map_err(git_error)?;
            let loaded = std::str::from_utf8(blob.content())
                .map_err(|e| ListError::InvalidOutputFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })
                .and_then(|contents| index.load_declaration(&path, contents));
            if let Err(err) = loaded {
                warn!("skipping output declaration: {err}");
            }
        }
        Ok(index)
    }

    fn lookup(&self, path: &str) -> Result<Option<Node>, ListError> {
        if path.is_empty() {
            return Ok(Some(Node::Tree(self.tree_id)));
        }
        if repo_path::components(path).any(|c| CONTROL_DIRS.contains(&c)) {
            return Ok(None);
        }

        let tree = self.root_tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(err) if err.code() == ErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(git_error(err)),
        };

        Ok(match entry.kind() {
            Some(ObjectType::Tree) => Some(Node::Tree(entry.id())),
            Some(ObjectType::Blob) => Some(Node::Blob {
                id: entry.id(),
                executable: entry.filemode() == EXECUTABLE_MODE,
            }),
            _ => None,
        })
    }

    fn list_dir(&self, dir: &str, include_declarations: bool) -> Result<WalkStep, ListError> {
        let mut step = WalkStep::new(dir);
        if let Some(Node::Tree(id)) = self.lookup(dir)? {
            let tree = self.repo.find_tree(id).map_err(git_error)?;
            for entry in tree.iter() {
                let Some(name) = entry.name() else {
                    continue;
                };
                match entry.kind() {
                    Some(ObjectType::Tree) if !CONTROL_DIRS.contains(&name) => {
                        step.dirs.push(name.to_string())
                    }
                    Some(ObjectType::Blob) => step.files.push(name.to_string()),
                    _ => {}
                }
            }
        }
        self.outputs.complete_step(&mut step, include_declarations);
        Ok(step)
    }

    fn blob_size(&self, id: Oid) -> Result<u64, ListError> {
        let blob = self.repo.find_blob(id).map_err(git_error)?;
        Ok(blob.size() as u64)
    }

    fn tree_size(&self, id: Oid) -> Result<u64, ListError> {
        let tree = self.repo.find_tree(id).map_err(git_error)?;
        let mut blobs = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |_, entry| match entry.kind() {
            Some(ObjectType::Tree) if CONTROL_DIRS.contains(&entry.name().unwrap_or_default()) => {
                TreeWalkResult::Skip
            }
            Some(ObjectType::Blob) => {
                blobs.push(entry.id());
                TreeWalkResult::Ok
            }
            _ => TreeWalkResult::Ok,
        })
        .map_err(git_error)?;

        blobs
            .into_iter()
            .try_fold(0u64, |total, id| Ok(total.saturating_add(self.blob_size(id)?)))
    }
}

impl RepoFs for GitSnapshot {
    fn location(&self) -> String {
        format!("{}@{}", self.location, self.rev)
    }

    fn walk(&self, path: &str, options: WalkOptions) -> Result<Vec<WalkStep>, ListError> {
        let path = repo_path::normalize(path);
        match self.lookup(&path)? {
            Some(Node::Tree(_)) => walk_top_down(&path, options.recursive, |dir| {
                self.list_dir(dir, options.include_declarations)
            }),
            Some(Node::Blob { .. }) => Err(ListError::NotADirectory { path }),
            None if self.outputs.is_output(&path) => Err(ListError::NotADirectory { path }),
            None if self.outputs.is_implied_dir(&path) => {
                walk_top_down(&path, options.recursive, |dir| {
                    self.list_dir(dir, options.include_declarations)
                })
            }
            None => Ok(Vec::new()),
        }
    }

    fn metadata(&self, path: &str) -> Result<RepoMetadata, ListError> {
        let path = repo_path::normalize(path);
        let (is_dir, is_exec) = match self.lookup(&path)? {
            Some(Node::Tree(_)) => (true, false),
            Some(Node::Blob { executable, .. }) => (false, executable),
            None => match self.outputs.get(&path) {
                Some(decl) => (decl.is_dir, false),
                None if self.outputs.is_implied_dir(&path) => (true, false),
                None => {
                    return Err(ListError::io(
                        path,
                        std::io::Error::from(std::io::ErrorKind::NotFound),
                    ));
                }
            },
        };

        Ok(RepoMetadata {
            output_exists: self.outputs.output_exists(&path),
            is_output: self.outputs.is_output(&path),
            is_dir,
            is_exec,
        })
    }

    fn size(&self, path: &str) -> Result<Option<u64>, ListError> {
        let path = repo_path::normalize(path);
        match self.lookup(&path)? {
            Some(Node::Blob { id, .. }) => Ok(Some(self.blob_size(id)?)),
            Some(Node::Tree(id)) => {
                let blobs = self.tree_size(id)?;
                let virtual_outputs = self.outputs.declared_size_under(&path, |p| {
                    matches!(self.lookup(p), Ok(None))
                });
                Ok(Some(blobs.saturating_add(virtual_outputs)))
            }
            None if self.outputs.is_implied_dir(&path) => Ok(Some(
                self.outputs
                    .declared_size_under(&path, |p| matches!(self.lookup(p), Ok(None))),
            )),
            None => Ok(self.outputs.get(&path).and_then(|decl| decl.size)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        let path = repo_path::normalize(path);
        matches!(self.lookup(&path), Ok(Some(_)))
            || self.outputs.is_output(&path)
            || self.outputs.is_implied_dir(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = git2::Signature::now("Test", "test@example.com").unwrap();
        let parents: Vec<git2::Commit<'_>> = repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parent_refs)
            .unwrap();
    }

    fn create_repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let repo = Repository::init(root).unwrap();

        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data/data-a.json"), "{\"some\": \"data\"}\n").unwrap();
        fs::write(
            root.join("data/data-b.json.dvc"),
            "outs:\n- md5: 0123456789abcdef\n  size: 22\n  path: data-b.json\n",
        )
        .unwrap();
        commit_all(&repo, "first");

        fs::write(root.join("later.txt"), "added later\n").unwrap();
        commit_all(&repo, "second");

        temp
    }

    #[test]
    fn test_open_unknown_revision_fails() {
        let temp = create_repo();
        let err = GitSnapshot::open(temp.path(), "no-such-rev").err().unwrap();
        assert!(matches!(err, ListError::RepositoryOpen { .. }));
    }

    #[test]
    fn test_snapshot_at_previous_revision() {
        let temp = create_repo();
        let snapshot = GitSnapshot::open(temp.path(), "HEAD~1").unwrap();
        assert!(!snapshot.exists("later.txt"));

        let head = GitSnapshot::open(temp.path(), "HEAD").unwrap();
        assert!(head.exists("later.txt"));
    }

    #[test]
    fn test_walk_includes_virtual_output() {
        let temp = create_repo();
        let snapshot = GitSnapshot::open(temp.path(), "HEAD").unwrap();
        let steps = snapshot.walk("data", WalkOptions::default()).unwrap();

        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].files,
            vec!["data-a.json", "data-b.json", "data-b.json.dvc"]
        );

        let metadata = snapshot.metadata("data/data-b.json").unwrap();
        assert!(metadata.is_output);
        assert_eq!(snapshot.size("data/data-b.json").unwrap(), Some(22));
    }

    #[test]
    fn test_sizes_from_blobs() {
        let temp = create_repo();
        let snapshot = GitSnapshot::open(temp.path(), "HEAD").unwrap();
        assert_eq!(snapshot.size("data/data-a.json").unwrap(), Some(17));

        let declaration = "outs:\n- md5: 0123456789abcdef\n  size: 22\n  path: data-b.json\n".len() as u64;
        assert_eq!(snapshot.size("data").unwrap(), Some(17 + declaration + 22));
    }

    #[test]
    fn test_walk_file_is_not_a_directory() {
        let temp = create_repo();
        let snapshot = GitSnapshot::open(temp.path(), "HEAD").unwrap();
        let err = snapshot.walk("later.txt", WalkOptions::default()).unwrap_err();
        assert!(err.is_not_a_directory());
        assert!(snapshot.walk("missing", WalkOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_output_in_uncommitted_directory() {
        let temp = create_repo();
        let repo = Repository::open(temp.path()).unwrap();
        fs::write(
            temp.path().join("model.dvc"),
            "outs:\n- md5: fedcba9876543210\n  size: 50\n  path: models/model.pkl\n",
        )
        .unwrap();
        commit_all(&repo, "third");

        let snapshot = GitSnapshot::open(temp.path(), "HEAD").unwrap();
        let steps = snapshot.walk("", WalkOptions::default()).unwrap();
        assert!(steps[0].dirs.contains(&"models".to_string()));
        let models = steps.iter().find(|s| s.dir == "models").unwrap();
        assert_eq!(models.files, vec!["model.pkl"]);

        assert!(snapshot.metadata("models").unwrap().is_dir);
        assert_eq!(snapshot.size("models").unwrap(), Some(50));
        assert!(snapshot.exists("models"));
    }
}
