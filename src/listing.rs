//! Listing and disk-usage orchestration.
//!
//! One invocation walks the repository once, optionally folds or totals
//! the entries, and renders a single block of output.

use serde::Serialize;
use tracing::{debug, error};

use repolist_analyze::{collapse_to_depth, total_size};
use repolist_core::{DisplayOptions, Entry, ListError};
use repolist_render::{EntryFormatter, format_bytes};
use repolist_scan::{RepoFs, TreeWalker, open_repository};

/// What to list: a repository location, a sub-path and a revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target<'a> {
    pub url: &'a str,
    pub path: Option<&'a str>,
    pub rev: Option<&'a str>,
}

/// Size as it appears in JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum SizeValue {
    Bytes(u64),
    Human(String),
}

impl SizeValue {
    fn new(size: u64, human_readable: bool) -> Self {
        if human_readable {
            Self::Human(format_bytes(size))
        } else {
            Self::Bytes(size)
        }
    }
}

#[derive(Debug, Serialize)]
struct EntryRecord<'a> {
    path: &'a str,
    isdir: bool,
    isexec: bool,
    isout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<SizeValue>,
}

impl<'a> EntryRecord<'a> {
    fn new(entry: &'a Entry, human_readable: bool) -> Self {
        Self {
            path: &entry.path,
            isdir: entry.is_dir,
            isexec: entry.is_exec,
            isout: entry.is_output,
            size: entry.size.map(|size| SizeValue::new(size, human_readable)),
        }
    }
}

#[derive(Debug, Serialize)]
struct TotalRecord {
    total: SizeValue,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ListError> {
    serde_json::to_string(value).map_err(ListError::serialization)
}

/// Produce the output block for a repository backend.
///
/// Returns `None` when there is nothing to print, which only happens for
/// an empty table.
pub fn render(
    fs: &dyn RepoFs,
    path: Option<&str>,
    options: &DisplayOptions,
    formatter: &EntryFormatter,
) -> Result<Option<String>, ListError> {
    let listing = TreeWalker::new(fs).walk(path, &options.walk_config())?;
    if listing.has_warnings() {
        debug!(count = listing.warnings.len(), "sizes were missing for some entries");
    }

    if options.summarize {
        let total = total_size(&listing.entries);
        let output = if options.json_output {
            to_json(&TotalRecord {
                total: SizeValue::new(total, options.human_readable),
            })?
        } else if options.human_readable {
            format_bytes(total)
        } else {
            total.to_string()
        };
        return Ok(Some(output));
    }

    let entries = match options.rollup_depth() {
        Some(depth) => collapse_to_depth(&listing.entries, depth),
        None => listing.entries,
    };

    if options.json_output {
        let records: Vec<EntryRecord<'_>> = entries
            .iter()
            .map(|entry| EntryRecord::new(entry, options.human_readable))
            .collect();
        return to_json(&records).map(Some);
    }

    if entries.is_empty() {
        return Ok(None);
    }
    Ok(Some(formatter.format_all(&entries, options)))
}

/// Open the target repository and render its listing.
///
/// The repository handle is dropped before returning, on success and
/// failure alike.
pub fn list(
    target: Target<'_>,
    options: &DisplayOptions,
    formatter: &EntryFormatter,
) -> Result<Option<String>, ListError> {
    let repo = open_repository(target.url, target.rev)?;
    debug!(location = %repo.location(), "listing repository");
    render(&*repo, target.path, options, formatter)
}

/// Run a listing and report failures at this boundary.
///
/// Output is written with `write`; failures are logged and turned into
/// `false`.
pub fn run(
    target: Target<'_>,
    options: &DisplayOptions,
    formatter: &EntryFormatter,
    write: impl FnMut(&str),
) -> bool {
    report(target.url, list(target, options, formatter), write)
}

/// Write a rendered listing, or log why there is none.
fn report(
    url: &str,
    rendered: Result<Option<String>, ListError>,
    mut write: impl FnMut(&str),
) -> bool {
    match rendered {
        Ok(Some(output)) => {
            write(&output);
            true
        }
        Ok(None) => true,
        Err(err) => {
            error!("failed to list '{url}': {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repolist_core::DisplayOptionsBuilder;
    use repolist_render::{ColorTable, DEFAULT_COLORS};
    use repolist_scan::{MemoryRepo, OutputDecl};

    fn repo() -> MemoryRepo {
        MemoryRepo::new()
            .with_name("example")
            .file("README.md", 9)
            .file("data/data-a.json", 17)
            .file("data/data-b.json", 22)
            .file("experiments/experiment-a/datafile-1.csv", 14)
            .file("experiments/experiment-a/datafile-2.csv", 20)
            .dir("experiments/experiment-b")
    }

    fn formatter() -> EntryFormatter {
        EntryFormatter::new(ColorTable::parse(DEFAULT_COLORS))
    }

    fn disk_usage() -> DisplayOptionsBuilder {
        let mut builder = DisplayOptions::builder();
        builder.with_size(true).colorized(false);
        builder
    }

    fn render_with(options: &DisplayOptions, path: Option<&str>) -> Option<String> {
        render(&repo(), path, options, &formatter()).unwrap()
    }

    #[test]
    fn test_list_top_level_colored() {
        let options = DisplayOptions::default();
        let output = render_with(&options, None).unwrap();
        assert_eq!(
            output,
            "README.md\n\x1b[01;34mdata\x1b[0m\n\x1b[01;34mexperiments\x1b[0m"
        );
    }

    #[test]
    fn test_list_json_omits_size() {
        let options = DisplayOptions::builder().json_output(true).build().unwrap();
        let output = render_with(&options, Some("data")).unwrap();
        assert_eq!(
            output,
            r#"[{"path":"data-a.json","isdir":false,"isexec":false,"isout":false},{"path":"data-b.json","isdir":false,"isexec":false,"isout":false}]"#
        );
    }

    #[test]
    fn test_disk_usage_rolls_up_top_level() {
        let options = disk_usage().build().unwrap();
        let output = render_with(&options, None).unwrap();
        assert_eq!(
            output,
            "9       \tREADME.md\n39      \tdata\n34      \texperiments"
        );
    }

    #[test]
    fn test_disk_usage_recursive_lists_leaves() {
        let options = disk_usage().recursive(true).build().unwrap();
        let output = render_with(&options, Some("experiments")).unwrap();
        assert_eq!(
            output,
            "14      \texperiment-a/datafile-1.csv\n20      \texperiment-a/datafile-2.csv"
        );
    }

    #[test]
    fn test_disk_usage_max_depth() {
        let options = disk_usage().max_depth(Some(2u32)).build().unwrap();
        let output = render_with(&options, None).unwrap();
        assert_eq!(
            output,
            "9       \tREADME.md\n17      \tdata/data-a.json\n22      \tdata/data-b.json\n34      \texperiments/experiment-a"
        );
    }

    #[test]
    fn test_summarize_total() {
        let options = disk_usage().summarize(true).build().unwrap();
        assert_eq!(render_with(&options, None).unwrap(), "82");

        let recursive = disk_usage().summarize(true).recursive(true).build().unwrap();
        assert_eq!(render_with(&recursive, None).unwrap(), "82");
    }

    #[test]
    fn test_summarize_json_human_readable() {
        let options = disk_usage()
            .summarize(true)
            .json_output(true)
            .human_readable(true)
            .build()
            .unwrap();
        assert_eq!(render_with(&options, None).unwrap(), r#"{"total":"82"}"#);

        let raw = disk_usage().summarize(true).json_output(true).build().unwrap();
        assert_eq!(render_with(&raw, None).unwrap(), r#"{"total":82}"#);
    }

    #[test]
    fn test_disk_usage_json_human_sizes_are_strings() {
        let repo = MemoryRepo::new().file("big/blob.bin", 32345678);
        let options = disk_usage()
            .json_output(true)
            .human_readable(true)
            .build()
            .unwrap();
        let output = render(&repo, None, &options, &formatter()).unwrap().unwrap();
        assert_eq!(
            output,
            r#"[{"path":"big","isdir":true,"isexec":false,"isout":false,"size":"31M"}]"#
        );
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        let options = DisplayOptions::default();
        assert_eq!(render_with(&options, Some("experiments/experiment-b")), None);
    }

    #[test]
    fn test_empty_json_renders_empty_array() {
        let options = DisplayOptions::builder().json_output(true).build().unwrap();
        assert_eq!(
            render_with(&options, Some("experiments/experiment-b")).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_dvc_only_keeps_outputs() {
        let repo = repo().output("models/model.pkl", OutputDecl {
            size: Some(2048),
            is_dir: false,
        });
        let options = disk_usage().dvc_only(true).build().unwrap();
        let output = render(&repo, None, &options, &formatter()).unwrap().unwrap();
        assert_eq!(output, "2048    \tmodels");
    }

    #[test]
    fn test_missing_path_fails() {
        let options = DisplayOptions::default();
        let err = render(&repo(), Some("nope"), &options, &formatter()).unwrap_err();
        assert!(matches!(err, ListError::PathNotFound { .. }));
    }

    #[test]
    fn test_json_failure_is_a_serialization_error() {
        let unkeyable = std::collections::BTreeMap::from([(vec![1u8], 1u8)]);
        let err = to_json(&unkeyable).unwrap_err();
        assert!(matches!(err, ListError::Serialization { .. }));
    }

    #[test]
    fn test_list_working_copy() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("data")).unwrap();
        std::fs::write(temp.path().join("data/data-a.json"), "{\"some\": \"data\"}\n").unwrap();
        std::fs::write(
            temp.path().join("model.pkl.dvc"),
            "outs:\n- md5: 0123456789abcdef\n  size: 2048\n  path: model.pkl\n",
        )
        .unwrap();

        let target = Target {
            url: temp.path().to_str().unwrap(),
            ..Target::default()
        };
        let options = disk_usage().dvc_only(true).build().unwrap();
        let output = list(target, &options, &formatter()).unwrap();
        assert_eq!(output.as_deref(), Some("2048    \tmodel.pkl"));
    }

    #[test]
    fn test_run_reports_failure() {
        let target = Target {
            url: "/no/such/repository",
            ..Target::default()
        };
        let mut written = Vec::new();
        let ok = run(target, &DisplayOptions::default(), &formatter(), |s| {
            written.push(s.to_string())
        });
        assert!(!ok);
        assert!(written.is_empty());
    }

    #[test]
    fn test_run_on_empty_working_copy() {
        let temp = tempfile::TempDir::new().unwrap();
        let url = temp.path().to_str().unwrap();
        let mut written = Vec::new();

        let root = Target {
            url,
            ..Target::default()
        };
        let ok = run(root, &DisplayOptions::default(), &formatter(), |s| {
            written.push(s.to_string())
        });
        assert!(ok);

        let missing = Target {
            url,
            path: Some("nope"),
            rev: None,
        };
        let ok = run(missing, &DisplayOptions::default(), &formatter(), |s| {
            written.push(s.to_string())
        });
        assert!(!ok);
        assert!(written.is_empty());
    }

    fn report_render(fs: &dyn RepoFs, path: Option<&str>) -> (bool, Vec<String>) {
        let mut written = Vec::new();
        let options = DisplayOptions::builder().colorized(false).build().unwrap();
        let rendered = render(fs, path, &options, &formatter());
        let ok = report("example", rendered, |s| written.push(s.to_string()));
        (ok, written)
    }

    #[test]
    fn test_report_missing_path_writes_nothing() {
        let (ok, written) = report_render(&repo(), Some("nope"));
        assert!(!ok);
        assert!(written.is_empty());
    }

    #[test]
    fn test_report_empty_repository_succeeds_silently() {
        let (ok, written) = report_render(&MemoryRepo::new(), None);
        assert!(ok);
        assert!(written.is_empty());
    }

    #[test]
    fn test_report_writes_listing_once() {
        let (ok, written) = report_render(&repo(), Some("data"));
        assert!(ok);
        assert_eq!(written, vec!["data-a.json\ndata-b.json".to_string()]);
    }
}
