use anyhow::Context;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One input file under evaluation. `relative` is the path below the corpus
/// root, used only for reporting.
#[derive(Debug, Clone)]
pub struct Benchmark {
    pub path: PathBuf,
    pub relative: String,
}

fn is_benchmark(path: &Path) -> bool {
    matches!(
        path.extension().map(|e| e.to_string_lossy().to_lowercase()),
        Some(ext) if ext == "aig" || ext == "aag"
    )
}

/// Recursively collect every benchmark file under `root`. Traversal is
/// sorted so reports are reproducible across filesystems.
pub fn discover(root: &Path) -> anyhow::Result<Vec<Benchmark>> {
    let mut benchmarks = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("cannot walk corpus {}", root.display()))?;
        if !entry.file_type().is_file() || !is_benchmark(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        benchmarks.push(Benchmark {
            path: entry.path().to_path_buf(),
            relative,
        });
    }
    Ok(benchmarks)
}
