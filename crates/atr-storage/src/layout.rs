use camino::{Utf8Path, Utf8PathBuf};

/// The POSIX tree rooted at the configured state directory.
///
/// ```text
/// <base>/unfinished/<project>/<version>/<revision>/...   draft and candidate content
/// <base>/finished/<committee>/<path-suffix>/...          released content, flat (no revisions)
/// <base>/downloads/<committee>/<path-suffix>/...         hard-linked, publicly served copies
/// <base>/tmp/...                                          staging scratch space for in-flight revisions
/// ```
#[derive(Debug, Clone)]
pub struct ContentStore {
    base: Utf8PathBuf,
}

impl ContentStore {
    pub fn new(base: impl Into<Utf8PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Utf8Path {
        &self.base
    }

    pub fn unfinished_dir(&self) -> Utf8PathBuf {
        self.base.join("unfinished")
    }

    pub fn finished_dir(&self) -> Utf8PathBuf {
        self.base.join("finished")
    }

    pub fn downloads_dir(&self) -> Utf8PathBuf {
        self.base.join("downloads")
    }

    pub fn tmp_dir(&self) -> Utf8PathBuf {
        self.base.join("tmp")
    }

    /// Where a specific revision's files live while the release is in
    /// `CANDIDATE_DRAFT`, `CANDIDATE`, or `PREVIEW` phase.
    pub fn revision_dir(&self, project_name: &str, version_name: &str, revision_number: &str) -> Utf8PathBuf {
        self.unfinished_dir()
            .join(project_name)
            .join(version_name)
            .join(revision_number)
    }

    /// Where a released version's files live, permanently, with no
    /// revision component: the `RELEASE` phase collapses history. Keyed by
    /// the owning committee and a caller-supplied path suffix, not by
    /// project/version, since an announcement can target a path layout the
    /// project name alone doesn't determine (e.g. a podling's graduated
    /// destination).
    pub fn release_dir(&self, committee_name: &str, path_suffix: &str) -> Utf8PathBuf {
        self.finished_dir().join(committee_name).join(path_suffix)
    }

    pub fn download_dir(&self, committee_name: &str, path_suffix: &str) -> Utf8PathBuf {
        self.downloads_dir().join(committee_name).join(path_suffix)
    }

    /// A fresh, process-and-time-scoped staging directory under `tmp/`.
    /// Callers own cleanup; crashed workers leave these behind for the
    /// retention sweep to reclaim.
    pub fn new_staging_dir(&self, prefix: &str) -> Utf8PathBuf {
        let pid = std::process::id();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        self.tmp_dir().join(format!("{prefix}-{pid}-{nanos}"))
    }

    pub fn ensure_skeleton(&self) -> std::io::Result<()> {
        for dir in [
            self.unfinished_dir(),
            self.finished_dir(),
            self.downloads_dir(),
            self.tmp_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
