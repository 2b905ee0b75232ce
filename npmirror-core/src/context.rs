use crate::config::MirrorConfig;
use crate::{MirrorError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// State shared by one mirroring run. Everything mutable lives behind a
/// mutex that is only held across synchronous sections; fetch coalescing
/// uses per-URL cells so the map lock never spans a network round-trip.
pub struct RunContext {
    pub config: MirrorConfig,
    pub client: reqwest::Client,
    /// Dedup ledger and final "what to mirror" manifest: name -> versions.
    collected: Mutex<BTreeMap<String, BTreeSet<String>>>,
    /// Every path an existence check touched; the prune sweep's keep set.
    required: Mutex<BTreeSet<PathBuf>>,
    /// Response bodies by URL, written at most once per URL.
    responses: Mutex<HashMap<String, Arc<OnceCell<Vec<u8>>>>>,
}

impl RunContext {
    pub fn new(config: MirrorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| MirrorError::Client { source })?;

        Ok(RunContext {
            config,
            client,
            collected: Mutex::new(BTreeMap::new()),
            required: Mutex::new(BTreeSet::new()),
            responses: Mutex::new(HashMap::new()),
        })
    }

    /// Records (name, version) in the ledger. Returns false when the pair
    /// was already present, which terminates recursion on that branch.
    pub fn record_package(&self, name: &str, version: &str) -> bool {
        let mut collected = self.collected.lock().unwrap();
        collected
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string())
    }

    pub fn collected_snapshot(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.collected.lock().unwrap().clone()
    }

    /// Registers `path` as touched by this run and reports whether it is
    /// already on disk. Every existence decision the pipeline makes goes
    /// through here so the prune sweep sees a complete keep set.
    pub fn check_file(&self, path: &Path) -> bool {
        self.require(path);
        path.is_file()
    }

    pub fn require(&self, path: &Path) {
        let mut required = self.required.lock().unwrap();
        required.insert(path.to_path_buf());
    }

    pub fn required_snapshot(&self) -> BTreeSet<PathBuf> {
        self.required.lock().unwrap().clone()
    }

    pub(crate) fn response_cell(&self, url: &str) -> Arc<OnceCell<Vec<u8>>> {
        let mut responses = self.responses.lock().unwrap();
        responses.entry(url.to_string()).or_default().clone()
    }

    /// Seeds the response cache directly; lets tests drive the pipeline
    /// without a network.
    #[cfg(test)]
    pub(crate) fn prime_response(&self, url: &str, body: Vec<u8>) {
        let cell = self.response_cell(url);
        let _ = cell.set(body);
    }

    /// Peeks at an already-seeded body without creating a cell. Archive
    /// fetches bypass the cache in production, so this only ever sees
    /// what a test planted.
    #[cfg(test)]
    pub(crate) fn primed_response(&self, url: &str) -> Option<Vec<u8>> {
        let responses = self.responses.lock().unwrap();
        responses.get(url).and_then(|cell| cell.get()).cloned()
    }
}
