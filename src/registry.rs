//! Profile registry: resolves profile identifiers to loaded profiles.
//!
//! Identifiers resolve to a location by a fixed convention: `http(s)://`
//! identifiers are URLs, anything path-like is used verbatim, and a bare
//! name maps to `syntax.{name}.yaml` in the configured base directory
//! (falling back to the builtin set when no user file exists).
//!
//! Loaded profiles are cached for the process lifetime. The cache is
//! append-only and shared by every handle cloned from one registry, and
//! concurrent resolutions of the same identifier coalesce onto a single
//! in-flight load. A failed load falls back to the builtin default profile,
//! which is cached under the failing identifier so the load is not retried.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::ProfileError;
use crate::profile::{
    builtin_profile, default_profile, ScannerFn, ScannerTable, SyntaxProfile,
};

/// The profile a tokenization pass should use.
#[derive(Debug, Clone)]
pub enum ProfileSource {
    /// Identifier resolved by the registry: bare name, path, or URL.
    Named(String),
    /// In-memory profile used as-is; resolves synchronously to itself.
    Literal(Arc<SyntaxProfile>),
}

impl From<&str> for ProfileSource {
    fn from(id: &str) -> Self {
        Self::Named(id.to_string())
    }
}

impl From<String> for ProfileSource {
    fn from(id: String) -> Self {
        Self::Named(id)
    }
}

impl From<SyntaxProfile> for ProfileSource {
    fn from(profile: SyntaxProfile) -> Self {
        Self::Literal(Arc::new(profile))
    }
}

impl From<Arc<SyntaxProfile>> for ProfileSource {
    fn from(profile: Arc<SyntaxProfile>) -> Self {
        Self::Literal(profile)
    }
}

/// Where a named identifier loads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLocation {
    /// `http://` or `https://` identifier, fetched verbatim.
    Url(String),
    /// Path-like identifier, read verbatim (`~/` expands to the home dir).
    File(PathBuf),
    /// Bare name: the conventional user file, then the builtin table.
    Conventional { id: String, path: PathBuf },
}

/// Map an identifier to its load location per the naming convention.
pub fn resolve_location(id: &str, base_dir: &Path) -> ProfileLocation {
    if id.starts_with("http://") || id.starts_with("https://") {
        return ProfileLocation::Url(id.to_string());
    }
    if id.starts_with('.') || id.starts_with('~') || id.contains('/') || id.contains('\\') {
        let path = match id.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(id)),
            None => PathBuf::from(id),
        };
        return ProfileLocation::File(path);
    }
    ProfileLocation::Conventional {
        id: id.to_string(),
        path: base_dir.join(format!("syntax.{id}.yaml")),
    }
}

/// Base directory for conventional profile files.
///
/// Returns `~/.config/tint/` on Unix/macOS (honoring `XDG_CONFIG_HOME`) and
/// `%APPDATA%\tint\` on Windows.
pub fn default_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .map(|appdata| PathBuf::from(appdata).join("tint"))
            .unwrap_or_else(|_| PathBuf::from("."))
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|config| config.join("tint"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Fetches the raw document for a location. The production implementation
/// reads files, fetches URLs, and falls back to the embedded builtins;
/// tests substitute their own to script load timing and failures.
pub trait ProfileLoader: Send + Sync {
    fn load(&self, location: &ProfileLocation) -> Result<String, ProfileError>;
}

/// Filesystem, HTTP, and builtin loading.
pub struct DefaultLoader;

impl ProfileLoader for DefaultLoader {
    fn load(&self, location: &ProfileLocation) -> Result<String, ProfileError> {
        match location {
            ProfileLocation::Url(url) => {
                let response = ureq::get(url).call().map_err(|err| ProfileError::Http {
                    url: url.clone(),
                    reason: err.to_string(),
                })?;
                response.into_string().map_err(|err| ProfileError::Http {
                    url: url.clone(),
                    reason: err.to_string(),
                })
            }
            ProfileLocation::File(path) => {
                std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
                    path: path.clone(),
                    source,
                })
            }
            ProfileLocation::Conventional { id, path } => {
                if path.exists() {
                    info!("loading user profile from {}", path.display());
                    return std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
                        path: path.clone(),
                        source,
                    });
                }
                if let Some(builtin) = builtin_profile(id) {
                    return Ok(builtin.yaml.to_string());
                }
                Err(ProfileError::Io {
                    path: path.clone(),
                    source: io::Error::new(
                        io::ErrorKind::NotFound,
                        "no user profile file and no builtin with this name",
                    ),
                })
            }
        }
    }
}

/// Callback fired with the resolved profile. Runs on the calling thread for
/// cache hits and literals, on the load's worker thread otherwise.
pub type ResolveCallback = Box<dyn FnOnce(Arc<SyntaxProfile>) + Send>;

#[derive(Default)]
struct RegistryInner {
    /// Append-only: entries are inserted once and never replaced.
    cache: HashMap<String, Arc<SyntaxProfile>>,
    /// Waiters for identifiers whose load is running.
    in_flight: HashMap<String, Vec<ResolveCallback>>,
}

/// Shared, cloneable handle to the profile cache and loader.
#[derive(Clone)]
pub struct ProfileRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    scanners: Arc<Mutex<ScannerTable>>,
    loader: Arc<dyn ProfileLoader>,
    base_dir: PathBuf,
}

impl ProfileRegistry {
    /// Registry with the production loader, the default base directory, and
    /// the builtin argument scanners.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner::default())),
            scanners: Arc::new(Mutex::new(ScannerTable::with_builtins())),
            loader: Arc::new(DefaultLoader),
            base_dir: default_base_dir(),
        }
    }

    /// Replace the loader (tests script load timing through this).
    pub fn with_loader(mut self, loader: Arc<dyn ProfileLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the base directory for conventional profile files.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Make a scanner available to `{scanner: name}` profile entries.
    /// Affects profiles loaded after the call; cached profiles keep the
    /// table they were parsed with.
    pub fn register_scanner(&self, name: impl Into<String>, scanner: ScannerFn) {
        self.scanners.lock().register(name, scanner);
    }

    /// Resolve a profile, invoking `callback` exactly once with the result.
    ///
    /// Literals and cache hits call back synchronously. A miss starts one
    /// load on a worker thread; further resolutions of the same identifier
    /// arriving before it finishes join its waiter list.
    pub fn resolve_with(&self, source: ProfileSource, callback: ResolveCallback) {
        let id = match source {
            ProfileSource::Literal(profile) => {
                callback(profile);
                return;
            }
            ProfileSource::Named(id) => id,
        };

        let mut inner = self.inner.lock();
        if let Some(profile) = inner.cache.get(&id) {
            let profile = Arc::clone(profile);
            drop(inner);
            callback(profile);
            return;
        }
        match inner.in_flight.get_mut(&id) {
            Some(waiters) => {
                debug!("joining in-flight load for profile '{}'", id);
                waiters.push(callback);
            }
            None => {
                inner.in_flight.insert(id.clone(), vec![callback]);
                drop(inner);
                self.spawn_load(id);
            }
        }
    }

    /// Resolve a profile, blocking the calling thread until it is ready.
    pub fn resolve_blocking(&self, source: ProfileSource) -> Arc<SyntaxProfile> {
        let (tx, rx) = mpsc::channel();
        self.resolve_with(
            source,
            Box::new(move |profile| {
                let _ = tx.send(profile);
            }),
        );
        match rx.recv() {
            Ok(profile) => profile,
            Err(_) => {
                error!("profile load worker dropped its callback");
                self.fallback_profile()
            }
        }
    }

    /// The profile cached for `id`, if any. Does not trigger a load.
    pub fn cached(&self, id: &str) -> Option<Arc<SyntaxProfile>> {
        self.inner.lock().cache.get(id).cloned()
    }

    fn fallback_profile(&self) -> Arc<SyntaxProfile> {
        let scanners = self.scanners.lock().clone();
        Arc::new(default_profile(&scanners))
    }

    fn spawn_load(&self, id: String) {
        let registry = self.clone();
        std::thread::spawn(move || {
            let location = resolve_location(&id, &registry.base_dir);
            let scanners = registry.scanners.lock().clone();
            let profile = match registry
                .loader
                .load(&location)
                .and_then(|doc| SyntaxProfile::from_yaml(&doc, &scanners))
            {
                Ok(profile) => {
                    debug!(
                        "loaded profile '{}' with {} token types",
                        id,
                        profile.len()
                    );
                    Arc::new(profile)
                }
                Err(err) => {
                    warn!(
                        "profile '{}' failed to load, falling back to default: {}",
                        id, err
                    );
                    Arc::new(default_profile(&scanners))
                }
            };

            // Cache (append-only) and release every waiter, in join order.
            let waiters = {
                let mut inner = registry.inner.lock();
                inner.cache.insert(id.clone(), Arc::clone(&profile));
                inner.in_flight.remove(&id).unwrap_or_default()
            };
            for waiter in waiters {
                waiter(Arc::clone(&profile));
            }
        });
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ProfileRegistry")
            .field("cached", &inner.cache.keys().collect::<Vec<_>>())
            .field("in_flight", &inner.in_flight.keys().collect::<Vec<_>>())
            .field("base_dir", &self.base_dir)
            .finish()
    }
}
