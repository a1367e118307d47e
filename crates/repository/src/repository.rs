//! The repository: a registry resolved into bundles, walked from an
//! initial dependency set.

use crate::bundle::Bundle;
use crate::bundle_version::BundleVersion;
use crate::config::RepositoryConfig;
use crate::error::Result;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use webmod_registry::{Cache, PackageId, Registry};
use webmod_semver::Range;

/// State shared by every bundle of one repository.
pub(crate) struct ResolverContext {
    pub(crate) registry: Arc<dyn Registry>,
    pub(crate) cache: Cache,
    pub(crate) symbolic_name_prefix: String,
}

/// A set of bundles resolved from a package registry.
///
/// A repository starts empty. [`Repository::resolve`] walks the
/// configured initial dependencies; [`Repository::fetch_dependencies`]
/// walks an arbitrary dependency set. Either walk recursively resolves
/// every published version the requested ranges match, then the ranges
/// those versions declare, until no new version appears. Both are total:
/// a package or version that cannot be resolved is logged and skipped,
/// never fatal to the walk.
pub struct Repository {
    context: Arc<ResolverContext>,
    config: RepositoryConfig,
    bundles: Mutex<HashMap<PackageId, Arc<Bundle>>>,
}

impl Repository {
    /// Create a repository over a registry.
    ///
    /// The cache directory is created if absent and may be shared with
    /// other repositories over the same registry. Nothing resolves until
    /// a walk is requested.
    pub fn new(
        registry: Arc<dyn Registry>,
        config: RepositoryConfig,
        cache_directory: impl Into<PathBuf>,
        symbolic_name_prefix: impl Into<String>,
    ) -> Result<Self> {
        let cache = Cache::new(cache_directory)?;
        Ok(Self {
            context: Arc::new(ResolverContext {
                registry,
                cache,
                symbolic_name_prefix: symbolic_name_prefix.into(),
            }),
            config,
            bundles: Mutex::new(HashMap::new()),
        })
    }

    /// Walk the initial dependencies of the repository configuration.
    pub fn resolve(&self) {
        let initial: BTreeMap<PackageId, Range> = self
            .config
            .initial_dependencies()
            .map(|(id, range)| (id.clone(), range.clone()))
            .collect();
        self.fetch_dependencies(&initial);
    }

    /// Walk a dependency set: resolve every matching version of every
    /// named package, then the dependencies those versions declare.
    ///
    /// Packages of one pass resolve in parallel. The walk ends when a
    /// pass resolves no new version; versions resolved by an earlier
    /// walk are not revisited, so repeated walks are cheap.
    pub fn fetch_dependencies(&self, dependencies: &BTreeMap<PackageId, Range>) {
        let mut frontier: Vec<(PackageId, Range)> = dependencies
            .iter()
            .map(|(id, range)| (id.clone(), range.clone()))
            .collect();

        while !frontier.is_empty() {
            debug!(packages = frontier.len(), "resolving dependency frontier");
            let resolved: Vec<Arc<BundleVersion>> = frontier
                .par_iter()
                .flat_map(|(id, range)| self.configure_bundle(id, range))
                .collect();

            frontier = resolved
                .iter()
                .flat_map(|version| version.dependencies().iter())
                .map(|(id, range)| (id.clone(), range.clone()))
                .collect();
        }
    }

    /// Resolved versions of a package that a range matches, in ascending
    /// precedence order.
    #[must_use]
    pub fn find_providers(&self, id: &PackageId, range: &Range) -> Vec<Arc<BundleVersion>> {
        self.bundle(id)
            .map_or_else(Vec::new, |bundle| bundle.matching_versions(range))
    }

    /// The bundle of a package, if any walk reached it.
    #[must_use]
    pub fn bundle(&self, id: &PackageId) -> Option<Arc<Bundle>> {
        self.lock_bundles().get(id).cloned()
    }

    /// Every bundle of the repository.
    #[must_use]
    pub fn bundles(&self) -> Vec<Arc<Bundle>> {
        self.lock_bundles().values().cloned().collect()
    }

    /// Every package a walk reached.
    #[must_use]
    pub fn packages(&self) -> Vec<PackageId> {
        let mut packages: Vec<PackageId> = self.lock_bundles().keys().cloned().collect();
        packages.sort();
        packages
    }

    /// Resolve one package and range, absorbing failures.
    fn configure_bundle(&self, id: &PackageId, range: &Range) -> Vec<Arc<BundleVersion>> {
        let bundle = match self.fetch_bundle(id) {
            Ok(bundle) => bundle,
            Err(error) => {
                warn!(package = %id, %error, "cannot initialize bundle");
                return Vec::new();
            }
        };
        bundle.fetch_dependencies(range)
    }

    /// The bundle of a package, created on first use.
    fn fetch_bundle(&self, id: &PackageId) -> Result<Arc<Bundle>> {
        if let Some(bundle) = self.lock_bundles().get(id) {
            return Ok(Arc::clone(bundle));
        }

        // The root document is fetched outside the lock; concurrent
        // creators race and the first insert wins.
        let root = self.context.registry.package_root(id)?;
        let config = self.config.bundle_config(id);
        let candidate = Arc::new(Bundle::new(Arc::clone(&self.context), root, config));

        let mut bundles = self.lock_bundles();
        let bundle = match bundles.entry(id.clone()) {
            Entry::Occupied(existing) => Arc::clone(existing.get()),
            Entry::Vacant(slot) => {
                debug!(package = %id, "created bundle");
                Arc::clone(slot.insert(candidate))
            }
        };
        Ok(bundle)
    }

    fn lock_bundles(&self) -> MutexGuard<'_, HashMap<PackageId, Arc<Bundle>>> {
        // Map operations cannot leave partial state, so a poisoned lock
        // stays usable.
        self.bundles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
