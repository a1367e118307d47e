//! A package and the set of its resolved versions.

use crate::bundle_version::BundleVersion;
use crate::config::BundleConfig;
use crate::error::Result;
use crate::repository::ResolverContext;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use webmod_registry::{PackageId, PackageRoot};
use webmod_semver::{Range, Version};

/// One package of the repository and the versions resolved for it so far.
///
/// A bundle is created the first time its package appears in a dependency
/// walk and accumulates versions as ranges request them. A version is
/// resolved at most once; later requests matching it see the existing
/// value.
pub struct Bundle {
    context: Arc<ResolverContext>,
    root: Arc<dyn PackageRoot>,
    config: BundleConfig,
    versions: Mutex<BTreeMap<Version, Arc<BundleVersion>>>,
}

impl Bundle {
    pub(crate) fn new(
        context: Arc<ResolverContext>,
        root: Arc<dyn PackageRoot>,
        config: BundleConfig,
    ) -> Self {
        Self {
            context,
            root,
            config,
            versions: Mutex::new(BTreeMap::new()),
        }
    }

    /// The package this bundle resolves.
    #[must_use]
    pub fn id(&self) -> &PackageId {
        self.root.id()
    }

    /// Resolve every published version the range matches that is not
    /// resolved yet.
    ///
    /// Candidates load in parallel. A candidate whose metadata cannot be
    /// loaded is logged and dropped; the rest still resolve. Returns the
    /// newly resolved versions only, so a repeated call with the same
    /// range returns nothing.
    pub fn fetch_dependencies(&self, range: &Range) -> Vec<Arc<BundleVersion>> {
        let candidates: Vec<Version> = {
            let versions = self.lock_versions();
            self.root
                .package_versions()
                .into_iter()
                .filter(|version| range.matches(version))
                .filter(|version| !versions.contains_key(version))
                .collect()
        };

        candidates
            .into_par_iter()
            .filter_map(|version| match self.fetch_version(&version) {
                Ok(resolved) => resolved,
                Err(error) => {
                    warn!(package = %self.id(), %version, %error, "cannot initialize version");
                    None
                }
            })
            .collect()
    }

    /// Resolve one version, or return `None` when another walk already
    /// resolved it.
    fn fetch_version(&self, version: &Version) -> Result<Option<Arc<BundleVersion>>> {
        let metadata = self.root.package_version(version)?;
        let config = self.config.version_config(version);
        let candidate = Arc::new(BundleVersion::new(
            Arc::clone(&self.context),
            metadata,
            config,
        ));

        let mut versions = self.lock_versions();
        match versions.entry(version.clone()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                debug!(package = %self.id(), %version, "resolved version");
                slot.insert(Arc::clone(&candidate));
                Ok(Some(candidate))
            }
        }
    }

    /// Every resolved version, in ascending precedence order.
    #[must_use]
    pub fn versions(&self) -> Vec<Arc<BundleVersion>> {
        self.lock_versions().values().cloned().collect()
    }

    /// One resolved version, if present.
    #[must_use]
    pub fn version(&self, version: &Version) -> Option<Arc<BundleVersion>> {
        self.lock_versions().get(version).cloned()
    }

    /// The resolved versions a range matches, in ascending precedence
    /// order.
    #[must_use]
    pub fn matching_versions(&self, range: &Range) -> Vec<Arc<BundleVersion>> {
        self.lock_versions()
            .iter()
            .filter(|(version, _)| range.matches(version))
            .map(|(_, resolved)| Arc::clone(resolved))
            .collect()
    }

    fn lock_versions(&self) -> MutexGuard<'_, BTreeMap<Version, Arc<BundleVersion>>> {
        // Map operations cannot leave partial state, so a poisoned lock
        // stays usable.
        self.versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use serde_json::json;
    use tempfile::TempDir;
    use webmod_registry::{Cache, PackageVersion, RegistryPackageRoot, StaticRegistry};

    fn range(s: &str) -> Range {
        s.parse().unwrap()
    }

    fn version(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn context() -> (TempDir, Arc<ResolverContext>) {
        let cache_dir = TempDir::new().unwrap();
        let context = Arc::new(ResolverContext {
            registry: Arc::new(StaticRegistry::new()),
            cache: Cache::new(cache_dir.path()).unwrap(),
            symbolic_name_prefix: "web.modules".to_string(),
        });
        (cache_dir, context)
    }

    fn left_pad_bundle(context: &Arc<ResolverContext>) -> Bundle {
        let root = RegistryPackageRoot::from_document(
            "left-pad".parse().unwrap(),
            &json!({
                "versions": {
                    "1.0.0": {},
                    "1.1.0": {},
                    "1.1.0-rc.1": {},
                    "2.0.0": {}
                }
            }),
        )
        .unwrap();
        let config = RepositoryConfig::default().bundle_config(root.id());
        Bundle::new(Arc::clone(context), Arc::new(root), config)
    }

    #[test]
    fn test_fetch_resolves_matching_versions() {
        let (_cache_dir, context) = context();
        let bundle = left_pad_bundle(&context);

        let resolved = bundle.fetch_dependencies(&range("^1.0.0"));
        let mut resolved: Vec<String> = resolved
            .iter()
            .map(|version| version.version().to_string())
            .collect();
        resolved.sort();
        // 1.1.0-rc.1 is invisible to a range without a pre-release
        // comparator on its tuple; 2.0.0 is out of range.
        assert_eq!(resolved, ["1.0.0", "1.1.0"]);
        assert_eq!(bundle.versions().len(), 2);
    }

    #[test]
    fn test_second_fetch_returns_nothing_new() {
        let (_cache_dir, context) = context();
        let bundle = left_pad_bundle(&context);

        assert_eq!(bundle.fetch_dependencies(&range("^1.0.0")).len(), 2);
        assert!(bundle.fetch_dependencies(&range("^1.0.0")).is_empty());
        assert_eq!(bundle.versions().len(), 2);
    }

    #[test]
    fn test_wider_second_fetch_returns_only_the_delta() {
        let (_cache_dir, context) = context();
        let bundle = left_pad_bundle(&context);

        bundle.fetch_dependencies(&range("^1.0.0"));
        let delta = bundle.fetch_dependencies(&range(">=1.0.0 <3.0.0"));
        let delta: Vec<String> = delta
            .iter()
            .map(|version| version.version().to_string())
            .collect();
        assert_eq!(delta, ["2.0.0"]);
        assert_eq!(bundle.versions().len(), 3);
    }

    #[test]
    fn test_matching_versions_ascending() {
        let (_cache_dir, context) = context();
        let bundle = left_pad_bundle(&context);
        bundle.fetch_dependencies(&range(">=1.0.0 <3.0.0"));

        let matching: Vec<String> = bundle
            .matching_versions(&range("^1.0.0"))
            .iter()
            .map(|version| version.version().to_string())
            .collect();
        assert_eq!(matching, ["1.0.0", "1.1.0"]);
        assert!(bundle.version(&version("2.0.0")).is_some());
        assert!(bundle.version(&version("3.0.0")).is_none());
    }

    #[test]
    fn test_failed_candidate_is_dropped_not_fatal() {
        struct FlakyRoot {
            id: PackageId,
            good: Arc<PackageVersion>,
        }

        impl PackageRoot for FlakyRoot {
            fn id(&self) -> &PackageId {
                &self.id
            }

            fn package_versions(&self) -> Vec<Version> {
                vec![version("1.0.0"), version("1.5.0")]
            }

            fn package_version(
                &self,
                requested: &Version,
            ) -> webmod_registry::Result<Arc<PackageVersion>> {
                if *requested == version("1.5.0") {
                    return Err(webmod_registry::Error::VersionNotFound {
                        package: self.id.to_string(),
                        version: requested.to_string(),
                    });
                }
                Ok(Arc::clone(&self.good))
            }
        }

        let (_cache_dir, context) = context();
        let id: PackageId = "left-pad".parse().unwrap();
        let good = Arc::new(PackageVersion::new(
            id.clone(),
            version("1.0.0"),
            BTreeMap::new(),
            Vec::new(),
            None,
        ));
        let config = RepositoryConfig::default().bundle_config(&id);
        let bundle = Bundle::new(
            Arc::clone(&context),
            Arc::new(FlakyRoot { id, good }),
            config,
        );

        let resolved = bundle.fetch_dependencies(&range("^1.0.0"));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].version(), &version("1.0.0"));
        assert!(bundle.version(&version("1.5.0")).is_none());

        // The broken candidate is retried by the next matching fetch, not
        // poisoned.
        assert!(bundle.fetch_dependencies(&range("^1.0.0")).is_empty());
    }
}
