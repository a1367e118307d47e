//! Capability and requirement descriptors for resolved module versions.
//!
//! Each resolved version publishes one capability in the
//! [`WEB_MODULE_NAMESPACE`] describing the module (id, converted version,
//! entry point, format, resource root) and requires the web-module
//! extender at a compatible version. The attribute names and namespaces
//! here are the contract with the consuming module resolver.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use webmod_registry::{ModuleFormat, PackageId};
use webmod_semver::Version;

/// Namespace of the capability a resolved module version publishes.
pub const WEB_MODULE_NAMESPACE: &str = "web.module";

/// Capability attribute carrying the module id.
pub const ID_ATTRIBUTE: &str = "web.module.id";

/// Capability attribute carrying the converted module version.
pub const VERSION_ATTRIBUTE: &str = "version";

/// Capability attribute carrying the entry point path.
pub const ENTRY_POINT_ATTRIBUTE: &str = "web.module.entry.point";

/// Capability attribute carrying the module format.
pub const FORMAT_ATTRIBUTE: &str = "web.module.format";

/// Capability attribute carrying the resource root inside the bundle.
pub const RESOURCE_ROOT_ATTRIBUTE: &str = "web.module.root";

/// Capability attribute carrying the extender version a module targets.
pub const EXTENDER_VERSION_ATTRIBUTE: &str = "web.module.extender.version";

/// Namespace of the extender capability every module requires.
pub const EXTENDER_NAMESPACE: &str = "osgi.extender";

/// Name of the extender capability every module requires.
pub const EXTENDER_NAME: &str = "web.module.extender";

/// The extender contract version descriptors are emitted against.
pub const EXTENDER_VERSION: Version = Version::new(1, 0, 0);

/// Root under which module resources are exposed inside a bundle.
pub const RESOURCE_ROOT: &str = "static/";

/// Qualifier marking a release version in the host scheme.
pub const RELEASE_TAG: &str = "REL";

/// Qualifier prefix marking a pre-release version in the host scheme.
pub const PRE_RELEASE_TAG: &str = "PRE";

/// A version converted to the host platform scheme.
///
/// The host orders equal numeric tuples by their qualifier, lexically,
/// with absent qualifiers first. Releases therefore carry an explicit
/// [`RELEASE_TAG`] qualifier: it orders after every `PRE-` qualifier, so
/// pre-releases keep their lower precedence. Build metadata is dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostVersion {
    major: u32,
    minor: u32,
    micro: u32,
    qualifier: String,
}

impl HostVersion {
    /// Major version number.
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    /// Minor version number.
    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }

    /// Micro version number.
    #[must_use]
    pub const fn micro(&self) -> u32 {
        self.micro
    }

    /// The qualifier: [`RELEASE_TAG`] or `PRE-` plus the encoded tag.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

impl From<&Version> for HostVersion {
    fn from(version: &Version) -> Self {
        // Pre-release identifiers join with `_`: the host allows no `.`
        // inside a qualifier.
        let qualifier = version.pre_release.as_ref().map_or_else(
            || RELEASE_TAG.to_string(),
            |pre_release| {
                let encoded = pre_release
                    .identifiers()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("_");
                format!("{PRE_RELEASE_TAG}-{encoded}")
            },
        );
        Self {
            major: version.major,
            minor: version.minor,
            micro: version.micro,
            qualifier,
        }
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.micro, self.qualifier
        )
    }
}

/// A typed capability attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Plain text.
    Text(String),
    /// A version in the host scheme.
    Version(HostVersion),
}

impl AttributeValue {
    /// The text value, if this is a text attribute.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Version(_) => None,
        }
    }

    /// The version value, if this is a version attribute.
    #[must_use]
    pub const fn as_version(&self) -> Option<&HostVersion> {
        match self {
            Self::Version(version) => Some(version),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Version(version) => write!(f, "{version}"),
        }
    }
}

/// One capability published by a resolved module version.
#[derive(Debug, Clone)]
pub struct Capability {
    namespace: String,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Capability {
    fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    /// The namespace this capability is published in.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every attribute of this capability.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// One attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// One requirement a resolved module version places on its host.
#[derive(Debug, Clone)]
pub struct Requirement {
    namespace: String,
    filter: String,
}

impl Requirement {
    /// The namespace the requirement must be satisfied in.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The LDAP-style filter a providing capability must match.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

/// The descriptor emitted for one resolved module version.
#[derive(Debug, Clone)]
pub struct ModuleResource {
    capabilities: Vec<Capability>,
    requirements: Vec<Requirement>,
}

impl ModuleResource {
    pub(crate) fn new(
        id: &PackageId,
        version: &Version,
        format: ModuleFormat,
        entry_point: Option<&str>,
    ) -> Self {
        let mut capability = Capability::new(WEB_MODULE_NAMESPACE)
            .with_attribute(ID_ATTRIBUTE, AttributeValue::Text(id.to_string()))
            .with_attribute(
                VERSION_ATTRIBUTE,
                AttributeValue::Version(HostVersion::from(version)),
            )
            .with_attribute(
                EXTENDER_VERSION_ATTRIBUTE,
                AttributeValue::Version(HostVersion::from(&EXTENDER_VERSION)),
            )
            .with_attribute(
                RESOURCE_ROOT_ATTRIBUTE,
                AttributeValue::Text(RESOURCE_ROOT.to_string()),
            )
            .with_attribute(
                FORMAT_ATTRIBUTE,
                AttributeValue::Text(format.as_str().to_string()),
            );
        if let Some(entry_point) = entry_point {
            capability = capability.with_attribute(
                ENTRY_POINT_ATTRIBUTE,
                AttributeValue::Text(entry_point.to_string()),
            );
        }

        let mut requirements = vec![extender_requirement()];
        requirements.extend(dependency_requirements());

        Self {
            capabilities: vec![capability],
            requirements,
        }
    }

    /// The capabilities published in a namespace.
    pub fn capabilities(&self, namespace: &str) -> impl Iterator<Item = &Capability> {
        self.capabilities
            .iter()
            .filter(move |capability| capability.namespace == namespace)
    }

    /// The requirements placed in a namespace.
    pub fn requirements(&self, namespace: &str) -> impl Iterator<Item = &Requirement> {
        self.requirements
            .iter()
            .filter(move |requirement| requirement.namespace == namespace)
    }

    /// The web-module capability of this version.
    #[must_use]
    pub fn capability(&self) -> &Capability {
        // Construction always publishes the web-module capability first.
        &self.capabilities[0]
    }
}

/// The requirement on the extender, ranged from the current contract
/// version up to its next major release, exclusive.
fn extender_requirement() -> Requirement {
    let floor = HostVersion::from(&EXTENDER_VERSION);
    let ceiling = HostVersion::from(&EXTENDER_VERSION.with_major_bump());
    Requirement {
        namespace: EXTENDER_NAMESPACE.to_string(),
        filter: format!(
            "(&({EXTENDER_NAMESPACE}={EXTENDER_NAME})(version>={}.{}.{})(!(version>={}.{}.{})))",
            floor.major(),
            floor.minor(),
            floor.micro(),
            ceiling.major(),
            ceiling.minor(),
            ceiling.micro(),
        ),
    }
}

fn dependency_requirements() -> Vec<Requirement> {
    // TODO: emit one requirement per declared dependency range.
    Vec::new()
}

/// The entry point a metadata document declares for a format.
///
/// ES modules are looked up under `module` and its historical aliases,
/// every other format under `main`. A leading `./` is stripped.
pub(crate) fn detect_entry_point(metadata: &Value, format: ModuleFormat) -> Option<String> {
    let keys: &[&str] = match format {
        ModuleFormat::EsModule => &["module", "jsnext:main", "es2015"],
        ModuleFormat::CommonJs => &["main"],
    };
    keys.iter()
        .find_map(|key| metadata.get(key).and_then(Value::as_str))
        .map(|path| path.strip_prefix("./").unwrap_or(path).to_string())
}
