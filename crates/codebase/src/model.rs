use std::collections::BTreeMap;

use serde::Serialize;

/// String-to-string mapping used for attrs, vars, pathing and URI tables
pub type StringMap = BTreeMap<String, String>;

/// Access-mode to URI, e.g. `{"rw": "http://github.com/dvln/viper"}`
pub type UriMap = BTreeMap<String, String>;

/// Codebase definition: the named set of packages a workspace can pull from.
///
/// Built empty, filled in one shot by [`crate::decode`], expanded, and then
/// treated as read-only by everything downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub home_page: String,
    /// Package dependency style, `monolithic` or `independent`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deps: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub contacts: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: StringMap,
    /// Shortcut variables usable as `{{.name}}` in access keys and package URIs
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: StringMap,
    /// Workspace layout rules, evaluated per package (see [`Definition::package_pathing`])
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pathing: StringMap,
    /// SPDX license identifier
    #[serde(skip_serializing_if = "String::is_empty")]
    pub license: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issues: String,
    /// Conditional (expansion-eligible key) to access-mode policy map
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub access: BTreeMap<String, StringMap>,
    pub pkgs: Vec<PackageRef>,
}

/// One package entry; order within [`Definition::pkgs`] is significant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageRef {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub license: String,
    /// Workspace subpath for the package
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ws: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: StringMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub contacts: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: StringMap,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub access: StringMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vcs: Vec<VcsBinding>,
}

/// One version-control association of a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VcsBinding {
    #[serde(rename = "type")]
    pub vcs_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fmts: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub repo: UriMap,
    /// Remote name to its access-mode URI table
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub remotes: BTreeMap<String, UriMap>,
}

pub const GENERATED_NAME: &str = "generated";
pub const GENERATED_DESC: &str = "Dynamically generated development line";

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stand-in used when no codebase document exists
    pub fn generated() -> Self {
        Self {
            name: GENERATED_NAME.to_string(),
            desc: GENERATED_DESC.to_string(),
            ..Self::default()
        }
    }

    pub fn is_generated(&self) -> bool {
        self.name == GENERATED_NAME && self.pkgs.is_empty()
    }

    /// First package with the given name
    pub fn package(&self, name: &str) -> Option<&PackageRef> {
        self.pkgs.iter().find(|pkg| pkg.name == name)
    }
}

impl PackageRef {
    /// First binding of the given VCS type
    pub fn vcs(&self, vcs_type: &str) -> Option<&VcsBinding> {
        self.vcs.iter().find(|binding| binding.vcs_type == vcs_type)
    }
}
