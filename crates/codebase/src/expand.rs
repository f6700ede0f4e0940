use std::collections::BTreeMap;

use dvln_template::{is_literal, MissingKey, Template};

use crate::error::{CodebaseError, Result};
use crate::model::{Definition, PackageRef, StringMap};

/// Expand `vars` references in every expansion-eligible field.
///
/// Eligible fields are the `access` conditionals (map keys), package `repo`
/// values and package `remotes` values. The walk stops at the first failing
/// field. Results are staged and committed together, so on error the
/// definition is left exactly as it was.
pub fn expand(definition: &mut Definition) -> Result<()> {
    let expander = Expander {
        codebase: &definition.name,
        vars: &definition.vars,
    };
    let access = expander.access(&definition.access)?;
    let pkgs = definition
        .pkgs
        .iter()
        .map(|pkg| expander.package(pkg))
        .collect::<Result<Vec<_>>>()?;

    definition.access = access;
    definition.pkgs = pkgs;
    Ok(())
}

struct Expander<'a> {
    codebase: &'a str,
    vars: &'a StringMap,
}

impl Expander<'_> {
    fn apply(&self, describe: impl Fn() -> String, field: &str, value: &str) -> Result<String> {
        if is_literal(value) {
            return Ok(value.to_string());
        }
        let tmpl = Template::parse(field, value)
            .map_err(|err| CodebaseError::template(describe(), value, err))?;
        let result = tmpl
            .execute(self.vars, MissingKey::Error)
            .map_err(|err| CodebaseError::template(describe(), value, err))?;
        log::trace!("expanded {field} {value:?} -> {result:?}");
        Ok(result)
    }

    fn access(&self, access: &BTreeMap<String, StringMap>) -> Result<BTreeMap<String, StringMap>> {
        let mut expanded = BTreeMap::new();
        let mut origins: BTreeMap<String, &str> = BTreeMap::new();
        for (conditional, policy) in access {
            let key = self.apply(
                || format!("  Access conditional for codebase: {}", self.codebase),
                "codebaseAccess",
                conditional,
            )?;
            if let Some(first) = origins.insert(key.clone(), conditional) {
                return Err(CodebaseError::DuplicateAccessKey {
                    key,
                    first: first.to_string(),
                    second: conditional.clone(),
                });
            }
            expanded.insert(key, policy.clone());
        }
        Ok(expanded)
    }

    fn package(&self, pkg: &PackageRef) -> Result<PackageRef> {
        let mut pkg = pkg.clone();
        for binding in &mut pkg.vcs {
            for (target, uri) in binding.repo.iter_mut() {
                *uri = self.apply(
                    || {
                        format!(
                            "  Pkg: {}\n  VCS: {}\n  Tgt: {target}",
                            pkg.name, binding.vcs_type
                        )
                    },
                    "repoURI",
                    uri,
                )?;
            }
            for (remote, uris) in binding.remotes.iter_mut() {
                for (target, uri) in uris.iter_mut() {
                    *uri = self.apply(
                        || {
                            format!(
                                "  Pkg: {}\n  VCS: {}\n  Remote: {remote}\n  Tgt: {target}",
                                pkg.name, binding.vcs_type
                            )
                        },
                        "remoteURI",
                        uri,
                    )?;
                }
            }
        }
        Ok(pkg)
    }
}

/// True when no expansion-eligible field still holds template syntax
pub fn is_expanded(definition: &Definition) -> bool {
    definition.access.keys().all(|key| is_literal(key))
        && definition.pkgs.iter().flat_map(|pkg| &pkg.vcs).all(|binding| {
            binding.repo.values().all(|uri| is_literal(uri))
                && binding
                    .remotes
                    .values()
                    .flat_map(|uris| uris.values())
                    .all(|uri| is_literal(uri))
        })
}

impl Definition {
    /// See [`expand`]
    pub fn expand(&mut self) -> Result<()> {
        expand(self)
    }

    /// Evaluate `pathing` for one package.
    ///
    /// Pathing templates see the package's `attrs`, not the codebase `vars`;
    /// an attribute the package lacks reads as empty (false in `if`).
    pub fn package_pathing(&self, pkg: &PackageRef) -> Result<StringMap> {
        let mut out = StringMap::new();
        for (key, text) in &self.pathing {
            let describe = || format!("  Pathing: {key}\n  Pkg: {}", pkg.name);
            let tmpl = Template::parse(key.as_str(), text)
                .map_err(|err| CodebaseError::template(describe(), text, err))?;
            let value = tmpl
                .execute(&pkg.attrs, MissingKey::Zero)
                .map_err(|err| CodebaseError::template(describe(), text, err))?;
            out.insert(key.clone(), value);
        }
        Ok(out)
    }
}
