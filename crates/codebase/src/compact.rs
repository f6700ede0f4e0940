use std::collections::BTreeMap;

use dvln_template::{is_valid_field_name, placeholder, quote_literal};

use crate::error::{CodebaseError, Result};
use crate::model::{Definition, PackageRef};

/// Serialize `definition` with variable values folded back into `{{.name}}`.
///
/// Inverse of [`crate::expand`]: decoding the output yields `definition`
/// again whenever `definition` was itself the result of an expansion.
pub fn compact(definition: &Definition) -> Result<Vec<u8>> {
    let mut bytes =
        serde_json::to_vec_pretty(&compacted(definition)).map_err(CodebaseError::Serialize)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// In-memory form of [`compact`]
pub fn compacted(definition: &Definition) -> Definition {
    let compactor = Compactor::new(&definition.vars);
    let mut out = definition.clone();
    out.access = definition
        .access
        .iter()
        .map(|(key, policy)| (compactor.fold(key), policy.clone()))
        .collect::<BTreeMap<_, _>>();
    for pkg in &mut out.pkgs {
        compactor.package(pkg);
    }
    out
}

struct Compactor<'a> {
    /// Longest value first, so the most specific variable wins
    vars: Vec<(&'a str, &'a str)>,
}

impl<'a> Compactor<'a> {
    fn new(vars: &'a BTreeMap<String, String>) -> Self {
        let mut vars: Vec<_> = vars
            .iter()
            .filter(|(name, value)| !value.is_empty() && is_valid_field_name(name))
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        vars.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
        Self { vars }
    }

    /// Replace every occurrence of a variable value, leftmost and longest
    /// first, with its placeholder; the text in between is quoted.
    fn fold(&self, value: &str) -> String {
        let mut out = String::new();
        let mut literal_start = 0;
        let mut pos = 0;
        while pos < value.len() {
            let rest = &value[pos..];
            match self
                .vars
                .iter()
                .find(|(_, var_value)| rest.starts_with(var_value))
            {
                Some((name, var_value)) => {
                    push_literal(&mut out, &value[literal_start..pos], true);
                    out.push_str(&placeholder(name));
                    pos += var_value.len();
                    literal_start = pos;
                }
                None => pos += rest.chars().next().map_or(1, char::len_utf8),
            }
        }
        push_literal(&mut out, &value[literal_start..], false);
        out
    }

    fn package(&self, pkg: &mut PackageRef) {
        for binding in &mut pkg.vcs {
            for uri in binding.repo.values_mut() {
                *uri = self.fold(uri);
            }
            for uri in binding.remotes.values_mut().flat_map(|uris| uris.values_mut()) {
                *uri = self.fold(uri);
            }
        }
    }
}

/// A trailing `{` right before a placeholder would open a bogus `{{{`
fn push_literal(out: &mut String, text: &str, before_placeholder: bool) {
    let quoted = quote_literal(text);
    match quoted.strip_suffix('{') {
        Some(head) if before_placeholder => {
            out.push_str(head);
            out.push_str("{{\"{\"}}");
        }
        _ => out.push_str(&quoted),
    }
}

impl Definition {
    /// See [`compact`]
    pub fn compact(&self) -> Result<Vec<u8>> {
        compact(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compactor_vars() -> BTreeMap<String, String> {
        [
            ("dvln", "http://github.com/dvln"),
            ("gh", "http://github.com"),
            ("empty", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn longest_variable_wins() {
        let vars = compactor_vars();
        let compactor = Compactor::new(&vars);
        assert_eq!(compactor.fold("http://github.com/dvln/viper"), "{{.dvln}}/viper");
        assert_eq!(compactor.fold("http://github.com/spf13/viper"), "{{.gh}}/spf13/viper");
        assert_eq!(compactor.fold("http://github.com/dvln"), "{{.dvln}}");
        assert_eq!(compactor.fold("ssh://elsewhere/x"), "ssh://elsewhere/x");
    }

    #[test]
    fn variables_fold_anywhere_in_the_value() {
        let vars = compactor_vars();
        let compactor = Compactor::new(&vars);
        assert_eq!(
            compactor.fold("m,^http://github.com/dvln/*, && Vendor!=True"),
            "m,^{{.dvln}}/*, && Vendor!=True"
        );
        assert_eq!(
            compactor.fold("http://github.com/dvln http://github.com/x"),
            "{{.dvln}} {{.gh}}/x"
        );
    }

    #[test]
    fn brace_before_placeholder_is_escaped() {
        let vars = compactor_vars();
        let compactor = Compactor::new(&vars);
        assert_eq!(
            compactor.fold("a{http://github.com/dvln"),
            r#"a{{"{"}}{{.dvln}}"#
        );
        assert_eq!(compactor.fold("trailing{"), "trailing{");
    }

    #[test]
    fn literal_braces_are_quoted() {
        let vars = compactor_vars();
        let compactor = Compactor::new(&vars);
        assert_eq!(compactor.fold("odd{{name"), r#"odd{{"{{"}}name"#);
    }
}
