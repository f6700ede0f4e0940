use std::io::Read;

use serde_json::Value;

use crate::coerce::{self, Fields};
use crate::error::{CodebaseError, Result};
use crate::expand;
use crate::model::{Definition, PackageRef, VcsBinding};

/// Decode and expand a codebase document.
///
/// Succeeds only when the JSON parses, maps onto the model and every
/// variable reference expands; on error no definition is returned.
pub fn decode(bytes: &[u8]) -> Result<Definition> {
    let tree = parse_json(bytes)?;
    let mut definition = map_definition(&tree)?;
    expand::expand(&mut definition)?;
    log::debug!(
        "decoded codebase {:?} ({} packages)",
        definition.name,
        definition.pkgs.len()
    );
    Ok(definition)
}

/// [`decode`] for anything readable; the reader is drained fully first
pub fn decode_reader<R: Read>(mut reader: R) -> Result<Definition> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| CodebaseError::ReadFailed {
            path: "<reader>".into(),
            source,
        })?;
    decode(&bytes)
}

/// Decode without running variable expansion
pub fn decode_raw(bytes: &[u8]) -> Result<Definition> {
    map_definition(&parse_json(bytes)?)
}

fn parse_json(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice::<Value>(bytes).map_err(|source| {
        let offset = if source.is_syntax() || source.is_eof() {
            byte_offset(bytes, source.line(), source.column())
        } else {
            None
        };
        CodebaseError::MalformedInput { offset, source }
    })
}

/// Byte offset of a 1-based line / column position reported by the parser
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut line_start = 0;
    for _ in 1..line {
        let newline = bytes[line_start..].iter().position(|&b| b == b'\n')?;
        line_start += newline + 1;
    }
    Some((line_start + column.saturating_sub(1)).min(bytes.len()))
}

fn map_definition(tree: &Value) -> Result<Definition> {
    if !tree.is_object() {
        return Err(CodebaseError::schema(
            "<root>",
            "object",
            coerce::type_name(tree),
        ));
    }
    let fields = Fields::of(tree, "")?;

    let pkgs = match fields.get("pkgs") {
        Some(value) => coerce::list(value, "pkgs")?
            .into_iter()
            .enumerate()
            .map(|(idx, pkg)| map_package(pkg, &coerce::index("pkgs", idx)))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Definition {
        name: fields.string("name")?,
        desc: fields.string("desc")?,
        home_page: fields.string("home_page")?,
        deps: fields.string("deps")?,
        contacts: fields.list_map("contacts")?,
        attrs: fields.string_map("attrs")?,
        vars: fields.string_map("vars")?,
        pathing: fields.string_map("pathing")?,
        license: fields.string("license")?,
        issues: fields.string("issues")?,
        access: fields.nested_string_map("access")?,
        pkgs,
    })
}

fn map_package(value: &Value, path: &str) -> Result<PackageRef> {
    let fields = Fields::of(value, path)?;
    let vcs_path = coerce::join(fields.path(), "vcs");
    let vcs = match fields.get("vcs") {
        Some(value) => coerce::list(value, &vcs_path)?
            .into_iter()
            .enumerate()
            .map(|(idx, binding)| map_vcs(binding, &coerce::index(&vcs_path, idx)))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(PackageRef {
        id: fields.string("id")?,
        name: fields.string("name")?,
        desc: fields.string("desc")?,
        class: fields.string("class")?,
        license: fields.string("license")?,
        ws: fields.string("ws")?,
        aliases: fields.string_map("aliases")?,
        contacts: fields.list_map("contacts")?,
        attrs: fields.string_map("attrs")?,
        status: fields.string("status")?,
        access: fields.string_map("access")?,
        vcs,
    })
}

fn map_vcs(value: &Value, path: &str) -> Result<VcsBinding> {
    let fields = Fields::of(value, path)?;
    Ok(VcsBinding {
        vcs_type: fields.string("type")?,
        fmts: fields.string_list("fmts")?,
        repo: fields.string_map("repo")?,
        remotes: fields.nested_string_map("remotes")?,
    })
}
