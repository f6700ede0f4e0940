//! # dvln template
//!
//! Placeholder templates for codebase definition fields.
//!
//! Authors shorten repository URIs by defining variables once and referencing
//! them with the dotted placeholder syntax:
//!
//! ```text
//! "vars": { "dvln": "http://github.com/dvln" }
//! "repo": { "rw":   "{{.dvln}}/viper" }          ->  http://github.com/dvln/viper
//! "pathing": { "wkspc_pfx_dir": "{{if .GoPkg}}src{{end}}" }
//! ```
//!
//! The accepted language is a small subset of Go's `text/template`:
//! field references (and a lone `.`, which renders empty), string and boolean
//! literals, `not`/`and`/`or`/`eq`/`ne`,
//! `if`/`else if`/`else`/`end`, comments and trim markers. Anything outside
//! that subset is rejected at parse time instead of being passed through.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use dvln_template::{MissingKey, Template};
//!
//! let mut vars = BTreeMap::new();
//! vars.insert("dvln".to_string(), "http://github.com/dvln".to_string());
//!
//! let tmpl = Template::parse("repoURI", "{{.dvln}}/viper").unwrap();
//! let uri = tmpl.execute(&vars, MissingKey::Error).unwrap();
//! assert_eq!(uri, "http://github.com/dvln/viper");
//! ```

mod error;
mod exec;
mod lexer;
mod parser;

use std::collections::BTreeSet;

pub use error::{Result, TemplateError};
pub use exec::{Context, MissingKey};

use exec::Executor;
use lexer::{LEFT_DELIM, RIGHT_DELIM};
use parser::{Expr, Node, Parser};

/// A parsed template, ready to be executed against any [`Context`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    root: Vec<Node>,
}

impl Template {
    /// Parse `text`; `name` shows up in every error this template produces
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let items = lexer::lex(&name, text)?;
        let root = Parser::new(&name, items).parse()?;
        Ok(Self { name, root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template against `ctx`
    pub fn execute<C: Context + ?Sized>(&self, ctx: &C, missing: MissingKey) -> Result<String> {
        let mut out = String::new();
        Executor {
            name: &self.name,
            ctx,
            missing,
        }
        .run(&self.root, &mut out)?;
        Ok(out)
    }

    /// Every field name referenced anywhere in the template
    pub fn field_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_nodes(&self.root, &mut names);
        names
    }

    /// True when the template contains only literal text
    pub fn is_literal(&self) -> bool {
        self.root.iter().all(|node| matches!(node, Node::Text(_)))
    }
}

fn collect_nodes(nodes: &[Node], names: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Output(expr) => collect_expr(expr, names),
            Node::If(if_node) => {
                for branch in &if_node.branches {
                    collect_expr(&branch.cond, names);
                    collect_nodes(&branch.body, names);
                }
                collect_nodes(&if_node.otherwise, names);
            }
        }
    }
}

fn collect_expr(expr: &Expr, names: &mut BTreeSet<String>) {
    match expr {
        Expr::Field(name) => {
            names.insert(name.clone());
        }
        Expr::Call(_, args) => args.iter().for_each(|arg| collect_expr(arg, names)),
        Expr::Dot | Expr::Str(_) | Expr::Bool(_) => {}
    }
}

/// Parse and execute in one step
pub fn render<C: Context + ?Sized>(
    name: &str,
    text: &str,
    ctx: &C,
    missing: MissingKey,
) -> Result<String> {
    let tmpl = Template::parse(name, text)?;
    log::trace!("executing template {name}: {text}");
    tmpl.execute(ctx, missing)
}

/// True when `text` has no action delimiters and renders to itself
pub fn is_literal(text: &str) -> bool {
    !text.contains(LEFT_DELIM)
}

/// Build a template that renders to exactly `text`.
///
/// Every `{{` in the input becomes the action `{{"{{"}}`; nothing else needs
/// escaping since text outside actions is copied verbatim.
pub fn quote_literal(text: &str) -> String {
    if is_literal(text) {
        return text.to_string();
    }
    let escaped = format!("{LEFT_DELIM}\"{LEFT_DELIM}\"{RIGHT_DELIM}");
    text.split(LEFT_DELIM).collect::<Vec<_>>().join(&escaped)
}

/// Placeholder text that references `name`, e.g. `{{.dvln}}`
pub fn placeholder(name: &str) -> String {
    format!("{LEFT_DELIM}.{name}{RIGHT_DELIM}")
}

/// True if `name` can be referenced with [`placeholder`]
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
