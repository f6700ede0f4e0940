use std::collections::{BTreeMap, HashMap};

use dvln_template::{
    is_literal, placeholder, quote_literal, render, MissingKey, Template, TemplateError,
};
use pretty_assertions::assert_eq;

fn vars() -> BTreeMap<String, String> {
    [
        ("dvln", "http://github.com/dvln"),
        ("spf13", "http://github.com/spf13"),
        ("GoPkg", "True"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[test]
fn substitutes_variables() {
    let out = render("repoURI", "{{.dvln}}/viper", &vars(), MissingKey::Error).unwrap();
    assert_eq!(out, "http://github.com/dvln/viper");
}

#[test]
fn access_conditional_expands_in_place() {
    let out = render(
        "codebaseAccess",
        "m,^{{.dvln}}/*, && Vendor!=True",
        &vars(),
        MissingKey::Error,
    )
    .unwrap();
    assert_eq!(out, "m,^http://github.com/dvln/*, && Vendor!=True");
}

#[test]
fn undefined_variable_is_an_execution_error() {
    let err = render("repoURI", "{{.undefined}}/x", &vars(), MissingKey::Error).unwrap_err();
    assert_eq!(
        err,
        TemplateError::UndefinedKey {
            name: "repoURI".to_string(),
            key: "undefined".to_string(),
        }
    );
    assert!(!err.is_parse());
}

#[test]
fn undefined_variable_is_empty_with_zero_policy() {
    let out = render("t", "[{{.undefined}}]", &vars(), MissingKey::Zero).unwrap();
    assert_eq!(out, "[]");
}

#[test]
fn mismatched_braces_fail_to_parse() {
    let err = Template::parse("repoURI", "{{.dvln}/viper").unwrap_err();
    assert!(err.is_parse(), "expected parse error, got {err:?}");
}

#[test]
fn conditional_uses_attribute_truthiness() {
    let mut attrs: HashMap<String, String> = HashMap::new();
    let tmpl = Template::parse("wkspc_pfx_dir", "{{if .GoPkg}}src{{end}}").unwrap();
    assert_eq!(tmpl.execute(&attrs, MissingKey::Zero).unwrap(), "");

    attrs.insert("GoPkg".to_string(), "True".to_string());
    assert_eq!(tmpl.execute(&attrs, MissingKey::Zero).unwrap(), "src");
}

#[test]
fn else_branches_and_functions() {
    let tmpl = Template::parse(
        "t",
        r#"{{if eq .GoPkg "False"}}no{{else if and .GoPkg (not .Vendor)}}go{{else}}other{{end}}"#,
    )
    .unwrap();
    assert_eq!(tmpl.execute(&vars(), MissingKey::Zero).unwrap(), "go");
}

#[test]
fn comparing_bool_with_string_fails() {
    let err = render("t", r#"{{eq true "true"}}"#, &vars(), MissingKey::Error).unwrap_err();
    assert!(matches!(err, TemplateError::Exec { .. }), "{err:?}");
}

#[test]
fn field_names_cover_every_branch() {
    let tmpl = Template::parse("t", "{{.a}}{{if .b}}{{.c}}{{else}}{{.d}}{{end}}").unwrap();
    let names: Vec<_> = tmpl.field_names().into_iter().collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
}

#[test]
fn literal_text_renders_to_itself() {
    let text = "http://dvln.org/api/v1/access?type=write";
    assert!(is_literal(text));
    let tmpl = Template::parse("t", text).unwrap();
    assert!(tmpl.is_literal());
    assert_eq!(tmpl.execute(&vars(), MissingKey::Error).unwrap(), text);
}

#[test]
fn quoted_literal_survives_rendering() {
    for text in ["plain", "a{{b", "{{{", "x}}{{.dvln}}y", "{{.dvln}}"] {
        let quoted = quote_literal(text);
        let out = render("t", &quoted, &BTreeMap::new(), MissingKey::Error).unwrap();
        assert_eq!(out, text, "quoted form was {quoted:?}");
    }
}

#[test]
fn placeholder_round_trips() {
    let text = format!("{}/viper", placeholder("spf13"));
    assert_eq!(
        render("t", &text, &vars(), MissingKey::Error).unwrap(),
        "http://github.com/spf13/viper"
    );
}

#[test]
fn trimmed_comments_render_nothing() {
    let out = render("t", "x {{- /* c */ -}} {{.dvln}}", &vars(), MissingKey::Error).unwrap();
    assert_eq!(out, "xhttp://github.com/dvln");
}
