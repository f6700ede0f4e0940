use dvln_codebase::{decode, decode_raw, decode_reader, is_expanded, CodebaseError, ErrorKind};
use pretty_assertions::assert_eq;

const EXAMPLE: &[u8] = include_bytes!("fixtures/example.codebase");
const EXPANDED: &[u8] = include_bytes!("fixtures/expanded.codebase");
// missing '}' in the first package's "repo" template
const BAD_TEMPLATE: &[u8] = include_bytes!("fixtures/bad_template.codebase");

#[test]
fn example_expands_to_the_pre_expanded_copy() {
    let read = decode(EXAMPLE).expect("decode example");
    let expected = decode(EXPANDED).expect("decode expanded");
    assert_eq!(read, expected);
    assert!(is_expanded(&read));
}

#[test]
fn example_fields_sample() {
    let def = decode_reader(EXAMPLE).expect("decode example");
    assert_eq!(def.name, "dvln");
    assert_eq!(def.desc, "Multi-package and workspace management tool");
    assert_eq!(def.attrs["jobs"], "4");
    assert_eq!(def.vars["dvln"], "http://github.com/dvln");
    assert_eq!(
        def.contacts["authors"],
        vec!["Erik Brady <brady@dvln.org>".to_string()]
    );
    assert!(def.pkgs.len() >= 3);
}

#[test]
fn access_conditional_key_is_rewritten() {
    let def = decode(EXAMPLE).expect("decode example");
    assert!(def
        .access
        .contains_key("m,^http://github.com/dvln/*, && Vendor!=True"));
    assert!(!def.access.contains_key("m,^{{.dvln}}/*, && Vendor!=True"));

    // policy values are not expansion targets
    let policy = &def.access["m,^http://github.com/dvln/*, && Vendor!=True"];
    assert_eq!(policy["read"], "open");
    assert!(policy["write"].contains("{{.TopCodebase}}"));
}

#[test]
fn repo_and_remote_uris_are_expanded() {
    let def = decode(EXAMPLE).expect("decode example");
    let viper = def.package("dvln/lib/3rd/viper").expect("viper package");
    let git = viper.vcs("git").expect("git binding");
    assert_eq!(git.repo["rw"], "http://github.com/dvln/viper");
    assert_eq!(
        git.remotes["vendor,spf13"]["r"],
        "http://github.com/spf13/viper"
    );
    assert_eq!(git.remotes["joe"]["read"], "http://github.com/joe/viper");
    assert_eq!(git.fmts, vec!["vcs", "src", "source"]);
}

#[test]
fn pathing_and_package_access_are_left_alone() {
    let def = decode(EXAMPLE).expect("decode example");
    assert_eq!(def.pathing["wkspc_pfx_dir"], "{{if .GoPkg}}src{{end}}");
    let out = def.package("dvln/lib/out").expect("out package");
    assert!(out.access["write"].contains("{{.Pkg}}"));
}

#[test]
fn package_order_is_preserved() {
    let def = decode(EXAMPLE).expect("decode example");
    let names: Vec<_> = def.pkgs.iter().map(|pkg| pkg.name.as_str()).collect();
    assert_eq!(names, vec!["dvln/lib/3rd/viper", "dvln/lib/out", "dvln/web/hugo"]);
    let ids: Vec<_> = def.pkgs.iter().map(|pkg| pkg.id.as_str()).collect();
    assert_eq!(ids, vec!["22", "23", "24"]);
}

#[test]
fn vcs_binding_order_is_preserved() {
    let def = decode(
        br#"{ "name": "multi",
              "vars": { "a": "http://a.example" },
              "pkgs": [ { "name": "p", "vcs": [
                  { "type": "hg",  "repo": { "ro": "{{.a}}/hg" } },
                  { "type": "git", "repo": { "rw": "{{.a}}/git" } },
                  { "type": "svn" } ] } ] }"#,
    )
    .expect("decode");
    let types: Vec<_> = def.pkgs[0]
        .vcs
        .iter()
        .map(|binding| binding.vcs_type.as_str())
        .collect();
    assert_eq!(types, vec!["hg", "git", "svn"]);
    assert_eq!(def.pkgs[0].vcs[1].repo["rw"], "http://a.example/git");
}

#[test]
fn end_to_end_viper_example() {
    let def = decode(
        br#"{ "name": "dvln",
              "vars": { "dvln": "http://github.com/dvln", "spf13": "http://github.com/spf13" },
              "pkgs": [ { "name": "viper", "vcs": [ {
                  "type": "git",
                  "repo": { "rw": "{{.dvln}}/viper" },
                  "remotes": { "vendor": { "r": "{{.spf13}}/viper" } } } ] } ] }"#,
    )
    .expect("decode");
    let git = &def.pkgs[0].vcs[0];
    assert_eq!(git.repo["rw"], "http://github.com/dvln/viper");
    assert_eq!(git.remotes["vendor"]["r"], "http://github.com/spf13/viper");
}

#[test]
fn bad_template_fixture_fails_to_parse() {
    let err = decode(BAD_TEMPLATE).expect_err("bad template must not decode");
    assert_eq!(err.kind(), ErrorKind::TemplateParse);
    assert_eq!(err.code(), 3004);
    let message = err.to_string();
    assert!(message.contains("{{.dvln}/viper"), "{message}");
    assert!(message.contains("Pkg: dvln/lib/3rd/viper"), "{message}");
}

#[test]
fn undefined_variable_fails_loudly() {
    let err = decode(
        br#"{ "name": "x", "vars": {},
              "pkgs": [ { "name": "p", "vcs": [ { "type": "git", "repo": { "rw": "{{.undefined}}/x" } } ] } ] }"#,
    )
    .expect_err("undefined variable must fail");
    assert_eq!(err.kind(), ErrorKind::TemplateExecution);
    match err {
        CodebaseError::TemplateExecution { template, .. } => {
            assert_eq!(template, "{{.undefined}}/x");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn undefined_variable_in_remote_fails_loudly() {
    let err = decode(
        br#"{ "name": "x", "vars": { "a": "b" },
              "pkgs": [ { "name": "p", "vcs": [ { "type": "git",
                  "remotes": { "upstream": { "r": "{{.nope}}/x" } } } ] } ] }"#,
    )
    .expect_err("undefined variable must fail");
    assert_eq!(err.kind(), ErrorKind::TemplateExecution);
    assert!(err.to_string().contains("Remote: upstream"), "{err}");
}

#[test]
fn expanding_an_expanded_definition_is_a_no_op() {
    let mut def = decode(EXAMPLE).expect("decode example");
    let once = def.clone();
    def.expand().expect("second expansion");
    assert_eq!(def, once);
}

#[test]
fn raw_decode_then_expand_matches_decode() {
    let mut raw = decode_raw(EXAMPLE).expect("raw decode");
    assert!(!is_expanded(&raw));
    raw.expand().expect("expand");
    assert_eq!(raw, decode(EXAMPLE).expect("decode"));
}

#[test]
fn pathing_is_evaluated_per_package() {
    let def = decode(
        br#"{ "name": "x",
              "pathing": { "wkspc_pfx_dir": "{{if .GoPkg}}src{{end}}" },
              "pkgs": [ { "name": "go", "attrs": { "GoPkg": "True" } },
                        { "name": "c" } ] }"#,
    )
    .expect("decode");
    let go = def.package_pathing(&def.pkgs[0]).expect("pathing");
    let c = def.package_pathing(&def.pkgs[1]).expect("pathing");
    assert_eq!(go["wkspc_pfx_dir"], "src");
    assert_eq!(c["wkspc_pfx_dir"], "");
}
