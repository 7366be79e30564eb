//! Integration tests for the htmlp compiler

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use htmlp::{compile_with_config, CompileConfig, ErrorKind, Session};

/// A component tree on disk
struct Project {
    dir: TempDir,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("Should create temp dir");
        for (name, text) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, text).unwrap();
        }
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> CompileConfig {
        CompileConfig::new().with_include_dir(self.dir.path())
    }

    fn compile(&self, name: &str) -> htmlp::Result<String> {
        compile_with_config(self.path(name), self.config())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

const CARD: &str = r#"<template args="title ?subtitle"><div class="card"><h1>$title</h1><p>$subtitle</p>$children</div></template>"#;

#[test]
fn test_card_end_to_end() {
    let project = Project::new(&[
        ("card.htmlp", CARD),
        ("index.htmlp", r#"<import path="card.htmlp"><card title="Hi">body</card>"#),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    insta::assert_snapshot!(html, @r#"<div class="card"><h1>Hi</h1><p></p>body</div>"#);
}

#[test]
fn test_same_component_through_two_aliases() {
    let project = Project::new(&[
        ("field.htmlp", r#"<template args="name"><input id="!f" name="$name"></template>"#),
        (
            "index.htmlp",
            r#"<import path="field.htmlp" alias="a"><import path="field.htmlp" alias="b"><a name="x"></a><b name="y"></b>"#,
        ),
    ]);
    let mut session = Session::new(project.config());
    let html = session
        .compile_file(project.path("index.htmlp"))
        .expect("Should compile");
    assert_eq!(html, r#"<input id="A" name="x"><input id="B" name="y">"#);
    assert_eq!(session.components().count(), 1);
}

#[test]
fn test_same_component_from_two_importers() {
    let project = Project::new(&[
        ("leaf.htmlp", "<template><i>$children</i></template>"),
        ("left.htmlp", r#"<import path="leaf.htmlp"><template><leaf>L</leaf></template>"#),
        ("right.htmlp", r#"<import path="leaf.htmlp"><template><leaf>R</leaf></template>"#),
        (
            "index.htmlp",
            r#"<import path="left.htmlp"><import path="right.htmlp"><left></left><right></right>"#,
        ),
    ]);
    let mut session = Session::new(project.config());
    let html = session
        .compile_file(project.path("index.htmlp"))
        .expect("Should compile");
    assert_eq!(html, "<i>L</i><i>R</i>");
    assert_eq!(session.components().count(), 3);
}

#[test]
fn test_direct_cycle() {
    let project = Project::new(&[
        ("a.htmlp", r#"<import path="b.htmlp"><template></template>"#),
        ("b.htmlp", r#"<import path="a.htmlp"><template></template>"#),
        ("index.htmlp", r#"<import path="a.htmlp">"#),
    ]);
    let err = project.compile("index.htmlp").unwrap_err();
    match err.kind {
        ErrorKind::ImportCycle { ref route } => {
            let names: Vec<_> = route.iter().map(|p| file_name(p)).collect();
            assert_eq!(names, vec!["index.htmlp", "a.htmlp", "b.htmlp", "a.htmlp"]);
        }
        ref other => panic!("Expected ImportCycle, got {:?}", other),
    }
    assert!(err.to_string().contains("Import recursion. Route:"));
    assert!(err.location.file.as_deref().is_some_and(|f| f.ends_with("b.htmlp")));
}

#[test]
fn test_long_cycle() {
    let project = Project::new(&[
        ("a.htmlp", r#"<import path="b.htmlp">"#),
        ("b.htmlp", r#"<import path="c.htmlp">"#),
        ("c.htmlp", r#"<import path="d.htmlp">"#),
        ("d.htmlp", r#"<import path="b.htmlp">"#),
        ("index.htmlp", r#"<import path="a.htmlp">"#),
    ]);
    let err = project.compile("index.htmlp").unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::ImportCycle { ref route } if route.len() == 6
    ));
}

#[test]
fn test_missing_required_argument() {
    let project = Project::new(&[
        ("card.htmlp", CARD),
        ("index.htmlp", "<import path=\"card.htmlp\">\n<div>\n<card></card></div>"),
    ]);
    let err = project.compile("index.htmlp").unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::MissingArgument { ref arg, .. } if arg == "title"
    ));
    assert_eq!(err.location.line, Some(3));
    let message = err.to_string();
    assert!(message.starts_with("Error in file "));
    assert!(message.ends_with("on line 3:\nCan't find required argument 'title' of <card/>."));
}

#[test]
fn test_extra_argument() {
    let project = Project::new(&[
        ("card.htmlp", CARD),
        ("index.htmlp", r#"<import path="card.htmlp"><card title="t" colour="red"></card>"#),
    ]);
    let err = project.compile("index.htmlp").unwrap_err();
    assert_eq!(err.kind.to_string(), "Extra argument 'colour'");
}

#[test]
fn test_optional_argument_never_left_literal() {
    let project = Project::new(&[
        (
            "tag.htmlp",
            r#"<template args="?note"><span title="$note" class="tag $note">[$note]</span></template>"#,
        ),
        ("index.htmlp", r#"<import path="tag.htmlp"><tag></tag>"#),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    assert!(!html.contains('$'));
    assert_eq!(html, r#"<span class="tag ">[]</span>"#);
}

#[test]
fn test_unique_tokens_scoped_per_usage() {
    let project = Project::new(&[
        (
            "check.htmlp",
            r#"<template><input id="!x"><label for="!x"></label></template>"#,
        ),
        ("index.htmlp", r#"<import path="check.htmlp"><check></check><check></check>"#),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    let doc = htmlp::parse(&html);
    let ids: Vec<_> = doc
        .find_all("input")
        .iter()
        .filter_map(|el| el.attr("id"))
        .map(str::to_string)
        .collect();
    let fors: Vec<_> = doc
        .find_all("label")
        .iter()
        .filter_map(|el| el.attr("for"))
        .map(str::to_string)
        .collect();
    assert_eq!(ids, fors);
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn test_children_slot() {
    let project = Project::new(&[
        ("box.htmlp", "<template><div>\n  $children\n</div></template>"),
        ("index.htmlp", r#"<import path="box.htmlp"><box><b>Hi</b></box>"#),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    assert_eq!(html, "<div><b>Hi</b></div>");
}

#[test]
fn test_component_without_template_vanishes() {
    let project = Project::new(&[
        ("css.htmlp", "<style>.x {}</style>"),
        ("index.htmlp", r#"<import path="css.htmlp"><main><css>gone</css></main>"#),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    assert_eq!(html, "<main></main>");
}

#[test]
fn test_usage_at_document_root() {
    let project = Project::new(&[
        ("page.htmlp", "<template><html><body>$children</body></html></template>"),
        ("index.htmlp", r#"<import path="page.htmlp"><page><p>x</p></page>"#),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    assert_eq!(html, "<html><body><p>x</p></body></html>");
}

#[test]
fn test_components_resolve_their_own_imports() {
    let project = Project::new(&[
        ("icon.htmlp", "<template><svg></svg></template>"),
        (
            "button.htmlp",
            r#"<import path="icon.htmlp"><template><button><icon></icon>$children</button></template>"#,
        ),
        // `icon` is not imported here, so the literal tag stays
        (
            "index.htmlp",
            r#"<import path="button.htmlp"><button>Go</button><icon></icon>"#,
        ),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    assert_eq!(html, "<button><svg></svg>Go</button><icon></icon>");
}

#[test]
fn test_missing_import_names_importer() {
    let project = Project::new(&[("index.htmlp", "\n\n<import path=\"lost.htmlp\">")]);
    let err = project.compile("index.htmlp").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ImportedFileNotFound { .. }));
    assert!(err.kind.to_string().contains("lost.htmlp"));
    assert!(err.location.file.as_deref().is_some_and(|f| f.ends_with("index.htmlp")));
    assert_eq!(err.location.line, Some(3));
}

#[test]
fn test_nested_include_dir_paths() {
    let project = Project::new(&[
        ("ui/card.htmlp", CARD),
        ("ui/list.htmlp", r#"<import path="ui/card.htmlp"><template><card title="x"></card></template>"#),
        ("index.htmlp", r#"<import path="ui/list.htmlp"><list></list>"#),
    ]);
    let html = project.compile("index.htmlp").expect("Should compile");
    assert_eq!(html, r#"<div class="card"><h1>x</h1><p></p></div>"#);
}

#[test]
fn test_report_includes_message() {
    let project = Project::new(&[("index.htmlp", "<import alias=\"x\">")]);
    let err = project.compile("index.htmlp").unwrap_err();
    let report = err.report();
    assert!(report.contains("Can't find 'path' attribute of <import/>"));
}
