use std::{cell::Cell, rc::Rc};

use expect_test::{expect, Expect};
use kern_node::{AnalysisError, FunctionNode, SourceNode};

use crate::{
    install_polyfills, DeclareFunction, FunctionDecl, NodeRegistry, RegistryError, SourceBackend, Ty, KERNEL_ENTRY,
    POLYFILLS,
};

fn registry_from(functions: Vec<(&str, &str)>) -> NodeRegistry {
    let mut backend = SourceBackend::new();
    for (name, body) in functions {
        let decl = FunctionDecl {
            name,
            body,
            param_types: &[],
            return_type: Ty::Float,
        };
        if name == KERNEL_ENTRY {
            backend.add_kernel(decl);
        } else {
            backend.declare(decl).expect("source backend always declares");
        }
    }
    backend.into_registry()
}

fn check(
    functions: Vec<(&str, &str)>,
    entry: &str,
    expect: Expect,
) {
    let mut registry = registry_from(functions);
    let traced = registry.trace(entry).expect("trace should succeed");
    expect.assert_eq(&render_closure(&registry, &traced));
}

fn render_closure(
    registry: &NodeRegistry,
    traced: &[Rc<str>],
) -> String {
    let mut result = String::new();
    result.push_str("__Closure__\n");
    for name in traced {
        let id = registry.lookup(name).expect("traced names are always registered");
        let parent = match registry.parent(id) {
            Some(parent) => registry.get(parent).function_name().to_string(),
            None => "none".to_string(),
        };
        result.push_str(&format!("{name} (parent {parent})\n"));
    }
    result
}

#[test]
fn closure_is_deduplicated_preorder() {
    check(
        vec![
            ("kernel", "return a(x) + b(y);"),
            ("a", "return b(x);"),
            ("b", "return 1.0;"),
        ],
        "kernel",
        expect![[r#"
            __Closure__
            kernel (parent none)
            a (parent kernel)
            b (parent a)
        "#]],
    );
}

#[test]
fn direct_recursion_terminates() {
    check(
        vec![("kernel", "return kernel(n - 1.0);")],
        "kernel",
        expect![[r#"
            __Closure__
            kernel (parent none)
        "#]],
    );
}

#[test]
fn mutual_recursion_terminates() {
    check(
        vec![("kernel", "return x(n);"), ("x", "return kernel(n);")],
        "kernel",
        expect![[r#"
            __Closure__
            kernel (parent none)
            x (parent kernel)
        "#]],
    );
}

#[test]
fn unknown_callees_are_skipped() {
    check(
        vec![("kernel", "return floor(a) + abs(b);")],
        "kernel",
        expect![[r#"
            __Closure__
            kernel (parent none)
        "#]],
    );
}

#[test]
fn unknown_entry_yields_empty_closure() {
    let mut registry = registry_from(vec![("kernel", "return 1.0;")]);
    let traced = registry.trace("builtin_only").expect("unknown entries are not an error");
    assert!(traced.is_empty());
}

#[test]
fn preorder_expands_whole_subtree_before_next_sibling() {
    check(
        vec![
            ("kernel", "return a(x) + b(y);"),
            ("a", "return c(x);"),
            ("b", "return 2.0;"),
            ("c", "return 3.0;"),
        ],
        "kernel",
        expect![[r#"
            __Closure__
            kernel (parent none)
            a (parent kernel)
            c (parent a)
            b (parent kernel)
        "#]],
    );
}

#[test]
fn re_registration_overwrites_by_name() {
    check(
        vec![
            ("scale", "return old_helper(x);"),
            ("old_helper", "return 1.0;"),
            ("new_helper", "return 2.0;"),
            ("scale", "return new_helper(x);"),
        ],
        "scale",
        expect![[r#"
            __Closure__
            scale (parent none)
            new_helper (parent scale)
        "#]],
    );
}

#[test]
fn later_root_registration_wins() {
    let mut registry = NodeRegistry::new();
    registry.register(SourceNode::new("first", "return 1.0;").root_kernel());
    let second = registry.register(SourceNode::new("second", "return 2.0;").root_kernel());
    assert_eq!(registry.root_kernel(), Some(second));
    assert_eq!(registry.get(second).function_name(), "second");
}

#[test]
fn trace_defaults_to_the_kernel_entry() {
    let mut registry = registry_from(vec![("kernel", "return helper(x);"), ("helper", "return 1.0;")]);
    let traced = registry.trace_kernel().expect("trace should succeed");
    let traced: Vec<&str> = traced.iter().map(|name| &**name).collect();
    assert_eq!(traced, ["kernel", "helper"]);
}

#[test]
fn polyfills_resolve_after_install() {
    let mut backend = SourceBackend::new();
    install_polyfills(&mut backend).expect("declaring backends install polyfills");
    let mut registry = backend.into_registry();

    assert!(registry.lookup("round").is_some());
    let traced = registry.trace("round").expect("polyfill bodies analyze cleanly");
    let traced: Vec<&str> = traced.iter().map(|name| &**name).collect();
    // `floor` is a guaranteed built-in, not a registry entry, so the
    // closure is the polyfill alone
    assert_eq!(traced, ["round"]);
}

#[test]
fn polyfill_install_is_idempotent() {
    let mut backend = SourceBackend::new();
    install_polyfills(&mut backend).expect("first install succeeds");
    install_polyfills(&mut backend).expect("second install overwrites in place");
    assert_eq!(backend.registry().len(), POLYFILLS.len());
}

#[test]
fn base_registry_cannot_declare() {
    let mut registry = NodeRegistry::new();
    let result = registry.declare(FunctionDecl {
        name:        "round",
        body:        "return floor(a + 0.5);",
        param_types: &[Ty::Float],
        return_type: Ty::Float,
    });
    assert!(matches!(result, Err(RegistryError::UnsupportedOperation("declare"))));
}

#[test]
fn polyfill_install_requires_a_backend() {
    let mut registry = NodeRegistry::new();
    assert!(matches!(
        install_polyfills(&mut registry),
        Err(RegistryError::UnsupportedOperation(_))
    ));
}

struct CountingNode {
    name:     &'static str,
    callees:  Vec<String>,
    analyzed: Rc<Cell<usize>>,
}

impl FunctionNode for CountingNode {
    fn function_name(&self) -> &str {
        self.name
    }

    fn ensure_analyzed(&mut self) -> Result<(), AnalysisError> {
        self.analyzed.set(self.analyzed.get() + 1);
        Ok(())
    }

    fn called_functions(&self) -> &[String] {
        &self.callees
    }
}

#[test]
fn reached_functions_are_analyzed_exactly_once() {
    let reached = Rc::new(Cell::new(0));
    let unreached = Rc::new(Cell::new(0));
    let mut registry = NodeRegistry::new();
    registry.register(SourceNode::new(KERNEL_ENTRY, "return helper(a) + helper(b);").root_kernel());
    registry.register(CountingNode {
        name:     "helper",
        callees:  Vec::new(),
        analyzed: Rc::clone(&reached),
    });
    registry.register(CountingNode {
        name:     "orphan",
        callees:  Vec::new(),
        analyzed: Rc::clone(&unreached),
    });

    registry.trace_kernel().expect("trace should succeed");

    // `helper` appears at two call sites but is analyzed once; `orphan` is
    // never reached, so it is never analyzed at all
    assert_eq!(reached.get(), 1);
    assert_eq!(unreached.get(), 0);
}

#[test]
fn analysis_failure_aborts_the_trace() {
    let mut registry = registry_from(vec![("kernel", "return broken(x);"), ("broken", "   ")]);
    let err = registry.trace_kernel().expect_err("empty bodies fail analysis");
    assert_eq!(err, AnalysisError::EmptyBody("broken".into()));
}

#[test]
fn parent_tracks_the_most_recent_trace() {
    let mut registry = registry_from(vec![
        ("kernel", "return a(x) + b(y);"),
        ("a", "return shared(x);"),
        ("b", "return shared(y);"),
        ("shared", "return 1.0;"),
    ]);

    registry.trace_kernel().expect("trace should succeed");
    let shared = registry.lookup("shared").expect("shared is registered");
    let parent = registry.parent(shared).expect("shared was reached through a caller");
    assert_eq!(registry.get(parent).function_name(), "a");

    // a fresh trace from `b` re-records the caller
    registry.trace("b").expect("trace should succeed");
    let parent = registry.parent(shared).expect("shared was reached through a caller");
    assert_eq!(registry.get(parent).function_name(), "b");
}
