use loxide::Lox;

// Static-error cases: the resolver (or parser) must flag the program and the
// driver must refuse to execute any of it.
fn expect_static_error(code: &str) {
    let mut lox = Lox::with_output(Vec::new());
    lox.run(code);

    assert!(lox.had_error(), "expected a static error in: {}", code);
    assert!(
        !lox.had_runtime_error(),
        "should never reach runtime: {}",
        code
    );

    let output = String::from_utf8(lox.into_output()).expect("program output should be UTF-8");
    assert_eq!(output, "", "nothing may execute after a static error");
}

fn expect_clean(code: &str) -> String {
    let mut lox = Lox::with_output(Vec::new());
    lox.run(code);

    assert!(!lox.had_error(), "unexpected static error in: {}", code);

    String::from_utf8(lox.into_output()).expect("program output should be UTF-8")
}

#[test]
fn reading_local_in_its_own_initializer() {
    expect_static_error("{ var a = a; }");
}

#[test]
fn global_initializer_may_reference_itself() {
    // Globals resolve late; this fails at runtime in general, but here the
    // name already exists by the time the initializer runs.
    let output = expect_clean("var a = 1; var a = a + 1; print a;");
    assert_eq!(output, "2\n");
}

#[test]
fn top_level_return() {
    expect_static_error("return 3;");
}

#[test]
fn return_inside_function_is_fine() {
    let output = expect_clean("fun f() { return 3; } print f();");
    assert_eq!(output, "3\n");
}

#[test]
fn returning_a_value_from_an_initializer() {
    expect_static_error("class A { init() { return 3; } }");
}

#[test]
fn bare_return_in_initializer_is_fine() {
    let output = expect_clean("class A { init() { return; } } print A();");
    assert_eq!(output, "A instance\n");
}

#[test]
fn this_outside_a_class() {
    expect_static_error("print this;");
    expect_static_error("fun f() { return this; }");
}

#[test]
fn super_outside_a_class() {
    expect_static_error("print super.x;");
}

#[test]
fn super_in_a_class_without_superclass() {
    expect_static_error("class A { m() { super.m(); } }");
}

#[test]
fn class_cannot_inherit_from_itself() {
    expect_static_error("class A < A {}");
}

#[test]
fn duplicate_declaration_in_local_scope() {
    expect_static_error("fun f() { var a = 1; var a = 2; }");
    expect_static_error("fun f(a) { var a = 1; }");
}

#[test]
fn shadowing_in_nested_scope_is_fine() {
    let output = expect_clean("fun f() { var a = 1; { var a = 2; print a; } print a; } f();");
    assert_eq!(output, "2\n1\n");
}

#[test]
fn resolution_continues_past_first_error() {
    // Both mistakes on one pass: reported together, nothing executed.
    let mut lox = Lox::with_output(Vec::new());
    lox.run("return 1; print this;");

    assert!(lox.had_error());
    assert_eq!(
        String::from_utf8(lox.into_output()).expect("program output should be UTF-8"),
        ""
    );
}

#[test]
fn resolved_depth_points_to_innermost_definition() {
    let code = "\
        var x = \"global\";\n\
        fun outer() {\n\
            var x = \"outer\";\n\
            fun inner() {\n\
                print x;\n\
            }\n\
            inner();\n\
        }\n\
        outer();\n\
        print x;";

    assert_eq!(expect_clean(code), "outer\nglobal\n");
}
