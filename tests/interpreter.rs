use loxide::Lox;

// Run Lox code with a fresh interpreter and return the captured program
// output. Panics if the code failed to run at all.
fn run(code: &str) -> String {
    let mut lox = Lox::with_output(Vec::new());
    lox.run(code);

    assert!(!lox.had_error(), "static error in: {}", code);
    assert!(!lox.had_runtime_error(), "runtime error in: {}", code);

    String::from_utf8(lox.into_output()).expect("program output should be UTF-8")
}

// Variant for failure cases: (output, had_error, had_runtime_error).
fn try_run(code: &str) -> (String, bool, bool) {
    let mut lox = Lox::with_output(Vec::new());
    lox.run(code);

    let had_error = lox.had_error();
    let had_runtime_error = lox.had_runtime_error();
    let output = String::from_utf8(lox.into_output()).expect("program output should be UTF-8");

    (output, had_error, had_runtime_error)
}

#[test]
fn arithmetic() {
    assert_eq!(run("print 1 + 2;"), "3\n");
    assert_eq!(run("print 10 / 4;"), "2.5\n");
    assert_eq!(run("print 2 * 3 - 1;"), "5\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run("print \"foo\" + \"bar\";"), "foobar\n");
}

#[test]
fn number_display_trims_integral_fraction() {
    assert_eq!(run("print 1.5; print 2.0; print 3;"), "1.5\n2\n3\n");
}

#[test]
fn division_by_zero_follows_ieee() {
    assert_eq!(run("print 1 / 0;"), "inf\n");
}

#[test]
fn block_scoping_and_shadowing() {
    let code = "\
        var a = 1;\n\
        {\n\
            var a = 2;\n\
            print a;\n\
        }\n\
        print a;";

    assert_eq!(run(code), "2\n1\n");
}

#[test]
fn closures_capture_their_defining_scope() {
    let code = "\
        fun make() {\n\
            var i = 0;\n\
            fun inc() {\n\
                i = i + 1;\n\
                print i;\n\
            }\n\
            return inc;\n\
        }\n\
        var c = make();\n\
        c();\n\
        c();";

    assert_eq!(run(code), "1\n2\n");
}

#[test]
fn closure_sees_definition_site_not_later_shadow() {
    let code = "\
        var a = \"global\";\n\
        {\n\
            fun show() { print a; }\n\
            show();\n\
            var a = \"block\";\n\
            show();\n\
        }";

    assert_eq!(run(code), "global\nglobal\n");
}

#[test]
fn class_initializer_and_methods() {
    let code = "\
        class A {\n\
            init(x) { this.x = x; }\n\
            get() { return this.x; }\n\
        }\n\
        print A(7).get();";

    assert_eq!(run(code), "7\n");
}

#[test]
fn super_dispatches_to_superclass_method() {
    let code = "\
        class A { greet() { print \"A\"; } }\n\
        class B < A {\n\
            greet() {\n\
                super.greet();\n\
                print \"B\";\n\
            }\n\
        }\n\
        B().greet();";

    assert_eq!(run(code), "A\nB\n");
}

#[test]
fn for_loop_counts() {
    assert_eq!(run("for (var i = 0; i < 3; i = i + 1) print i;"), "0\n1\n2\n");
}

#[test]
fn clock_is_monotonic_enough() {
    assert_eq!(run("print clock() - clock() <= 0;"), "true\n");
}

#[test]
fn truthiness() {
    assert_eq!(run("print !nil;"), "true\n");
    assert_eq!(run("print !false;"), "true\n");
    assert_eq!(run("print !0;"), "false\n");
    assert_eq!(run("print !\"\";"), "false\n");
    assert_eq!(run("print !true;"), "false\n");
}

#[test]
fn logical_operators_return_raw_operands() {
    assert_eq!(run("print \"hi\" or 2;"), "hi\n");
    assert_eq!(run("print nil or \"yes\";"), "yes\n");
    assert_eq!(run("print nil and 1;"), "nil\n");
    assert_eq!(run("print 1 and 2;"), "2\n");
}

#[test]
fn short_circuit_skips_right_operand() {
    let code = "\
        fun boom() { print \"boom\"; return true; }\n\
        var x = false and boom();\n\
        var y = true or boom();\n\
        print x;\n\
        print y;";

    assert_eq!(run(code), "false\ntrue\n");
}

#[test]
fn equality_rules() {
    assert_eq!(run("print nil == nil;"), "true\n");
    assert_eq!(run("print nil == 0;"), "false\n");
    assert_eq!(run("print 1 == 1;"), "true\n");
    assert_eq!(run("print \"a\" == \"a\";"), "true\n");
    assert_eq!(run("print 1 == \"1\";"), "false\n");
    assert_eq!(run("print true != false;"), "true\n");
}

#[test]
fn nan_is_not_equal_to_itself() {
    assert_eq!(run("var nan = 0 / 0; print nan == nan;"), "false\n");
}

#[test]
fn var_defaults_to_nil() {
    assert_eq!(run("var a; print a;"), "nil\n");
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(run("var a = 1; print a = 2; print a;"), "2\n2\n");
}

#[test]
fn global_redefinition_is_allowed() {
    assert_eq!(run("var a = 1; var a = 2; print a;"), "2\n");
}

#[test]
fn while_loop() {
    let code = "\
        var n = 3;\n\
        while (n > 0) {\n\
            print n;\n\
            n = n - 1;\n\
        }";

    assert_eq!(run(code), "3\n2\n1\n");
}

#[test]
fn if_else_branches_on_truthiness() {
    assert_eq!(run("if (1) print \"then\"; else print \"else\";"), "then\n");
    assert_eq!(run("if (nil) print \"then\"; else print \"else\";"), "else\n");
}

#[test]
fn recursion() {
    let code = "\
        fun fib(n) {\n\
            if (n < 2) return n;\n\
            return fib(n - 1) + fib(n - 2);\n\
        }\n\
        print fib(6);";

    assert_eq!(run(code), "8\n");
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(run("fun f() {} print f();"), "nil\n");
}

#[test]
fn value_display_forms() {
    assert_eq!(run("fun f() {} print f;"), "<fn f>\n");
    assert_eq!(run("print clock;"), "<native fn>\n");
    assert_eq!(run("class A {} print A;"), "A\n");
    assert_eq!(run("class A {} print A();"), "A instance\n");
}

#[test]
fn fields_are_created_on_write() {
    let code = "\
        class Bag {}\n\
        var bag = Bag();\n\
        bag.x = 1;\n\
        bag.x = bag.x + 1;\n\
        print bag.x;";

    assert_eq!(run(code), "2\n");
}

#[test]
fn instances_have_independent_fields() {
    let code = "\
        class Bag {}\n\
        var a = Bag();\n\
        var b = Bag();\n\
        a.x = 1;\n\
        b.x = 2;\n\
        print a.x;\n\
        print b.x;";

    assert_eq!(run(code), "1\n2\n");
}

#[test]
fn field_shadows_method() {
    let code = "\
        class A {\n\
            m() { return \"method\"; }\n\
        }\n\
        var a = A();\n\
        a.m = \"field\";\n\
        print a.m;";

    assert_eq!(run(code), "field\n");
}

#[test]
fn bound_method_remembers_its_instance() {
    let code = "\
        class A {\n\
            init() { this.n = \"inst\"; }\n\
            name() { return this.n; }\n\
        }\n\
        var m = A().name;\n\
        print m();";

    assert_eq!(run(code), "inst\n");
}

#[test]
fn initializer_always_yields_the_instance() {
    assert_eq!(run("class A { init() { return; } } print A();"), "A instance\n");

    let code = "\
        class A { init() {} }\n\
        var a = A();\n\
        print a.init() == a;";

    assert_eq!(run(code), "true\n");
}

#[test]
fn methods_are_inherited() {
    let code = "\
        class A { m() { return 1; } }\n\
        class B < A {}\n\
        print B().m();";

    assert_eq!(run(code), "1\n");
}

#[test]
fn inherited_init_runs_through_subclass() {
    let code = "\
        class A { init(x) { this.x = x; } }\n\
        class B < A {}\n\
        print B(9).x;";

    assert_eq!(run(code), "9\n");
}

// ── runtime failures ────────────────────────────────────────────────────────

#[test]
fn negating_a_string_fails_at_runtime() {
    let (output, had_error, had_runtime_error) = try_run("-\"a\";");

    assert!(!had_error);
    assert!(had_runtime_error);
    assert_eq!(output, "");
}

#[test]
fn mixed_plus_fails_at_runtime() {
    let (_, had_error, had_runtime_error) = try_run("\"a\" + 1;");

    assert!(!had_error);
    assert!(had_runtime_error);
}

#[test]
fn comparing_non_numbers_fails() {
    let (_, _, had_runtime_error) = try_run("\"a\" < \"b\";");

    assert!(had_runtime_error);
}

#[test]
fn calling_a_non_callable_fails() {
    let (_, _, had_runtime_error) = try_run("\"nope\"();");

    assert!(had_runtime_error);
}

#[test]
fn undefined_variable_fails() {
    let (_, _, had_runtime_error) = try_run("print missing;");

    assert!(had_runtime_error);
}

#[test]
fn wrong_arity_fails() {
    let (_, _, had_runtime_error) = try_run("fun f(a) {} f(1, 2);");

    assert!(had_runtime_error);

    let (_, _, had_runtime_error) = try_run("class A { init(x) {} } A();");

    assert!(had_runtime_error);
}

#[test]
fn property_access_on_non_instance_fails() {
    let (_, _, had_runtime_error) = try_run("var a = 1; a.b;");

    assert!(had_runtime_error);

    let (_, _, had_runtime_error) = try_run("var a = 1; a.b = 2;");

    assert!(had_runtime_error);
}

#[test]
fn undefined_property_fails() {
    let (_, _, had_runtime_error) = try_run("class A {} A().missing;");

    assert!(had_runtime_error);
}

#[test]
fn superclass_must_be_a_class() {
    let (_, _, had_runtime_error) = try_run("var NotAClass = 1; class B < NotAClass {}");

    assert!(had_runtime_error);
}

#[test]
fn runtime_error_aborts_remaining_statements() {
    let (output, _, had_runtime_error) = try_run("print 1; -\"a\"; print 2;");

    assert!(had_runtime_error);
    assert_eq!(output, "1\n");
}
