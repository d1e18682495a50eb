use mus::{Interpreter, Lexer, MusError, Parser};

fn run(src: &str) -> Result<(), MusError> {
    let tokens = Lexer::new(src).lex()?;
    let program = Parser::parse(tokens)?;
    Interpreter::new().interpret(&program)
}

#[test]
fn hello_world() {
    run(r#"out("hello, world")"#).expect("program should run to completion");
}

#[test]
fn arithmetic_respects_operator_precedence() {
    run(
        r#"
        var result => integer = 2 + 3 * 4 - 10 / 2
        if (result != 9) { error("expected 9") }
        out(result)
        "#,
    )
    .expect("precedence should match the grammar's level order");
}

#[test]
fn closures_keep_a_private_mutable_counter() {
    run(
        r#"
        fun make_counter() {
            var count => integer = 0
            fun increment() {
                count = count + 1
                return count
            }
            return increment
        }

        var counter => any = make_counter()
        var first => integer = counter()
        var second => integer = counter()
        var third => integer = counter()

        if (first != 1) { error("first call should return 1") }
        if (second != 2) { error("second call should return 2") }
        if (third != 3) { error("third call should return 3") }
        "#,
    )
    .expect("each call should observe the previous mutation through the shared closure");
}

#[test]
fn single_inheritance_with_super_dispatch() {
    run(
        r#"
        class Animal {
            var name => string = "animal"

            fun speak() {
                return "..."
            }
        }

        class Dog extends Animal {
            fun speak() {
                var base => string = super.speak()
                return base + " woof"
            }
        }

        var d => any = new Dog()
        var speech => string = d.speak()
        if (speech != "... woof") { error("expected inherited dispatch to prefix the base call") }
        "#,
    )
    .expect("super should resolve to the declaring superclass's method");
}

#[test]
fn for_in_iterates_array_elements_in_order() {
    run(
        r#"
        var total => integer = 0
        for (n in [1, 2, 3, 4]) {
            total = total + n
        }
        if (total != 10) { error("expected sum of 1..4 to be 10") }
        "#,
    )
    .expect("for-in should visit every element exactly once, in order");
}

#[test]
fn c_style_for_supports_early_return_from_an_enclosing_function() {
    run(
        r#"
        fun first_multiple_of(n => integer, limit => integer) {
            for (var i = 1; i <= limit; i = i + 1) {
                if (i % n == 0) {
                    return i
                }
            }
            return -1
        }

        var result => integer = first_multiple_of(7, 100)
        if (result != 7) { error("expected the first multiple of 7 under 100 to be 7 itself") }
        "#,
    )
    .expect("a return inside a C-style for body should unwind out of the loop and the function");
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let err = run("out(10 / 0)").expect_err("dividing by zero must not panic");
    assert!(matches!(err, MusError::Runtime { .. }));
}

#[test]
fn modulo_by_zero_is_a_runtime_error() {
    let err = run("out(10 % 0)").expect_err("modulo by zero must not panic");
    assert!(matches!(err, MusError::Runtime { .. }));
}

#[test]
fn indexing_one_past_the_last_element_is_out_of_bounds() {
    let err = run(
        r#"
        var items => array<integer> = [1, 2, 3]
        out(items[3])
        "#,
    )
    .expect_err("index equal to the array length is out of bounds");
    assert!(matches!(err, MusError::Runtime { .. }));
}

#[test]
fn unterminated_string_literal_is_a_lexer_error() {
    let err = run(r#"out("never closed)"#).expect_err("an unterminated string must not lex");
    assert!(matches!(err, MusError::Lexer { .. }));
}

#[test]
fn assigning_to_a_literal_is_a_parse_error() {
    let err = run("1 = 2").expect_err("a literal is not an assignable target");
    assert!(matches!(err, MusError::Parser(_)));
}

#[test]
fn this_outside_of_a_method_body_is_a_name_error() {
    let err = run("out(this)").expect_err("'this' only makes sense inside a bound method");
    assert!(matches!(err, MusError::Name { .. }));
}

#[test]
fn field_initializers_do_not_share_mutable_state_across_instances() {
    run(
        r#"
        class Box {
            var items => array<integer> = [0, 0, 0]
        }

        var a => any = new Box()
        var b => any = new Box()
        a.items[0] = 99
        if (b.items[0] != 0) { error("each instance should own its own array") }
        "#,
    )
    .expect("per-instance field initialization should not alias instances");
}

#[test]
fn a_non_empty_typed_array_literal_is_not_a_type_error() {
    run(
        r#"
        var items => array<integer> = [1, 2, 3]
        if (items.length != 3) { error("expected length 3") }
        "#,
    )
    .expect("a non-empty array literal should adopt the declared element type");
}

#[test]
fn push_appends_and_grows_length_by_one() {
    run(
        r#"
        var items => array<integer> = [1, 2, 3]
        items.push(4)
        if (items.length != 4) { error("push should grow length by exactly one") }
        if (items[3] != 4) { error("push should append at the end") }
        "#,
    )
    .expect("push should append an element of the declared element type");
}

#[test]
fn push_rejects_a_value_outside_the_declared_element_type() {
    let err = run(
        r#"
        var items => array<integer> = [1, 2, 3]
        items.push("not an integer")
        "#,
    )
    .expect_err("pushing a string onto an array<integer> should fail");
    assert!(matches!(err, MusError::Type { .. }));
}

#[test]
fn pop_removes_and_returns_the_last_element() {
    run(
        r#"
        var items => array<integer> = [1, 2, 3]
        var last => integer = items.pop()
        if (last != 3) { error("pop should return the last element") }
        if (items.length != 2) { error("pop should shrink length by exactly one") }
        "#,
    )
    .expect("pop should remove and return the last element");
}

#[test]
fn pop_on_an_empty_array_is_a_runtime_error() {
    let err = run(
        r#"
        var items => array<integer> = []
        items.pop()
        "#,
    )
    .expect_err("popping from an empty array should fail");
    assert!(matches!(err, MusError::Runtime { .. }));
}
