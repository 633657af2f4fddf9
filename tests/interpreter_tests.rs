// End-to-end semantics tests: each test runs a complete source program
// through a fresh interpreter and then inspects the variables it left
// behind.

use jung::evaluator::Interpreter;
use jung::value::Value;

fn run(source: &str) -> Interpreter {
    let mut interpreter = Interpreter::new();
    if let Err(error) = interpreter.run_source(source) {
        panic!("program failed: {}", error.message);
    }
    interpreter
}

fn get(interpreter: &Interpreter, name: &str) -> Value {
    interpreter
        .lookup(name)
        .unwrap_or_else(|| panic!("variable '{}' is not defined", name))
}

fn run_err(source: &str) -> String {
    let mut interpreter = Interpreter::new();
    match interpreter.run_source(source) {
        Ok(()) => panic!("program unexpectedly succeeded"),
        Err(error) => error.message,
    }
}

// ---- arithmetic ----

#[test]
fn integer_division_truncates_but_doubles_divide_exactly() {
    let interp = run(
        "let a = 10 / 3\n\
         let b = 10 % 3\n\
         let c = 10.0 / 4\n\
         let d = 7 / 2\n\
         let e = -7 / 2\n\
         let f = 1 + 2 * 3",
    );
    assert_eq!(get(&interp, "a"), Value::Int(3));
    assert_eq!(get(&interp, "b"), Value::Int(1));
    assert_eq!(get(&interp, "c"), Value::Double(2.5));
    assert_eq!(get(&interp, "d"), Value::Int(3));
    assert_eq!(get(&interp, "e"), Value::Int(-3));
    assert_eq!(get(&interp, "f"), Value::Int(7));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    assert!(run_err("let x = 1 / 0").contains("division by zero"));
    assert!(run_err("let x = 1 % 0").contains("modulo by zero"));
}

#[test]
fn string_concatenation_coerces_either_side() {
    let interp = run(
        "let a = \"v\" + 1\n\
         let b = 2 + \"x\"\n\
         let c = \"ab\" + \"cd\"",
    );
    assert_eq!(get(&interp, "a"), Value::Str("v1".to_string()));
    assert_eq!(get(&interp, "b"), Value::Str("2x".to_string()));
    assert_eq!(get(&interp, "c"), Value::Str("abcd".to_string()));
}

#[test]
fn type_mismatches_fail() {
    assert!(run_err("let x = [1] + 2").contains("cannot add"));
    assert!(run_err("let x = \"a\" < \"b\"").contains("cannot compare"));
    assert!(run_err("let x = -\"a\"").contains("cannot negate"));
}

// ---- truthiness and logic ----

#[test]
fn truthiness_follows_empty_is_falsy() {
    let interp = run(
        "let a = [] ? 1 : 2\n\
         let b = \"\" ? 1 : 2\n\
         let c = 0 ? 1 : 2\n\
         let d = null ? 1 : 2\n\
         let e = {} ? 1 : 2\n\
         let f = [0] ? 1 : 2",
    );
    assert_eq!(get(&interp, "a"), Value::Int(2));
    assert_eq!(get(&interp, "b"), Value::Int(2));
    assert_eq!(get(&interp, "c"), Value::Int(2));
    assert_eq!(get(&interp, "d"), Value::Int(2));
    // Empty objects are truthy; empty arrays are not.
    assert_eq!(get(&interp, "e"), Value::Int(1));
    assert_eq!(get(&interp, "f"), Value::Int(1));
}

#[test]
fn logical_operators_short_circuit_and_yield_operands() {
    let interp = run(
        "let calls = 0\n\
         fn bump() { calls = calls + 1 return true }\n\
         let a = false and bump()\n\
         let b = true or bump()\n\
         let c = null or 5\n\
         let d = 1 and 2",
    );
    assert_eq!(get(&interp, "calls"), Value::Int(0));
    assert_eq!(get(&interp, "a"), Value::Bool(false));
    assert_eq!(get(&interp, "b"), Value::Bool(true));
    assert_eq!(get(&interp, "c"), Value::Int(5));
    assert_eq!(get(&interp, "d"), Value::Int(2));
}

#[test]
fn equality_is_by_value_for_primitives_and_identity_for_aggregates() {
    let interp = run(
        "let a = 1 == 1.0\n\
         let b = \"x\" == \"x\"\n\
         let c = [1] == [1]\n\
         let arr = [1]\n\
         let arr2 = arr\n\
         let d = arr == arr2\n\
         let e = null == null",
    );
    assert_eq!(get(&interp, "a"), Value::Bool(true));
    assert_eq!(get(&interp, "b"), Value::Bool(true));
    assert_eq!(get(&interp, "c"), Value::Bool(false));
    assert_eq!(get(&interp, "d"), Value::Bool(true));
    assert_eq!(get(&interp, "e"), Value::Bool(true));
}

// ---- scoping ----

#[test]
fn let_scopes_to_block_but_assignment_writes_through() {
    let interp = run(
        "let x = 1\n\
         if true { let y = 2 x = x + y }\n\
         let z = x",
    );
    assert_eq!(get(&interp, "z"), Value::Int(3));
    assert!(interp.lookup("y").is_none(), "block-local binding escaped");
}

#[test]
fn compound_assignment_requires_existing_binding() {
    let interp = run("let x = 1 x += 2 x *= 3 x -= 1 x /= 2");
    assert_eq!(get(&interp, "x"), Value::Int(4));
    assert!(run_err("ghost += 1").contains("undefined variable"));
}

#[test]
fn undefined_variable_is_an_error() {
    assert!(run_err("let x = nothing_here").contains("undefined variable 'nothing_here'"));
}

// ---- arrays ----

#[test]
fn arrays_share_their_storage() {
    let interp = run(
        "let a = [1, 2, 3]\n\
         let b = a\n\
         push(a, 4)\n\
         let n = b.length\n\
         a[0] = 10\n\
         let first = b[0]",
    );
    assert_eq!(get(&interp, "n"), Value::Int(4));
    assert_eq!(get(&interp, "first"), Value::Int(10));
}

#[test]
fn array_indexing_with_negatives_and_out_of_range() {
    let interp = run(
        "let a = [1, 2, 3]\n\
         let last = a[-1]\n\
         let oob = a[99]\n\
         a[-1] = 30\n\
         let tail = a[2]\n\
         a[99] = 0\n\
         let len = a.length",
    );
    assert_eq!(get(&interp, "last"), Value::Int(3));
    assert_eq!(get(&interp, "oob"), Value::Null);
    assert_eq!(get(&interp, "tail"), Value::Int(30));
    // Writes past the end are ignored
    assert_eq!(get(&interp, "len"), Value::Int(3));
}

#[test]
fn index_assignment_reads_back() {
    let interp = run("let a = [0, 0, 0] a[1] = \"mid\" let v = a[1]");
    assert_eq!(get(&interp, "v"), Value::Str("mid".to_string()));
}

#[test]
fn array_methods_work() {
    let interp = run(
        "let a = [1, 2]\n\
         a.push(3)\n\
         let popped = a.pop()\n\
         let n = a.length()\n\
         let has2 = a.includes(2)\n\
         let has9 = a.includes(9)\n\
         let flat = str([[1, 2], [3], 4].flat())\n\
         let cat = str([1].concat([2, 3]))\n\
         let idx = [5, 6, 7].indexOf(6)",
    );
    assert_eq!(get(&interp, "popped"), Value::Int(3));
    assert_eq!(get(&interp, "n"), Value::Int(2));
    assert_eq!(get(&interp, "has2"), Value::Bool(true));
    assert_eq!(get(&interp, "has9"), Value::Bool(false));
    assert_eq!(get(&interp, "flat"), Value::Str("[1, 2, 3, 4]".to_string()));
    assert_eq!(get(&interp, "cat"), Value::Str("[1, 2, 3]".to_string()));
    assert_eq!(get(&interp, "idx"), Value::Int(1));
}

#[test]
fn sort_reverse_and_slice() {
    let interp = run(
        "let s1 = str(sort([3, 1, 2]))\n\
         let s2 = str(sort([\"pear\", \"apple\"]))\n\
         let s3 = str(sort([2, \"a\", 1]))\n\
         let r = str(reverse([1, 2, 3]))\n\
         let sl1 = slice(\"hello\", 1, 3)\n\
         let sl2 = slice(\"hello\", -3)\n\
         let sl3 = str(slice([1, 2, 3, 4], 1, -1))",
    );
    assert_eq!(get(&interp, "s1"), Value::Str("[1, 2, 3]".to_string()));
    assert_eq!(
        get(&interp, "s2"),
        Value::Str("[\"apple\", \"pear\"]".to_string())
    );
    // Mixed arrays sort without crashing: numbers first, then strings
    assert_eq!(get(&interp, "s3"), Value::Str("[1, 2, \"a\"]".to_string()));
    assert_eq!(get(&interp, "r"), Value::Str("[3, 2, 1]".to_string()));
    assert_eq!(get(&interp, "sl1"), Value::Str("el".to_string()));
    assert_eq!(get(&interp, "sl2"), Value::Str("llo".to_string()));
    assert_eq!(get(&interp, "sl3"), Value::Str("[2, 3]".to_string()));
}

#[test]
fn range_builds_integer_sequences() {
    let interp = run(
        "let n1 = len(range(5))\n\
         let n2 = len(range(-3))\n\
         let r = str(range(2, 5))\n\
         let ok = true\n\
         for i in range(6) { if range(6)[i] != i { ok = false } }",
    );
    assert_eq!(get(&interp, "n1"), Value::Int(5));
    assert_eq!(get(&interp, "n2"), Value::Int(0));
    assert_eq!(get(&interp, "r"), Value::Str("[2, 3, 4]".to_string()));
    assert_eq!(get(&interp, "ok"), Value::Bool(true));
}

// ---- objects ----

#[test]
fn object_access_and_mutation() {
    let interp = run(
        "let o = {name: \"Carl\", age: 82}\n\
         let n = o.name\n\
         let a = o[\"age\"]\n\
         let missing = o.unknown\n\
         o.age = 83\n\
         o[\"city\"] = \"Zurich\"\n\
         o.age += 1\n\
         let age = o.age\n\
         let city = o.city\n\
         let size = o.length",
    );
    assert_eq!(get(&interp, "n"), Value::Str("Carl".to_string()));
    assert_eq!(get(&interp, "a"), Value::Int(82));
    assert_eq!(get(&interp, "missing"), Value::Null);
    assert_eq!(get(&interp, "age"), Value::Int(84));
    assert_eq!(get(&interp, "city"), Value::Str("Zurich".to_string()));
    assert_eq!(get(&interp, "size"), Value::Int(3));
}

#[test]
fn objects_are_reference_shared() {
    let interp = run(
        "let a = {n: 1}\n\
         let b = a\n\
         b.n = 2\n\
         let seen = a.n",
    );
    assert_eq!(get(&interp, "seen"), Value::Int(2));
}

#[test]
fn has_distinguishes_absence_from_null() {
    let interp = run(
        "let o = {a: null}\n\
         let v1 = o[\"a\"]\n\
         let h1 = has(o, \"a\")\n\
         let v2 = o[\"b\"]\n\
         let h2 = has(o, \"b\")\n\
         delete(o, \"a\")\n\
         let h3 = has(o, \"a\")",
    );
    assert_eq!(get(&interp, "v1"), Value::Null);
    assert_eq!(get(&interp, "h1"), Value::Bool(true));
    assert_eq!(get(&interp, "v2"), Value::Null);
    assert_eq!(get(&interp, "h2"), Value::Bool(false));
    assert_eq!(get(&interp, "h3"), Value::Bool(false));
}

#[test]
fn keys_and_values_keep_insertion_order() {
    let interp = run(
        "let o = {b: 1, a: 2, c: 3}\n\
         delete(o, \"a\")\n\
         o.d = 4\n\
         let ks = str(keys(o))\n\
         let vs = str(values(o))",
    );
    assert_eq!(
        get(&interp, "ks"),
        Value::Str("[\"b\", \"c\", \"d\"]".to_string())
    );
    assert_eq!(get(&interp, "vs"), Value::Str("[1, 3, 4]".to_string()));
}

// ---- strings ----

#[test]
fn string_indexing_and_methods() {
    let interp = run(
        "let s = \"Hello\"\n\
         let c0 = s[0]\n\
         let cl = s[-1]\n\
         let oob = s[99]\n\
         let n = s.length\n\
         let up = s.upper()\n\
         let low = s.lower()\n\
         let trimmed = \"  hi  \".trim()\n\
         let chained = \"  Hi  \".trim().lower()\n\
         let has = s.contains(\"ell\")\n\
         let rep = s.replace(\"l\", \"L\")\n\
         let idx = s.indexOf(\"lo\")",
    );
    assert_eq!(get(&interp, "c0"), Value::Str("H".to_string()));
    assert_eq!(get(&interp, "cl"), Value::Str("o".to_string()));
    assert_eq!(get(&interp, "oob"), Value::Null);
    assert_eq!(get(&interp, "n"), Value::Int(5));
    assert_eq!(get(&interp, "up"), Value::Str("HELLO".to_string()));
    assert_eq!(get(&interp, "low"), Value::Str("hello".to_string()));
    assert_eq!(get(&interp, "trimmed"), Value::Str("hi".to_string()));
    assert_eq!(get(&interp, "chained"), Value::Str("hi".to_string()));
    assert_eq!(get(&interp, "has"), Value::Bool(true));
    assert_eq!(get(&interp, "rep"), Value::Str("HeLLo".to_string()));
    assert_eq!(get(&interp, "idx"), Value::Int(3));
}

#[test]
fn split_and_join() {
    let interp = run(
        "let parts = split(\"a,b,c\", \",\")\n\
         let n = parts.length\n\
         let chars = str(split(\"abc\", \"\"))\n\
         let joined = join([1, \"x\", true], \"-\")",
    );
    assert_eq!(get(&interp, "n"), Value::Int(3));
    assert_eq!(
        get(&interp, "chars"),
        Value::Str("[\"a\", \"b\", \"c\"]".to_string())
    );
    assert_eq!(get(&interp, "joined"), Value::Str("1-x-true".to_string()));
}

#[test]
fn string_interpolation_renders_each_part() {
    let interp = run(
        "let n = \"Carl\"; let y = 1875\n\
         let msg = \"${n} was born in ${y}, age ${2025 - y}\"\n\
         let nested = \"sum: ${1 + 2 * 3}\"\n\
         let leading = \"${y} it begins\"\n\
         let only = \"${n}\"",
    );
    assert_eq!(
        get(&interp, "msg"),
        Value::Str("Carl was born in 1875, age 150".to_string())
    );
    assert_eq!(get(&interp, "nested"), Value::Str("sum: 7".to_string()));
    assert_eq!(
        get(&interp, "leading"),
        Value::Str("1875 it begins".to_string())
    );
    assert_eq!(get(&interp, "only"), Value::Str("Carl".to_string()));
}

// ---- functions ----

#[test]
fn functions_return_values_and_defaults_fill_in() {
    let interp = run(
        "fn greet(name) { return \"Hello, \" + name }\n\
         fn pair(a = 1, b = 2) { return a + b }\n\
         let msg = greet(\"World\")\n\
         let d0 = pair()\n\
         let d1 = pair(10)\n\
         let d2 = pair(10, 20)\n\
         fn noret() { let local = 1 }\n\
         let nothing = noret()",
    );
    assert_eq!(get(&interp, "msg"), Value::Str("Hello, World".to_string()));
    assert_eq!(get(&interp, "d0"), Value::Int(3));
    assert_eq!(get(&interp, "d1"), Value::Int(12));
    assert_eq!(get(&interp, "d2"), Value::Int(30));
    assert_eq!(get(&interp, "nothing"), Value::Null);
}

#[test]
fn missing_arguments_without_defaults_bind_null() {
    let interp = run("fn probe(a, b) { return b == null }\nlet r = probe(1)");
    assert_eq!(get(&interp, "r"), Value::Bool(true));
}

#[test]
fn recursion_works_up_to_the_depth_bound() {
    let interp = run(
        "fn fact(n) { if n <= 1 { return 1 } return n * fact(n - 1) }\n\
         let f = fact(10)",
    );
    assert_eq!(get(&interp, "f"), Value::Int(3628800));

    assert!(run_err("fn spin() { return spin() }\nspin()").contains("stack overflow"));
}

#[test]
fn undefined_function_is_an_error() {
    assert!(run_err("conjure()").contains("undefined function 'conjure'"));
}

#[test]
fn map_filter_reduce_accept_either_argument_order() {
    let interp = run(
        "fn double_it(n) { return n * 2 }\n\
         fn odd(n) { return n % 2 == 1 }\n\
         fn add2(a, b) { return a + b }\n\
         let m1 = str(map([1, 2, 3], double_it))\n\
         let m2 = str(map(\"double_it\", [1, 2, 3]))\n\
         let f1 = str(filter([1, 2, 3, 4], odd))\n\
         let r1 = reduce([1, 2, 3, 4], add2, 0)\n\
         let r2 = reduce(\"add2\", [1, 2, 3], 100)",
    );
    assert_eq!(get(&interp, "m1"), Value::Str("[2, 4, 6]".to_string()));
    assert_eq!(get(&interp, "m2"), Value::Str("[2, 4, 6]".to_string()));
    assert_eq!(get(&interp, "f1"), Value::Str("[1, 3]".to_string()));
    assert_eq!(get(&interp, "r1"), Value::Int(10));
    assert_eq!(get(&interp, "r2"), Value::Int(106));
}

// ---- control flow ----

#[test]
fn for_in_iterates_arrays_strings_and_object_keys_in_order() {
    let interp = run(
        "let ks = \"\"\n\
         for k in {a: 1, b: 2} { ks = ks + k }\n\
         let sum = 0\n\
         for v in [10, 20, 30] { sum += v }\n\
         let cs = \"\"\n\
         for c in \"abc\" { cs = c + cs }",
    );
    assert_eq!(get(&interp, "ks"), Value::Str("ab".to_string()));
    assert_eq!(get(&interp, "sum"), Value::Int(60));
    assert_eq!(get(&interp, "cs"), Value::Str("cba".to_string()));
}

#[test]
fn break_and_continue_steer_loops() {
    let interp = run(
        "let out = \"\"\n\
         for i in range(10) {\n\
           if i == 3 { continue }\n\
           if i == 5 { break }\n\
           out = out + str(i)\n\
         }\n\
         let w = 0\n\
         while true { w += 1 if w >= 4 { break } }",
    );
    assert_eq!(get(&interp, "out"), Value::Str("0124".to_string()));
    assert_eq!(get(&interp, "w"), Value::Int(4));
}

#[test]
fn return_unwinds_out_of_loops() {
    let interp = run(
        "fn find_first_even(items) {\n\
           for x in items { if x % 2 == 0 { return x } }\n\
           return null\n\
         }\n\
         let found = find_first_even([3, 7, 8, 9])\n\
         let none = find_first_even([1, 3])",
    );
    assert_eq!(get(&interp, "found"), Value::Int(8));
    assert_eq!(get(&interp, "none"), Value::Null);
}

#[test]
fn else_if_chains_pick_the_first_truthy_branch() {
    let interp = run(
        "fn grade(n) {\n\
           if n >= 90 { return \"A\" }\n\
           else if n >= 80 { return \"B\" }\n\
           else { return \"C\" }\n\
         }\n\
         let a = grade(95)\n\
         let b = grade(85)\n\
         let c = grade(10)",
    );
    assert_eq!(get(&interp, "a"), Value::Str("A".to_string()));
    assert_eq!(get(&interp, "b"), Value::Str("B".to_string()));
    assert_eq!(get(&interp, "c"), Value::Str("C".to_string()));
}

// ---- classes ----

#[test]
fn class_instances_dispatch_methods_through_this() {
    let interp = run(
        "class Hero { fn init(n) { this.name = n } fn quest() { return this.name + \" rides\" } }\n\
         let h = new Hero(\"Jung\")\n\
         let q = h.quest()\n\
         let nm = h.name",
    );
    assert_eq!(get(&interp, "q"), Value::Str("Jung rides".to_string()));
    assert_eq!(get(&interp, "nm"), Value::Str("Jung".to_string()));
}

#[test]
fn method_mutations_are_visible_to_the_caller() {
    let interp = run(
        "class Counter {\n\
           fn init() { this.count = 0 }\n\
           fn incr() { this.count += 1 }\n\
           fn get() { return this.count }\n\
         }\n\
         let c = new Counter()\n\
         c.incr()\n\
         c.incr()\n\
         let n = c.get()\n\
         let raw = c.count",
    );
    assert_eq!(get(&interp, "n"), Value::Int(2));
    assert_eq!(get(&interp, "raw"), Value::Int(2));
}

#[test]
fn constructor_name_is_accepted_too() {
    let interp = run(
        "class Box { fn constructor(v) { this.v = v } }\n\
         let b = new Box(7)\n\
         let v = b.v",
    );
    assert_eq!(get(&interp, "v"), Value::Int(7));
}

#[test]
fn class_methods_shadow_builtin_methods() {
    let interp = run(
        "class Chest { fn init() { this.v = 1 } fn keys() { return \"mine\" } }\n\
         let c = new Chest()\n\
         let k = c.keys()",
    );
    assert_eq!(get(&interp, "k"), Value::Str("mine".to_string()));
}

#[test]
fn unknown_class_is_an_error() {
    assert!(run_err("let x = new Phantom()").contains("undefined class 'Phantom'"));
}

#[test]
fn this_outside_a_method_is_null() {
    let interp = run("let t = this");
    assert_eq!(get(&interp, "t"), Value::Null);
}

// ---- exceptions ----

#[test]
fn catch_binds_the_thrown_string_exactly() {
    let interp = run("let e = \"\" try { throw \"x\" } catch (caught) { e = caught }");
    assert_eq!(get(&interp, "e"), Value::Str("x".to_string()));
}

#[test]
fn thrown_values_are_rendered_to_strings() {
    let interp = run("let e = null try { throw 42 } catch (caught) { e = caught }");
    assert_eq!(get(&interp, "e"), Value::Str("42".to_string()));
}

#[test]
fn a_throw_inside_catch_reaches_the_enclosing_try() {
    let interp = run(
        "let f = \"\"\n\
         try {\n\
           try { throw \"inner\" } catch (e) { throw \"outer:\" + e }\n\
         } catch (caught) { f = caught }",
    );
    assert_eq!(get(&interp, "f"), Value::Str("outer:inner".to_string()));
}

#[test]
fn exceptions_unwind_through_function_calls() {
    let interp = run(
        "fn deep() { throw \"from below\" }\n\
         fn mid() { deep() return \"unreached\" }\n\
         let msg = \"\"\n\
         try { mid() } catch (e) { msg = e }",
    );
    assert_eq!(get(&interp, "msg"), Value::Str("from below".to_string()));
}

#[test]
fn runtime_errors_convert_to_exceptions_with_a_line_prefix() {
    let interp = run(
        "let caught = \"\"\n\
         try {\n\
           let x = 1 / 0\n\
         } catch (e) { caught = e }",
    );
    let caught = match get(&interp, "caught") {
        Value::Str(s) => s,
        other => panic!("expected string, got {:?}", other),
    };
    assert!(caught.starts_with("[line 3]"), "got: {}", caught);
    assert!(caught.contains("division by zero"), "got: {}", caught);
}

#[test]
fn uncaught_exceptions_fail_the_program() {
    assert_eq!(run_err("throw \"boom\""), "boom");
}

#[test]
fn execution_resumes_after_a_handled_exception() {
    let interp = run(
        "let log = \"\"\n\
         try { throw \"a\" } catch (e) { log = log + e }\n\
         log = log + \"b\"\n\
         try { log = log + \"c\" } catch { log = log + \"!\" }",
    );
    assert_eq!(get(&interp, "log"), Value::Str("abc".to_string()));
}

// ---- conversions and introspection ----

#[test]
fn conversions_follow_truncation_and_prefix_parsing() {
    let interp = run(
        "let a = int(3.9)\n\
         let b = int(-3.9)\n\
         let c = int(\"42\")\n\
         let d = int(\"42abc\")\n\
         let e = int(true)\n\
         let f = float(\"2.5\")\n\
         let g = number(\"3.25\")\n\
         let h = str(42)\n\
         let i = toString(2.5)",
    );
    assert_eq!(get(&interp, "a"), Value::Int(3));
    assert_eq!(get(&interp, "b"), Value::Int(-3));
    assert_eq!(get(&interp, "c"), Value::Int(42));
    assert_eq!(get(&interp, "d"), Value::Int(42));
    assert_eq!(get(&interp, "e"), Value::Int(1));
    assert_eq!(get(&interp, "f"), Value::Double(2.5));
    assert_eq!(get(&interp, "g"), Value::Double(3.25));
    assert_eq!(get(&interp, "h"), Value::Str("42".to_string()));
    assert_eq!(get(&interp, "i"), Value::Str("2.5".to_string()));
}

#[test]
fn type_reports_stable_kind_names() {
    let interp = run(
        "let a = type(null)\n\
         let b = type(true)\n\
         let c = type(1)\n\
         let d = type(2.5)\n\
         let e = type(\"s\")\n\
         let f = type([])\n\
         let g = type({})\n\
         fn probe() { return 1 }\n\
         let h = type(probe)",
    );
    assert_eq!(get(&interp, "a"), Value::Str("null".to_string()));
    assert_eq!(get(&interp, "b"), Value::Str("bool".to_string()));
    assert_eq!(get(&interp, "c"), Value::Str("number".to_string()));
    assert_eq!(get(&interp, "d"), Value::Str("number".to_string()));
    assert_eq!(get(&interp, "e"), Value::Str("string".to_string()));
    assert_eq!(get(&interp, "f"), Value::Str("array".to_string()));
    assert_eq!(get(&interp, "g"), Value::Str("object".to_string()));
    assert_eq!(get(&interp, "h"), Value::Str("function".to_string()));
}

#[test]
fn math_builtins() {
    let interp = run(
        "let a = abs(-3)\n\
         let b = floor(2.7)\n\
         let c = ceil(2.1)\n\
         let d = round(2.5)\n\
         let e = sqrt(9)\n\
         let f = min(3, 1)\n\
         let g = max(3, 1)\n\
         let h = pow(2, 10)",
    );
    assert_eq!(get(&interp, "a"), Value::Int(3));
    assert_eq!(get(&interp, "b"), Value::Int(2));
    assert_eq!(get(&interp, "c"), Value::Int(3));
    assert_eq!(get(&interp, "d"), Value::Int(3));
    assert_eq!(get(&interp, "e"), Value::Double(3.0));
    assert_eq!(get(&interp, "f"), Value::Int(1));
    assert_eq!(get(&interp, "g"), Value::Int(3));
    assert_eq!(get(&interp, "h"), Value::Int(1024));
}

// ---- rendering ----

#[test]
fn rendering_matches_the_display_rules() {
    let interp = run(
        "let a = str(3.0)\n\
         let b = str(2.5)\n\
         let c = str(1000000)\n\
         let d = str(true)\n\
         let e = str(null)\n\
         let f = str([1, \"a\", [2]])\n\
         let g = str({a: 1, b: \"x\"})",
    );
    assert_eq!(get(&interp, "a"), Value::Str("3".to_string()));
    assert_eq!(get(&interp, "b"), Value::Str("2.5".to_string()));
    assert_eq!(get(&interp, "c"), Value::Str("1000000".to_string()));
    assert_eq!(get(&interp, "d"), Value::Str("true".to_string()));
    assert_eq!(get(&interp, "e"), Value::Str("null".to_string()));
    assert_eq!(
        get(&interp, "f"),
        Value::Str("[1, \"a\", [2]]".to_string())
    );
    assert_eq!(
        get(&interp, "g"),
        Value::Str("{a: 1, b: \"x\"}".to_string())
    );
}

// ---- serialization ----

#[test]
fn json_round_trips_every_non_function_value() {
    let interp = run(
        "let v = {name: \"Carl \\\"G\\\"\", tags: [1, 2.5, true, null], nested: {x: 1}, note: \"a\\nb\\tc\"}\n\
         let s = jsonStringify(v)\n\
         let back = jsonParse(s)\n\
         let ok = jsonStringify(back) == s\n\
         let name = back.name\n\
         let tag0 = back.tags[0]\n\
         let x = back.nested.x",
    );
    assert_eq!(get(&interp, "ok"), Value::Bool(true));
    assert_eq!(get(&interp, "name"), Value::Str("Carl \"G\"".to_string()));
    assert_eq!(get(&interp, "tag0"), Value::Int(1));
    assert_eq!(get(&interp, "x"), Value::Int(1));
}

#[test]
fn json_parse_handles_plain_documents_and_rejects_garbage() {
    let interp = run(
        "let arr = jsonParse(\"[1, 2.5, \\\"three\\\"]\")\n\
         let first = arr[0]\n\
         let mid = arr[1]\n\
         let last = arr[2]\n\
         let bad = jsonParse(\"{oops\")\n\
         let alias = parse(stringify([1]))[0]",
    );
    assert_eq!(get(&interp, "first"), Value::Int(1));
    assert_eq!(get(&interp, "mid"), Value::Double(2.5));
    assert_eq!(get(&interp, "last"), Value::Str("three".to_string()));
    assert_eq!(get(&interp, "bad"), Value::Null);
    assert_eq!(get(&interp, "alias"), Value::Int(1));
}

// ---- imports ----

#[test]
fn import_runs_a_file_once() {
    let path = std::env::temp_dir().join("jung_import_once.jung");
    std::fs::write(&path, "counter = counter + 1\nlet imported_value = 99").unwrap();

    let source = format!(
        "let counter = 0\n\
         import \"{p}\"\n\
         import \"{p}\"\n\
         let x = imported_value + 1",
        p = path.display()
    );
    let interp = run(&source);
    assert_eq!(get(&interp, "counter"), Value::Int(1));
    assert_eq!(get(&interp, "x"), Value::Int(100));
}

#[test]
fn circular_imports_short_circuit() {
    let path = std::env::temp_dir().join("jung_import_cycle.jung");
    let content = format!("import \"{}\"\nrounds = rounds + 1", path.display());
    std::fs::write(&path, content).unwrap();

    let source = format!("let rounds = 0\nimport \"{}\"", path.display());
    let interp = run(&source);
    assert_eq!(get(&interp, "rounds"), Value::Int(1));
}

#[test]
fn missing_import_is_an_error() {
    assert!(
        run_err("import \"/nonexistent/jung/module.jung\"").contains("cannot open import file")
    );
}

// ---- the dual vocabulary, end to end ----

#[test]
fn jungian_vocabulary_runs_like_the_conventional_one() {
    let interp = run(
        "perceive x = 5\n\
         individuation double_it(n) { manifest n * 2 }\n\
         archetype Soul {\n\
           dream init(n) { Self.n = n }\n\
           dream reveal() { manifest Self.n }\n\
         }\n\
         perceive s = emerge Soul(double_it(x))\n\
         perceive r = s.reveal()\n\
         perceive caught = \"\"\n\
         confront { reject \"shadow\" } embrace (e) { caught = e }\n\
         perceive u = unconscious",
    );
    assert_eq!(get(&interp, "r"), Value::Int(10));
    assert_eq!(get(&interp, "caught"), Value::Str("shadow".to_string()));
    assert_eq!(get(&interp, "u"), Value::Null);
}
