use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rice_translate::{CppWriter, Dialect, read_rice, tokenize, translate};

/// A module with `count` small functions calling each other.
fn module_source(count: usize) -> String {
    let mut source = String::from("def f0(x) {\n    return x + 1\n}\n");
    for i in 1..count {
        source.push_str(&format!(
            "\ndef f{i}(x) {{\n    var xs = [x, x * 2, x % 7]\n    var g = \\a -> f{prev}(a) - 3\n    return xs.map(g)[1] + \"s{i}\".size()\n}}\n",
            prev = i - 1
        ));
    }
    source.push_str("\ndef main() {\n    print(f0(1))\n}\n");
    source
}

/// `depth` nested parenthesized additions.
fn nested_source(depth: usize) -> String {
    let mut expr = String::from("1");
    for i in 0..depth {
        expr = format!("({expr} + {i}) * 2");
    }
    format!("print({expr})\n")
}

fn bench_lex(c: &mut Criterion) {
    let source = module_source(500);
    c.bench_function("tokenize module 500 defs", |b| {
        b.iter(|| black_box(tokenize(&source, &Dialect::FULL).unwrap()))
    });
}

fn bench_parse(c: &mut Criterion) {
    let source = module_source(500);
    c.bench_function("read module 500 defs", |b| {
        b.iter(|| black_box(read_rice(&source, &Dialect::FULL).unwrap()))
    });
}

fn bench_emit(c: &mut Criterion) {
    let program = read_rice(&module_source(500), &Dialect::FULL).unwrap();
    c.bench_function("emit module 500 defs", |b| {
        b.iter(|| black_box(CppWriter::emit(&program)))
    });
}

fn bench_translate_nested(c: &mut Criterion) {
    let source = nested_source(60);
    c.bench_function("translate nested 60", |b| {
        b.iter(|| black_box(translate(&source, &Dialect::SCRIPT).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_lex,
    bench_parse,
    bench_emit,
    bench_translate_nested
);
criterion_main!(benches);
