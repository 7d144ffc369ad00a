//! C++ writer for rice IR.
//!
//! Emits a self-contained C++14 translation unit: a banner, the fixed
//! runtime [`PREAMBLE`], the translated program, and the fixed [`POSTFIX`]
//! that calls the program's `main`.
//!
//! Every rice value becomes a C++ value with shared ownership (`String` and
//! `List<T>` wrap `std::shared_ptr`), functions become generic lambdas, and
//! every user identifier is passed through [`rename`] so it can never
//! collide with a C++ keyword or with the runtime's own names.

use crate::dialect::ProgramForm;
use crate::ir::*;
use crate::traits::Writer;

/// Static instance of the C++ writer for registry.
pub static CPP_WRITER: CppWriterImpl = CppWriterImpl;

/// Prefix prepended to every user identifier.
pub const RENAME_PREFIX: &str = "rr";

/// Map a rice identifier to its C++ name.
///
/// Prefixing is injective: distinct rice names always map to distinct C++
/// names, and every occurrence of one name maps to the same C++ name.
pub fn rename(name: &str) -> String {
    format!("{RENAME_PREFIX}{name}")
}

pub const HEADER: &str = "\
// ------------------------------------------------------
// --------- autogenerated from rice source -------------
// ------------------------------------------------------
";

/// Runtime support shared by every translated program.
pub const PREAMBLE: &str = r#"
#include <cstddef>
#include <initializer_list>
#include <iostream>
#include <memory>
#include <sstream>
#include <string>
#include <type_traits>
#include <vector>

using Int = long long;
using Float = double;

struct String final {
    std::shared_ptr<std::string> buffer;
    String()=default;
    String(const String&)=default;
    String(const std::string &s): buffer(std::make_shared<std::string>(s)) {}
    String rrstr() const { return *this; }
};

struct {
    template <class T>
    String operator()(const T &t) const {
        return t.rrstr();
    }
    String operator()(Int t) const {
        return String(std::to_string(t));
    }
    String operator()(Float t) const {
        return String(std::to_string(t));
    }
} rrstr;

template <class T>
struct List final {
    std::shared_ptr<std::vector<T>> buffer;
    List()=default;
    List(const List&)=default;
    List(const std::vector<T> &v): buffer(std::make_shared<std::vector<T>>(v)) {}
    T operator[](Int i) const { return (*buffer)[i]; }
    String rrstr() const {
        std::stringstream ss;
        ss << "List(";
        for (std::size_t i = 0; i < buffer->size(); i++) {
            if (i > 0) {
                ss << ", ";
            }
            ss << *::rrstr((*buffer)[i]).buffer;
        }
        ss << ")";
        return String(ss.str());
    }
    template <class F>
    auto rrmap(F f) const {
        using U = std::decay_t<decltype(f((*buffer)[0]))>;
        List<U> ret{std::vector<U>()};
        for (const T &t: *buffer) {
            ret.buffer->push_back(f(t));
        }
        return ret;
    }
};

template <class T>
List<T> mklist(const std::initializer_list<T> &v) {
    return List<T>(std::vector<T>(v));
}

struct {
    template <class T>
    void operator()(const T &t) const {
        std::cout << *rrstr(t).buffer << std::endl;
    }
} rrprint;
"#;

/// Calls the program's entry point.
pub const POSTFIX: &str = "
int main() {
    rrmain();
}
";

/// Name of the entry point a script body is wrapped in.
const ENTRY_POINT: &str = "main";

/// C++ writer implementing the Writer trait.
pub struct CppWriterImpl;

impl Writer for CppWriterImpl {
    fn language(&self) -> &'static str {
        "cpp"
    }

    fn extension(&self) -> &'static str {
        "cpp"
    }

    fn write(&self, program: &Program) -> String {
        CppWriter::emit(program)
    }
}

/// Emits IR as C++ source code.
pub struct CppWriter {
    output: String,
    indent: usize,
    /// Number of enclosing function bodies; zero means namespace scope.
    functions: usize,
}

impl CppWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
            functions: 0,
        }
    }

    /// Emit a complete translation unit.
    pub fn emit(program: &Program) -> String {
        let body = Self::emit_body(program);
        let mut out =
            String::with_capacity(HEADER.len() + PREAMBLE.len() + body.len() + POSTFIX.len());
        out.push_str(HEADER);
        out.push_str(PREAMBLE);
        out.push_str(&body);
        out.push_str(POSTFIX);
        tracing::debug!(bytes = out.len(), "emitted C++");
        out
    }

    /// Emit only the translated program, without preamble or postfix.
    pub fn emit_body(program: &Program) -> String {
        let mut writer = Self::new();
        writer.write_program(program);
        writer.output
    }

    /// Module-form `def`s become namespace-scope lambdas in source order.
    /// A lambda's type is only known once it is defined, so a `def` can call
    /// only the `def`s written above it.
    fn write_program(&mut self, program: &Program) {
        match program.form {
            ProgramForm::Module => {
                for stmt in &program.body {
                    self.output.push('\n');
                    self.write_stmt(stmt);
                    self.output.push('\n');
                }
            }
            ProgramForm::Script => {
                self.output.push('\n');
                self.write_binding(ENTRY_POINT, &[], &program.body);
                self.output.push('\n');
            }
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        self.write_indent();
        match stmt {
            Stmt::Expr(expr) => {
                self.write_expr(expr);
                self.output.push(';');
            }

            Stmt::Let { name, init } => {
                self.output.push_str("auto ");
                self.output.push_str(&rename(name));
                self.output.push_str(" = ");
                self.write_expr(init);
                self.output.push(';');
            }

            Stmt::Return(expr) => {
                self.output.push_str("return ");
                self.write_expr(expr);
                self.output.push(';');
            }

            Stmt::Block(stmts) => self.write_block(stmts),

            Stmt::Function(f) => self.write_binding(&f.name, &f.params, &f.body),
        }
    }

    fn write_block(&mut self, stmts: &[Stmt]) {
        self.output.push_str("{\n");
        self.indent += 1;
        for s in stmts {
            self.write_stmt(s);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.write_indent();
        self.output.push('}');
    }

    /// `auto rrname = [capture](auto rrparam, ...) { body };`
    ///
    /// Assumes the indent for the line is already written.
    fn write_binding(&mut self, name: &str, params: &[String], body: &[Stmt]) {
        self.output.push_str("auto ");
        self.output.push_str(&rename(name));
        self.output.push_str(" = ");
        // Namespace-scope lambdas may not have a capture-default.
        let capture = if self.functions == 0 { "[]" } else { "[&]" };
        self.write_closure(capture, params);
        self.write_function_body(body);
        self.output.push(';');
    }

    fn write_closure(&mut self, capture: &str, params: &[String]) {
        self.output.push_str(capture);
        self.output.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.output.push_str("auto ");
            self.output.push_str(&rename(param));
        }
        self.output.push_str(") ");
    }

    fn write_function_body(&mut self, body: &[Stmt]) {
        self.functions += 1;
        self.write_block(body);
        self.functions -= 1;
    }

    fn write_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(lit) => self.write_literal(lit),

            Expr::Ident(name) => self.output.push_str(&rename(name)),

            Expr::Binary { left, op, right } => {
                self.output.push('(');
                self.write_expr(left);
                self.output.push(' ');
                self.output.push_str(op.symbol());
                self.output.push(' ');
                self.write_expr(right);
                self.output.push(')');
            }

            Expr::Call { callee, args } => {
                self.write_operand(callee);
                self.write_args(args);
            }

            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                self.write_operand(receiver);
                self.output.push('.');
                self.output.push_str(&rename(method));
                self.write_args(args);
            }

            Expr::Index { object, index } => {
                self.write_operand(object);
                self.output.push('[');
                self.write_expr(index);
                self.output.push(']');
            }

            Expr::List(items) => {
                self.output.push_str("mklist({");
                self.write_comma_separated(items);
                self.output.push_str("})");
            }

            Expr::Lambda(f) => {
                self.write_closure("[&]", &f.params);
                match f.arrow_expr() {
                    Some(body) => {
                        self.output.push_str("{ return ");
                        self.write_expr(body);
                        self.output.push_str("; }");
                    }
                    None => self.write_function_body(&f.body),
                }
            }
        }
    }

    /// The left side of a postfix operation. Literals and lambdas are
    /// wrapped so `.`, `(` and `[` bind to the whole value.
    fn write_operand(&mut self, expr: &Expr) {
        if matches!(expr, Expr::Literal(_) | Expr::Lambda(_)) {
            self.output.push('(');
            self.write_expr(expr);
            self.output.push(')');
        } else {
            self.write_expr(expr);
        }
    }

    fn write_args(&mut self, args: &[Expr]) {
        self.output.push('(');
        self.write_comma_separated(args);
        self.output.push(')');
    }

    fn write_comma_separated(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.write_expr(item);
        }
    }

    fn write_literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Int(n) => {
                self.output.push_str(&n.to_string());
                self.output.push_str("ll");
            }
            // Shortest round-trip form; always a valid C++ double literal.
            Literal::Float(n) => self.output.push_str(&format!("{n:?}")),
            Literal::String(s) => {
                self.output.push_str("String(\"");
                self.output.push_str(&escape_string(s));
                self.output.push_str("\")");
            }
        }
    }
}

impl Default for CppWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a decoded string for a C++ string literal.
///
/// Backslashes go first so the escapes inserted afterwards stay intact.
/// `?` is escaped because C++14 still replaces trigraphs like `??/`.
fn escape_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('?', "\\?")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    if !escaped.chars().any(|c| c.is_ascii_control()) {
        return escaped;
    }
    // Octal escapes stop after three digits, so a following digit can't
    // be swallowed the way it would be by `\x`.
    let mut out = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        if c.is_ascii_control() {
            out.push_str(&format!("\\{:03o}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(stmts: Vec<Stmt>) -> String {
        CppWriter::emit_body(&Program::script(stmts))
    }

    fn expr(expr: Expr) -> String {
        let body = script(vec![Stmt::expr(expr)]);
        body.lines()
            .nth(2)
            .expect("expression line")
            .trim()
            .trim_end_matches(';')
            .to_string()
    }

    #[test]
    fn test_script_wraps_entry_point() {
        let body = script(vec![
            Stmt::let_decl("x", Expr::int(5)),
            Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::ident("x")])),
        ]);
        assert_eq!(
            body,
            "\nauto rrmain = []() {\n    auto rrx = 5ll;\n    rrprint(rrx);\n};\n"
        );
    }

    #[test]
    fn test_module_defs() {
        let program = Program::module(vec![Stmt::Function(Function::named(
            "add",
            vec!["a".into(), "b".into()],
            vec![Stmt::return_stmt(Expr::binary(
                Expr::ident("a"),
                BinaryOp::Add,
                Expr::ident("b"),
            ))],
        ))]);
        assert_eq!(
            CppWriter::emit_body(&program),
            "\nauto rradd = [](auto rra, auto rrb) {\n    return (rra + rrb);\n};\n"
        );
    }

    #[test]
    fn test_nested_def_captures() {
        let body = script(vec![Stmt::Function(Function::named(
            "f",
            vec![],
            vec![],
        ))]);
        assert!(body.contains("    auto rrf = [&]() {\n    };"));
    }

    #[test]
    fn test_precedence_is_parenthesized() {
        let e = Expr::binary(
            Expr::int(1),
            BinaryOp::Add,
            Expr::binary(Expr::int(2), BinaryOp::Mul, Expr::int(3)),
        );
        assert_eq!(expr(e), "(1ll + (2ll * 3ll))");
    }

    #[test]
    fn test_literals() {
        assert_eq!(expr(Expr::int(42)), "42ll");
        assert_eq!(expr(Expr::float(2.2)), "2.2");
        assert_eq!(expr(Expr::float(5.0)), "5.0");
        assert_eq!(expr(Expr::string("hi")), "String(\"hi\")");
    }

    #[test]
    fn test_string_escaping_order() {
        assert_eq!(escape_string("a\\b\tc\nd"), "a\\\\b\\tc\\nd");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("\x07\x001"), "\\007\\0001");
    }

    #[test]
    fn test_trigraphs_are_broken_up() {
        assert_eq!(escape_string("what??!"), "what\\?\\?!");
        assert_eq!(escape_string("a??/nb"), "a\\?\\?/nb");
        assert_eq!(escape_string("\\?"), "\\\\\\?");
    }

    #[test]
    fn test_postfix_forms() {
        let e = Expr::index(
            Expr::method_call(Expr::ident("xs"), "map", vec![Expr::ident("f")]),
            Expr::int(0),
        );
        assert_eq!(expr(e), "rrxs.rrmap(rrf)[0ll]");

        let e = Expr::method_call(Expr::int(1), "str", vec![]);
        assert_eq!(expr(e), "(1ll).rrstr()");
    }

    #[test]
    fn test_list_literal() {
        let e = Expr::list(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
        assert_eq!(expr(e), "mklist({1ll, 2ll, 3ll})");
    }

    #[test]
    fn test_arrow_lambda() {
        let e = Expr::lambda(Function::arrow(
            vec!["a".into(), "b".into()],
            Expr::binary(Expr::ident("a"), BinaryOp::Add, Expr::ident("b")),
        ));
        assert_eq!(expr(e), "[&](auto rra, auto rrb) { return (rra + rrb); }");
    }

    #[test]
    fn test_block_lambda() {
        let body = script(vec![Stmt::let_decl(
            "g",
            Expr::lambda(Function::anonymous(
                vec!["a".into()],
                vec![Stmt::return_stmt(Expr::ident("a"))],
            )),
        )]);
        assert_eq!(
            body,
            "\nauto rrmain = []() {\n    auto rrg = [&](auto rra) {\n        return rra;\n    };\n};\n"
        );
    }

    #[test]
    fn test_immediately_invoked_lambda() {
        let e = Expr::call(
            Expr::lambda(Function::arrow(vec!["x".into()], Expr::ident("x"))),
            vec![Expr::int(1)],
        );
        assert_eq!(expr(e), "([&](auto rrx) { return rrx; })(1ll)");
    }

    #[test]
    fn test_rename_is_injective() {
        let names = ["a", "b", "ra", "rra", "main", "int", "_"];
        let renamed: std::collections::HashSet<_> = names.iter().map(|n| rename(n)).collect();
        assert_eq!(renamed.len(), names.len());
        assert_eq!(rename("int"), "rrint");
    }

    #[test]
    fn test_emit_wraps_preamble_and_postfix() {
        let out = CppWriter::emit(&Program::script(vec![]));
        assert!(out.starts_with(HEADER));
        assert!(out.contains(PREAMBLE));
        assert!(out.ends_with(POSTFIX));
        assert!(out.contains("auto rrmain = []() {\n};"));
    }
}
