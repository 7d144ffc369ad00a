//! Recursive-descent reader for rice.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! program    := sep* (top sep*)*            (module form: top = def)
//!             | sep* (stmt)*                (script form)
//! stmt       := "var" NAME "=" expr | "return" expr | block | def | expr
//! def        := "def" NAME "(" names ")" block
//! block      := "{" sep* stmt* "}"
//! expr       := term (("+" | "-") term)*
//! term       := postfix (("*" | "/" | "%") postfix)*
//! postfix    := primary ("(" args ")" | "." NAME "(" args ")" | "[" expr "]")*
//! primary    := INT | FLOAT | STRING | NAME | "[" args "]" | lambda | "(" expr ")"
//! lambda     := "\" NAME* ("->" expr | block)
//! ```
//!
//! Every statement is followed by a run of newlines/semicolons, or by the
//! closing `}` of its block, or by the end of input.

use crate::dialect::{Dialect, Keyword, ProgramForm};
use crate::ir::*;
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};
use crate::traits::{ReadError, Reader};

/// Static readers for the three built-in dialects.
pub static RICE_READER: RiceReader = RiceReader::new("rice", &["rice"], Dialect::FULL);
pub static RICE_SCRIPT_READER: RiceReader =
    RiceReader::new("rice-script", &["rcl"], Dialect::SCRIPT);
pub static RICE_MINIMAL_READER: RiceReader =
    RiceReader::new("rice-minimal", &["r2"], Dialect::MINIMAL);

/// Error raised while parsing a token stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected {
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("expected expression, found {found}")]
    ExpectedExpression { offset: usize, found: String },

    #[error("expected top-level declaration, found {found}")]
    ExpectedTopLevel { offset: usize, found: String },

    #[error("`{keyword}` is reserved and cannot start a statement")]
    ReservedKeyword { offset: usize, keyword: Keyword },

    #[error("{feature} are not enabled in this dialect")]
    Disabled {
        offset: usize,
        feature: &'static str,
    },

    #[error("nesting deeper than {limit} levels")]
    TooDeep { offset: usize, limit: usize },
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Expected { offset, .. }
            | ParseError::ExpectedExpression { offset, .. }
            | ParseError::ExpectedTopLevel { offset, .. }
            | ParseError::ReservedKeyword { offset, .. }
            | ParseError::Disabled { offset, .. }
            | ParseError::TooDeep { offset, .. } => *offset,
        }
    }
}

/// Reader for one rice dialect.
pub struct RiceReader {
    language: &'static str,
    extensions: &'static [&'static str],
    dialect: Dialect,
}

impl RiceReader {
    pub const fn new(
        language: &'static str,
        extensions: &'static [&'static str],
        dialect: Dialect,
    ) -> Self {
        Self {
            language,
            extensions,
            dialect,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }
}

impl Reader for RiceReader {
    fn language(&self) -> &'static str {
        self.language
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn read(&self, source: &str) -> Result<Program, ReadError> {
        read_rice(source, &self.dialect)
    }
}

/// Parse rice source into IR.
pub fn read_rice(source: &str, dialect: &Dialect) -> Result<Program, ReadError> {
    let tokens = tokenize(source, dialect)?;
    let program = Parser::new(&tokens, dialect).read_program()?;
    tracing::debug!(
        form = ?program.form,
        items = program.body.len(),
        "parsed program"
    );
    Ok(program)
}

type PResult<T> = Result<T, ParseError>;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    dialect: &'a Dialect,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], dialect: &'a Dialect) -> Self {
        Self {
            tokens,
            pos: 0,
            dialect,
            depth: 0,
        }
    }

    // ---- Token navigation ----

    fn peek(&self) -> &'a Token {
        // The lexer always ends the stream with `Eof`, and `advance` never
        // steps past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &'a Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expected(&self, expected: impl Into<String>) -> ParseError {
        let tok = self.peek();
        ParseError::Expected {
            offset: tok.offset,
            expected: expected.into(),
            found: tok.kind.to_string(),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<&'a Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.expected(kind.to_string()))
        }
    }

    fn expect_name(&mut self) -> PResult<String> {
        match &self.peek().kind {
            TokenKind::Name(name) => {
                self.advance();
                Ok(name.clone())
            }
            _ => Err(self.expected("name")),
        }
    }

    fn skip_separators(&mut self) {
        while self.peek().kind.is_separator() {
            self.advance();
        }
    }

    /// A statement ends at a separator run, a closing brace, or end of input.
    fn end_stmt(&mut self) -> PResult<()> {
        if self.peek().kind.is_separator() {
            self.skip_separators();
            Ok(())
        } else if self.at(&TokenKind::RBrace) || self.at(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.expected("newline or `;`"))
        }
    }

    /// Run `f` one nesting level deeper, failing past the dialect's limit.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.dialect.max_depth {
            return Err(ParseError::TooDeep {
                offset: self.peek().offset,
                limit: self.dialect.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Run a left-folding chain. Each fold step deepens the tree by one
    /// level, so steps count against the limit until the chain ends.
    fn chain(&mut self, f: impl FnOnce(&mut Self) -> PResult<Expr>) -> PResult<Expr> {
        let base = self.depth;
        let result = f(self);
        self.depth = base;
        result
    }

    fn fold_step(&mut self) -> PResult<()> {
        if self.depth >= self.dialect.max_depth {
            return Err(ParseError::TooDeep {
                offset: self.peek().offset,
                limit: self.dialect.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn disabled(&self, feature: &'static str) -> ParseError {
        ParseError::Disabled {
            offset: self.peek().offset,
            feature,
        }
    }

    // ---- Program and statements ----

    fn read_program(&mut self) -> PResult<Program> {
        let mut body = Vec::new();
        self.skip_separators();
        while !self.at(&TokenKind::Eof) {
            let item = match self.dialect.program {
                ProgramForm::Module => self.read_top()?,
                ProgramForm::Script => self.read_stmt()?,
            };
            body.push(item);
        }
        Ok(Program::new(self.dialect.program, body))
    }

    fn read_top(&mut self) -> PResult<Stmt> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Def) => self.read_def(),
            TokenKind::Keyword(
                keyword @ (Keyword::Class | Keyword::While | Keyword::Include | Keyword::Import),
            ) => Err(self.reserved(*keyword)),
            other => Err(ParseError::ExpectedTopLevel {
                offset: self.peek().offset,
                found: other.to_string(),
            }),
        }
    }

    fn reserved(&self, keyword: Keyword) -> ParseError {
        ParseError::ReservedKeyword {
            offset: self.peek().offset,
            keyword,
        }
    }

    fn read_def(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::Keyword(Keyword::Def))?;
        let name = self.expect_name()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.eat(&TokenKind::RParen) {
            params.push(self.expect_name()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RParen)?;
                break;
            }
        }
        let body = self.read_block()?;
        self.end_stmt()?;
        Ok(Stmt::Function(Function::named(name, params, body)))
    }

    fn read_stmt(&mut self) -> PResult<Stmt> {
        let stmt = match &self.peek().kind {
            TokenKind::Keyword(Keyword::Var) => {
                self.advance();
                let name = self.expect_name()?;
                self.expect(&TokenKind::Assign)?;
                let init = self.read_expr()?;
                Stmt::let_decl(name, init)
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                Stmt::return_stmt(self.read_expr()?)
            }
            TokenKind::Keyword(Keyword::Def) => return self.read_def(),
            TokenKind::Keyword(keyword) => return Err(self.reserved(*keyword)),
            TokenKind::LBrace => Stmt::block(self.read_block()?),
            _ => Stmt::expr(self.read_expr()?),
        };
        self.end_stmt()?;
        Ok(stmt)
    }

    fn read_block(&mut self) -> PResult<Vec<Stmt>> {
        self.nested(|p| {
            p.skip_separators();
            p.expect(&TokenKind::LBrace)?;
            p.skip_separators();
            let mut stmts = Vec::new();
            while !p.eat(&TokenKind::RBrace) {
                if p.at(&TokenKind::Eof) {
                    return Err(p.expected(TokenKind::RBrace.to_string()));
                }
                stmts.push(p.read_stmt()?);
            }
            Ok(stmts)
        })
    }

    // ---- Expressions ----

    fn read_expr(&mut self) -> PResult<Expr> {
        self.nested(Self::read_additive)
    }

    fn read_additive(&mut self) -> PResult<Expr> {
        self.chain(|p| {
            let mut expr = p.read_multiplicative()?;
            loop {
                let op = match p.peek().kind {
                    TokenKind::Plus => BinaryOp::Add,
                    TokenKind::Minus => BinaryOp::Sub,
                    _ => return Ok(expr),
                };
                p.fold_step()?;
                p.advance();
                let right = p.read_multiplicative()?;
                expr = Expr::binary(expr, op, right);
            }
        })
    }

    fn read_multiplicative(&mut self) -> PResult<Expr> {
        self.chain(|p| {
            let mut expr = p.read_postfix()?;
            loop {
                let op = match p.peek().kind {
                    TokenKind::Star => BinaryOp::Mul,
                    TokenKind::Slash => BinaryOp::Div,
                    TokenKind::Percent => BinaryOp::Mod,
                    _ => return Ok(expr),
                };
                p.fold_step()?;
                p.advance();
                let right = p.read_postfix()?;
                expr = Expr::binary(expr, op, right);
            }
        })
    }

    fn read_postfix(&mut self) -> PResult<Expr> {
        self.chain(|p| {
            let mut expr = p.read_primary()?;
            loop {
                match p.peek().kind {
                    TokenKind::LParen => {
                        p.fold_step()?;
                        p.advance();
                        let args = p.read_args(&TokenKind::RParen)?;
                        expr = Expr::call(expr, args);
                    }
                    TokenKind::Dot => {
                        if !p.dialect.member_calls {
                            return Err(p.disabled("member calls"));
                        }
                        p.fold_step()?;
                        p.advance();
                        let method = p.expect_name()?;
                        p.expect(&TokenKind::LParen)?;
                        let args = p.read_args(&TokenKind::RParen)?;
                        expr = Expr::method_call(expr, method, args);
                    }
                    TokenKind::LBracket if p.dialect.lists => {
                        p.fold_step()?;
                        p.advance();
                        let index = p.read_expr()?;
                        p.expect(&TokenKind::RBracket)?;
                        expr = Expr::index(expr, index);
                    }
                    _ => return Ok(expr),
                }
            }
        })
    }

    /// Comma-separated expressions up to `close`; a trailing comma is fine.
    fn read_args(&mut self, close: &TokenKind) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.eat(close) {
            args.push(self.read_expr()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(args)
    }

    fn read_primary(&mut self) -> PResult<Expr> {
        let tok = self.peek();
        match &tok.kind {
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::int(*value))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::float(*value))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::string(value.clone()))
            }
            TokenKind::Name(name) => {
                self.advance();
                Ok(Expr::ident(name.clone()))
            }
            TokenKind::LBracket => {
                if !self.dialect.lists {
                    return Err(self.disabled("list literals"));
                }
                self.advance();
                let items = self.nested(|p| p.read_args(&TokenKind::RBracket))?;
                Ok(Expr::list(items))
            }
            TokenKind::Backslash => {
                self.advance();
                self.read_lambda()
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.read_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            other => Err(ParseError::ExpectedExpression {
                offset: tok.offset,
                found: other.to_string(),
            }),
        }
    }

    fn read_lambda(&mut self) -> PResult<Expr> {
        let mut params = Vec::new();
        while let TokenKind::Name(name) = &self.peek().kind {
            params.push(name.clone());
            self.advance();
        }

        if self.eat(&TokenKind::Arrow) {
            let body = self.read_expr()?;
            return Ok(Expr::lambda(Function::arrow(params, body)));
        }
        if !self.at(&TokenKind::LBrace) && !self.peek().kind.is_separator() {
            return Err(self.expected("`->` or `{`"));
        }
        let body = self.read_block()?;
        Ok(Expr::lambda(Function::anonymous(params, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        read_rice(source, &Dialect::FULL).expect("parse failed")
    }

    fn parse_script(source: &str) -> Program {
        read_rice(source, &Dialect::SCRIPT).expect("parse failed")
    }

    fn parse_err(source: &str, dialect: &Dialect) -> ParseError {
        match read_rice(source, dialect) {
            Err(ReadError::Parse(err)) => err,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    fn script_expr(source: &str) -> Expr {
        match parse_script(source).body.as_slice() {
            [Stmt::Expr(expr)] => expr.clone(),
            other => panic!("expected one expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_script() {
        let program = read_rice("var x = 5\nprint(x)", &Dialect::MINIMAL).unwrap();
        assert_eq!(
            program,
            Program::script(vec![
                Stmt::let_decl("x", Expr::int(5)),
                Stmt::expr(Expr::call(Expr::ident("print"), vec![Expr::ident("x")])),
            ])
        );
    }

    #[test]
    fn test_precedence() {
        let expr = script_expr("1 + 2 * 3");
        assert_eq!(
            expr,
            Expr::binary(
                Expr::int(1),
                BinaryOp::Add,
                Expr::binary(Expr::int(2), BinaryOp::Mul, Expr::int(3)),
            )
        );

        let expr = script_expr("2 * 3 + 4 * 5");
        assert_eq!(
            expr,
            Expr::binary(
                Expr::binary(Expr::int(2), BinaryOp::Mul, Expr::int(3)),
                BinaryOp::Add,
                Expr::binary(Expr::int(4), BinaryOp::Mul, Expr::int(5)),
            )
        );
    }

    #[test]
    fn test_left_associative() {
        let expr = script_expr("10 - 4 - 3");
        assert_eq!(
            expr,
            Expr::binary(
                Expr::binary(Expr::int(10), BinaryOp::Sub, Expr::int(4)),
                BinaryOp::Sub,
                Expr::int(3),
            )
        );
    }

    #[test]
    fn test_parens_override_precedence() {
        let expr = script_expr("(1 + 2) % 3");
        assert_eq!(
            expr,
            Expr::binary(
                Expr::binary(Expr::int(1), BinaryOp::Add, Expr::int(2)),
                BinaryOp::Mod,
                Expr::int(3),
            )
        );
    }

    #[test]
    fn test_call_args_span_lines() {
        let expr = script_expr("f(1,\n  2,\n)");
        assert_eq!(
            expr,
            Expr::call(Expr::ident("f"), vec![Expr::int(1), Expr::int(2)])
        );
    }

    #[test]
    fn test_postfix_chain() {
        let program = parse("def main() {\n  xs.map(f).map(g)[0](1)\n}");
        let [Stmt::Function(main)] = program.body.as_slice() else {
            panic!("expected one def");
        };
        let expected = Expr::call(
            Expr::index(
                Expr::method_call(
                    Expr::method_call(Expr::ident("xs"), "map", vec![Expr::ident("f")]),
                    "map",
                    vec![Expr::ident("g")],
                ),
                Expr::int(0),
            ),
            vec![Expr::int(1)],
        );
        assert_eq!(main.body, vec![Stmt::expr(expected)]);
    }

    #[test]
    fn test_lambdas() {
        let program = parse_script("var f = \\a b -> a + b\nvar g = \\ {\n  return 1\n}");
        assert_eq!(
            program.body[0],
            Stmt::let_decl(
                "f",
                Expr::lambda(Function::arrow(
                    vec!["a".into(), "b".into()],
                    Expr::binary(Expr::ident("a"), BinaryOp::Add, Expr::ident("b")),
                )),
            )
        );
        assert_eq!(
            program.body[1],
            Stmt::let_decl(
                "g",
                Expr::lambda(Function::anonymous(
                    vec![],
                    vec![Stmt::return_stmt(Expr::int(1))]
                )),
            )
        );
    }

    #[test]
    fn test_module_defs() {
        let program = parse("# helpers first\ndef add(a, b) {\n  return a + b\n}\n\ndef main() {\n  print(add(1, 2))\n}\n");
        assert_eq!(program.form, ProgramForm::Module);
        let names: Vec<_> = program
            .body
            .iter()
            .map(|stmt| match stmt {
                Stmt::Function(f) => f.name.as_str(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["add", "main"]);
    }

    #[test]
    fn test_separators_collapse() {
        let program = parse_script("\n\na;;\n; b\n\n");
        assert_eq!(
            program.body,
            vec![
                Stmt::expr(Expr::ident("a")),
                Stmt::expr(Expr::ident("b"))
            ]
        );
    }

    #[test]
    fn test_nested_block() {
        let program = parse_script("{\n  var a = 1\n  { a }\n}");
        assert_eq!(
            program.body,
            vec![Stmt::block(vec![
                Stmt::let_decl("a", Expr::int(1)),
                Stmt::block(vec![Stmt::expr(Expr::ident("a"))]),
            ])]
        );
    }

    #[test]
    fn test_missing_name_points_at_equals() {
        let dialect = Dialect {
            program: ProgramForm::Script,
            ..Dialect::FULL
        };
        let err = parse_err("var = 1", &dialect);
        assert_eq!(
            err,
            ParseError::Expected {
                offset: 4,
                expected: "name".into(),
                found: "`=`".into(),
            }
        );
        assert_eq!(err.to_string(), "expected name, found `=`");
    }

    #[test]
    fn test_statements_need_separator() {
        let err = parse_err("a b", &Dialect::SCRIPT);
        assert_eq!(err.offset(), 2);
        assert!(err.to_string().starts_with("expected newline or `;`"));
    }

    #[test]
    fn test_expected_expression() {
        let err = parse_err("var x = *", &Dialect::SCRIPT);
        assert_eq!(
            err,
            ParseError::ExpectedExpression {
                offset: 8,
                found: "`*`".into()
            }
        );
    }

    #[test]
    fn test_reserved_keywords() {
        let err = parse_err("while x", &Dialect::SCRIPT);
        assert_eq!(
            err,
            ParseError::ReservedKeyword {
                offset: 0,
                keyword: Keyword::While
            }
        );
        let err = parse_err("class Foo", &Dialect::FULL);
        assert!(matches!(
            err,
            ParseError::ReservedKeyword {
                keyword: Keyword::Class,
                ..
            }
        ));
    }

    #[test]
    fn test_module_rejects_statements() {
        let err = parse_err("print(1)", &Dialect::FULL);
        assert_eq!(
            err,
            ParseError::ExpectedTopLevel {
                offset: 0,
                found: "name `print`".into()
            }
        );
    }

    #[test]
    fn test_disabled_features() {
        let err = parse_err("var xs = [1]", &Dialect::SCRIPT);
        assert_eq!(err, ParseError::Disabled { offset: 9, feature: "list literals" });

        let err = parse_err("xs.map(f)", &Dialect::SCRIPT);
        assert_eq!(err, ParseError::Disabled { offset: 2, feature: "member calls" });
    }

    #[test]
    fn test_depth_limit() {
        let dialect = Dialect {
            max_depth: 10,
            ..Dialect::SCRIPT
        };
        let source = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        let err = parse_err(&source, &dialect);
        assert!(matches!(err, ParseError::TooDeep { limit: 10, .. }));

        assert!(read_rice("((((1))))", &dialect).is_ok());
    }

    #[test]
    fn test_long_chains_hit_depth_limit() {
        let product = format!("print({})", vec!["x"; 20_000].join(" * "));
        let err = parse_err(&product, &Dialect::SCRIPT);
        assert!(matches!(err, ParseError::TooDeep { limit: 200, .. }));

        let sum = format!("print({})", vec!["1"; 20_000].join(" + "));
        let err = parse_err(&sum, &Dialect::SCRIPT);
        assert!(matches!(err, ParseError::TooDeep { .. }));

        let calls = format!("f{}", "()".repeat(20_000));
        let err = parse_err(&calls, &Dialect::SCRIPT);
        assert!(matches!(err, ParseError::TooDeep { .. }));
    }

    #[test]
    fn test_chain_depth_resets_between_chains() {
        let dialect = Dialect {
            max_depth: 10,
            ..Dialect::SCRIPT
        };
        // Each chain fits on its own; their lengths do not add up.
        let chain = vec!["x"; 6].join(" + ");
        let source = format!("{chain}\n{chain}\nf({chain}, {chain})");
        assert!(read_rice(&source, &dialect).is_ok());

        let long = vec!["x"; 12].join(" + ");
        let err = parse_err(&long, &dialect);
        assert!(matches!(err, ParseError::TooDeep { limit: 10, .. }));
    }

    #[test]
    fn test_unclosed_block_is_lex_error() {
        let err = read_rice("def main() {\n", &Dialect::FULL).unwrap_err();
        assert!(matches!(err, ReadError::Lex(_)));
    }
}
