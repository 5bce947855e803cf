//! Recursive-descent parser with precedence climbing for binary operators.
//!
//! Grammar:
//!
//! ```text
//! module      = definition*
//! definition  = "fn" identifier "(" params? ")" "->" type body
//!             | "const" identifier (":" type)? "=" expression ";"
//! params      = param ("," param)*
//! param       = identifier ":" type
//! body        = "{" statement* "}"
//! statement   = "return" expression ";"
//!             | "const" identifier "=" expression ";"
//! expression  = unary (binop expression)*        (precedence climbing)
//! unary       = "-" unary | postfix
//! postfix     = primary ("." integer | "(" args? ")")*
//! primary     = integer | "true" | "false" | "nil" | identifier
//!             | "(" ")" | "(" expression ("," expression)* ")"
//! type        = "nil" | "bool" | "i32" | "(" type ("," type)* ")"
//! ```

use crate::ast::*;
use crate::error::{FrontError, SourceLocation};
use crate::token::{Token, TokenKind};

/// Parse a token stream (as produced by [`crate::lexer::lex`]) to a module.
pub fn parse(tokens: Vec<Token>) -> Result<Module, FrontError> {
    let mut parser = Parser { tokens, position: 0 };
    parser.module()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Token {
        self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, FrontError> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        Err(FrontError::UnexpectedToken {
            expected,
            found: token.kind.to_string(),
            location: token.location,
        })
    }

    fn identifier(&mut self, expected: &'static str) -> Result<(rillc_util::Symbol, SourceLocation), FrontError> {
        let token = self.peek();
        if let TokenKind::Identifier(name) = token.kind {
            self.advance();
            return Ok((name, token.location));
        }
        Err(FrontError::UnexpectedToken {
            expected,
            found: token.kind.to_string(),
            location: token.location,
        })
    }

    fn module(&mut self) -> Result<Module, FrontError> {
        let mut items = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            items.push(self.definition()?);
        }
        Ok(Module { items })
    }

    fn definition(&mut self) -> Result<Item, FrontError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Fn => self.function().map(Item::Function),
            TokenKind::Const => self.global_const().map(Item::Const),
            _ => Err(FrontError::UnexpectedToken {
                expected: "`fn` or `const`",
                found: token.kind.to_string(),
                location: token.location,
            }),
        }
    }

    fn function(&mut self) -> Result<FunctionItem, FrontError> {
        let location = self.expect(TokenKind::Fn, "`fn`")?.location;
        let (name, _) = self.identifier("a function name")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            loop {
                let (param_name, param_location) = self.identifier("a parameter name")?;
                self.expect(TokenKind::Colon, "`:`")?;
                let ty = self.type_expr()?;
                params.push(Param { name: param_name, ty, location: param_location });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Arrow, "`->`")?;
        let return_type = self.type_expr()?;
        let body = self.body()?;
        Ok(FunctionItem { name, params, return_type, body, location })
    }

    fn global_const(&mut self) -> Result<ConstItem, FrontError> {
        let location = self.expect(TokenKind::Const, "`const`")?.location;
        let (name, _) = self.identifier("a constant name")?;
        let ty = if self.eat(TokenKind::Colon) { Some(self.type_expr()?) } else { None };
        self.expect(TokenKind::Equal, "`=`")?;
        let value = self.expression(0)?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(ConstItem { name, ty, value, location })
    }

    fn body(&mut self) -> Result<Vec<Stmt>, FrontError> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut statements = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, FrontError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Return => {
                self.advance();
                let value = self.expression(0)?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Ok(Stmt::Return { value, location: token.location })
            }
            TokenKind::Const => {
                self.advance();
                let (name, _) = self.identifier("a constant name")?;
                self.expect(TokenKind::Equal, "`=`")?;
                let value = self.expression(0)?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Ok(Stmt::Const { name, value, location: token.location })
            }
            _ => Err(FrontError::UnexpectedToken {
                expected: "`return` or `const`",
                found: token.kind.to_string(),
                location: token.location,
            }),
        }
    }

    fn expression(&mut self, min_precedence: u8) -> Result<Expr, FrontError> {
        let mut lhs = self.unary()?;
        loop {
            let token = self.peek();
            let Some((op, precedence)) = binary_operator(token.kind) else {
                return Ok(lhs);
            };
            if precedence < min_precedence {
                return Ok(lhs);
            }
            self.advance();
            let rhs = self.expression(precedence + 1)?;
            lhs = Expr {
                location: lhs.location,
                kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, FrontError> {
        let token = self.peek();
        if token.kind == TokenKind::Minus {
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr {
                location: token.location,
                kind: ExprKind::Unary(UnaryOp::Neg, Box::new(operand)),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, FrontError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let token = self.peek();
                    let TokenKind::Integer(index) = token.kind else {
                        return Err(FrontError::TupleIndexNotConstant {
                            location: token.location,
                        });
                    };
                    self.advance();
                    expr = Expr {
                        location: expr.location,
                        kind: ExprKind::Field { base: Box::new(expr), index: index as u64 },
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek().kind != TokenKind::RParen {
                        loop {
                            args.push(self.expression(0)?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "`)`")?;
                    expr = Expr {
                        location: expr.location,
                        kind: ExprKind::Call { callee: Box::new(expr), args },
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, FrontError> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Integer(value) => ExprKind::Integer(value),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Nil => ExprKind::Nil,
            TokenKind::Identifier(name) => ExprKind::Name(name),
            TokenKind::LParen => {
                if self.eat(TokenKind::RParen) {
                    ExprKind::Nil
                } else {
                    let first = self.expression(0)?;
                    if self.eat(TokenKind::Comma) {
                        let mut elements = vec![first];
                        loop {
                            elements.push(self.expression(0)?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect(TokenKind::RParen, "`)`")?;
                        ExprKind::Tuple(elements)
                    } else {
                        self.expect(TokenKind::RParen, "`)`")?;
                        return Ok(first);
                    }
                }
            }
            found => {
                return Err(FrontError::UnexpectedToken {
                    expected: "an expression",
                    found: found.to_string(),
                    location: token.location,
                })
            }
        };
        Ok(Expr { kind, location: token.location })
    }

    fn type_expr(&mut self) -> Result<TypeExpr, FrontError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Nil => Ok(TypeExpr::Nil),
            TokenKind::Bool => Ok(TypeExpr::Bool),
            TokenKind::I32 => Ok(TypeExpr::I32),
            TokenKind::LParen => {
                let mut fields = Vec::new();
                if self.peek().kind != TokenKind::RParen {
                    loop {
                        fields.push(self.type_expr()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(TypeExpr::Tuple(fields))
            }
            found => Err(FrontError::UnexpectedToken {
                expected: "a type",
                found: found.to_string(),
                location: token.location,
            }),
        }
    }
}

fn binary_operator(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    match kind {
        TokenKind::Plus => Some((BinaryOp::Add, 10)),
        TokenKind::Minus => Some((BinaryOp::Sub, 10)),
        TokenKind::Star => Some((BinaryOp::Mul, 20)),
        TokenKind::Slash => Some((BinaryOp::Div, 20)),
        TokenKind::Percent => Some((BinaryOp::Mod, 20)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_source(source: &str) -> Module {
        parse(lexer::lex(source).unwrap()).unwrap()
    }

    #[test]
    fn parses_a_minimal_main() {
        let module = parse_source("fn main() -> i32 { return 0; }");
        assert_eq!(module.items.len(), 1);
        let Item::Function(function) = &module.items[0] else {
            panic!("expected a function")
        };
        assert!(function.name.eq_str("main"));
        assert!(function.params.is_empty());
        assert_eq!(function.return_type, TypeExpr::I32);
        assert_eq!(function.body.len(), 1);
    }

    #[test]
    fn precedence_binds_products_tighter() {
        let module = parse_source("fn main() -> i32 { return 1 + 2 * 3; }");
        let Item::Function(function) = &module.items[0] else { panic!() };
        let Stmt::Return { value, .. } = &function.body[0] else { panic!() };
        let ExprKind::Binary(BinaryOp::Add, lhs, rhs) = &value.kind else {
            panic!("expected + at the root, got {:?}", value.kind)
        };
        assert!(matches!(lhs.kind, ExprKind::Integer(1)));
        assert!(matches!(rhs.kind, ExprKind::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn same_precedence_associates_left() {
        let module = parse_source("fn main() -> i32 { return 10 - 3 - 2; }");
        let Item::Function(function) = &module.items[0] else { panic!() };
        let Stmt::Return { value, .. } = &function.body[0] else { panic!() };
        let ExprKind::Binary(BinaryOp::Sub, lhs, _) = &value.kind else { panic!() };
        assert!(matches!(lhs.kind, ExprKind::Binary(BinaryOp::Sub, _, _)));
    }

    #[test]
    fn parses_parameters_and_calls() {
        let module =
            parse_source("fn add(a: i32, b: i32) -> i32 { return a + b; } fn main() -> i32 { return add(2, 3); }");
        assert_eq!(module.items.len(), 2);
        let Item::Function(main) = &module.items[1] else { panic!() };
        let Stmt::Return { value, .. } = &main.body[0] else { panic!() };
        let ExprKind::Call { callee, args } = &value.kind else { panic!() };
        assert!(matches!(callee.kind, ExprKind::Name(_)));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn parses_tuples_and_field_access() {
        let module = parse_source("fn main() -> i32 { const t = (1, 2); return t.1; }");
        let Item::Function(function) = &module.items[0] else { panic!() };
        let Stmt::Const { value, .. } = &function.body[0] else { panic!() };
        assert!(matches!(&value.kind, ExprKind::Tuple(items) if items.len() == 2));
        let Stmt::Return { value, .. } = &function.body[1] else { panic!() };
        assert!(matches!(&value.kind, ExprKind::Field { index: 1, .. }));
    }

    #[test]
    fn parenthesised_expression_groups() {
        let module = parse_source("fn main() -> i32 { return (1 + 2) * 3; }");
        let Item::Function(function) = &module.items[0] else { panic!() };
        let Stmt::Return { value, .. } = &function.body[0] else { panic!() };
        assert!(matches!(&value.kind, ExprKind::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn parses_global_constants() {
        let module = parse_source("const answer: i32 = 42;");
        let Item::Const(constant) = &module.items[0] else { panic!() };
        assert!(constant.name.eq_str("answer"));
        assert_eq!(constant.ty, Some(TypeExpr::I32));
    }

    #[test]
    fn field_index_must_be_a_literal() {
        let tokens = lexer::lex("fn main() -> i32 { return t.x; }").unwrap();
        let error = parse(tokens).unwrap_err();
        assert!(matches!(error, FrontError::TupleIndexNotConstant { .. }));
    }

    #[test]
    fn reports_unexpected_tokens() {
        let tokens = lexer::lex("fn main() -> i32 { return ; }").unwrap();
        let error = parse(tokens).unwrap_err();
        assert!(matches!(error, FrontError::UnexpectedToken { .. }));
    }
}
