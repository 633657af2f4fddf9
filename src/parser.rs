use crate::ast::{BinaryOp, Expr, LogicalOp, MemberKey, Program, Stmt, UnaryOp};
use crate::error::{JungError, Span};
use crate::lexer::{Token, TokenType};
use crate::value::{FuncDef, Param, Value};
use std::rc::Rc;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, JungError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, JungError> {
        if self.match_types(&[TokenType::Class]) {
            self.class_declaration()
        } else if self.match_types(&[TokenType::Fn]) {
            self.function_declaration()
        } else if self.match_types(&[TokenType::Let]) {
            self.let_statement()
        } else if self.match_types(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_types(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_types(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_types(&[TokenType::Break]) {
            let span = self.previous().span.clone();
            self.optional_semicolon();
            Ok(Stmt::Break { span })
        } else if self.match_types(&[TokenType::Continue]) {
            let span = self.previous().span.clone();
            self.optional_semicolon();
            Ok(Stmt::Continue { span })
        } else if self.match_types(&[TokenType::Import]) {
            self.import_statement()
        } else if self.match_types(&[TokenType::Try]) {
            self.try_statement()
        } else if self.match_types(&[TokenType::Throw]) {
            self.throw_statement()
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self, open_help: &str) -> Result<Vec<Stmt>, JungError> {
        self.consume_with_help(
            TokenType::LeftBrace,
            "Expected '{'",
            open_help.to_string(),
        )?;

        let mut statements = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Blocks must be closed with '}' after the opening '{'.".to_string(),
        )?;
        Ok(statements)
    }

    fn class_declaration(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let name = self
            .consume(TokenType::Identifier, "Expected class name")?
            .lexeme
            .clone();
        self.consume_with_help(
            TokenType::LeftBrace,
            "Expected '{' after class name",
            "A class body is a brace-delimited list of method definitions.".to_string(),
        )?;

        let mut methods = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            self.consume_with_help(
                TokenType::Fn,
                "Expected method definition in class",
                "Class bodies may only contain methods: fn name(params) { ... }".to_string(),
            )?;
            methods.push(self.function_def()?);
        }
        self.consume(TokenType::RightBrace, "Expected '}' after class body")?;

        Ok(Stmt::ClassDef {
            name,
            methods,
            span: self.close_span(&start),
        })
    }

    fn function_declaration(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let func = self.function_def()?;
        Ok(Stmt::FunctionDef {
            func,
            span: self.close_span(&start),
        })
    }

    /// Shared by function declarations and class methods; the `fn` keyword
    /// has already been consumed.
    fn function_def(&mut self) -> Result<Rc<FuncDef>, JungError> {
        let name = self
            .consume(TokenType::Identifier, "Expected function name")?
            .lexeme
            .clone();
        let params = self.parameters()?;
        let body = self.block("Function bodies are brace-delimited: fn name(params) { ... }")?;

        Ok(Rc::new(FuncDef { name, params, body }))
    }

    fn parameters(&mut self) -> Result<Vec<Param>, JungError> {
        self.consume(TokenType::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let name = self
                    .consume(TokenType::Identifier, "Expected parameter name")?
                    .lexeme
                    .clone();
                let default = if self.match_types(&[TokenType::Equal]) {
                    Some(self.expression()?)
                } else {
                    None
                };
                params.push(Param { name, default });

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;
        Ok(params)
    }

    fn let_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let name = self
            .consume(TokenType::Identifier, "Expected variable name")?
            .lexeme
            .clone();
        self.consume_with_help(
            TokenType::Equal,
            "Expected '=' in declaration",
            "Declarations take the form: let name = expression".to_string(),
        )?;
        let value = self.expression()?;
        self.optional_semicolon();

        Ok(Stmt::Let {
            name,
            value,
            span: self.close_span(&start),
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let expr = self.expression()?;
        self.optional_semicolon();
        Ok(Stmt::Print {
            expr,
            span: self.close_span(&start),
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let condition = self.expression()?;
        let then_body = self.block("If statements take the form: if condition { ... }")?;

        let else_body = if self.match_types(&[TokenType::Else]) {
            if self.match_types(&[TokenType::If]) {
                // else if chains as a nested if in the else body
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block("Else branches take the form: else { ... }")?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
            span: self.close_span(&start),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let condition = self.expression()?;
        let body = self.block("While loops take the form: while condition { ... }")?;

        Ok(Stmt::While {
            condition,
            body,
            span: self.close_span(&start),
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let var = self
            .consume(TokenType::Identifier, "Expected variable name after 'for'")?
            .lexeme
            .clone();
        self.consume_with_help(
            TokenType::In,
            "Expected 'in' after loop variable",
            "For loops take the form: for item in iterable { ... }".to_string(),
        )?;
        let iterable = self.expression()?;
        let body = self.block("For loops take the form: for item in iterable { ... }")?;

        Ok(Stmt::ForIn {
            var,
            iterable,
            body,
            span: self.close_span(&start),
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let value = if !self.check(&TokenType::Semicolon)
            && !self.check(&TokenType::RightBrace)
            && !self.is_at_end()
        {
            Some(self.expression()?)
        } else {
            None
        };
        self.optional_semicolon();

        Ok(Stmt::Return {
            value,
            span: self.close_span(&start),
        })
    }

    fn import_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let path = self
            .consume(TokenType::String, "Expected string path after 'import'")?
            .lexeme
            .clone();
        self.optional_semicolon();

        Ok(Stmt::Import {
            path,
            span: self.close_span(&start),
        })
    }

    fn try_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let try_body = self.block("Try statements take the form: try { ... } catch (e) { ... }")?;

        self.consume_with_help(
            TokenType::Catch,
            "Expected 'catch' after try block",
            "Every try block needs a catch: try { ... } catch (e) { ... }".to_string(),
        )?;

        // The catch variable is optional and may be parenthesized or bare.
        let catch_var = if self.match_types(&[TokenType::LeftParen]) {
            let name = self
                .consume(TokenType::Identifier, "Expected variable name in catch")?
                .lexeme
                .clone();
            self.consume(TokenType::RightParen, "Expected ')' after catch variable")?;
            Some(name)
        } else if self.check(&TokenType::Identifier) {
            Some(self.advance().lexeme.clone())
        } else {
            None
        };

        let catch_body = self.block("Catch bodies are brace-delimited: catch (e) { ... }")?;

        Ok(Stmt::TryCatch {
            try_body,
            catch_var,
            catch_body,
            span: self.close_span(&start),
        })
    }

    fn throw_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.previous().span.clone();
        let value = self.expression()?;
        self.optional_semicolon();

        Ok(Stmt::Throw {
            value,
            span: self.close_span(&start),
        })
    }

    /// Anything that didn't start with a statement keyword: a bare or
    /// compound assignment to a variable, an assignment through a member or
    /// index target, or a plain expression statement.
    fn expression_statement(&mut self) -> Result<Stmt, JungError> {
        let start = self.peek().span.clone();

        if self.check(&TokenType::Identifier) {
            match self.peek_next().map(|t| t.token_type) {
                Some(TokenType::Equal) => {
                    let name = self.advance().lexeme.clone();
                    self.advance(); // =
                    let value = self.expression()?;
                    self.optional_semicolon();
                    return Ok(Stmt::Assign {
                        name,
                        value,
                        span: self.close_span(&start),
                    });
                }
                Some(
                    op @ (TokenType::PlusEqual
                    | TokenType::MinusEqual
                    | TokenType::StarEqual
                    | TokenType::SlashEqual),
                ) => {
                    let name = self.advance().lexeme.clone();
                    self.advance(); // the compound operator
                    let value = self.expression()?;
                    self.optional_semicolon();
                    return Ok(Stmt::CompoundAssign {
                        name,
                        operator: compound_op(op),
                        value,
                        span: self.close_span(&start),
                    });
                }
                _ => {}
            }
        }

        let expr = self.expression()?;

        if self.match_types(&[TokenType::Equal]) {
            let value = self.expression()?;
            self.optional_semicolon();
            let span = self.close_span(&start);
            return match expr {
                Expr::Member { object, field, .. } => Ok(Stmt::SetMember {
                    target: *object,
                    key: MemberKey::Field(field),
                    value,
                    span,
                }),
                Expr::Index { object, index, .. } => Ok(Stmt::SetMember {
                    target: *object,
                    key: MemberKey::Index(*index),
                    value,
                    span,
                }),
                _ => Err(JungError::parse_error_with_help(
                    span,
                    "Invalid assignment target".to_string(),
                    "Only variables, members, and indexed elements can be assigned. \
                     Examples: x = 1, obj.field = 1, arr[0] = 1"
                        .to_string(),
                )),
            };
        }

        if let Some(op) = self.match_compound() {
            let value = self.expression()?;
            self.optional_semicolon();
            let span = self.close_span(&start);
            return match expr {
                Expr::Member { object, field, .. } => Ok(Stmt::CompoundSetMember {
                    target: *object,
                    key: MemberKey::Field(field),
                    operator: op,
                    value,
                    span,
                }),
                Expr::Index { object, index, .. } => Ok(Stmt::CompoundSetMember {
                    target: *object,
                    key: MemberKey::Index(*index),
                    operator: op,
                    value,
                    span,
                }),
                _ => Err(JungError::parse_error_with_help(
                    span,
                    "Invalid compound assignment target".to_string(),
                    "Compound assignment needs a variable, member, or indexed element \
                     on the left. Examples: x += 1, obj.count += 1"
                        .to_string(),
                )),
            };
        }

        self.optional_semicolon();
        Ok(Stmt::Expression {
            expr,
            span: self.close_span(&start),
        })
    }

    fn match_compound(&mut self) -> Option<BinaryOp> {
        for tt in [
            TokenType::PlusEqual,
            TokenType::MinusEqual,
            TokenType::StarEqual,
            TokenType::SlashEqual,
        ] {
            if self.check(&tt) {
                self.advance();
                return Some(compound_op(tt));
            }
        }
        None
    }

    // ---- expressions, lowest to highest precedence ----

    fn expression(&mut self) -> Result<Expr, JungError> {
        self.ternary()
    }

    fn ternary(&mut self) -> Result<Expr, JungError> {
        let expr = self.or()?;

        if self.match_types(&[TokenType::Question]) {
            let then_expr = self.ternary()?;
            self.consume(TokenType::Colon, "Expected ':' in ternary expression")?;
            let else_expr = self.ternary()?;
            let span = Span::new(
                expr.span().start,
                else_expr.span().end,
                expr.span().line,
            );
            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span,
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, JungError> {
        let mut expr = self.and()?;

        while self.match_types(&[TokenType::Or]) {
            let right = self.and()?;
            let span = Span::new(expr.span().start, right.span().end, expr.span().line);
            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::Or,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, JungError> {
        let mut expr = self.equality()?;

        while self.match_types(&[TokenType::And]) {
            let right = self.equality()?;
            let span = Span::new(expr.span().start, right.span().end, expr.span().line);
            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::And,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, JungError> {
        let mut expr = self.comparison()?;

        while self.match_types(&[TokenType::EqualEqual, TokenType::BangEqual]) {
            let operator = match self.previous().token_type {
                TokenType::EqualEqual => BinaryOp::Equal,
                TokenType::BangEqual => BinaryOp::NotEqual,
                _ => unreachable!(),
            };
            let right = self.binary_operand(self.previous().clone(), Self::comparison)?;
            let span = Span::new(expr.span().start, right.span().end, expr.span().line);
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, JungError> {
        let mut expr = self.term()?;

        while self.match_types(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let operator = match self.previous().token_type {
                TokenType::Greater => BinaryOp::Greater,
                TokenType::GreaterEqual => BinaryOp::GreaterEqual,
                TokenType::Less => BinaryOp::Less,
                TokenType::LessEqual => BinaryOp::LessEqual,
                _ => unreachable!(),
            };
            let right = self.binary_operand(self.previous().clone(), Self::term)?;
            let span = Span::new(expr.span().start, right.span().end, expr.span().line);
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, JungError> {
        let mut expr = self.factor()?;

        while self.match_types(&[TokenType::Plus, TokenType::Minus]) {
            let operator = match self.previous().token_type {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Subtract,
                _ => unreachable!(),
            };
            let right = self.binary_operand(self.previous().clone(), Self::factor)?;
            let span = Span::new(expr.span().start, right.span().end, expr.span().line);
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, JungError> {
        let mut expr = self.unary()?;

        while self.match_types(&[TokenType::Star, TokenType::Slash, TokenType::Percent]) {
            let operator = match self.previous().token_type {
                TokenType::Star => BinaryOp::Multiply,
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Percent => BinaryOp::Modulo,
                _ => unreachable!(),
            };
            let right = self.binary_operand(self.previous().clone(), Self::unary)?;
            let span = Span::new(expr.span().start, right.span().end, expr.span().line);
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    /// Parse the right-hand side of a binary operator, rewording a failure
    /// into an error anchored at the operator token.
    fn binary_operand(
        &mut self,
        operator_token: Token,
        parse: fn(&mut Self) -> Result<Expr, JungError>,
    ) -> Result<Expr, JungError> {
        parse(self).map_err(|_| {
            JungError::parse_error_with_help(
                operator_token.span.clone(),
                format!("Expected expression after '{}'", operator_token.lexeme),
                "Binary operators require expressions on both sides.".to_string(),
            )
        })
    }

    fn unary(&mut self) -> Result<Expr, JungError> {
        if self.match_types(&[TokenType::Not, TokenType::Minus]) {
            let operator = match self.previous().token_type {
                TokenType::Not => UnaryOp::Not,
                TokenType::Minus => UnaryOp::Negate,
                _ => unreachable!(),
            };
            let start = self.previous().span.clone();
            let operand = self.unary()?;
            let span = Span::new(start.start, operand.span().end, start.line);
            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
                span,
            });
        }

        self.postfix()
    }

    /// Postfix chain: indexing, member access, and method calls. Method
    /// calls desugar to `__method_<name>` with the receiver prepended to the
    /// argument list.
    fn postfix(&mut self) -> Result<Expr, JungError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_types(&[TokenType::LeftBracket]) {
                let index = self.expression()?;
                let end = self
                    .consume(TokenType::RightBracket, "Expected ']' after index")?
                    .span
                    .end;
                let span = Span::new(expr.span().start, end, expr.span().line);
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.match_types(&[TokenType::Dot]) {
                let name = self
                    .consume(TokenType::Identifier, "Expected property name after '.'")?
                    .clone();

                if self.match_types(&[TokenType::LeftParen]) {
                    let mut args = vec![expr];
                    if !self.check(&TokenType::RightParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.match_types(&[TokenType::Comma]) {
                                break;
                            }
                        }
                    }
                    let end = self
                        .consume(TokenType::RightParen, "Expected ')' after arguments")?
                        .span
                        .end;
                    let span = Span::new(args[0].span().start, end, args[0].span().line);
                    expr = Expr::Call {
                        name: format!("__method_{}", name.lexeme),
                        args,
                        span,
                    };
                } else {
                    let span =
                        Span::new(expr.span().start, name.span.end, expr.span().line);
                    expr = Expr::Member {
                        object: Box::new(expr),
                        field: name.lexeme,
                        span,
                    };
                }
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, JungError> {
        if self.is_at_end() {
            return Err(JungError::parse_error_with_help(
                self.peek().span.clone(),
                "Unexpected end of input".to_string(),
                "Expected an expression here. Check for unmatched delimiters or an \
                 incomplete statement."
                    .to_string(),
            ));
        }

        let token = self.advance().clone();

        match token.token_type {
            TokenType::Integer => {
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    JungError::parse_error(token.span.clone(), "Invalid integer".to_string())
                })?;
                Ok(Expr::Literal {
                    value: Value::Int(value),
                    span: token.span,
                })
            }
            TokenType::Double => Ok(Expr::Literal {
                value: Value::Double(token.number),
                span: token.span,
            }),
            TokenType::String => Ok(Expr::Literal {
                value: Value::Str(token.lexeme),
                span: token.span,
            }),
            TokenType::True => Ok(Expr::Literal {
                value: Value::Bool(true),
                span: token.span,
            }),
            TokenType::False => Ok(Expr::Literal {
                value: Value::Bool(false),
                span: token.span,
            }),
            TokenType::Null => Ok(Expr::Literal {
                value: Value::Null,
                span: token.span,
            }),
            TokenType::This => Ok(Expr::This { span: token.span }),
            TokenType::InterpBegin => self.interpolation(token.span),
            TokenType::New => self.new_expression(token.span),
            TokenType::Identifier => {
                if self.match_types(&[TokenType::LeftParen]) {
                    let mut args = Vec::new();
                    if !self.check(&TokenType::RightParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.match_types(&[TokenType::Comma]) {
                                break;
                            }
                        }
                    }
                    let end = self
                        .consume_with_help(
                            TokenType::RightParen,
                            "Expected ')' after arguments",
                            "Function calls must be closed with ')'. Example: func(arg1, arg2)"
                                .to_string(),
                        )?
                        .span
                        .end;
                    Ok(Expr::Call {
                        name: token.lexeme,
                        args,
                        span: Span::new(token.span.start, end, token.span.line),
                    })
                } else {
                    Ok(Expr::Variable {
                        name: token.lexeme,
                        span: token.span,
                    })
                }
            }
            TokenType::LeftBracket => self.array_literal(token.span),
            TokenType::LeftBrace => self.object_literal(token.span),
            TokenType::LeftParen => {
                let expr = self.expression()?;
                self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching ')'.".to_string(),
                )?;
                Ok(expr)
            }
            _ => {
                let help = match token.token_type {
                    TokenType::RightParen => {
                        "Found ')' without a matching '('. Check for unbalanced parentheses."
                    }
                    TokenType::RightBrace => {
                        "Found '}' without a matching '{'. Check for unbalanced braces."
                    }
                    TokenType::RightBracket => {
                        "Found ']' without a matching '['. Check for unbalanced brackets."
                    }
                    TokenType::Eof => "Reached end of input while expecting an expression.",
                    _ => "Expected a literal value, variable, or parenthesized expression here.",
                };

                Err(JungError::parse_error_with_help(
                    token.span,
                    format!("Expected expression, found '{}'", token.lexeme),
                    help.to_string(),
                ))
            }
        }
    }

    /// The literal and expression parts between InterpBegin and InterpEnd, in
    /// order. Literal runs arrive as plain string tokens.
    fn interpolation(&mut self, start: Span) -> Result<Expr, JungError> {
        let mut parts = Vec::new();

        while !self.check(&TokenType::InterpEnd) && !self.is_at_end() {
            parts.push(self.expression()?);
        }
        let end = self
            .consume(TokenType::InterpEnd, "Expected end of string interpolation")?
            .span
            .end;

        Ok(Expr::Interp {
            parts,
            span: Span::new(start.start, end, start.line),
        })
    }

    fn new_expression(&mut self, start: Span) -> Result<Expr, JungError> {
        let class_name = self
            .consume(TokenType::Identifier, "Expected class name after 'new'")?
            .lexeme
            .clone();
        self.consume(TokenType::LeftParen, "Expected '(' after class name")?;

        let mut args = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        let end = self
            .consume(TokenType::RightParen, "Expected ')' after arguments")?
            .span
            .end;

        Ok(Expr::New {
            class_name,
            args,
            span: Span::new(start.start, end, start.line),
        })
    }

    fn array_literal(&mut self, start: Span) -> Result<Expr, JungError> {
        let mut elements = Vec::new();

        if !self.check(&TokenType::RightBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
                if self.check(&TokenType::RightBracket) {
                    break; // trailing comma
                }
            }
        }

        let end = self
            .consume_with_help(
                TokenType::RightBracket,
                "Expected ']' after array elements",
                "Array literals must be closed with ']'. Example: [1, 2, 3]".to_string(),
            )?
            .span
            .end;

        Ok(Expr::Array {
            elements,
            span: Span::new(start.start, end, start.line),
        })
    }

    fn object_literal(&mut self, start: Span) -> Result<Expr, JungError> {
        let mut pairs = Vec::new();

        if !self.check(&TokenType::RightBrace) {
            loop {
                let key = self
                    .consume(TokenType::Identifier, "Expected property name")?
                    .lexeme
                    .clone();
                self.consume_with_help(
                    TokenType::Colon,
                    "Expected ':' after property name",
                    "Object entries take the form key: value. Example: {name: \"Carl\"}"
                        .to_string(),
                )?;
                let value = self.expression()?;
                pairs.push((key, value));

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
                if self.check(&TokenType::RightBrace) {
                    break; // trailing comma
                }
            }
        }

        let end = self
            .consume_with_help(
                TokenType::RightBrace,
                "Expected '}' after object entries",
                "Object literals must be closed with '}'. Example: {key: value}".to_string(),
            )?
            .span
            .end;

        Ok(Expr::ObjectLiteral {
            pairs,
            span: Span::new(start.start, end, start.line),
        })
    }

    // ---- token plumbing ----

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn close_span(&self, start: &Span) -> Span {
        Span::new(start.start, self.previous().span.end, start.line)
    }

    fn optional_semicolon(&mut self) {
        if self.check(&TokenType::Semicolon) {
            self.advance();
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, JungError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(JungError::parse_error(self.error_span(), message.to_string()))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: String,
    ) -> Result<&Token, JungError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(JungError::parse_error_with_help(
                self.error_span(),
                message.to_string(),
                help,
            ))
        }
    }

    /// The span to blame for a failed consume: the current token, or for EOF
    /// the position just past the last real token.
    fn error_span(&self) -> Span {
        if self.is_at_end() && self.current > 0 {
            let last = &self.tokens[self.current - 1];
            Span::single(last.span.end, last.span.line)
        } else {
            self.peek().span.clone()
        }
    }
}

fn compound_op(token_type: TokenType) -> BinaryOp {
    match token_type {
        TokenType::PlusEqual => BinaryOp::Add,
        TokenType::MinusEqual => BinaryOp::Subtract,
        TokenType::StarEqual => BinaryOp::Multiply,
        TokenType::SlashEqual => BinaryOp::Divide,
        _ => unreachable!(),
    }
}
