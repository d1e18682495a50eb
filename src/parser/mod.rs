use crate::ast::{BinOp, Expr, LiteralValue, Member, Param, Stmt, UnOp};
use crate::error::{MusError, ParseError};
use crate::lexer::{Literal, Token, TokenKind};

/// Recursive-descent parser with panic-mode error recovery: a failed
/// declaration is synchronized past and replaced with a placeholder so that
/// parsing can continue and surface every error from a single run.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

type ExprResult = Result<Expr, ParseError>;
type StmtResult = Result<Stmt, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: vec![],
        }
    }

    pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, MusError> {
        let mut parser = Parser::new(tokens);
        let mut statements = vec![];

        while !parser.is_at_end() {
            statements.push(parser.declaration());
        }

        if parser.errors.is_empty() {
            Ok(statements)
        } else {
            Err(MusError::Parser(parser.errors))
        }
    }

    // ---- declarations -----------------------------------------------

    fn declaration(&mut self) -> Stmt {
        let result = if self.match_kind(TokenKind::Class) {
            self.class_declaration()
        } else if self.match_kind(TokenKind::Fun) {
            self.function_declaration()
        } else if self.match_kind(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => stmt,
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                Stmt::Placeholder
            }
        }
    }

    fn class_declaration(&mut self) -> StmtResult {
        let name_token = self.consume(TokenKind::Identifier, "Expected class name.")?;

        let mut superclass_name = None;
        if self.match_kind(TokenKind::Extends) {
            let superclass_token = self.consume(TokenKind::Identifier, "Expected superclass name.")?;
            superclass_name = Some(superclass_token.lexeme);
        }

        self.consume(TokenKind::LeftBrace, "Expected '{' before class body.")?;

        let mut fields = vec![];
        let mut methods = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.match_kind(TokenKind::Var) {
                fields.push(self.var_declaration()?);
            } else if self.match_kind(TokenKind::Fun) {
                methods.push(self.function_declaration()?);
            } else {
                return Err(self.error(self.peek(), "Expected field or method declaration."));
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after class body.")?;

        Ok(Stmt::ClassDecl {
            name: name_token.lexeme.clone(),
            superclass_name,
            fields,
            methods,
            token: name_token,
        })
    }

    fn function_declaration(&mut self) -> StmtResult {
        let name_token = self.consume(TokenKind::Identifier, "Expected function name.")?;

        self.consume(TokenKind::LeftParen, "Expected '(' after function name.")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                let param_name = self.consume(TokenKind::Identifier, "Expected parameter name.")?.lexeme;
                self.consume(TokenKind::Arrow, "Expected '=>' after parameter name.")?;
                let param_type = self.consume(TokenKind::Identifier, "Expected parameter type.")?.lexeme;
                params.push(Param {
                    name: param_name,
                    declared_type: param_type,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expected '{' before function body.")?;

        let mut body = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.declaration());
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after function body.")?;

        Ok(Stmt::FunctionDecl {
            name: name_token.lexeme.clone(),
            params,
            body,
            token: name_token,
        })
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name_token = self.consume(TokenKind::Identifier, "Expected variable name.")?;
        self.consume(TokenKind::Arrow, "Expected '=>' after variable name.")?;
        let type_token = self.consume(TokenKind::Identifier, "Expected variable type.")?;

        let initializer = if self.match_kind(TokenKind::Assign) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Stmt::VarDecl {
            name: name_token.lexeme.clone(),
            declared_type: type_token.lexeme,
            initializer,
            token: name_token,
        })
    }

    // ---- statements ---------------------------------------------------

    fn statement(&mut self) -> StmtResult {
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::While) {
            return self.while_statement();
        }
        if self.match_kind(TokenKind::For) {
            return self.for_statement();
        }
        if self.match_kind(TokenKind::Return) {
            return self.return_statement();
        }
        if self.match_kind(TokenKind::LeftBrace) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// Disambiguates the two `for` forms by looking ahead past the loop
    /// variable: `in` means for-in, `=` means the C-style form.
    fn for_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'.")?;

        // Both forms tolerate a cosmetic leading `var`.
        self.match_kind(TokenKind::Var);
        let name_token = self.consume(TokenKind::Identifier, "Expected loop variable name.")?;

        if self.match_kind(TokenKind::In) {
            let iterable = self.expression()?;
            self.consume(TokenKind::RightParen, "Expected ')' after for-in clause.")?;
            let body = Box::new(self.statement()?);
            return Ok(Stmt::For {
                iter_name: name_token.lexeme,
                iterable,
                body,
            });
        }

        self.consume(TokenKind::Assign, "Expected '=' after loop variable.")?;
        let start = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after loop initializer.")?;

        let condition = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after loop condition.")?;

        let increment = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses.")?;

        let body = self.statement()?;

        let initializer = Stmt::VarDecl {
            name: name_token.lexeme.clone(),
            declared_type: "integer".to_string(),
            initializer: Some(start),
            token: name_token,
        };

        let increment_stmt = Stmt::ExpressionStmt(increment);
        let loop_body = match body {
            Stmt::Block(mut stmts) => {
                stmts.push(increment_stmt);
                Stmt::Block(stmts)
            }
            other => Stmt::Block(vec![other, increment_stmt]),
        };

        let while_loop = Stmt::While {
            condition,
            body: Box::new(loop_body),
        };

        Ok(Stmt::Block(vec![initializer, while_loop]))
    }

    fn return_statement(&mut self) -> StmtResult {
        let token = self.previous();
        let value = if !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Stmt::Return { value, token })
    }

    fn expression_statement(&mut self) -> StmtResult {
        Ok(Stmt::ExpressionStmt(self.expression()?))
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration());
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    // ---- expressions ----------------------------------------------------

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.logic_or()?;

        if self.match_kind(TokenKind::Assign) {
            let equals = self.previous();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, token } => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    token,
                }),
                Expr::Get { object, member, token } => Ok(Expr::Set {
                    object,
                    member,
                    value: Box::new(value),
                    token,
                }),
                _ => Err(self.error(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> ExprResult {
        let mut expr = self.logic_and()?;
        while self.check(TokenKind::Or) {
            let token = self.advance();
            let right = self.logic_and()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: BinOp::Or,
                right: Box::new(right),
                token,
            };
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.check(TokenKind::And) {
            let token = self.advance();
            let right = self.equality()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: BinOp::And,
                right: Box::new(right),
                token,
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Equals => BinOp::Eq,
                TokenKind::NotEquals => BinOp::Ne,
                _ => break,
            };
            let token = self.advance();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                token,
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Greater => BinOp::Gt,
                TokenKind::GreaterEqual => BinOp::Ge,
                TokenKind::Less => BinOp::Lt,
                TokenKind::LessEqual => BinOp::Le,
                _ => break,
            };
            let token = self.advance();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                token,
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let token = self.advance();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                token,
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let token = self.advance();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                token,
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnOp::Not,
            TokenKind::Minus => UnOp::Neg,
            _ => return self.call(),
        };
        let token = self.advance();
        let right = self.unary()?;
        Ok(Expr::Unary {
            op,
            right: Box::new(right),
            token,
        })
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;

        loop {
            if self.match_kind(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(TokenKind::Dot) {
                let name = self.consume(TokenKind::Identifier, "Expected property name after '.'.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    member: Member::Name(name.lexeme.clone()),
                    token: name,
                };
            } else if self.match_kind(TokenKind::LeftBracket) {
                let index = self.expression()?;
                let bracket = self.consume(TokenKind::RightBracket, "Expected ']' after array index.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    member: Member::Index(Box::new(index)),
                    token: bracket,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut args = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expected ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            token: paren,
        })
    }

    fn primary(&mut self) -> ExprResult {
        if self.check(TokenKind::Integer) || self.check(TokenKind::String) || self.check(TokenKind::Boolean) {
            let token = self.advance();
            let value = match &token.literal {
                Some(Literal::Integer(i)) => LiteralValue::Integer(*i),
                Some(Literal::String(s)) => LiteralValue::String(s.clone()),
                Some(Literal::Boolean(b)) => LiteralValue::Boolean(*b),
                None => unreachable!("literal token without a literal payload"),
            };
            return Ok(Expr::Literal { value, token });
        }

        if self.match_kind(TokenKind::This) {
            return Ok(Expr::This { token: self.previous() });
        }

        if self.match_kind(TokenKind::Super) {
            let token = self.previous();
            self.consume(TokenKind::Dot, "Expected '.' after 'super'.")?;
            let method = self.consume(TokenKind::Identifier, "Expected superclass method name.")?;
            return Ok(Expr::Super {
                method: method.lexeme,
                token,
            });
        }

        if self.match_kind(TokenKind::Identifier) {
            let token = self.previous();
            return Ok(Expr::Variable {
                name: token.lexeme.clone(),
                token,
            });
        }

        if self.match_kind(TokenKind::LeftParen) {
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, "Expected ')' after expression.")?;
            return Ok(expr);
        }

        if self.match_kind(TokenKind::LeftBracket) {
            let token = self.previous();
            let mut elements = vec![];
            if !self.check(TokenKind::RightBracket) {
                loop {
                    elements.push(self.expression()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::RightBracket, "Expected ']' after array elements.")?;
            return Ok(Expr::Literal {
                value: LiteralValue::Array(elements),
                token,
            });
        }

        if self.match_kind(TokenKind::New) {
            let name = self.consume(TokenKind::Identifier, "Expected class name after 'new'.")?;
            self.consume(TokenKind::LeftParen, "Expected '(' after class name.")?;

            let mut args = vec![];
            if !self.check(TokenKind::RightParen) {
                loop {
                    args.push(self.expression()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            let paren = self.consume(TokenKind::RightParen, "Expected ')' after arguments.")?;

            return Ok(Expr::Call {
                callee: Box::new(Expr::Variable {
                    name: name.lexeme.clone(),
                    token: name,
                }),
                args,
                token: paren,
            });
        }

        Err(self.error(&self.peek(), "Expected expression."))
    }

    // ---- token-stream plumbing -----------------------------------------

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.current].kind
    }

    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&self.peek(), message))
        }
    }

    fn error(&self, token: &Token, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            position: token.position(),
        }
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::RightBrace {
                return;
            }

            if matches!(
                self.peek_kind(),
                TokenKind::Class
                    | TokenKind::Fun
                    | TokenKind::Var
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::For
                    | TokenKind::Return
            ) {
                return;
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Vec<Stmt> {
        let tokens = Lexer::new(src).lex().expect("lex should succeed");
        Parser::parse(tokens).expect("parse should succeed")
    }

    #[test]
    fn parses_var_decl_with_type_annotation() {
        let stmts = parse(r#"var greeting => string = "hi""#);
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::VarDecl { .. }));
    }

    #[test]
    fn precedence_binds_multiplication_tighter_than_addition() {
        let stmts = parse("out(1 + 2 * 3)");
        match &stmts[0] {
            Stmt::ExpressionStmt(Expr::Call { args, .. }) => match &args[0] {
                Expr::Binary { op: BinOp::Add, right, .. } => {
                    assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
                }
                other => panic!("expected addition at the top, got {other:?}"),
            },
            other => panic!("expected a call statement, got {other:?}"),
        }
    }

    #[test]
    fn for_in_and_c_style_are_disambiguated_by_lookahead() {
        let stmts = parse("for (x in [1,2]) { out(x) }");
        assert!(matches!(stmts[0], Stmt::For { .. }));

        let stmts = parse("for (var i = 0; i < 10; i = i + 1) { out(i) }");
        assert!(matches!(stmts[0], Stmt::Block(_)));
    }

    #[test]
    fn assignment_to_a_literal_is_a_parse_error() {
        let tokens = Lexer::new("1 = 2").lex().unwrap();
        let err = Parser::parse(tokens).unwrap_err();
        assert!(matches!(err, MusError::Parser(_)));
    }

    #[test]
    fn indexing_parses_as_a_member_index_not_a_stringified_expression() {
        let stmts = parse("a[0]");
        match &stmts[0] {
            Stmt::ExpressionStmt(Expr::Get { member, .. }) => {
                assert!(matches!(member, Member::Index(_)));
            }
            other => panic!("expected a Get expression, got {other:?}"),
        }
    }

    #[test]
    fn new_and_bare_call_parse_to_the_same_call_shape() {
        let via_new = parse("new Foo(1)");
        let bare = parse("Foo(1)");
        assert_eq!(format!("{:?}", via_new), format!("{:?}", bare));
    }
}
