use crate::ast::expr::Expr;
use crate::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    ExpressionStmt(Expr),
    VarDecl {
        name: String,
        declared_type: String,
        initializer: Option<Expr>,
        token: Token,
    },
    FunctionDecl {
        name: String,
        params: Vec<Param>,
        body: Vec<Stmt>,
        token: Token,
    },
    ClassDecl {
        name: String,
        superclass_name: Option<String>,
        fields: Vec<Stmt>,
        methods: Vec<Stmt>,
        token: Token,
    },
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    For {
        iter_name: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return {
        value: Option<Expr>,
        token: Token,
    },
    /// Produced in place of a declaration that failed to parse, so that
    /// panic-mode recovery can keep the surrounding statement list intact
    /// while still surfacing every accumulated parse error at the end.
    Placeholder,
}
