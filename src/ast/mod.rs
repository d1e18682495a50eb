mod expr;
mod stmt;

pub use expr::{BinOp, Expr, LiteralValue, Member, UnOp};
pub use stmt::{Param, Stmt};
