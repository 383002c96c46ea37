//! Expression tree for contract predicates
//!
//! Predicates are small boolean-valued expressions. The tree keeps the
//! shape of the source closely enough that `Display` renders an
//! equivalent, fully parenthesised expression.

use std::fmt;

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Short-circuiting boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),

    /// A free name, resolved against the evaluation bindings
    Name(String),

    /// `object.name`
    Attribute { object: Box<Expr>, name: String },

    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },

    /// `function(args...)`
    Call { function: Box<Expr>, args: Vec<Expr> },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// A comparison chain: `a < b <= c` holds when every link holds
    Compare {
        first: Box<Expr>,
        rest: Vec<(CompareOp, Expr)>,
    },

    /// `then_branch if condition else else_branch`
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    List(Vec<Expr>),

    /// `element for target in iterable if condition`, used both as a list
    /// comprehension and as a generator argument
    Comprehension {
        element: Box<Expr>,
        target: String,
        iterable: Box<Expr>,
        condition: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into())
    }

    pub fn integer(value: i64) -> Self {
        Expr::Literal(Literal::Integer(value))
    }

    /// Names referenced by this expression that are not bound by an
    /// enclosing comprehension
    pub fn free_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_free_names(&mut Vec::new(), &mut names);
        names
    }

    fn collect_free_names<'a>(&'a self, bound: &mut Vec<&'a str>, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Name(name) => {
                if !bound.contains(&name.as_str()) && !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Attribute { object, .. } => object.collect_free_names(bound, out),
            Expr::Index { object, index } => {
                object.collect_free_names(bound, out);
                index.collect_free_names(bound, out);
            }
            Expr::Call { function, args } => {
                function.collect_free_names(bound, out);
                for arg in args {
                    arg.collect_free_names(bound, out);
                }
            }
            Expr::Unary { operand, .. } => operand.collect_free_names(bound, out),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.collect_free_names(bound, out);
                right.collect_free_names(bound, out);
            }
            Expr::Compare { first, rest } => {
                first.collect_free_names(bound, out);
                for (_, expr) in rest {
                    expr.collect_free_names(bound, out);
                }
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_free_names(bound, out);
                then_branch.collect_free_names(bound, out);
                else_branch.collect_free_names(bound, out);
            }
            Expr::List(items) => {
                for item in items {
                    item.collect_free_names(bound, out);
                }
            }
            Expr::Comprehension {
                element,
                target,
                iterable,
                condition,
            } => {
                iterable.collect_free_names(bound, out);
                bound.push(target);
                element.collect_free_names(bound, out);
                if let Some(condition) = condition {
                    condition.collect_free_names(bound, out);
                }
                bound.pop();
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Boolean(true) => write!(f, "True"),
            Literal::Boolean(false) => write!(f, "False"),
            Literal::Nil => write!(f, "None"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "not ",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Less => "<",
            CompareOp::LessEq => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterEq => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        })
    }
}

fn write_comma_separated(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Name(name) => write!(f, "{}", name),
            Expr::Attribute { object, name } => write!(f, "{}.{}", object, name),
            Expr::Index { object, index } => write!(f, "{}[{}]", object, index),
            Expr::Call { function, args } => {
                write!(f, "{}(", function)?;
                write_comma_separated(f, args)?;
                write!(f, ")")
            }
            Expr::Unary { op, operand } => write!(f, "({}{})", op, operand),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Logical { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Compare { first, rest } => {
                write!(f, "({}", first)?;
                for (op, expr) in rest {
                    write!(f, " {} {}", op, expr)?;
                }
                write!(f, ")")
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} if {} else {})", then_branch, condition, else_branch),
            Expr::List(items) => {
                write!(f, "[")?;
                write_comma_separated(f, items)?;
                write!(f, "]")
            }
            Expr::Comprehension {
                element,
                target,
                iterable,
                condition,
            } => {
                write!(f, "[{} for {} in {}", element, target, iterable)?;
                if let Some(condition) = condition {
                    write!(f, " if {}", condition)?;
                }
                write!(f, "]")
            }
        }
    }
}
