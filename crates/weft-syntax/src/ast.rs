use text_size::TextSize;

use crate::NodeId;

/// Python's abstract grammar, one variant per node class.
///
/// Child nodes are referenced by [`NodeId`]; records that are never visited on
/// their own (keyword arguments, import aliases, with-items) are stored inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Module { body: Vec<NodeId> },

    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return { value: Option<NodeId> },
    Delete { targets: Vec<NodeId> },
    Assign { targets: Vec<NodeId>, value: NodeId },
    AugAssign { target: NodeId, op: BinOpKind, value: NodeId },
    AnnAssign { target: NodeId, annotation: NodeId, value: Option<NodeId> },
    For { is_async: bool, target: NodeId, iter: NodeId, body: Vec<NodeId>, orelse: Vec<NodeId> },
    While { test: NodeId, body: Vec<NodeId>, orelse: Vec<NodeId> },
    If { test: NodeId, body: Vec<NodeId>, orelse: Vec<NodeId> },
    With { is_async: bool, items: Vec<WithItem>, body: Vec<NodeId> },
    Raise { exc: Option<NodeId>, cause: Option<NodeId> },
    Try { body: Vec<NodeId>, handlers: Vec<NodeId>, orelse: Vec<NodeId>, finalbody: Vec<NodeId> },
    ExceptHandler { typ: Option<NodeId>, name: Option<String>, body: Vec<NodeId> },
    Assert { test: NodeId, msg: Option<NodeId> },
    Import { names: Vec<Alias> },
    ImportFrom { module: Option<String>, names: Vec<Alias>, level: u32 },
    Global { names: Vec<String> },
    Nonlocal { names: Vec<String> },
    Expr { value: NodeId },
    Pass,
    Break,
    Continue,

    BoolOp { op: BoolOpKind, values: Vec<NodeId> },
    NamedExpr { target: NodeId, value: NodeId },
    BinOp { left: NodeId, op: BinOpKind, right: NodeId },
    UnaryOp { op: UnaryOpKind, operand: NodeId },
    Lambda { args: NodeId, body: NodeId },
    IfExp { test: NodeId, body: NodeId, orelse: NodeId },
    Dict { keys: Vec<Option<NodeId>>, values: Vec<NodeId> },
    Set { elts: Vec<NodeId> },
    ListComp { elt: NodeId, generators: Vec<NodeId> },
    SetComp { elt: NodeId, generators: Vec<NodeId> },
    DictComp { key: NodeId, value: NodeId, generators: Vec<NodeId> },
    GeneratorExp { elt: NodeId, generators: Vec<NodeId> },
    Await { value: NodeId },
    Yield { value: Option<NodeId> },
    YieldFrom { value: NodeId },
    Compare { left: NodeId, ops: Vec<CmpOpKind>, comparators: Vec<NodeId> },
    Call { func: NodeId, args: Vec<NodeId>, keywords: Vec<Keyword> },
    Constant(Constant),
    /// An f-string, possibly implicitly concatenated with plain literals.
    JoinedStr { literals: Vec<String> },
    Attribute { value: NodeId, attr: String },
    Subscript { value: NodeId, slice: NodeId },
    Starred { value: NodeId },
    Name { id: String },
    List { elts: Vec<NodeId> },
    Tuple { elts: Vec<NodeId> },
    Slice { lower: Option<NodeId>, upper: Option<NodeId>, step: Option<NodeId> },

    Comprehension { is_async: bool, target: NodeId, iter: NodeId, ifs: Vec<NodeId> },
    Arguments(Arguments),
    Arg { name: String, annotation: Option<NodeId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub is_async: bool,
    pub name: String,
    pub decorators: Vec<NodeId>,
    pub args: NodeId,
    pub returns: Option<NodeId>,
    pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub decorators: Vec<NodeId>,
    pub bases: Vec<NodeId>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    pub posonlyargs: Vec<NodeId>,
    pub args: Vec<NodeId>,
    pub vararg: Option<NodeId>,
    pub kwonlyargs: Vec<NodeId>,
    /// One entry per keyword-only argument.
    pub kw_defaults: Vec<Option<NodeId>>,
    pub kwarg: Option<NodeId>,
    /// Defaults of the last positional arguments.
    pub defaults: Vec<NodeId>,
}

/// `name=value` or `**value` inside a call or a class header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: NodeId,
    /// Offset of the keyword's first character.
    pub start: TextSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Possibly dotted.
    pub name: String,
    pub asname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithItem {
    pub context_expr: NodeId,
    pub optional_vars: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    None,
    True,
    False,
    Ellipsis,
    Number(String),
    /// Source text of each implicitly concatenated literal.
    Str(Vec<String>),
    Bytes(Vec<String>),
}

impl Constant {
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::None => Some("None"),
            Self::True => Some("True"),
            Self::False => Some("False"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOpKind {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

impl BinOpKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mult => "*",
            Self::MatMult => "@",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
            Self::FloorDiv => "//",
        }
    }

    pub fn from_op(text: &str) -> Option<Self> {
        Some(match text {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mult,
            "@" => Self::MatMult,
            "/" => Self::Div,
            "%" => Self::Mod,
            "**" => Self::Pow,
            "<<" => Self::LShift,
            ">>" => Self::RShift,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "&" => Self::BitAnd,
            "//" => Self::FloorDiv,
            _ => return None,
        })
    }

    /// Maps `+=` and friends to the underlying operator.
    pub fn from_augmented(text: &str) -> Option<Self> {
        Self::from_op(text.strip_suffix('=')?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOpKind {
    Invert,
    Not,
    UAdd,
    USub,
}

impl UnaryOpKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invert => "~",
            Self::Not => "not",
            Self::UAdd => "+",
            Self::USub => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOpKind {
    And,
    Or,
}

impl BoolOpKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOpKind {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOpKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtE => "<=",
            Self::Gt => ">",
            Self::GtE => ">=",
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}

impl NodeKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Module { .. } => "Module",
            Self::FunctionDef(_) => "FunctionDef",
            Self::ClassDef(_) => "ClassDef",
            Self::Return { .. } => "Return",
            Self::Delete { .. } => "Delete",
            Self::Assign { .. } => "Assign",
            Self::AugAssign { .. } => "AugAssign",
            Self::AnnAssign { .. } => "AnnAssign",
            Self::For { .. } => "For",
            Self::While { .. } => "While",
            Self::If { .. } => "If",
            Self::With { .. } => "With",
            Self::Raise { .. } => "Raise",
            Self::Try { .. } => "Try",
            Self::ExceptHandler { .. } => "ExceptHandler",
            Self::Assert { .. } => "Assert",
            Self::Import { .. } => "Import",
            Self::ImportFrom { .. } => "ImportFrom",
            Self::Global { .. } => "Global",
            Self::Nonlocal { .. } => "Nonlocal",
            Self::Expr { .. } => "Expr",
            Self::Pass => "Pass",
            Self::Break => "Break",
            Self::Continue => "Continue",
            Self::BoolOp { .. } => "BoolOp",
            Self::NamedExpr { .. } => "NamedExpr",
            Self::BinOp { .. } => "BinOp",
            Self::UnaryOp { .. } => "UnaryOp",
            Self::Lambda { .. } => "Lambda",
            Self::IfExp { .. } => "IfExp",
            Self::Dict { .. } => "Dict",
            Self::Set { .. } => "Set",
            Self::ListComp { .. } => "ListComp",
            Self::SetComp { .. } => "SetComp",
            Self::DictComp { .. } => "DictComp",
            Self::GeneratorExp { .. } => "GeneratorExp",
            Self::Await { .. } => "Await",
            Self::Yield { .. } => "Yield",
            Self::YieldFrom { .. } => "YieldFrom",
            Self::Compare { .. } => "Compare",
            Self::Call { .. } => "Call",
            Self::Constant(_) => "Constant",
            Self::JoinedStr { .. } => "JoinedStr",
            Self::Attribute { .. } => "Attribute",
            Self::Subscript { .. } => "Subscript",
            Self::Starred { .. } => "Starred",
            Self::Name { .. } => "Name",
            Self::List { .. } => "List",
            Self::Tuple { .. } => "Tuple",
            Self::Slice { .. } => "Slice",
            Self::Comprehension { .. } => "Comprehension",
            Self::Arguments(_) => "Arguments",
            Self::Arg { .. } => "Arg",
        }
    }

    /// Every child slot of this node, in field order.
    pub fn slots_mut(&mut self) -> Vec<&mut NodeId> {
        let mut slots = Vec::new();
        match self {
            Self::Pass
            | Self::Break
            | Self::Continue
            | Self::Import { .. }
            | Self::ImportFrom { .. }
            | Self::Global { .. }
            | Self::Nonlocal { .. }
            | Self::Constant(_)
            | Self::JoinedStr { .. }
            | Self::Name { .. } => {}
            Self::Module { body } => slots.extend(body),
            Self::FunctionDef(def) => {
                slots.extend(&mut def.decorators);
                slots.push(&mut def.args);
                slots.extend(&mut def.returns);
                slots.extend(&mut def.body);
            }
            Self::ClassDef(def) => {
                slots.extend(&mut def.decorators);
                slots.extend(&mut def.bases);
                slots.extend(def.keywords.iter_mut().map(|keyword| &mut keyword.value));
                slots.extend(&mut def.body);
            }
            Self::Return { value } | Self::Yield { value } => slots.extend(value),
            Self::Delete { targets } => slots.extend(targets),
            Self::Assign { targets, value } => {
                slots.extend(targets);
                slots.push(value);
            }
            Self::AugAssign { target, value, .. } => slots.extend([target, value]),
            Self::AnnAssign { target, annotation, value } => {
                slots.extend([target, annotation]);
                slots.extend(value);
            }
            Self::For { target, iter, body, orelse, .. } => {
                slots.extend([target, iter]);
                slots.extend(body);
                slots.extend(orelse);
            }
            Self::While { test, body, orelse } | Self::If { test, body, orelse } => {
                slots.push(test);
                slots.extend(body);
                slots.extend(orelse);
            }
            Self::With { items, body, .. } => {
                for item in items {
                    slots.push(&mut item.context_expr);
                    slots.extend(&mut item.optional_vars);
                }
                slots.extend(body);
            }
            Self::Raise { exc, cause } => {
                slots.extend(exc);
                slots.extend(cause);
            }
            Self::Try { body, handlers, orelse, finalbody } => {
                slots.extend(body);
                slots.extend(handlers);
                slots.extend(orelse);
                slots.extend(finalbody);
            }
            Self::ExceptHandler { typ, body, .. } => {
                slots.extend(typ);
                slots.extend(body);
            }
            Self::Assert { test, msg } => {
                slots.push(test);
                slots.extend(msg);
            }
            Self::Expr { value }
            | Self::Await { value }
            | Self::YieldFrom { value }
            | Self::Starred { value }
            | Self::Attribute { value, .. } => slots.push(value),
            Self::BoolOp { values, .. } => slots.extend(values),
            Self::NamedExpr { target, value } => slots.extend([target, value]),
            Self::BinOp { left, right, .. } => slots.extend([left, right]),
            Self::UnaryOp { operand, .. } => slots.push(operand),
            Self::Lambda { args, body } => slots.extend([args, body]),
            Self::IfExp { test, body, orelse } => slots.extend([test, body, orelse]),
            Self::Dict { keys, values } => {
                for (key, value) in keys.iter_mut().zip(values) {
                    slots.extend(key);
                    slots.push(value);
                }
            }
            Self::Set { elts } | Self::List { elts } | Self::Tuple { elts } => slots.extend(elts),
            Self::ListComp { elt, generators }
            | Self::SetComp { elt, generators }
            | Self::GeneratorExp { elt, generators } => {
                slots.push(elt);
                slots.extend(generators);
            }
            Self::DictComp { key, value, generators } => {
                slots.extend([key, value]);
                slots.extend(generators);
            }
            Self::Compare { left, comparators, .. } => {
                slots.push(left);
                slots.extend(comparators);
            }
            Self::Call { func, args, keywords } => {
                slots.push(func);
                slots.extend(args);
                slots.extend(keywords.iter_mut().map(|keyword| &mut keyword.value));
            }
            Self::Subscript { value, slice } => slots.extend([value, slice]),
            Self::Slice { lower, upper, step } => {
                slots.extend(lower);
                slots.extend(upper);
                slots.extend(step);
            }
            Self::Comprehension { target, iter, ifs, .. } => {
                slots.extend([target, iter]);
                slots.extend(ifs);
            }
            Self::Arguments(arguments) => {
                slots.extend(&mut arguments.posonlyargs);
                slots.extend(&mut arguments.args);
                slots.extend(&mut arguments.vararg);
                slots.extend(&mut arguments.kwonlyargs);
                slots.extend(arguments.kw_defaults.iter_mut().flatten());
                slots.extend(&mut arguments.kwarg);
                slots.extend(&mut arguments.defaults);
            }
            Self::Arg { annotation, .. } => slots.extend(annotation),
        }
        slots
    }

    pub fn slots(&self) -> Vec<NodeId> {
        let mut kind = self.clone();
        kind.slots_mut().into_iter().map(|slot| *slot).collect()
    }

    /// Statements that the beautifier may split across lines.
    pub const fn is_long_statement(&self) -> bool {
        matches!(
            self,
            Self::Assign { .. }
                | Self::AnnAssign { .. }
                | Self::AugAssign { .. }
                | Self::Call { .. }
                | Self::Delete { .. }
                | Self::ExceptHandler { .. }
                | Self::For { .. }
                | Self::Global { .. }
                | Self::If { .. }
                | Self::Import { .. }
                | Self::ImportFrom { .. }
                | Self::Nonlocal { .. }
                | Self::Return { .. }
                | Self::While { .. }
                | Self::With { .. }
                | Self::Yield { .. }
                | Self::YieldFrom { .. }
        )
    }

    pub const fn is_statement(&self) -> bool {
        self.is_long_statement()
            || matches!(self, Self::Break | Self::Continue | Self::Pass | Self::Try { .. })
    }
}
