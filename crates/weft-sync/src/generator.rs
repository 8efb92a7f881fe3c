use weft_syntax::{NodeId, NodeKind, SyntaxTree, Token, TokenKind, TokenRange, Tokens};

use crate::SyncError;
use crate::nodes::find_statement_node;

mod exprs;
mod stmts;

pub(crate) type SyncResult<T = ()> = Result<T, SyncError>;

/// A call node with the indices of its opening and closing parenthesis.
pub(crate) type CallParens = (NodeId, usize, usize);

/// Walks the tree in token order, one grammar rule per node kind.
///
/// Each rule names the fixed lexemes of its construct and visits the children
/// in between. A lexeme is matched by [`Generator::sync`], which advances a
/// cursor through the token sequence and links what it finds to the current
/// node.
pub(crate) struct Generator<'a> {
    file_name: &'a str,
    tokens: &'a mut Tokens,
    tree: &'a mut SyntaxTree,
    /// Index of the last synced token.
    px: Option<usize>,
    /// The node whose rule is running.
    node: NodeId,
    next_index: u32,
    /// Statement owning the most recent significant token.
    last_statement: Option<NodeId>,
    call_parens: Vec<CallParens>,
}

impl<'a> Generator<'a> {
    pub(crate) fn new(
        file_name: &'a str,
        tokens: &'a mut Tokens,
        tree: &'a mut SyntaxTree,
    ) -> Self {
        let node = tree.root();
        Self {
            file_name,
            tokens,
            tree,
            px: None,
            node,
            next_index: 0,
            last_statement: None,
            call_parens: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> SyncResult<Vec<CallParens>> {
        let root = self.tree.root();
        self.visit(root)?;
        Ok(self.call_parens)
    }

    fn visit(&mut self, node: NodeId) -> SyncResult {
        let parent = (node != self.tree.root()).then_some(self.node);
        debug_assert!(self.tree[node].node_index.is_none(), "{node:?} visited twice");

        self.tree[node].parent = parent;
        self.tree[node].node_index = Some(self.next_index);
        self.next_index += 1;
        if let Some(parent) = parent {
            self.tree[parent].children.push(node);
        }

        self.node = node;
        let kind = self.tree[node].kind.clone();
        self.rule(node, &kind)?;
        self.node = parent.unwrap_or(node);

        if let (Some(parent), Some(range)) = (parent, self.tree[node].token_range) {
            self.tree[parent].cover(range);
        }
        Ok(())
    }

    fn visit_all(&mut self, nodes: &[NodeId]) -> SyncResult {
        nodes.iter().try_for_each(|&node| self.visit(node))
    }

    fn visit_opt(&mut self, node: Option<NodeId>) -> SyncResult {
        node.map_or(Ok(()), |node| self.visit(node))
    }

    fn rule(&mut self, node: NodeId, kind: &NodeKind) -> SyncResult {
        match kind {
            NodeKind::Module { body } => {
                self.visit_all(body)?;
                self.sync(TokenKind::EndMarker, "")?;
            }

            NodeKind::FunctionDef(def) => self.function_def(def)?,
            NodeKind::ClassDef(def) => self.class_def(def)?,
            NodeKind::Return { value } => {
                self.sync_name("return")?;
                self.visit_opt(*value)?;
            }
            NodeKind::Delete { targets } => {
                self.sync_name("del")?;
                self.visit_all(targets)?;
            }
            NodeKind::Assign { targets, value } => {
                for &target in targets {
                    self.visit(target)?;
                    self.sync_op("=")?;
                }
                self.visit(*value)?;
            }
            NodeKind::AugAssign { target, op, value } => {
                self.visit(*target)?;
                self.sync_op(&format!("{}=", op.as_str()))?;
                self.visit(*value)?;
            }
            NodeKind::AnnAssign { target, annotation, value } => {
                self.visit(*target)?;
                self.sync_op(":")?;
                self.visit(*annotation)?;
                if let Some(value) = *value {
                    self.sync_op("=")?;
                    self.visit(value)?;
                }
            }
            NodeKind::For { is_async, target, iter, body, orelse } => {
                self.sync_async(*is_async)?;
                self.sync_name("for")?;
                self.visit(*target)?;
                self.sync_name("in")?;
                self.visit(*iter)?;
                self.suite(body)?;
                self.else_clause(orelse)?;
            }
            NodeKind::While { test, body, orelse } => {
                self.sync_name("while")?;
                self.visit(*test)?;
                self.suite(body)?;
                self.else_clause(orelse)?;
            }
            NodeKind::If { test, body, orelse } => self.if_statement(*test, body, orelse)?,
            NodeKind::With { is_async, items, body } => {
                self.sync_async(*is_async)?;
                self.sync_name("with")?;
                for item in items {
                    self.visit(item.context_expr)?;
                    if let Some(vars) = item.optional_vars {
                        self.sync_name("as")?;
                        self.visit(vars)?;
                    }
                }
                self.suite(body)?;
            }
            NodeKind::Raise { exc, cause } => {
                self.sync_name("raise")?;
                self.visit_opt(*exc)?;
                if let Some(cause) = *cause {
                    self.sync_name("from")?;
                    self.visit(cause)?;
                }
            }
            NodeKind::Try { body, handlers, orelse, finalbody } => {
                self.sync_name("try")?;
                self.suite(body)?;
                self.visit_all(handlers)?;
                self.else_clause(orelse)?;
                if !finalbody.is_empty() {
                    self.sync_name("finally")?;
                    self.suite(finalbody)?;
                }
            }
            NodeKind::ExceptHandler { typ, name, body } => {
                self.sync_name("except")?;
                self.visit_opt(*typ)?;
                if let Some(name) = name {
                    self.sync_name("as")?;
                    self.sync_name(name)?;
                }
                self.suite(body)?;
            }
            NodeKind::Assert { test, msg } => {
                self.sync_name("assert")?;
                self.visit(*test)?;
                self.visit_opt(*msg)?;
            }
            NodeKind::Import { names } => {
                self.sync_name("import")?;
                for alias in names {
                    self.sync_dotted(&alias.name)?;
                    self.sync_asname(alias.asname.as_deref())?;
                }
            }
            NodeKind::ImportFrom { module, names, level } => {
                self.import_from(module.as_deref(), names, *level)?;
            }
            NodeKind::Global { names } => {
                self.sync_name("global")?;
                self.sync_names(names)?;
            }
            NodeKind::Nonlocal { names } => {
                self.sync_name("nonlocal")?;
                self.sync_names(names)?;
            }
            NodeKind::Expr { value } => self.visit(*value)?,
            NodeKind::Pass => self.sync_name("pass")?,
            NodeKind::Break => self.sync_name("break")?,
            NodeKind::Continue => self.sync_name("continue")?,

            NodeKind::BoolOp { op, values } => {
                for (i, &value) in values.iter().enumerate() {
                    if i > 0 {
                        self.sync_name(op.as_str())?;
                    }
                    self.visit(value)?;
                }
            }
            NodeKind::NamedExpr { target, value } => {
                self.visit(*target)?;
                self.sync_op(":=")?;
                self.visit(*value)?;
            }
            NodeKind::BinOp { left, op, right } => {
                self.visit(*left)?;
                self.sync_op(op.as_str())?;
                self.visit(*right)?;
            }
            NodeKind::UnaryOp { op, operand } => {
                let op = op.as_str();
                if op == "not" {
                    self.sync_name(op)?;
                } else {
                    self.sync_op(op)?;
                }
                self.visit(*operand)?;
            }
            NodeKind::Lambda { args, body } => {
                self.sync_name("lambda")?;
                self.visit(*args)?;
                self.sync_op(":")?;
                self.visit(*body)?;
            }
            NodeKind::IfExp { test, body, orelse } => {
                self.visit(*body)?;
                self.sync_name("if")?;
                self.visit(*test)?;
                self.sync_name("else")?;
                self.visit(*orelse)?;
            }
            NodeKind::Dict { keys, values } => self.dict(keys, values)?,
            NodeKind::Set { elts } => {
                self.sync_op("{")?;
                self.visit_all(elts)?;
                self.sync_op("}")?;
            }
            NodeKind::ListComp { elt, generators } => {
                self.sync_op("[")?;
                self.visit(*elt)?;
                self.visit_all(generators)?;
                self.sync_op("]")?;
            }
            NodeKind::SetComp { elt, generators } => {
                self.sync_op("{")?;
                self.visit(*elt)?;
                self.visit_all(generators)?;
                self.sync_op("}")?;
            }
            NodeKind::DictComp { key, value, generators } => {
                self.sync_op("{")?;
                self.visit(*key)?;
                self.sync_op(":")?;
                self.visit(*value)?;
                self.visit_all(generators)?;
                self.sync_op("}")?;
            }
            NodeKind::GeneratorExp { elt, generators } => {
                self.visit(*elt)?;
                self.visit_all(generators)?;
            }
            NodeKind::Await { value } => {
                self.sync_name("await")?;
                self.visit(*value)?;
            }
            NodeKind::Yield { value } => {
                self.sync_name("yield")?;
                self.visit_opt(*value)?;
            }
            NodeKind::YieldFrom { value } => {
                self.sync_name("yield")?;
                self.sync_name("from")?;
                self.visit(*value)?;
            }
            NodeKind::Compare { left, ops, comparators } => {
                self.visit(*left)?;
                for (op, &comparator) in ops.iter().zip(comparators) {
                    self.compare_op(op.as_str())?;
                    self.visit(comparator)?;
                }
            }
            NodeKind::Call { func, args, keywords } => self.call(node, *func, args, keywords)?,
            NodeKind::Constant(constant) => self.constant(constant)?,
            NodeKind::JoinedStr { literals } => self.strings(literals)?,
            NodeKind::Attribute { value, attr } => {
                self.visit(*value)?;
                self.sync_op(".")?;
                self.sync_name(attr)?;
            }
            NodeKind::Subscript { value, slice } => {
                self.visit(*value)?;
                self.sync_op("[")?;
                self.visit(*slice)?;
                self.sync_op("]")?;
            }
            NodeKind::Starred { value } => {
                self.sync_op("*")?;
                self.visit(*value)?;
            }
            NodeKind::Name { id } => self.sync_name(id)?,
            NodeKind::List { elts } => {
                self.sync_op("[")?;
                self.visit_all(elts)?;
                self.sync_op("]")?;
            }
            NodeKind::Tuple { elts } => self.visit_all(elts)?,
            NodeKind::Slice { lower, upper, step } => self.slice(*lower, *upper, *step)?,

            NodeKind::Comprehension { is_async, target, iter, ifs } => {
                self.sync_async(*is_async)?;
                self.sync_name("for")?;
                self.visit(*target)?;
                self.sync_name("in")?;
                self.visit(*iter)?;
                for &condition in ifs {
                    self.sync_name("if")?;
                    self.visit(condition)?;
                }
            }
            NodeKind::Arguments(arguments) => self.arguments(arguments)?,
            NodeKind::Arg { name, annotation } => {
                self.sync_name(name)?;
                if let Some(annotation) = *annotation {
                    self.sync_op(":")?;
                    self.visit(annotation)?;
                }
            }
        }
        Ok(())
    }

    /// Scans forward for the token `(kind, text)` and links it to the current node.
    ///
    /// Insignificant tokens on the way are skipped; comments are attached to the
    /// current node and line ends are tagged with the last statement. A
    /// significant token that does not match is an error.
    fn sync(&mut self, kind: TokenKind, text: &str) -> SyncResult<usize> {
        let start = self.px.map_or(0, |px| px + 1);

        let mut found = None;
        for (index, token) in self.tokens.as_slice().iter().enumerate().skip(start) {
            if token.kind == kind && token.text == text {
                found = Some(index);
                break;
            }
            if token.is_significant() {
                return Err(self.error(kind, text, Some(index)));
            }
        }
        let Some(index) = found else {
            return Err(self.error(kind, text, None));
        };

        for skipped in start..index {
            self.attach(skipped);
        }
        self.link(index)?;
        self.px = Some(index);
        tracing::trace!(index, %kind, text, node = self.tree.kind(self.node).name(), "sync");
        Ok(index)
    }

    fn sync_name(&mut self, text: &str) -> SyncResult {
        self.sync(TokenKind::Name, text).map(drop)
    }

    fn sync_op(&mut self, text: &str) -> SyncResult {
        self.sync(TokenKind::Op, text).map(drop)
    }

    fn sync_names(&mut self, names: &[String]) -> SyncResult {
        names.iter().try_for_each(|name| self.sync_name(name))
    }

    /// `a.b.c` as three names separated by dots.
    fn sync_dotted(&mut self, name: &str) -> SyncResult {
        for (i, part) in name.split('.').enumerate() {
            if i > 0 {
                self.sync_op(".")?;
            }
            self.sync_name(part)?;
        }
        Ok(())
    }

    fn sync_async(&mut self, is_async: bool) -> SyncResult {
        if is_async { self.sync_name("async") } else { Ok(()) }
    }

    /// The next significant token, without moving the cursor.
    fn peek(&self) -> Option<&Token> {
        self.tokens.next_significant(self.px)
    }

    /// The next token that is not whitespace or a comment, commas and parentheses
    /// included.
    fn next_token(&self) -> Option<&Token> {
        let start = self.px.map_or(0, |px| px + 1);
        self.tokens.as_slice().get(start..)?.iter().find(|token| {
            !matches!(
                token.kind,
                TokenKind::Ws | TokenKind::Comment | TokenKind::Nl | TokenKind::Newline
            )
        })
    }

    fn peek_is_op(&self, text: &str) -> bool {
        self.peek().is_some_and(|token| token.is_op(text))
    }

    fn peek_is_name(&self, text: &str) -> bool {
        self.peek().is_some_and(|token| token.is_name(text))
    }

    /// Records a skipped token that is not part of any grammar rule.
    fn attach(&mut self, index: usize) {
        match self.tokens[index].kind {
            TokenKind::Comment => self.tree[self.node].comments.push(index),
            TokenKind::Newline | TokenKind::Nl => {
                self.tokens[index].statement = self.last_statement;
            }
            _ => {}
        }
    }

    fn link(&mut self, index: usize) -> SyncResult {
        let token = &self.tokens[index];
        if !token.is_significant() {
            return Ok(());
        }
        if let Some(owner) = token.node {
            return Err(SyncError {
                file: self.file_name.to_owned(),
                line: token.line_number,
                expected: "an unlinked token".to_owned(),
                found: format!("{} linked to {}", token.show(), self.tree.kind(owner).name()),
                index,
            });
        }

        if token.kind != TokenKind::EndMarker {
            self.last_statement = find_statement_node(self.tree, self.node);
        }
        self.tokens[index].node = Some(self.node);
        self.tree[self.node].cover(TokenRange::single(index));
        Ok(())
    }

    fn error(&self, kind: TokenKind, text: &str, at: Option<usize>) -> SyncError {
        let expected = match kind {
            TokenKind::EndMarker => "end of file".to_owned(),
            kind => format!("{kind} {text:?}"),
        };
        match at.and_then(|index| self.tokens.get(index)) {
            Some(token) => SyncError {
                file: self.file_name.to_owned(),
                line: token.line_number,
                expected,
                found: token.show(),
                index: token.index,
            },
            None => SyncError {
                file: self.file_name.to_owned(),
                line: self.tokens.as_slice().last().map_or(0, |token| token.line_number),
                expected,
                found: "end of token list".to_owned(),
                index: self.tokens.len(),
            },
        }
    }
}
