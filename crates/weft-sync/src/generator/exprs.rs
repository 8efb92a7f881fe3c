use weft_syntax::{Arguments, Constant, Keyword, NodeId, TextSize, TokenKind};

use super::{Generator, SyncResult};
use crate::nodes::matching_paren;

enum CallArgument<'k> {
    Positional(NodeId),
    Keyword(&'k Keyword),
}

impl Generator<'_> {
    pub(super) fn call(
        &mut self,
        node: NodeId,
        func: NodeId,
        args: &[NodeId],
        keywords: &[Keyword],
    ) -> SyncResult {
        self.visit(func)?;
        let open = self.sync(TokenKind::Op, "(")?;
        self.call_arguments(args, keywords)?;

        let Some(close) = matching_paren(self.tokens, open) else {
            return Err(self.error(TokenKind::Op, ")", None));
        };
        // Parentheses around the last argument come first.
        while self.sync(TokenKind::Op, ")")? < close {}
        self.call_parens.push((node, open, close));
        Ok(())
    }

    /// Positional and keyword arguments, in source order.
    ///
    /// The tree keeps the two kinds apart, so they are merged by start offset.
    pub(super) fn call_arguments(&mut self, args: &[NodeId], keywords: &[Keyword]) -> SyncResult {
        let mut ordered: Vec<(TextSize, CallArgument<'_>)> = args
            .iter()
            .map(|&arg| (self.tree[arg].start, CallArgument::Positional(arg)))
            .chain(keywords.iter().map(|keyword| (keyword.start, CallArgument::Keyword(keyword))))
            .collect();
        ordered.sort_by_key(|&(start, _)| start);

        for (_, argument) in ordered {
            match argument {
                CallArgument::Positional(arg) => self.visit(arg)?,
                CallArgument::Keyword(keyword) => {
                    match &keyword.arg {
                        Some(arg) => {
                            self.sync_name(arg)?;
                            self.sync_op("=")?;
                        }
                        None => self.sync_op("**")?,
                    }
                    self.visit(keyword.value)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn arguments(&mut self, arguments: &Arguments) -> SyncResult {
        let positional: Vec<NodeId> =
            arguments.posonlyargs.iter().chain(&arguments.args).copied().collect();
        let first_default = positional.len().saturating_sub(arguments.defaults.len());

        for (i, &arg) in positional.iter().enumerate() {
            self.visit(arg)?;
            let default = i.checked_sub(first_default).and_then(|d| arguments.defaults.get(d));
            if let Some(&default) = default {
                self.sync_op("=")?;
                self.visit(default)?;
            }
            if i + 1 == arguments.posonlyargs.len() {
                self.sync_op("/")?;
            }
        }

        if let Some(vararg) = arguments.vararg {
            self.sync_op("*")?;
            self.visit(vararg)?;
        } else if !arguments.kwonlyargs.is_empty() {
            self.sync_op("*")?;
        }
        for (&arg, &default) in arguments.kwonlyargs.iter().zip(&arguments.kw_defaults) {
            self.visit(arg)?;
            if let Some(default) = default {
                self.sync_op("=")?;
                self.visit(default)?;
            }
        }

        if let Some(kwarg) = arguments.kwarg {
            self.sync_op("**")?;
            self.visit(kwarg)?;
        }
        Ok(())
    }

    pub(super) fn dict(&mut self, keys: &[Option<NodeId>], values: &[NodeId]) -> SyncResult {
        self.sync_op("{")?;
        for (&key, &value) in keys.iter().zip(values) {
            match key {
                Some(key) => {
                    self.visit(key)?;
                    self.sync_op(":")?;
                }
                None => self.sync_op("**")?,
            }
            self.visit(value)?;
        }
        self.sync_op("}")
    }

    pub(super) fn compare_op(&mut self, op: &str) -> SyncResult {
        match op {
            "not in" | "is not" => op.split(' ').try_for_each(|part| self.sync_name(part)),
            "in" | "is" => self.sync_name(op),
            _ => self.sync_op(op),
        }
    }

    pub(super) fn constant(&mut self, constant: &Constant) -> SyncResult {
        match constant {
            Constant::None | Constant::True | Constant::False => {
                self.sync_name(constant.keyword().unwrap_or_default())
            }
            Constant::Ellipsis => self.sync_op("..."),
            Constant::Number(text) => self.sync(TokenKind::Number, text).map(drop),
            Constant::Str(literals) | Constant::Bytes(literals) => self.strings(literals),
        }
    }

    /// One string token per implicitly concatenated literal.
    pub(super) fn strings(&mut self, literals: &[String]) -> SyncResult {
        literals.iter().try_for_each(|literal| self.sync(TokenKind::String, literal).map(drop))
    }

    /// The second colon is optional and invisible in the tree, so it is synced
    /// only if it is the very next token.
    pub(super) fn slice(
        &mut self,
        lower: Option<NodeId>,
        upper: Option<NodeId>,
        step: Option<NodeId>,
    ) -> SyncResult {
        self.visit_opt(lower)?;
        self.sync_op(":")?;
        self.visit_opt(upper)?;
        match step {
            Some(step) => {
                self.sync_op(":")?;
                self.visit(step)
            }
            None if self.next_token().is_some_and(|token| token.is_op(":")) => self.sync_op(":"),
            None => Ok(()),
        }
    }
}
