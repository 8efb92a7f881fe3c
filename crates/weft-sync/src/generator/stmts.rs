use weft_syntax::{Alias, ClassDef, FunctionDef, NodeId};

use super::{Generator, SyncResult};

impl Generator<'_> {
    /// `:` followed by the statements of a block.
    pub(super) fn suite(&mut self, body: &[NodeId]) -> SyncResult {
        self.sync_op(":")?;
        self.visit_all(body)
    }

    pub(super) fn else_clause(&mut self, orelse: &[NodeId]) -> SyncResult {
        if orelse.is_empty() {
            return Ok(());
        }
        self.sync_name("else")?;
        self.suite(orelse)
    }

    fn decorators(&mut self, decorators: &[NodeId]) -> SyncResult {
        for &decorator in decorators {
            self.sync_op("@")?;
            self.visit(decorator)?;
        }
        Ok(())
    }

    pub(super) fn function_def(&mut self, def: &FunctionDef) -> SyncResult {
        self.decorators(&def.decorators)?;
        self.sync_async(def.is_async)?;
        self.sync_name("def")?;
        self.sync_name(&def.name)?;
        self.sync_op("(")?;
        self.visit(def.args)?;
        self.sync_op(")")?;
        if let Some(returns) = def.returns {
            self.sync_op("->")?;
            self.visit(returns)?;
        }
        self.suite(&def.body)
    }

    pub(super) fn class_def(&mut self, def: &ClassDef) -> SyncResult {
        self.decorators(&def.decorators)?;
        self.sync_name("class")?;
        self.sync_name(&def.name)?;
        self.call_arguments(&def.bases, &def.keywords)?;
        self.suite(&def.body)
    }

    /// An `if` and an `elif` produce the same tree, so the keyword is read from
    /// the token stream. The same goes for an `else` block holding a lone `if`.
    pub(super) fn if_statement(
        &mut self,
        test: NodeId,
        body: &[NodeId],
        orelse: &[NodeId],
    ) -> SyncResult {
        let keyword = if self.peek_is_name("elif") { "elif" } else { "if" };
        self.sync_name(keyword)?;
        self.visit(test)?;
        self.suite(body)?;

        if orelse.is_empty() {
            Ok(())
        } else if self.peek_is_name("else") {
            self.sync_name("else")?;
            self.suite(orelse)
        } else {
            self.visit_all(orelse)
        }
    }

    pub(super) fn import_from(
        &mut self,
        module: Option<&str>,
        names: &[Alias],
        level: u32,
    ) -> SyncResult {
        self.sync_name("from")?;

        let mut remaining = level;
        while remaining > 0 {
            if remaining >= 3 && self.peek_is_op("...") {
                self.sync_op("...")?;
                remaining -= 3;
            } else {
                self.sync_op(".")?;
                remaining -= 1;
            }
        }
        if let Some(module) = module {
            self.sync_dotted(module)?;
        }

        self.sync_name("import")?;
        for alias in names {
            if alias.name == "*" {
                self.sync_op("*")?;
            } else {
                self.sync_name(&alias.name)?;
            }
            self.sync_asname(alias.asname.as_deref())?;
        }
        Ok(())
    }

    pub(super) fn sync_asname(&mut self, asname: Option<&str>) -> SyncResult {
        match asname {
            Some(asname) => {
                self.sync_name("as")?;
                self.sync_name(asname)
            }
            None => Ok(()),
        }
    }
}
