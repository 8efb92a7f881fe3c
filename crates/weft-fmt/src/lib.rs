//! A token-based beautifier for Python source.
//!
//! [`beautify`] walks the linked token sequence once and produces a fresh list of
//! output pieces (words, operators, blanks, line ends and indentation). Spacing is
//! decided from the token kinds, with the syntax tree consulted where tokens alone
//! are ambiguous: unary versus binary operators, slice colons, `*` and `**`
//! unpacking. Long statement lines are split after their first opening bracket and
//! lines continued inside brackets are joined when they fit.
//!
//! Lines between `# pragma: no beautify` and `# pragma: beautify` are copied
//! unchanged.

mod beautifier;
mod lines;
mod output;

use weft_sync::LinkedTree;

/// Beautifier settings, as read from the `[beautify]` table of `weft.toml`.
///
/// A width of zero disables splitting or joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub max_join_width: usize,
    pub max_split_width: usize,
    /// Join continuation lines even when they contain string literals.
    pub allow_joined_strings: bool,
    /// Extra indentation of the arguments of a split line.
    pub tab_width: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_join_width: 88, max_split_width: 88, allow_joined_strings: false, tab_width: 4 }
    }
}

/// Returns the beautified text of `linked`. The tokens and tree are not modified.
pub fn beautify(linked: &LinkedTree, options: &Options) -> String {
    beautifier::Beautifier::new(linked, options).run()
}
