//! Indentation-driven contextual parser.
//!
//! The parser knows nothing about any vendor syntax. A grammar registers
//! commands against named contexts; each command is a regular expression
//! (anchored at both ends, case-insensitive) with an optional action and an
//! optional child context entered by the block the command opens.
//!
//! For every non-blank line the parser:
//! 1. closes the blocks the line's indentation ends,
//! 2. takes the context and a private copy of the params of the innermost
//!    open block (the root context `"."` when none is open),
//! 3. tries the context's commands in registration order and runs the
//!    action of the first that matches,
//! 4. opens a block for the line, recording the child context (if the
//!    command names one that has commands) and the possibly-refined params.
//!
//! Lines nothing matches are skipped, but they still open a block so their
//! indented children are skipped as well. Errors raised by actions abort
//! the parse and are returned wrapped with the offending line.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut parser = ContextParser::<MyTarget>::new();
//! parser.register(".", r"vlan (?P<tag>\d+)", Some(cmd_vlan), Some("vlan"))?;
//! parser.register("vlan", r"name (?P<name>\S+)", Some(cmd_vlan_name), None)?;
//!
//! let target: MyTarget = parser.parse(text)?;
//! ```

pub mod context;

pub use context::{ContextStack, Frame, ROOT_CONTEXT};

use crate::error::{Error, Result};
use indexmap::IndexMap;
use regex::{Captures, Regex, RegexBuilder};
use std::fmt;
use tracing::{debug, debug_span, trace};

/// State a grammar builds up while lines are parsed.
pub trait ParseTarget {
    /// Values carried from a block into the lines nested inside it.
    type Params: Clone + Default + fmt::Debug;

    /// The part of the target a context's lines operate on.
    type Section: ?Sized;

    /// Resolve the section the given params point at, if any.
    fn section_mut(&mut self, params: &Self::Params) -> Option<&mut Self::Section>;

    /// Called once after the last line, to flush any buffered state.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Handler run when a command matches.
pub type Action<T> = fn(&Groups<'_>, &mut Scope<'_, T>) -> Result<()>;

/// Named capture groups of a matched line.
#[derive(Debug)]
pub struct Groups<'t> {
    caps: Captures<'t>,
}

impl<'t> Groups<'t> {
    /// Text captured by `name`, if the group took part in the match.
    pub fn get(&self, name: &str) -> Option<&'t str> {
        self.caps.name(name).map(|m| m.as_str())
    }

    /// Text captured by `name`, failing if the group did not take part.
    pub fn require(&self, name: &str) -> Result<&'t str> {
        self.get(name).ok_or_else(|| Error::MissingGroup(name.to_string()))
    }

    /// The whole matched text, without indentation.
    pub fn text(&self) -> &'t str {
        self.caps.get(0).map_or("", |m| m.as_str())
    }

    /// Whether `name` took part in the match.
    pub fn has(&self, name: &str) -> bool {
        self.caps.name(name).is_some()
    }
}

/// What an action gets to work with: the whole target and the params of
/// the block being opened.
pub struct Scope<'a, T: ParseTarget> {
    target: &'a mut T,
    params: &'a mut T::Params,
}

impl<'a, T: ParseTarget> Scope<'a, T> {
    pub fn new(target: &'a mut T, params: &'a mut T::Params) -> Self {
        Self { target, params }
    }

    pub fn target(&mut self) -> &mut T {
        &mut *self.target
    }

    pub fn params(&self) -> &T::Params {
        &*self.params
    }

    /// Params handed to the lines nested under this one.
    pub fn params_mut(&mut self) -> &mut T::Params {
        &mut *self.params
    }

    /// The section the current params point at, if any.
    pub fn section(&mut self) -> Option<&mut T::Section> {
        self.target.section_mut(&*self.params)
    }
}

/// One registered command.
pub struct Command<T: ParseTarget> {
    pattern: String,
    regex: Regex,
    action: Option<Action<T>>,
    enter_context: Option<String>,
}

impl<T: ParseTarget> Command<T> {
    /// The pattern as registered, without anchors.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn enter_context(&self) -> Option<&str> {
        self.enter_context.as_deref()
    }
}

impl<T: ParseTarget> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("pattern", &self.pattern)
            .field("has_action", &self.action.is_some())
            .field("enter_context", &self.enter_context)
            .finish()
    }
}

/// Line counts from one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read, including blank ones
    pub lines: usize,
    /// Blank or whitespace-only lines
    pub blank: usize,
    /// Lines that matched a command
    pub matched: usize,
    /// Non-blank lines nothing matched
    pub ignored: usize,
}

/// Command table plus the parsing loop that drives it.
pub struct ContextParser<T: ParseTarget> {
    dialect: String,
    commands: IndexMap<String, Vec<Command<T>>>,
}

impl<T: ParseTarget> Default for ContextParser<T> {
    fn default() -> Self {
        Self {
            dialect: String::new(),
            commands: IndexMap::new(),
        }
    }
}

impl<T: ParseTarget> fmt::Debug for ContextParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextParser")
            .field("dialect", &self.dialect)
            .field("commands", &self.commands)
            .finish()
    }
}

impl<T: ParseTarget> ContextParser<T> {
    /// Create a parser with no commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with no commands, labelled with the dialect its
    /// grammar implements (used in log spans).
    pub fn named(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            ..Self::default()
        }
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Add a command to the end of `context`'s list.
    ///
    /// `enter_context` need not have any commands yet; it is looked up when
    /// a line matches, and a context without commands makes the block
    /// opaque.
    pub fn register(
        &mut self,
        context: &str,
        pattern: &str,
        action: Option<Action<T>>,
        enter_context: Option<&str>,
    ) -> Result<&mut Self> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
            .map_err(|source| Error::InvalidPattern {
                context: context.to_string(),
                pattern: pattern.to_string(),
                source,
            })?;

        self.commands
            .entry(context.to_string())
            .or_default()
            .push(Command {
                pattern: pattern.to_string(),
                regex,
                action,
                enter_context: enter_context.map(String::from),
            });

        Ok(self)
    }

    /// Commands registered for `context`, in match order.
    pub fn commands(&self, context: &str) -> &[Command<T>] {
        self.commands
            .get(context)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `context` has at least one command.
    pub fn has_context(&self, context: &str) -> bool {
        !self.commands(context).is_empty()
    }

    fn find<'t>(&self, context: &str, text: &'t str) -> Option<(&Command<T>, Captures<'t>)> {
        self.commands(context)
            .iter()
            .find_map(|command| command.regex.captures(text).map(|caps| (command, caps)))
    }

    /// Parse `text` into a fresh target.
    pub fn parse(&self, text: &str) -> Result<T>
    where
        T: Default,
    {
        let mut target = T::default();
        self.parse_into(&mut target, text.lines())?;
        Ok(target)
    }

    /// Parse `lines` into an existing target, then let it finish.
    pub fn parse_into<I, S>(&self, target: &mut T, lines: I) -> Result<ParseStats>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let span = debug_span!("parse", dialect = %self.dialect);
        let _guard = span.enter();

        let mut stack: ContextStack<T::Params> = ContextStack::new();
        let mut stats = ParseStats::default();

        for (index, raw) in lines.into_iter().enumerate() {
            let line_no = index + 1;
            let line = raw.as_ref().trim_end();
            stats.lines += 1;

            if line.trim_start().is_empty() {
                stats.blank += 1;
                continue;
            }

            let text = line.trim_start_matches(' ');
            let indent = line.len() - text.len();

            stack.close_to(indent);
            let mut params = stack.params();
            let mut child_context = None;

            match stack
                .current_context()
                .and_then(|context| self.find(context, text).map(|found| (context, found)))
            {
                Some((context, (command, caps))) => {
                    stats.matched += 1;
                    trace!(line_no, indent, context, pattern = %command.pattern, "matched");

                    if let Some(action) = command.action {
                        let groups = Groups { caps };
                        let mut scope = Scope::new(&mut *target, &mut params);
                        action(&groups, &mut scope).map_err(|e| e.at_line(line_no, line))?;
                    }

                    child_context = command
                        .enter_context
                        .as_deref()
                        .filter(|name| self.has_context(name))
                        .map(String::from);
                }
                None => {
                    stats.ignored += 1;
                    trace!(line_no, indent, "ignored");
                }
            }

            stack.push(Frame {
                indent,
                context: child_context,
                params,
            });
        }

        target.finish()?;

        debug!(
            lines = stats.lines,
            matched = stats.matched,
            ignored = stats.ignored,
            "parse complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records which params each matched line saw.
    #[derive(Debug, Default)]
    struct Recorder {
        seen: Vec<(String, Vec<String>)>,
        finished: bool,
    }

    impl ParseTarget for Recorder {
        type Params = Vec<String>;
        type Section = Vec<(String, Vec<String>)>;

        fn section_mut(&mut self, params: &Self::Params) -> Option<&mut Self::Section> {
            if params.is_empty() {
                None
            } else {
                Some(&mut self.seen)
            }
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn cmd_block(groups: &Groups<'_>, scope: &mut Scope<'_, Recorder>) -> Result<()> {
        let name = groups.require("name")?.to_string();
        let visible = scope.params().clone();
        scope.target().seen.push((format!("block {name}"), visible));
        scope.params_mut().push(name);
        Ok(())
    }

    fn cmd_leaf(groups: &Groups<'_>, scope: &mut Scope<'_, Recorder>) -> Result<()> {
        let name = groups.require("name")?.to_string();
        let visible = scope.params().clone();
        scope
            .section()
            .ok_or(Error::MissingFocus("block"))?
            .push((format!("leaf {name}"), visible));
        Ok(())
    }

    fn cmd_fail(_: &Groups<'_>, _: &mut Scope<'_, Recorder>) -> Result<()> {
        Err(Error::UnknownService("bogus".into()))
    }

    fn parser() -> ContextParser<Recorder> {
        let mut parser = ContextParser::new();
        parser
            .register(".", r"block (?P<name>\S+)", Some(cmd_block), Some("block"))
            .unwrap()
            .register(".", r"opaque \S+", None, Some("nowhere"))
            .unwrap()
            .register(".", r"fail", Some(cmd_fail), None)
            .unwrap()
            .register("block", r"block (?P<name>\S+)", Some(cmd_block), Some("block"))
            .unwrap()
            .register("block", r"leaf (?P<name>\S+)", Some(cmd_leaf), None)
            .unwrap();
        parser
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_register_orders_commands() {
        let parser = parser();
        let patterns: Vec<_> = parser.commands("block").iter().map(Command::pattern).collect();
        assert_eq!(patterns, vec![r"block (?P<name>\S+)", r"leaf (?P<name>\S+)"]);
        assert!(parser.has_context("."));
        assert!(!parser.has_context("nowhere"));
    }

    #[test]
    fn test_register_rejects_bad_pattern() {
        let mut parser: ContextParser<Recorder> = ContextParser::new();
        let err = parser.register(".", r"vlan (?P<tag>\d+", None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_nested_params_follow_indentation() {
        let text = "block a\n  leaf x\n  block b\n    leaf y\n  leaf z\nblock c\n";
        let recorder: Recorder = parser().parse(text).unwrap();

        assert!(recorder.finished);
        assert_eq!(
            recorder.seen,
            vec![
                ("block a".to_string(), names(&[])),
                ("leaf x".to_string(), names(&["a"])),
                ("block b".to_string(), names(&["a"])),
                ("leaf y".to_string(), names(&["a", "b"])),
                ("leaf z".to_string(), names(&["a"])),
                ("block c".to_string(), names(&[])),
            ]
        );
    }

    #[test]
    fn test_matching_is_case_insensitive_and_anchored() {
        let recorder: Recorder = parser().parse("BLOCK a\n leaf x extra\n LEAF y\n").unwrap();
        let seen: Vec<_> = recorder.seen.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(seen, vec!["block a", "leaf y"]);
    }

    #[test]
    fn test_unknown_and_opaque_blocks_swallow_children() {
        let text = "\
router ospf 1
 leaf hidden
opaque thing
 leaf hidden
 block hidden
block a

   \t
 leaf shown
";
        let mut recorder = Recorder::default();
        let stats = parser().parse_into(&mut recorder, text.lines()).unwrap();

        let seen: Vec<_> = recorder.seen.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(seen, vec!["block a", "leaf shown"]);
        assert_eq!(
            stats,
            ParseStats {
                lines: 9,
                blank: 2,
                matched: 3,
                ignored: 4,
            }
        );
    }

    #[test]
    fn test_action_error_reports_line() {
        let err = parser().parse("block a\nfail\n").unwrap_err();
        assert_eq!(err.line_no(), Some(2));
        assert!(matches!(err.root(), Error::UnknownService(_)));
    }
}
