// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{borrow::Cow,
          collections::HashSet,
          fmt::{Debug, Formatter},
          sync::Arc};

use crate::{ShellContext, ShellError, builtins};

/// What runs when a command is executed. `argv[0]` is the command's own syntax, the rest
/// are its arguments. The return value is kept as the "last return value" (0 is success).
pub type CommandHandler = Arc<dyn Fn(&mut ShellContext<'_>, &[&str]) -> i32 + Send + Sync>;

/// How many arguments follow the mandatory ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalArgs {
    Count(usize),
    /// No upper bound.
    Unbounded,
    /// Everything after the mandatory arguments is handed over as one unparsed argument.
    RawTail,
}

/// Argument count bounds of a command. `mandatory` counts the command itself, so a
/// command that needs one argument has `mandatory == 2`. The default (`0`, unbounded)
/// means the count isn't checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgBounds {
    pub mandatory: usize,
    pub optional: OptionalArgs,
}

impl Default for ArgBounds {
    fn default() -> Self {
        Self {
            mandatory: 0,
            optional: OptionalArgs::Unbounded,
        }
    }
}

impl ArgBounds {
    pub fn new(mandatory: usize, optional: usize) -> Self {
        Self {
            mandatory,
            optional: OptionalArgs::Count(optional),
        }
    }

    pub fn accepts(&self, argc: usize) -> bool {
        if argc < self.mandatory {
            return false;
        }
        match self.optional {
            OptionalArgs::Count(optional) => argc <= self.mandatory + optional,
            OptionalArgs::Unbounded => true,
            OptionalArgs::RawTail => argc <= self.mandatory + 1,
        }
    }
}

/// Produces the children of a dynamic command on demand, one index at a time. The first
/// index that returns `None` ends the list.
///
/// Every call returns a fully owned [CommandNode], so nested lookups (a parent, then one
/// of its children) never share scratch storage. Nothing is cached between calls, the
/// list may change between two walks of the tree.
pub trait CommandSource: Send + Sync {
    fn get(&self, index: usize) -> Option<CommandNode>;
}

impl<F> CommandSource for F
where
    F: Fn(usize) -> Option<CommandNode> + Send + Sync,
{
    fn get(&self, index: usize) -> Option<CommandNode> { self(index) }
}

/// The children of a command, in declaration order (which is significant: matching is
/// first match wins, and wildcard expansion emits matches in this order).
#[derive(Clone)]
pub enum CommandSet {
    Static(Arc<[CommandNode]>),
    Dynamic(Arc<dyn CommandSource>),
}

impl Debug for CommandSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandSet::Static(nodes) => f.debug_tuple("Static").field(&nodes.len()).finish(),
            CommandSet::Dynamic(_) => write!(f, "Dynamic"),
        }
    }
}

impl From<Vec<CommandNode>> for CommandSet {
    fn from(nodes: Vec<CommandNode>) -> Self { CommandSet::Static(nodes.into()) }
}

impl CommandSet {
    pub fn dynamic(source: impl CommandSource + 'static) -> Self {
        CommandSet::Dynamic(Arc::new(source))
    }

    /// # Panics
    ///
    /// If a [CommandSource] returns a node with an empty syntax. That is a broken
    /// command tree, not something to recover from at runtime.
    pub fn get(&self, index: usize) -> Option<CommandNode> {
        let node = match self {
            CommandSet::Static(nodes) => nodes.get(index).cloned(),
            CommandSet::Dynamic(source) => source.get(index),
        }?;
        assert!(
            !node.syntax.is_empty(),
            "command source returned a node with an empty syntax at index {index}"
        );
        Some(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = CommandNode> + '_ {
        (0..).map_while(move |index| self.get(index))
    }

    /// First node whose syntax is exactly `syntax`.
    pub fn find(&self, syntax: &str) -> Option<CommandNode> {
        self.iter().find(|node| node.syntax == syntax)
    }

    pub fn is_empty(&self) -> bool { self.get(0).is_none() }
}

/// One command (or subcommand) of the tree.
#[derive(Clone)]
pub struct CommandNode {
    pub syntax: Cow<'static, str>,
    pub help: Option<Cow<'static, str>>,
    pub handler: Option<CommandHandler>,
    pub subcommands: Option<CommandSet>,
    pub args: ArgBounds,
}

impl Debug for CommandNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNode")
            .field("syntax", &self.syntax)
            .field("help", &self.help)
            .field("handler", &self.handler.is_some())
            .field("subcommands", &self.subcommands)
            .field("args", &self.args)
            .finish()
    }
}

impl CommandNode {
    pub fn new(syntax: impl Into<Cow<'static, str>>) -> Self {
        Self {
            syntax: syntax.into(),
            help: None,
            handler: None,
            subcommands: None,
            args: ArgBounds::default(),
        }
    }

    pub fn with_help(mut self, help: impl Into<Cow<'static, str>>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ShellContext<'_>, &[&str]) -> i32 + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn with_subcommands(mut self, subcommands: impl Into<CommandSet>) -> Self {
        self.subcommands = Some(subcommands.into());
        self
    }

    pub fn with_dynamic_subcommands(mut self, source: impl CommandSource + 'static) -> Self {
        self.subcommands = Some(CommandSet::dynamic(source));
        self
    }

    pub fn with_args(mut self, mandatory: usize, optional: usize) -> Self {
        self.args = ArgBounds::new(mandatory, optional);
        self
    }

    pub fn with_unbounded_args(mut self, mandatory: usize) -> Self {
        self.args = ArgBounds {
            mandatory,
            optional: OptionalArgs::Unbounded,
        };
        self
    }

    /// The command takes `mandatory` arguments (itself included) and then the rest of the
    /// line as one raw argument, without any quote or escape processing.
    pub fn with_raw_args(mut self, mandatory: usize) -> Self {
        self.args = ArgBounds {
            mandatory,
            optional: OptionalArgs::RawTail,
        };
        self
    }

    pub fn has_handler(&self) -> bool { self.handler.is_some() }
}

/// The root of the command tree. The root level is sorted by syntax.
#[derive(Debug, Clone)]
pub struct CommandTree {
    pub root: CommandSet,
}

impl CommandTree {
    pub fn root(&self) -> &CommandSet { &self.root }
}

/// Collects the root commands at startup and turns them into a [CommandTree].
#[derive(Debug, Default)]
pub struct CommandTreeBuilder {
    commands: Vec<CommandNode>,
}

impl CommandTreeBuilder {
    pub fn register(mut self, command: CommandNode) -> Self {
        self.commands.push(command);
        self
    }

    /// Add `help`, `clear`, `history`, `cli`, `resize` and `retval`.
    pub fn with_builtins(mut self) -> Self {
        self.commands.extend(builtins::all());
        self
    }

    pub fn build(mut self) -> Result<CommandTree, ShellError> {
        let mut seen = HashSet::new();
        for command in &self.commands {
            if command.syntax.is_empty() {
                return Err(ShellError::EmptySyntax);
            }
            if !seen.insert(command.syntax.clone()) {
                return Err(ShellError::DuplicateCommand(command.syntax.to_string()));
            }
        }
        self.commands.sort_by(|lhs, rhs| lhs.syntax.cmp(&rhs.syntax));
        tracing::debug!(count = self.commands.len(), "command tree built");
        Ok(CommandTree {
            root: self.commands.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(1, false)]
    #[test_case(2, true)]
    #[test_case(3, true)]
    #[test_case(4, false)]
    fn test_arg_bounds(argc: usize, accepted: bool) {
        assert_eq!(ArgBounds::new(2, 1).accepts(argc), accepted);
    }

    #[test]
    fn test_unbounded_and_raw_tail_bounds() {
        let unbounded = ArgBounds {
            mandatory: 2,
            optional: OptionalArgs::Unbounded,
        };
        assert!(!unbounded.accepts(1));
        assert!(unbounded.accepts(20));

        let raw = ArgBounds {
            mandatory: 2,
            optional: OptionalArgs::RawTail,
        };
        assert!(raw.accepts(3));
        assert!(!raw.accepts(4));

        assert!(ArgBounds::default().accepts(0));
    }

    #[test]
    fn test_dynamic_source_is_queried_per_lookup() {
        let set = CommandSet::dynamic(|index: usize| {
            ["uart0", "uart1"]
                .get(index)
                .map(|name| CommandNode::new(name.to_string()))
        });
        let names: Vec<_> = set.iter().map(|node| node.syntax.to_string()).collect();
        assert_eq!(names, vec!["uart0", "uart1"]);
        assert!(set.find("uart1").is_some());
        assert!(set.find("uart").is_none());
    }

    #[test]
    #[should_panic(expected = "empty syntax")]
    fn test_empty_syntax_from_source_panics() {
        let set = CommandSet::dynamic(|_: usize| Some(CommandNode::new("")));
        set.get(0);
    }

    #[test]
    fn test_builder_sorts_and_rejects_duplicates() {
        let tree = CommandTreeBuilder::default()
            .register(CommandNode::new("zeta"))
            .register(CommandNode::new("alpha"))
            .build()
            .unwrap();
        let names: Vec<_> = tree.root().iter().map(|node| node.syntax).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let result = CommandTreeBuilder::default()
            .register(CommandNode::new("dup"))
            .register(CommandNode::new("dup"))
            .build();
        assert!(matches!(result, Err(ShellError::DuplicateCommand(name)) if name == "dup"));

        let result = CommandTreeBuilder::default()
            .register(CommandNode::new(""))
            .build();
        assert!(matches!(result, Err(ShellError::EmptySyntax)));
    }
}
