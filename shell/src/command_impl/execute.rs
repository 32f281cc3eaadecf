// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{matcher::{WildcardContext, walk},
            tokenizer::{TokenLimit, Tokens, tokenize_with_limit}};
use crate::{CommandError, CommandTree, OptionalArgs, ShellContext};

/// Returned when `-h` / `--help` printed help instead of running a handler.
pub const RETVAL_HELP_PRINTED: i32 = 1;
/// Returned for lines that could not be dispatched (`-ENOEXEC`).
pub const RETVAL_NOT_EXECUTED: i32 = -8;
/// Returned for a wrong parameter count (`-EINVAL`).
pub const RETVAL_INVALID_ARGS: i32 = -22;

impl CommandError {
    pub fn retval(&self) -> i32 {
        match self {
            CommandError::WrongArgCount(_) => RETVAL_INVALID_ARGS,
            _ => RETVAL_NOT_EXECUTED,
        }
    }
}

/// Run one submitted line. Failures are printed in the error color (followed by the
/// command's help for a wrong parameter count, if configured) and returned.
pub fn execute(
    line: &str,
    tree: &CommandTree,
    ctx: &mut ShellContext<'_>,
) -> Result<i32, CommandError> {
    let result = dispatch(line, tree, ctx);
    match &result {
        Ok(retval) => {
            tracing::debug!(line, retval, "command executed");
        }
        Err(error) => {
            tracing::debug!(line, %error, "command not executed");
            ctx.error(&error.to_string());
            if let (CommandError::WrongArgCount(_), true) =
                (error, ctx.config.help_on_wrong_argc)
            {
                ctx.print_help();
            }
        }
    }
    result
}

/// 1. Tokenize the line and walk it down the tree, expanding wildcards into a copy of the
///    line when they are enabled.
/// 2. If any pattern was expanded, tokenize the expanded copy, that is what the handler
///    gets.
/// 3. `-h` prints help for the deepest node with help text.
/// 4. Without a handler on the path, report the first token that didn't match, or print
///    the help of the command that needs a subcommand.
/// 5. Check the argument count and call the handler with the tokens from its own syntax
///    onwards.
fn dispatch(
    line: &str,
    tree: &CommandTree,
    ctx: &mut ShellContext<'_>,
) -> Result<i32, CommandError> {
    let max_argc = ctx.config.max_argc;
    let tokens = tokenize_with_limit(line, TokenLimit::Max(max_argc));
    if tokens.is_empty() {
        return match tokens.unterminated_quote {
            Some(quote) => Err(CommandError::UnterminatedQuote(quote)),
            None => Ok(0),
        };
    }

    let mut wildcards = ctx
        .config
        .wildcards
        .then(|| WildcardContext::new(line, ctx.config.cmd_buffer_capacity));
    let walked = walk(tree.root(), &tokens.as_argv(), wildcards.as_mut());
    if let Some(context) = &wildcards {
        for warning in &context.warnings {
            ctx.warn(warning);
        }
    }
    let found = walked?;

    // The part of a raw tail command's line after its mandatory arguments isn't parsed,
    // so a quote there can't be unterminated.
    let raw_tail = found
        .handler
        .as_ref()
        .filter(|(node, _)| node.args.optional == OptionalArgs::RawTail);
    if let (None, Some(quote)) = (raw_tail, tokens.unterminated_quote) {
        return Err(CommandError::UnterminatedQuote(quote));
    }

    if found.help_requested {
        ctx.print_help_for(found.help_node());
        return Ok(RETVAL_HELP_PRINTED);
    }

    let text = match &wildcards {
        Some(context) if context.rewritten => context.buffer.as_str().to_owned(),
        _ => line.to_owned(),
    };

    let Some((node, level)) = found.handler.clone() else {
        let argv = tokens.as_argv();
        return match found.stopped_at {
            Some(index) => Err(CommandError::UnknownParameter {
                command: argv[index - 1].to_owned(),
                param: argv[index].to_owned(),
            }),
            None if found.node.help.is_some() => {
                ctx.print_help_for(&found.node);
                Ok(RETVAL_HELP_PRINTED)
            }
            None => Err(CommandError::SpecifySubcommand),
        };
    };

    let args: Tokens = match node.args.optional {
        OptionalArgs::RawTail => {
            let args = tokenize_with_limit(
                &text,
                TokenLimit::RawTailAfter(level + node.args.mandatory),
            );
            if let Some(quote) = args.unterminated_quote {
                return Err(CommandError::UnterminatedQuote(quote));
            }
            args
        }
        _ if text != line => tokenize_with_limit(&text, TokenLimit::Max(max_argc)),
        _ => tokens,
    };

    let argv = args.as_argv();
    let handler_argv = argv.get(level..).unwrap_or_default();
    ctx.current = Some(node.clone());
    if !node.args.accepts(handler_argv.len()) {
        return Err(CommandError::WrongArgCount(node.syntax.to_string()));
    }

    let Some(handler) = node.handler.clone() else {
        return Err(CommandError::SpecifySubcommand);
    };
    tracing::debug!(command = %node.syntax, argc = handler_argv.len(), "dispatching");
    Ok(handler(ctx, handler_argv))
}
