// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Commands every shell gets from [crate::CommandTreeBuilder::with_builtins].

use std::io::Write;

use super::execute::{RETVAL_HELP_PRINTED, RETVAL_INVALID_ARGS, RETVAL_NOT_EXECUTED};
use crate::{CommandError, CommandNode, ShellColor, ShellContext, Size};

/// Switches the terminal to 80 columns (DECCOLM reset).
pub const VT100_SET_80_COLUMNS: &[u8] = b"\x1b[?3l";

pub fn all() -> Vec<CommandNode> {
    vec![
        CommandNode::new("clear")
            .with_help("Clear screen.")
            .with_args(1, 0)
            .with_handler(clear),
        CommandNode::new("cli")
            .with_help("Useful, not Unix-like shell commands.")
            .with_args(1, 1)
            .with_handler(unknown_parameter_or_help)
            .with_subcommands(vec![
                CommandNode::new("colors")
                    .with_help("Toggle colored syntax.")
                    .with_args(1, 1)
                    .with_handler(unknown_parameter_or_help)
                    .with_subcommands(vec![
                        CommandNode::new("off")
                            .with_help("Disable colored syntax.")
                            .with_args(1, 0)
                            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                                ctx.set_use_colors(false);
                                0
                            }),
                        CommandNode::new("on")
                            .with_help("Enable colored syntax.")
                            .with_args(1, 0)
                            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                                ctx.set_use_colors(true);
                                0
                            }),
                    ]),
                CommandNode::new("echo")
                    .with_help("Toggle shell echo.")
                    .with_args(1, 1)
                    .with_handler(echo_status)
                    .with_subcommands(vec![
                        CommandNode::new("off")
                            .with_help(
                                "Disable shell echo. Editing keys and meta-keys are not handled.",
                            )
                            .with_args(1, 0)
                            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                                ctx.set_echo(false);
                                0
                            }),
                        CommandNode::new("on")
                            .with_help("Enable shell echo.")
                            .with_args(1, 0)
                            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                                ctx.set_echo(true);
                                0
                            }),
                    ]),
                CommandNode::new("stats")
                    .with_help("CLI statistics.")
                    .with_args(1, 1)
                    .with_handler(unknown_parameter_or_help)
                    .with_subcommands(vec![
                        CommandNode::new("reset")
                            .with_help("Reset the count of lost log lines.")
                            .with_args(1, 0)
                            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                                ctx.reset_log_stats();
                                0
                            }),
                        CommandNode::new("show")
                            .with_help("Show how many log lines were lost.")
                            .with_args(1, 0)
                            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                                ctx.println(
                                    ShellColor::NORMAL,
                                    &format!("Lost logs: {}", ctx.log_stats()),
                                );
                                0
                            }),
                    ]),
            ]),
        CommandNode::new("help")
            .with_help("Prints the help message.")
            .with_args(1, 0)
            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                ctx.print_command_list();
                0
            }),
        CommandNode::new("history")
            .with_help("Command history.")
            .with_args(1, 0)
            .with_handler(history),
        CommandNode::new("resize")
            .with_help(
                "Console gets terminal screen size or assumes 80 in case the readout fails. \
                 It must be executed after each terminal width change to ensure correct \
                 text display.",
            )
            .with_args(1, 1)
            .with_handler(resize)
            .with_subcommands(vec![
                CommandNode::new("default")
                    .with_help(
                        "Assume 80 chars screen width and send this setting to the terminal.",
                    )
                    .with_args(1, 0)
                    .with_handler(resize_default),
            ]),
        CommandNode::new("retval")
            .with_help("Print return value of most recent command.")
            .with_args(1, 0)
            .with_handler(|ctx: &mut ShellContext<'_>, _: &[&str]| {
                ctx.println(ShellColor::NORMAL, &ctx.last_retval().to_string());
                0
            }),
    ]
}

/// Handler of a command that only groups subcommands: help without arguments, an error
/// for an argument that isn't one of the subcommands.
fn unknown_parameter_or_help(ctx: &mut ShellContext<'_>, argv: &[&str]) -> i32 {
    match argv {
        [_] => {
            ctx.print_help();
            RETVAL_HELP_PRINTED
        }
        [command, param, ..] => {
            print_unknown_parameter(ctx, command, param);
            RETVAL_INVALID_ARGS
        }
        [] => RETVAL_NOT_EXECUTED,
    }
}

fn print_unknown_parameter(ctx: &ShellContext<'_>, command: &str, param: &str) {
    let error = CommandError::UnknownParameter {
        command: command.to_owned(),
        param: param.to_owned(),
    };
    ctx.error(&error.to_string());
}

fn clear(ctx: &mut ShellContext<'_>, _argv: &[&str]) -> i32 {
    ctx.clear_screen();
    0
}

fn echo_status(ctx: &mut ShellContext<'_>, argv: &[&str]) -> i32 {
    if let [command, param, ..] = argv {
        print_unknown_parameter(ctx, command, param);
        return RETVAL_INVALID_ARGS;
    }
    let status = if ctx.echo() { "on" } else { "off" };
    ctx.println(ShellColor::NORMAL, &format!("Echo status: {status}"));
    0
}

fn history(ctx: &mut ShellContext<'_>, _argv: &[&str]) -> i32 {
    let lines: Vec<String> = ctx
        .history()
        .iter()
        .enumerate()
        .map(|(index, line)| format!("[{index:3}] {line}"))
        .collect();
    for line in lines {
        ctx.println(ShellColor::NORMAL, &line);
    }
    0
}

fn resize(ctx: &mut ShellContext<'_>, argv: &[&str]) -> i32 {
    if let [command, param, ..] = argv {
        print_unknown_parameter(ctx, command, param);
        return RETVAL_INVALID_ARGS;
    }
    match ctx.query_terminal_size() {
        Some(size) => {
            ctx.set_terminal_size(size);
            0
        }
        None => {
            ctx.set_terminal_size(Size::default());
            ctx.warn("No response from the terminal, assumed 80x24 screen size");
            RETVAL_NOT_EXECUTED
        }
    }
}

fn resize_default(ctx: &mut ShellContext<'_>, _argv: &[&str]) -> i32 {
    let result = ctx
        .output
        .with_term(|_, term| term.write_all(VT100_SET_80_COLUMNS));
    if let Err(error) = result {
        tracing::warn!(?error, "failed to switch to 80 columns");
    }
    ctx.set_terminal_size(Size::default());
    0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use r3bl_test_fixtures::StdoutMock;

    use super::*;
    use crate::{CommandTree, CommandTreeBuilder, History, InputFeeder, LineState, LogStats,
                LoopbackTransport, ShellConfig, ShellFlags, ShellOutput, execute};

    struct Fixture {
        output: ShellOutput,
        stdout_mock: StdoutMock,
        feeder: InputFeeder,
        history: History,
        config: ShellConfig,
        log_stats: LogStats,
        tree: CommandTree,
    }

    impl Fixture {
        fn new() -> Self {
            let stdout_mock = StdoutMock::default();
            let (transport, feeder) = LoopbackTransport::new(stdout_mock.clone());
            let flags = ShellFlags {
                use_colors: false,
                ..Default::default()
            };
            let line_state = LineState::new("$ ".into(), 64, Size::new(40, 10), flags);
            Self {
                output: ShellOutput::new(line_state, transport),
                stdout_mock,
                feeder,
                history: History::new(4),
                config: ShellConfig::default(),
                log_stats: LogStats::default(),
                tree: CommandTreeBuilder::default().with_builtins().build().unwrap(),
            }
        }

        fn run(&self, line: &str, last_retval: i32) -> i32 {
            let mut ctx = ShellContext {
                output: &self.output,
                tree: &self.tree,
                history: &self.history,
                config: &self.config,
                log_stats: &self.log_stats,
                last_retval,
                current: None,
            };
            execute(line, &self.tree, &mut ctx).unwrap_or_else(|error| error.retval())
        }

        fn screen(&self) -> String { self.stdout_mock.get_copy_of_buffer_as_string_strip_ansi() }

        fn size(&self) -> Size { self.output.safe_line_state.lock().unwrap().cons.size }
    }

    #[test]
    fn test_builtins_are_registered() {
        let fixture = Fixture::new();
        let names: Vec<_> = fixture.tree.root().iter().map(|it| it.syntax).collect();
        assert_eq!(names, vec!["clear", "cli", "help", "history", "resize", "retval"]);
    }

    #[test]
    fn test_history_newest_first() {
        let mut fixture = Fixture::new();
        fixture.history.put("first");
        fixture.history.put("second");
        assert_eq!(fixture.run("history", 0), 0);
        assert_eq!(fixture.screen(), "[  0] second\n[  1] first\n");
    }

    #[test]
    fn test_echo_status_and_toggle() {
        let fixture = Fixture::new();
        fixture.run("cli echo", 0);
        fixture.run("cli echo off", 0);
        assert!(!fixture.output.safe_line_state.lock().unwrap().flags.echo);
        fixture.run("cli echo", 0);
        assert_eq!(fixture.screen(), "Echo status: on\nEcho status: off\n");
    }

    #[test]
    fn test_unknown_parameter() {
        let fixture = Fixture::new();
        assert_eq!(fixture.run("cli nope", 0), RETVAL_INVALID_ARGS);
        assert_eq!(fixture.screen(), "cli: unknown parameter: nope\n");
    }

    #[test]
    fn test_group_without_argument_prints_help() {
        let fixture = Fixture::new();
        assert_eq!(fixture.run("cli stats", 0), RETVAL_HELP_PRINTED);
        let screen = fixture.screen();
        assert!(screen.starts_with("stats - CLI statistics.\n"), "{screen:?}");
        assert!(screen.contains("Subcommands:\n"));
    }

    #[test]
    fn test_stats_show_and_reset() {
        let fixture = Fixture::new();
        fixture.log_stats.record_dropped();
        fixture.log_stats.record_dropped();
        fixture.run("cli stats show", 0);
        fixture.run("cli stats reset", 0);
        fixture.run("cli stats show", 0);
        assert_eq!(fixture.screen(), "Lost logs: 2\nLost logs: 0\n");
    }

    #[test]
    fn test_colors_off() {
        let fixture = Fixture::new();
        fixture.output.safe_line_state.lock().unwrap().flags.use_colors = true;
        fixture.run("cli colors off", 0);
        assert!(!fixture.output.safe_line_state.lock().unwrap().flags.use_colors);
    }

    #[test]
    fn test_retval() {
        let fixture = Fixture::new();
        fixture.run("retval", -22);
        assert_eq!(fixture.screen(), "-22\n");
    }

    #[test]
    fn test_wrong_parameter_count() {
        let fixture = Fixture::new();
        assert_eq!(fixture.run("clear now", 0), RETVAL_INVALID_ARGS);
        assert!(fixture.screen().starts_with("clear: wrong parameter count\n"));
    }

    #[test]
    fn test_resize_without_reply_assumes_default() {
        let fixture = Fixture::new();
        fixture.feeder.close();
        assert_eq!(fixture.run("resize", 0), RETVAL_NOT_EXECUTED);
        assert_eq!(fixture.size(), Size::new(80, 24));
        assert!(
            fixture
                .screen()
                .ends_with("No response from the terminal, assumed 80x24 screen size\n")
        );
    }

    #[test]
    fn test_resize_reads_cursor_reports() {
        let fixture = Fixture::new();
        // Where the cursor is, then where it ends up after the move to the corner.
        fixture.feeder.push(b"\x1b[5;3R");
        fixture.feeder.push(b"\x1b[50;132R");
        assert_eq!(fixture.run("resize", 0), 0);
        assert_eq!(fixture.size(), Size::new(132, 50));
        let raw = fixture.stdout_mock.get_copy_of_buffer_as_string();
        assert!(raw.contains("\x1b[6n\x1b[250B\x1b[250C\x1b[6n\x1b[5;3H"), "{raw:?}");
    }

    #[test]
    fn test_resize_default() {
        let fixture = Fixture::new();
        assert_eq!(fixture.run("resize default", 0), 0);
        assert_eq!(fixture.size(), Size::new(80, 24));
        assert_eq!(fixture.stdout_mock.get_copy_of_buffer_as_string(), "\x1b[?3l");
    }
}
