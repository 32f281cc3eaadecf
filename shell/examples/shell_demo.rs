// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::Duration;

use crossterm::terminal;
use miette::IntoDiagnostic;
use r3bl_shell::{CommandNode, CommandTreeBuilder, DisplayPreference,
                 LoopbackTransport, RETVAL_INVALID_ARGS, Shell, ShellColor, ShellConfig,
                 ShellContext, Size, TracingConfig, pump_input_stream, stdin_input_stream,
                 tracing_setup};

const SENSORS: [&str; 3] = ["accel", "gyro", "temp"];

/// Runs the shell on `stdin` / `stdout` in raw mode.
///
/// ```text
/// ┌───────────────────────────────────┐
/// │ > cargo run --example shell_demo  │
/// └───────────────────────────────────┘
/// ```
///
/// Things to try:
///
/// ```text
/// help
/// sensor <TAB><TAB>
/// sensor * read
/// tick 5          (log lines show up above the prompt while you type)
/// cli stats show
/// exit
/// ```
#[tokio::main]
pub async fn main() -> miette::Result<()> {
    let (transport, feeder) = LoopbackTransport::new(std::io::stdout());

    let exit_feeder = feeder.clone();
    let tree = CommandTreeBuilder::default()
        .register(
            CommandNode::new("sensor")
                .with_help("Attached sensors.")
                .with_dynamic_subcommands(sensor_node),
        )
        .register(
            CommandNode::new("tick")
                .with_help("Log a line every 500ms, <count> times.")
                .with_args(2, 0)
                .with_handler(tick),
        )
        .register(
            CommandNode::new("exit")
                .with_help("Leave the shell.")
                .with_handler(move |_ctx: &mut ShellContext<'_>, _argv: &[&str]| {
                    exit_feeder.close();
                    0
                }),
        )
        .with_builtins()
        .build()?;

    let size = terminal::size()
        .map(|(width, height)| Size::new(width, height))
        .unwrap_or_default();
    let config = ShellConfig::default()
        .with_prompt("demo:~$ ")
        .with_terminal_size(size);

    let (mut shell, shared_writer) = Shell::new(config, tree, transport)?;

    tracing_setup::init(TracingConfig::new_display(
        DisplayPreference::SharedWriter(shared_writer),
    ))?;

    tokio::spawn(pump_input_stream(
        stdin_input_stream(),
        feeder,
        shell.rx_ready(),
    ));

    terminal::enable_raw_mode().into_diagnostic()?;
    shell.start()?;
    let result = shell.run().await;
    _ = shell.stop();
    _ = terminal::disable_raw_mode();
    result?;

    // The stdin reader is parked on a blocking thread that the runtime would wait for.
    std::process::exit(0);
}

fn sensor_node(index: usize) -> Option<CommandNode> {
    let name = *SENSORS.get(index)?;
    let read = CommandNode::new("read")
        .with_help("Print the current value.")
        .with_handler(move |ctx: &mut ShellContext<'_>, _argv: &[&str]| {
            let value = name.len() * 7;
            ctx.println(ShellColor::NORMAL, &format!("{name}: {value}"));
            0
        });
    Some(
        CommandNode::new(name)
            .with_help("A sensor.")
            .with_subcommands(vec![read]),
    )
}

fn tick(ctx: &mut ShellContext<'_>, argv: &[&str]) -> i32 {
    let Ok(count) = argv[1].parse::<u32>() else {
        ctx.error(&format!("{}: not a number", argv[1]));
        return RETVAL_INVALID_ARGS;
    };
    tokio::spawn(async move {
        for it in 1..=count {
            tokio::time::sleep(Duration::from_millis(500)).await;
            tracing::info!(tick = it, "tick");
        }
    });
    0
}
