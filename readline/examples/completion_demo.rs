// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A tiny line editor wired to a [`PrefixCompleter`]. Press `Tab` to complete, `Tab`
//! again to pick from the grid, `Ctrl+Z` to suspend, `Ctrl+C` or `Ctrl+D` to quit.
//!
//! ```text
//! cargo run --example completion_demo -- --log
//! ```

use clap::Parser;
use r3bl_readline::{EscapePolicy, InputDevice, LineBuffer, LogicalKey, OpCompleter,
                    OutputDevice, PrefixCompleter, RuneLineBuffer, SelectOutcome,
                    TerminalConfig, TerminalSession, TracingConfig,
                    lock_output_device_as_mut, pc_item, pc_item_dynamic,
                    try_initialize_logging_global};
use std::{io::Write, sync::Arc};

const PROMPT: &str = "> ";

#[derive(Debug, Parser)]
#[command(bin_name = "completion_demo")]
#[command(about = "Tab completion over a raw mode terminal session")]
pub struct CLIArg {
    #[arg(long, short = 'l', help = "Log to `readline_log_file_debug.log`.")]
    pub log: bool,

    #[arg(
        long,
        short = 'e',
        default_value = "consume",
        help = "What a lone ESC does: `consume` or `emit`."
    )]
    pub escape_policy: EscapePolicy,
}

fn create_tree() -> PrefixCompleter {
    PrefixCompleter::new(vec![
        pc_item("mode", "switch key bindings", vec![
            pc_item("vi", "", vec![]),
            pc_item("emacs", "", vec![]),
        ]),
        pc_item("login", "", vec![]),
        pc_item("say", "print something", vec![pc_item_dynamic(
            |_line: &str| {
                let names = std::fs::read_dir(".")
                    .map(|entries| {
                        entries
                            .filter_map(Result::ok)
                            .map(|entry| entry.file_name().to_string_lossy().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                (names, vec![])
            },
            vec![pc_item("loudly", "", vec![])],
        )]),
        pc_item("bye", "", vec![]),
    ])
}

fn redraw(output_device: &OutputDevice, buf: &RuneLineBuffer) -> std::io::Result<()> {
    let term = lock_output_device_as_mut!(output_device);
    let tail_width = r3bl_readline::runes_width(&buf.buf[buf.cursor..]);
    write!(term, "\r\x1b[K{PROMPT}{}", buf.line())?;
    if tail_width > 0 {
        write!(term, "\x1b[{tail_width}D")?;
    }
    term.flush()
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli_arg = CLIArg::parse();
    if cli_arg.log {
        try_initialize_logging_global(TracingConfig::new_file(None))?;
    }

    let output_device = OutputDevice::new_stdout();
    let config = TerminalConfig {
        output_device: output_device.clone(),
        escape_policy: cli_arg.escape_policy,
        ..Default::default()
    };
    let mut session = TerminalSession::try_new(InputDevice::new_stdin(), config)?;
    let width = crossterm::terminal::size().map_or(80, |(columns, _)| usize::from(columns));
    let mut completer = OpCompleter::new(Arc::new(create_tree()), width);
    let mut buf = RuneLineBuffer::new(PROMPT, width);

    session.print(PROMPT)?;

    while let Some(key) = session.next_key().await {
        if completer.is_in_complete_select_mode() {
            let outcome = completer
                .handle_complete_select(key, &mut buf, lock_output_device_as_mut!(output_device))
                .map_err(r3bl_readline::ReadlineError::from)?;
            match outcome {
                SelectOutcome::Continue => continue,
                SelectOutcome::Finished => {
                    session.print("\x1b[J")?;
                    redraw(&output_device, &buf).map_err(r3bl_readline::ReadlineError::from)?;
                    continue;
                }
                SelectOutcome::Reprocess => {}
            }
        }

        match key {
            LogicalKey::Tab => {
                completer
                    .on_complete(&mut buf, lock_output_device_as_mut!(output_device))
                    .map_err(r3bl_readline::ReadlineError::from)?;
                if !completer.is_in_complete_mode() {
                    session.print("\x1b[J")?;
                }
            }
            LogicalKey::Enter | LogicalKey::CtrlJ => {
                completer.exit_complete_mode(false);
                let line = buf.line();
                session.print(&format!("\x1b[J\r\nyou said: {line}\r\n"))?;
                if line.trim() == "bye" {
                    break;
                }
                buf.set_line("");
                session.print(PROMPT)?;
                continue;
            }
            LogicalKey::Interrupt | LogicalKey::Delete if buf.buf.is_empty() => break,
            LogicalKey::CtrlZ => {
                session.sleep_to_resume().await?;
            }
            LogicalKey::Backspace | LogicalKey::CtrlH => {
                if buf.cursor > 0 {
                    buf.cursor -= 1;
                    let cursor = buf.cursor;
                    buf.buf.remove(cursor);
                }
            }
            LogicalKey::Backward => buf.cursor = buf.cursor.saturating_sub(1),
            LogicalKey::Forward => buf.cursor = (buf.cursor + 1).min(buf.buf.len()),
            LogicalKey::LineStart => buf.cursor = 0,
            LogicalKey::LineEnd => buf.cursor = buf.buf.len(),
            LogicalKey::Char(ch) => buf.write_runes(&[ch]),
            _ => {
                session.bell()?;
                continue;
            }
        }

        // Keep the grid in sync with what was typed.
        if completer.is_in_complete_mode() && key != LogicalKey::Tab {
            completer
                .on_complete(&mut buf, lock_output_device_as_mut!(output_device))
                .map_err(r3bl_readline::ReadlineError::from)?;
        }
        redraw(&output_device, &buf).map_err(r3bl_readline::ReadlineError::from)?;
    }

    session.close().await?;
    Ok(())
}
