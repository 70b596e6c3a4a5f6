//! Vellum entrypoint: a line-oriented driver for manual exercise.
//!
//! Reads editing commands from stdin, flushes the editor's deferred queue
//! once per iteration (standing in for the host's frame tick), and prints
//! the committed value and format state after each command.

use anyhow::Result;
use clap::Parser;
use core_config::load_from;
use core_editor::{DialogState, Editor, HostNotifier};
use core_keymap::{KeyInput, Mods};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "vellum", version, about = "Vellum rich text editing core")] // minimal metadata
struct Args {
    /// Optional markup file loaded as the initial value. If omitted the
    /// editor starts empty.
    pub path: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `vellum.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

/// Echoes every change callback, the way a host form field would observe it.
struct ChangeEcho;

impl HostNotifier for ChangeEcho {
    fn value_changed(&mut self, value: &str) {
        println!("on_change: {value:?}");
    }
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn run(&mut self) -> Result<Editor> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        let args = Args::parse();
        Self::load_editor(&args)
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("vellum.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "vellum.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn load_editor(args: &Args) -> Result<Editor> {
        let mut open_failed = false;
        let initial = if let Some(path) = args.path.as_ref() {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    tracing::debug!(target: "io", file = %path.display(), size_bytes = content.len(), "file_read_ok");
                    content
                }
                Err(e) => {
                    error!(target: "io", ?e, "file_open_error");
                    open_failed = true;
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let mut config = load_from(args.config.clone())?;
        let (history_capacity, paste_max) = config.apply_limits();
        let path_str = args.path.as_ref().map(|p| p.to_string_lossy().to_string());
        info!(
            target: "runtime.startup",
            path = path_str.as_deref(),
            open_failed,
            config_override = args.config.is_some(),
            history_capacity,
            paste_max,
            "bootstrap_complete"
        );

        Ok(Editor::new(&initial, config, Box::new(ChangeEcho)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Help,
    Show,
    Quit,
    Focus,
    Blur,
    Select(usize, usize),
    Type(String),
    Enter,
    Backspace,
    Delete,
    Bold,
    Italic,
    Underline,
    Bulleted,
    Numbered,
    Quote,
    Link { url: String, text: Option<String> },
    Unlink,
    Paste(String),
    Sync(String),
    Undo,
    Redo,
    Key(KeyInput),
}

enum LoopControl {
    Continue,
    Break,
}

fn parse_line(line: &str) -> Option<ReplCommand> {
    let (verb, rest) = match line.split_once(' ') {
        Some((v, r)) => (v, r.trim()),
        None => (line, ""),
    };
    match verb {
        "help" => Some(ReplCommand::Help),
        "show" => Some(ReplCommand::Show),
        "quit" | "exit" => Some(ReplCommand::Quit),
        "focus" => Some(ReplCommand::Focus),
        "blur" => Some(ReplCommand::Blur),
        "select" | "sel" => {
            let mut parts = rest.split_whitespace();
            let anchor = parts.next()?.parse().ok()?;
            let head = match parts.next() {
                Some(h) => h.parse().ok()?,
                None => anchor,
            };
            Some(ReplCommand::Select(anchor, head))
        }
        "type" => Some(ReplCommand::Type(rest.to_string())),
        "enter" => Some(ReplCommand::Enter),
        "bs" | "backspace" => Some(ReplCommand::Backspace),
        "del" | "delete" => Some(ReplCommand::Delete),
        "bold" => Some(ReplCommand::Bold),
        "italic" => Some(ReplCommand::Italic),
        "underline" => Some(ReplCommand::Underline),
        "bulleted" | "bullets" => Some(ReplCommand::Bulleted),
        "numbered" | "numbers" => Some(ReplCommand::Numbered),
        "quote" => Some(ReplCommand::Quote),
        "link" => {
            let mut parts = rest.splitn(2, ' ');
            let url = parts.next().unwrap_or("").to_string();
            if url.is_empty() {
                return None;
            }
            let text = parts
                .next()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            Some(ReplCommand::Link { url, text })
        }
        "unlink" => Some(ReplCommand::Unlink),
        "paste" => Some(ReplCommand::Paste(rest.replace("\\n", "\n"))),
        "sync" => Some(ReplCommand::Sync(rest.to_string())),
        "undo" => Some(ReplCommand::Undo),
        "redo" => Some(ReplCommand::Redo),
        "key" => parse_key(rest).map(ReplCommand::Key),
        _ => None,
    }
}

/// Parse a chord like `ctrl+b` or `cmd+shift+z`.
fn parse_key(chord: &str) -> Option<KeyInput> {
    let mut mods = Mods::empty();
    let mut key = None;
    for part in chord.split('+') {
        match part.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" => mods |= Mods::CTRL,
            "alt" => mods |= Mods::ALT,
            "shift" => mods |= Mods::SHIFT,
            "cmd" | "meta" | "super" => mods |= Mods::META,
            other => {
                let mut chars = other.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                key = Some(c);
            }
        }
    }
    key.map(|key| KeyInput::new(key, mods))
}

fn run_command(editor: &mut Editor, cmd: ReplCommand) -> LoopControl {
    match cmd {
        ReplCommand::Quit => return LoopControl::Break,
        ReplCommand::Help => print_help(),
        ReplCommand::Show => {}
        ReplCommand::Focus => editor.focus(),
        ReplCommand::Blur => editor.blur(),
        ReplCommand::Select(anchor, head) => editor.select(anchor, head),
        ReplCommand::Type(text) => editor.insert_text(&text),
        ReplCommand::Enter => editor.insert_paragraph(),
        ReplCommand::Backspace => editor.delete_backward(),
        ReplCommand::Delete => editor.delete_forward(),
        ReplCommand::Bold => editor.toggle_bold(),
        ReplCommand::Italic => editor.toggle_italic(),
        ReplCommand::Underline => editor.toggle_underline(),
        ReplCommand::Bulleted => editor.toggle_bulleted(),
        ReplCommand::Numbered => editor.toggle_numbered(),
        ReplCommand::Quote => editor.toggle_quote(),
        ReplCommand::Link { url, text } => {
            editor.open_link_dialog();
            let prefill = editor
                .link_draft()
                .map(|d| d.text.clone())
                .unwrap_or_default();
            editor.update_link_draft(&url, text.as_deref().unwrap_or(&prefill));
            if editor.confirm_link_dialog() == DialogState::Open {
                println!("link rejected: {url}");
                editor.cancel_link_dialog();
            }
        }
        ReplCommand::Unlink => editor.remove_link(),
        ReplCommand::Paste(payload) => editor.paste(&payload),
        ReplCommand::Sync(value) => editor.sync_value(&value),
        ReplCommand::Undo => {
            if !editor.undo() {
                println!("nothing to undo");
            }
        }
        ReplCommand::Redo => {
            if !editor.redo() {
                println!("nothing to redo");
            }
        }
        ReplCommand::Key(input) => {
            if !editor.handle_key(input) {
                println!("chord not reserved");
            }
            if editor.link_draft().is_some() {
                println!("link dialog open; use `link URL [TEXT]` to apply");
                editor.cancel_link_dialog();
            }
        }
    }
    LoopControl::Continue
}

fn print_state(editor: &Editor) {
    println!("value: {:?}", editor.committed());
    let f = editor.format();
    let sel = editor.selection();
    let placeholder = if editor.placeholder_visible() {
        " placeholder"
    } else {
        ""
    };
    println!(
        "format: bold={} italic={} underline={} bulleted={} numbered={} quoted={} | selection {}..{} | undo {} redo {}{}",
        f.bold,
        f.italic,
        f.underline,
        f.bulleted,
        f.numbered,
        f.quoted,
        sel.anchor,
        sel.head,
        editor.state().undo_depth(),
        editor.state().redo_depth(),
        placeholder
    );
}

fn print_help() {
    println!(
        "commands:\n  \
         select A [H]      set selection offsets\n  \
         type TEXT         insert text at the selection\n  \
         enter             paragraph break\n  \
         bs | del          delete backward / forward\n  \
         bold | italic | underline\n  \
         bulleted | numbered | quote\n  \
         link URL [TEXT]   apply a link\n  \
         unlink            clear links in the selection\n  \
         paste TEXT        plain-text paste (\\n splits paragraphs)\n  \
         sync MARKUP       host-driven value replacement\n  \
         undo | redo\n  \
         key CHORD         e.g. key ctrl+b, key cmd+shift+z\n  \
         focus | blur | show | quit"
    );
}

fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    let mut editor = startup.run()?;

    print_state(&editor);
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(cmd) = parse_line(trimmed) else {
            println!("unrecognized: {trimmed} (try `help`)");
            continue;
        };
        if matches!(run_command(&mut editor, cmd), LoopControl::Break) {
            break;
        }
        editor.tick();
        print_state(&editor);
    }

    info!(target: "runtime", "shutdown");
    Ok(())
}
