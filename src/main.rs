use argh::FromArgs;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tsh::Interpreter;
use tsh::input::{self, LineReader, Terminal};

#[derive(FromArgs)]
/// TSH, a tiny interactive pipeline shell.
struct Args {
    /// run a single line and exit with its status
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// do not clear the terminal on startup
    #[argh(switch)]
    no_clear: bool,

    /// log verbosity: off, error, warn, info, debug or trace
    #[argh(option, default = "LevelFilter::Warn")]
    log_level: LevelFilter,
}

fn run(args: Args) -> anyhow::Result<i32> {
    let mut sh = Interpreter::new();

    if let Some(line) = args.command {
        return Ok(sh.run_line(&line)?.exit_code());
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        input::bootstrap(&mut io::stdout(), !args.no_clear)?;
        sh.repl(&mut Terminal::new()?)
    } else {
        sh.repl(&mut LineReader::new(stdin.lock()))
    }
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    if let Err(e) = TermLogger::init(
        args.log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("tsh: failed to initialize logging: {}", e);
    }

    match run(args) {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("tsh: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
