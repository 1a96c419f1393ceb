use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, Write};

mod commands;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [--tool <PATH>] [--deny|--expect <SUBSTR>] [--settings <PATH>] --request-path <FIXTURE> <POLICY>
                                       # Run the policy tool against a fixture and assert the verdict
  {0} rewrite [--settings <PATH>] <IMAGE>...
                                       # Print the canonical (or rewritten) form of image references

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "polcheck", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(commands::run::RunArgs),
    Rewrite(commands::rewrite::RewriteArgs),
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("polcheck"));

    let cli = Cli::parse();

    if cli.help || cli.command.is_none() {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    }

    let code = match cli.command.unwrap() {
        Command::Run(args) => commands::run::run(&program, args),
        Command::Rewrite(args) => commands::rewrite::run(&program, args),
    };

    std::process::exit(code);
}
