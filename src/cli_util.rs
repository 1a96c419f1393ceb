use std::io::{self, Write};

use nu_ansi_term::Color;

use crate::check::{CheckError, CheckReport};
use crate::runner::RunnerError;

/// Echo the captured tool output, then the verdict. The output is printed
/// pass or fail so a red run can be diagnosed from the test log alone.
pub fn print_report(report: &CheckReport) {
    echo_output(&report.result.stdout, &report.result.stderr);

    if report.passed() {
        println!(
            "{} ({} ms)",
            Color::Green.paint("check passed"),
            report.result.elapsed.as_millis()
        );
    } else {
        for failure in &report.failures {
            eprintln!("  {} {failure}", Color::Red.paint("assertion failed:"));
        }
        eprintln!("{}", Color::Red.bold().paint("check failed"));
    }
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

/// Print an infrastructure failure, prefixed with the program name.
/// A timed-out tool still gets its partial output echoed.
pub fn print_check_error(program: &str, err: &CheckError) {
    if let CheckError::Runner(RunnerError::Timeout { partial_output, .. }) = err {
        if !partial_output.is_empty() {
            print!("{partial_output}");
            if !partial_output.ends_with('\n') {
                println!();
            }
        }
    }
    eprintln!("{program}: {err}");
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

fn echo_output(stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        print!("{stdout}");
        if !stdout.ends_with('\n') {
            println!();
        }
    }
    if !stderr.is_empty() {
        eprint!("{stderr}");
        if !stderr.ends_with('\n') {
            eprintln!();
        }
    }
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}
