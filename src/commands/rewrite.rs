use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;

use polcheck::{ImageRef, Settings};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RewriteArgs {
    /// Settings JSON file with the repo map to apply
    #[arg(short = 's', long = "settings", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Image references to canonicalize or rewrite
    #[arg(value_name = "IMAGE", trailing_var_arg = true)]
    pub images: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RewriteArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RewriteArgs {
        settings, images, ..
    } = args;

    if images.is_empty() {
        usage_and_exit(program, 2);
    }

    let settings = match settings {
        Some(path) => match Settings::load(&path) {
            Ok((settings, _)) => Some(settings),
            Err(e) => {
                eprintln!("{program}: {e}");
                let _ = io::stderr().flush();
                return 2;
            }
        },
        None => None,
    };

    for image in &images {
        let parsed = ImageRef::parse(image);
        let line = settings
            .as_ref()
            .and_then(|s| parsed.rewrite(&s.repos))
            .unwrap_or_else(|| parsed.to_string());
        println!("{line}");
    }
    let _ = io::stdout().flush();
    0
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} rewrite [--settings <PATH>] <IMAGE>...

Options:
  --settings, -s <PATH>  Settings JSON file with the repo map to apply
  --help,  -h            Show this help

Description:
  Prints one line per IMAGE: its canonical form (docker.io/library/... inference,
  :latest when untagged), rewritten through the settings repo map when one is given.
  Useful for predicting what a mutating policy will produce for a fixture.

Examples:
- Canonicalize a bare image name:
    {0} rewrite alpine:3.10
- Preview a repo rewrite:
    {0} rewrite --settings settings.json quay.io/etcd/etcd:v3.5
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
