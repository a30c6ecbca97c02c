//! Command line front end for the settlement verification core.
//!
//! Every subcommand prints a single JSON document on stdout. Logs go to stderr.

mod args;
mod cmd;
mod util;

use args::resolve_context_and_subcommand;
use cmd::exec_subc;

fn main() {
    let args: args::Args = argh::from_env();
    let inner = || -> anyhow::Result<()> {
        let (ctx, subc) = resolve_context_and_subcommand(args)?;
        bs_common::logging::init(ctx.logging.clone());
        exec_subc(subc, &ctx)?;
        Ok(())
    };
    if let Err(e) = inner() {
        eprintln!("ERROR\n{e:?}");
        std::process::exit(1);
    }
}
