/*!
 * Build Relay - Main Entry Point
 *
 * Parses the command line, picks the role for this process and exits with
 * the role's return code.
 */

use build_relay::{
    init_tracing, parse_args, InterruptGuard, Orchestrator, ParseOutcome, RelayConfig,
    RelayError, ReturnCode, ScriptEngine,
};
use tracing::{debug, warn};

fn run() -> ReturnCode {
    let config = RelayConfig::from_env();
    init_tracing(&config);

    // Installed before anything can block on the instance mutex.
    let interrupt = match InterruptGuard::install() {
        Ok(guard) => guard,
        Err(e) => {
            warn!(error = %e, "could not install interrupt handler");
            let err: RelayError = e.into();
            eprintln!("{:?}", miette::Report::new(err));
            return ReturnCode::BuildFailed;
        }
    };

    let options = match parse_args(std::env::args()) {
        Ok(ParseOutcome::Run(options)) => *options,
        Ok(ParseOutcome::Quit) => return ReturnCode::Ok,
        Err(e) => {
            let err: RelayError = e.into();
            let code = err.return_code();
            eprintln!("{:?}", miette::Report::new(err));
            return code;
        }
    };

    debug!(
        role = %options.wrapper_mode,
        working_dir = %options.working_dir.display(),
        "options parsed"
    );

    let engine = ScriptEngine::from_options(&options);
    Orchestrator::new(interrupt, engine, options, config).run()
}

fn main() {
    // Everything owned by `run` is dropped before exiting.
    let code = run();
    std::process::exit(code.code());
}
