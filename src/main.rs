use scriptgen::{
    cli::{get_args, get_log_level_from_verbose, run},
    constants::exit_codes,
    error::default_error_handler,
};

fn main() {
    let args = get_args();
    env_logger::Builder::new().filter_level(get_log_level_from_verbose(args.verbose)).init();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(exit_codes::FAILURE),
        Err(err) => default_error_handler(err),
    }
}
