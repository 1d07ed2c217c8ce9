use std::path::PathBuf;

use clap::{value_parser, Arg, Command};

use anonboard::{Config, Error, Result};

fn main_res() -> Result<()> {
    let matches = Command::new("anonboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("Config file to use"),
        )
        .arg(
            Arg::new("database-url")
                .short('u')
                .long("database-url")
                .value_name("URL")
                .num_args(1)
                .help("URL to use to connect to the database, or 'memory'"),
        )
        .subcommand(Command::new("serve").about("Serve the boards (the default)"))
        .subcommand(
            Command::new("generate-config")
                .about("Print a config file with the default values"),
        )
        .subcommand(
            Command::new("check-config")
                .about("Check configuration file for errors"),
        )
        .get_matches();

    if matches.subcommand_matches("generate-config").is_some() {
        return Config::generate(std::io::stdout());
    }

    let conf_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(Config::default_path);

    let mut config = Config::open(&conf_path)?;

    if let Some(url) = matches.get_one::<String>("database-url") {
        config.database_url = url.to_owned();
    }

    if matches.subcommand_matches("check-config").is_some() {
        config.registry()?;
        config.limits()?;

        println!("Configuration: {}", conf_path.display());
        println!("\nThe config file is good.");

        return Ok(());
    }

    anonboard::init_logging(&config)?;

    log::info!("Loaded config from {}", conf_path.display());
    config.debug_log();

    let rocket = anonboard::new_instance(config)?;

    rocket::execute(rocket.launch())
        .map(|_| ())
        .map_err(|err| Error::Launch {
            msg: err.to_string(),
        })
}

fn main() {
    if let Err(e) = main_res() {
        eprintln!("{}", e);
        std::process::exit(-1);
    }
}
