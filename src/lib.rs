//! An anonymous discussion board engine.
//!
//! Boards hold a bounded number of threads and threads hold a bounded number
//! of replies. Starting a thread on a full board pushes out its oldest thread;
//! replying to a full thread kills it.

#[macro_use]
extern crate diesel;

use std::sync::Arc;

use fern::colors::{Color, ColoredLevelConfig};

use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket};

use rocket_dyn_templates::Template;

pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod path;
pub mod routes;
pub mod schema;
pub mod validate;
pub mod views;

pub use crate::config::Config;
pub use crate::error::{Error, Result};

use crate::handlers::App;

/// Create a new Rocket instance serving the boards described by `config`.
pub fn new_instance(config: Config) -> Result<Rocket<Build>> {
    let app = App::new(config)?;

    log::debug!("Opened {:?}", app.store);

    let figment = rocket::Config::figment()
        .merge(("address", app.config.address.clone()))
        .merge(("port", app.config.port))
        .merge(("template_dir", app.config.template_dir.clone()))
        .merge(("log_level", "off"));

    let static_files = FileServer::new(
        app.config.static_dir.clone(),
        Options::Index | Options::Missing,
    );

    Ok(rocket::custom(figment)
        .mount("/", routes::routes())
        .mount("/static", static_files)
        .register("/", routes::catchers())
        .manage(Arc::new(app))
        .attach(Template::fairing()))
}

/// Install the logger described by `config`.
pub fn init_logging(config: &Config) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);

    let stdout = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}] {} {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new()
        .level(config.log_level)
        .level_for("rocket", log::LevelFilter::Warn)
        .level_for("_", log::LevelFilter::Warn)
        .chain(stdout);

    if let Some(ref log_file) = config.log_file {
        let msg = format!("Couldn't open log file at {}", log_file.display());
        let file =
            fern::log_file(log_file).map_err(|err| Error::from_io_error(err, msg))?;

        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} [{}] {} {}",
                        chrono::Utc::now().format("%F %T"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
    }

    dispatch.apply()?;

    Ok(())
}
