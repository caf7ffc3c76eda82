use clap::{App, Arg};
use log::{error, info};
use simple_data_server::mirror::rest_mirror::DEFAULT_MIRROR_TABLE;
use simple_data_server::server::{ServerConfig, ServerNode};
use std::net::IpAddr;

fn setup_logger(log_file: Option<&str>, verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        // rocket's own request logging is noisy at debug
        .level_for("rocket", log::LevelFilter::Warn)
        .chain(std::io::stdout());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}

fn env_or(name: &str, arg: Option<&str>) -> Option<String> {
    arg.map(String::from).or_else(|| std::env::var(name).ok())
}

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    let matches = App::new("simple-data-server")
        .version("1.0")
        .about("A small REST service that stores records in memory and mirrors writes")
        .arg(
            Arg::new("port")
                .long("port")
                .takes_value(true)
                .help("Port to listen on (defaults to $PORT, then 8000)"),
        )
        .arg(
            Arg::new("address")
                .long("address")
                .takes_value(true)
                .default_value("0.0.0.0")
                .help("Address to bind"),
        )
        .arg(
            Arg::new("mirror_url")
                .long("mirror-url")
                .takes_value(true)
                .help("Base URL of the hosted mirror table service (or $MIRROR_URL)"),
        )
        .arg(
            Arg::new("mirror_key")
                .long("mirror-key")
                .takes_value(true)
                .help("API key for the mirror service (or $MIRROR_API_KEY)"),
        )
        .arg(
            Arg::new("mirror_table")
                .long("mirror-table")
                .takes_value(true)
                .help("Mirror table name (or $MIRROR_TABLE)"),
        )
        .arg(
            Arg::new("use_memory_mirror")
                .long("use-memory-mirror")
                .help("Mirror writes into an in-process table instead of a hosted one"),
        )
        .arg(
            Arg::new("log_file")
                .long("log-file")
                .takes_value(true)
                .help("Also write logs to this file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log at debug level"),
        )
        .get_matches();
    if let Err(e) = setup_logger(matches.value_of("log_file"), matches.is_present("verbose")) {
        eprintln!("Failed to set up logging: {}", e);
    }

    let port_flag = matches.value_of("port");
    let port_env = std::env::var("PORT").ok();
    let port = match ServerConfig::resolve_port(port_flag, port_env.as_deref()) {
        Ok(port) => port,
        Err(e) => {
            error!(
                "Invalid port '{}': {}",
                port_flag.or(port_env.as_deref()).unwrap_or_default(),
                e
            );
            std::process::exit(2);
        }
    };
    let address_arg = matches.value_of("address").unwrap_or("0.0.0.0");
    let address = match address_arg.parse::<IpAddr>() {
        Ok(address) => address,
        Err(e) => {
            error!("Invalid address '{}': {}", address_arg, e);
            std::process::exit(2);
        }
    };
    let config = ServerConfig {
        port,
        address,
        mirror_url: env_or("MIRROR_URL", matches.value_of("mirror_url")),
        mirror_api_key: env_or("MIRROR_API_KEY", matches.value_of("mirror_key")),
        mirror_table: env_or("MIRROR_TABLE", matches.value_of("mirror_table"))
            .unwrap_or_else(|| String::from(DEFAULT_MIRROR_TABLE)),
        use_memory_mirror: matches.is_present("use_memory_mirror"),
    };
    let server_node = match ServerNode::new(config) {
        Ok(node) => node,
        Err(e) => {
            error!("Failed to set up mirror: {}", e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}:{}", address, port);
    let _ = server_node.build().launch().await?;
    Ok(())
}
