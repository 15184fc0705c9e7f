use slog::Drain;
#[macro_use]
extern crate slog;

use std::convert::TryFrom;

pub mod commands;
pub mod helper;

#[derive(Debug)]
pub enum CLIError {
    IOError(String, std::io::Error),
    Clap(clap::Error),
    SerdeJSON(serde_json::Error),
    Build(mesh_provisioner::access::PduBuildError),
    OtherMessage(String),
}

fn main() {
    let app = clap::App::new("mesh-provisioner")
        .version(clap::crate_version!())
        .about("Builds outbound Bluetooth Mesh network PDUs from a persisted network document")
        .arg(
            clap::Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .max_values(5)
                .help("Set the amount of logging from level 0 up to level 5"),
        )
        .arg(
            clap::Arg::with_name("network")
                .short("n")
                .long("network")
                .value_name("FILE")
                .help("Specifies the network document .json file"),
        )
        .subcommand(commands::send::sub_command())
        .subcommand(commands::crypto::sub_command())
        .subcommand(commands::network::sub_command());
    let matches = app.get_matches();

    let log_level = slog::Level::from_usize(
        1 + usize::try_from(matches.occurrences_of("verbose"))
            .expect("verbose usize overflow (how??)"),
    )
    .expect("verbose limit set too low");
    let drain = slog_term::PlainSyncDecorator::new(std::io::stdout());
    let drain = slog_term::FullFormat::new(drain).build().fuse();
    let root = slog::Logger::root(slog::LevelFilter::new(drain, log_level).fuse(), o!());
    trace!(root, "main");
    let get_network_path = || -> &str {
        match matches.value_of("network") {
            Some(path) => path,
            None => clap::Error::with_description(
                "missing 'network.json' path",
                clap::ErrorKind::ArgumentNotFound,
            )
            .exit(),
        }
    };
    debug!(root, "arg_match"; "sub_command" => matches.subcommand().0);
    if let Err(e) = (|| -> Result<(), CLIError> {
        match matches.subcommand() {
            ("", None) => error!(root, "no command given"),
            ("send", Some(send_matches)) => {
                commands::send::send_matches(&root, get_network_path(), send_matches)?
            }
            ("crypto", Some(crypto_matches)) => {
                commands::crypto::crypto_matches(&root, crypto_matches)?
            }
            ("network", Some(network_matches)) => {
                commands::network::network_matches(&root, get_network_path(), network_matches)?
            }
            _ => unreachable!("unhandled subcommand"),
        }
        Ok(())
    })() {
        eprintln!("error: {:?}", e);
        std::process::exit(1);
    }
}
