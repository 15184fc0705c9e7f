use crate::{helper, CLIError};
use mesh_provisioner::crypto::materials::NetworkKeys;

pub fn sub_command() -> clap::App<'static, 'static> {
    clap::SubCommand::with_name("network")
        .about("Summarize a network document")
        .arg(
            clap::Arg::with_name("nid")
                .long("nid")
                .takes_value(false)
                .help("include the derived NID of every netkey"),
        )
}

pub fn network_matches(
    parent_logger: &slog::Logger,
    network_path: &str,
    network_matches: &clap::ArgMatches,
) -> Result<(), CLIError> {
    let logger = parent_logger.new(o!("network_path" => network_path.to_owned()));
    let network = helper::load_network(network_path)?;
    debug!(logger, "loaded_network");
    println!("uuid: {}", network.uuid());
    println!("name: {}", network.name());
    println!("iv_index: {}", network.iv_index().0);
    println!("sequence: {}", network.seq_counter().check());
    println!("next_unicast: {:#06x}", network.next_unicast());
    let print_nid = network_matches.is_present("nid");
    for net_key in network.net_keys() {
        if print_nid {
            let derived = NetworkKeys::from(net_key.key());
            println!(
                "netkey index: {} nid: {:#04x}",
                u16::from(net_key.index().0),
                derived.nid().value()
            );
        } else {
            println!("netkey index: {}", u16::from(net_key.index().0));
        }
    }
    for (position, app_key) in network.app_keys().iter().enumerate() {
        println!(
            "appkey position: {} index: {} bound: {}",
            position,
            u16::from(app_key.index().0),
            u16::from(app_key.bound_net_key().0)
        );
    }
    for node in network.nodes() {
        println!(
            "node {:#06x} elements: {} name: {}",
            u16::from(node.unicast()),
            node.element_count(),
            node.name()
        );
    }
    Ok(())
}
