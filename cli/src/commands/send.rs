use crate::{helper, CLIError};
use mesh_provisioner::access::{build_network_pdu_with_layout, PduBuildError, APP_IDX_DEV};
use mesh_provisioner::net::PrivacyRandomLayout;

pub fn sub_command() -> clap::App<'static, 'static> {
    clap::SubCommand::with_name("send")
        .about("Encrypt and obfuscate an unsegmented access message into a network PDU")
        .arg(
            clap::Arg::with_name("payload")
                .help("model-layer opcode + parameters as hex (1 to 11 bytes)")
                .required(true)
                .value_name("MODEL_HEX")
                .validator(helper::is_model_payload_validator),
        )
        .arg(
            clap::Arg::with_name("src")
                .help("source unicast address (decimal or 0x hex)")
                .required(true)
                .value_name("SRC")
                .validator(helper::is_u16_or_hex_validator),
        )
        .arg(
            clap::Arg::with_name("dst")
                .help("destination address (decimal or 0x hex)")
                .required(true)
                .value_name("DST")
                .validator(helper::is_u16_or_hex_validator),
        )
        .arg(
            clap::Arg::with_name("ttl")
                .short("t")
                .long("ttl")
                .value_name("TTL")
                .default_value("127")
                .validator(helper::is_ttl_validator),
        )
        .arg(
            clap::Arg::with_name("app_idx")
                .short("a")
                .long("app-idx")
                .value_name("APP_IDX")
                .default_value("0")
                .help("position of the app key in the document, or 'dev' for the device key"),
        )
        .arg(
            clap::Arg::with_name("seq")
                .short("q")
                .long("seq")
                .value_name("SEQ")
                .validator(helper::is_u24_validator)
                .help("24-bit sequence number; allocated from the network counter if omitted"),
        )
        .arg(
            clap::Arg::with_name("zero_padded_pecb")
                .long("zero-padded-pecb")
                .takes_value(false)
                .help("obfuscate with the zero-padded PECB input instead of the IV-index layout"),
        )
}

pub fn send_matches(
    parent_logger: &slog::Logger,
    network_path: &str,
    send_matches: &clap::ArgMatches,
) -> Result<(), CLIError> {
    let logger = parent_logger.new(o!("network_path" => network_path.to_owned()));
    let network = helper::load_network(network_path)?;
    debug!(logger, "loaded_network";
        "uuid" => network.uuid().to_owned(),
        "net_keys" => network.net_keys().len(),
        "app_keys" => network.app_keys().len(),
    );
    let payload = helper::hex_str_to_vec(
        send_matches.value_of("payload").expect("required by clap"),
    )
    .expect("validated by clap");
    let src = helper::u16_from_str(send_matches.value_of("src").expect("required by clap"))
        .expect("validated by clap");
    let dst = helper::u16_from_str(send_matches.value_of("dst").expect("required by clap"))
        .expect("validated by clap");
    let ttl: u8 = send_matches
        .value_of("ttl")
        .expect("defaulted by clap")
        .parse()
        .expect("validated by clap");
    let app_idx = match send_matches.value_of("app_idx").expect("defaulted by clap") {
        "dev" => APP_IDX_DEV,
        v => v.parse().map_err(|_| {
            CLIError::Clap(clap::Error::with_description(
                &format!("'{}' is not an app key position or 'dev'", v),
                clap::ErrorKind::InvalidValue,
            ))
        })?,
    };
    let seq: u32 = match send_matches.value_of("seq") {
        Some(v) => v.parse().expect("validated by clap"),
        None => {
            let seq = network
                .next_seq()
                .ok_or(CLIError::Build(PduBuildError::SequenceExhausted))?;
            (seq.0).value()
        }
    };
    let layout = if send_matches.is_present("zero_padded_pecb") {
        PrivacyRandomLayout::ZeroPadded
    } else {
        PrivacyRandomLayout::WithIvIndex
    };
    debug!(logger, "send";
        "payload" => format!("{:x}", helper::HexSlice(&payload)),
        "src" => src, "dst" => dst, "ttl" => ttl,
        "app_idx" => app_idx, "seq" => seq,
        "iv_index" => network.iv_index().0,
    );
    let pdu = build_network_pdu_with_layout(&payload, &network, app_idx, seq, src, dst, ttl, layout)
        .map_err(CLIError::Build)?;
    debug!(logger, "network_pdu"; "len" => pdu.len());
    println!("{:x}", helper::HexSlice(pdu.as_ref()));
    Ok(())
}
