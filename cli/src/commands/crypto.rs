use crate::{helper, CLIError};
use mesh_provisioner::crypto::key::{AppKey, NetKey};
use mesh_provisioner::crypto::{k2, s1};

pub fn sub_command() -> clap::App<'static, 'static> {
    clap::SubCommand::with_name("crypto")
        .about("Mesh key derivation helpers")
        .subcommand(
            clap::SubCommand::with_name("s1")
                .about("s1 salt of the UTF-8 bytes of TEXT")
                .arg(
                    clap::Arg::with_name("text")
                        .required(true)
                        .value_name("TEXT"),
                ),
        )
        .subcommand(
            clap::SubCommand::with_name("k2")
                .about("master credentials (NID, encryption key, privacy key) of a netkey")
                .arg(
                    clap::Arg::with_name("net_key_hex")
                        .required(true)
                        .value_name("NET_KEY_HEX")
                        .validator(helper::is_128_bit_hex_str_validator),
                ),
        )
        .subcommand(
            clap::SubCommand::with_name("aid")
                .about("6-bit application key identifier (k4) of an appkey")
                .arg(
                    clap::Arg::with_name("app_key_hex")
                        .required(true)
                        .value_name("APP_KEY_HEX")
                        .validator(helper::is_128_bit_hex_str_validator),
                ),
        )
}

pub fn crypto_matches(
    parent_logger: &slog::Logger,
    crypto_matches: &clap::ArgMatches,
) -> Result<(), CLIError> {
    let logger = parent_logger.new(o!());
    debug!(logger, "crypto_sub_command");
    match crypto_matches.subcommand() {
        ("s1", Some(s1_matches)) => {
            let text = s1_matches.value_of("text").expect("required by clap");
            println!("{:x}", helper::HexSlice(s1(text).as_ref()));
        }
        ("k2", Some(k2_matches)) => {
            let key_hex = k2_matches.value_of("net_key_hex").expect("required by clap");
            let key_buf =
                helper::hex_str_to_bytes::<[u8; 16]>(key_hex).expect("validated by clap");
            let key = NetKey::new_bytes(key_buf);
            let (nid, encryption_key, privacy_key) = k2(&key.key(), b"\x00");
            println!("nid: {:#04x}", nid.value());
            println!(
                "encryption_key: {:x}",
                helper::HexSlice(encryption_key.key().as_ref())
            );
            println!(
                "privacy_key: {:x}",
                helper::HexSlice(privacy_key.key().as_ref())
            );
        }
        ("aid", Some(aid_matches)) => {
            let key_hex = aid_matches
                .value_of("app_key_hex")
                .expect("required by clap");
            let key_buf =
                helper::hex_str_to_bytes::<[u8; 16]>(key_hex).expect("validated by clap");
            let key = AppKey::new_bytes(key_buf);
            println!("aid: {:#04x}", u8::from(key.aid()));
        }
        ("", None) => error!(logger, "no_crypto_subcommand"),
        _ => unreachable!("unhandled crypto subcommand"),
    }
    Ok(())
}
