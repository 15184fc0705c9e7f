use crate::CLIError;
use mesh_provisioner::document::NetworkDocument;
use mesh_provisioner::network::MeshNetwork;
use mesh_provisioner::transport::APP_PAYLOAD_MAX_LEN;
use std::convert::TryFrom;
use std::fmt::{Error, Formatter};
use std::str::FromStr;

pub struct HexSlice<'a>(pub &'a [u8]);
impl<'a> std::fmt::UpperHex for HexSlice<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for &b in self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}
impl<'a> std::fmt::LowerHex for HexSlice<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for &b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
pub fn is_hex_str(s: &str) -> bool {
    if s.is_empty() || s.len() % 2 == 1 {
        return false;
    }
    for c in s.chars() {
        if !c.is_digit(16) {
            return false;
        }
    }
    true
}
pub fn is_128_bit_hex_str_validator(input: String) -> Result<(), String> {
    if input.len() == 32 && is_hex_str(&input) {
        Ok(())
    } else {
        Err(format!("'{}' is not a 128-bit hex string", &input))
    }
}
pub fn is_model_payload_validator(input: String) -> Result<(), String> {
    if is_hex_str(&input) && input.len() <= APP_PAYLOAD_MAX_LEN * 2 {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not a 1..={} byte hex payload",
            &input, APP_PAYLOAD_MAX_LEN
        ))
    }
}
pub fn is_ttl_validator(input: String) -> Result<(), String> {
    match u8::from_str(&input) {
        Ok(v) if v <= 127 => Ok(()),
        _ => Err(format!("'{}' is not a valid TTL", &input)),
    }
}
pub fn is_u24_validator(input: String) -> Result<(), String> {
    match u32::from_str(&input) {
        Ok(v) if v <= 0x00FF_FFFF => Ok(()),
        _ => Err(format!("'{}' is not a 24-bit unsigned integer", &input)),
    }
}
/// `u16` given either as decimal or as `0x` prefixed hex (addresses read
/// better in hex).
pub fn u16_from_str(s: &str) -> Option<u16> {
    if let Some(hex) = s.strip_prefix("0x") {
        u16::from_str_radix(hex, 16).ok()
    } else {
        u16::from_str(s).ok()
    }
}
pub fn is_u16_or_hex_validator(input: String) -> Result<(), String> {
    match u16_from_str(&input) {
        Some(_) => Ok(()),
        None => Err(format!("'{}' is not a 16-bit unsigned integer", &input)),
    }
}
pub fn hex_str_to_bytes<T: Default + AsMut<[u8]>>(s: &str) -> Option<T> {
    let mut out = T::default();
    if s.len() != out.as_mut().len() * 2 || out.as_mut().is_empty() {
        None
    } else {
        {
            let buf = out.as_mut();
            for (i, c) in s.chars().enumerate() {
                let v = u8::try_from(c.to_digit(16)?).expect("only returns [0..=15]");
                buf[i / 2] |= v << u8::try_from(((i + 1) % 2) * 4).expect("only returns 0 or 4");
            }
        }
        Some(out)
    }
}
pub fn hex_str_to_vec(s: &str) -> Option<Vec<u8>> {
    if !is_hex_str(s) {
        return None;
    }
    let mut out = vec![0_u8; s.len() / 2];
    for (i, c) in s.chars().enumerate() {
        let v = u8::try_from(c.to_digit(16)?).expect("only returns [0..=15]");
        out[i / 2] |= v << u8::try_from(((i + 1) % 2) * 4).expect("only returns 0 or 4");
    }
    Some(out)
}
pub fn load_file(path: &str, writeable: bool, create: bool) -> Result<std::fs::File, CLIError> {
    std::fs::OpenOptions::new()
        .read(true)
        .write(writeable)
        .truncate(writeable)
        .create(create)
        .open(path)
        .map_err(|e| CLIError::IOError(path.to_owned(), e))
}
pub fn load_network(path: &str) -> Result<MeshNetwork, CLIError> {
    let document: NetworkDocument =
        serde_json::from_reader(load_file(path, false, false)?).map_err(CLIError::SerdeJSON)?;
    let (uuid, record) = document
        .into_entry()
        .ok_or_else(|| CLIError::OtherMessage("network document is empty".to_owned()))?;
    record.into_network(uuid).map_err(CLIError::Build)
}
