//! Cabinet LED controller (Ultimarc PacDrive)
//!
//! The board takes a 5-byte output report: report ID, 0xDD, two reserved
//! bytes and the LED bitmask.

use crate::error::LedError;
use hidapi::HidApi;
use tracing::debug;

const LED_COMMAND: u8 = 0xDD;

/// Parse `0x1F` / `1f` style masks
pub fn parse_mask(raw: &str) -> Result<u8, LedError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let value =
        u32::from_str_radix(digits, 16).map_err(|_| LedError::InvalidMask(raw.to_string()))?;
    u8::try_from(value).map_err(|_| LedError::OutOfRange(value))
}

/// Output report for `mask`
pub fn build_report(mask: u8) -> [u8; 5] {
    [0x00, LED_COMMAND, 0x00, 0x00, mask]
}

/// Send `mask` to the controller identified by vendor/product id
pub fn set_mask(vendor_id: u16, product_id: u16, mask: u8) -> Result<(), LedError> {
    let api = HidApi::new()?;
    let device = api.open(vendor_id, product_id)?;

    let report = build_report(mask);
    debug!("Sending LED report: {:02x?}", report);
    device.write(&report)?;
    Ok(())
}
