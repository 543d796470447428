//! Reference config inspection
//!
//! MAME stores input bindings as
//!
//! ```xml
//! <port tag=":IN1" type="P2_BUTTON1" mask="1" defvalue="0">
//!     <newseq type="standard">JOYCODE_3_BUTTON1</newseq>
//! </port>
//! ```
//!
//! The token bound to one anchor port tells which way round the whole file
//! currently maps the two sticks.

use crate::error::ConfigError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs;
use std::path::Path;
use tracing::{error, info};

const PORT_TAG: &[u8] = b"port";
const SEQ_TAG: &[u8] = b"newseq";
const STANDARD_SEQ: &str = "standard";

/// Whether the anchor port in `path` is bound to `normal_token`.
///
/// Unreadable or malformed files, and files without the anchor, count as
/// swapped (`false`). Errors are logged here and never returned.
pub fn inspect(path: &Path, anchor_port: &str, normal_token: &str) -> bool {
    match read_anchor_sequence(path, anchor_port) {
        Ok(Some(seq)) => seq.contains(normal_token),
        Ok(None) => {
            info!("No standard sequence for {} in {:?}", anchor_port, path);
            false
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

/// Load `path` and return the standard sequence text of the anchor port
pub fn read_anchor_sequence(path: &Path, anchor_port: &str) -> Result<Option<String>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    find_anchor_sequence(&raw, anchor_port).map_err(|(position, source)| ConfigError::Parse {
        path: path.to_path_buf(),
        position,
        source,
    })
}

/// Two-level lookup: first `port[type=anchor]`, then its first direct
/// `newseq[type=standard]` child. Later anchor ports are ignored. The whole
/// document is still read so malformed trailing markup is reported.
pub fn find_anchor_sequence(
    xml: &str,
    anchor_port: &str,
) -> Result<Option<String>, (u64, quick_xml::Error)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    // Depth of the anchor port while inside it
    let mut anchor_depth: Option<usize> = None;
    let mut anchor_done = false;
    // Text collected for the sequence currently being read
    let mut in_seq: Option<String> = None;
    let mut found: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| (reader.buffer_position(), e))?;

        match event {
            Event::Start(element) => {
                depth += 1;
                match anchor_depth {
                    None if !anchor_done
                        && element.name().as_ref() == PORT_TAG
                        && has_type(&element, anchor_port) =>
                    {
                        anchor_depth = Some(depth);
                    }
                    Some(port_depth)
                        if depth == port_depth + 1
                            && found.is_none()
                            && element.name().as_ref() == SEQ_TAG
                            && has_type(&element, STANDARD_SEQ) =>
                    {
                        in_seq = Some(String::new());
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => {
                let is_direct_child = anchor_depth.is_some_and(|d| depth == d);
                if is_direct_child
                    && found.is_none()
                    && element.name().as_ref() == SEQ_TAG
                    && has_type(&element, STANDARD_SEQ)
                {
                    found = Some(String::new());
                }
            }
            Event::Text(text) => {
                if let Some(seq) = in_seq.as_mut() {
                    let text = text.unescape().map_err(|e| (reader.buffer_position(), e))?;
                    seq.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(seq) = in_seq.as_mut() {
                    seq.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                if let Some(port_depth) = anchor_depth {
                    if depth == port_depth + 1 {
                        if let Some(seq) = in_seq.take() {
                            found = Some(seq);
                        }
                    } else if depth == port_depth {
                        anchor_depth = None;
                        anchor_done = true;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(found)
}

fn has_type(element: &BytesStart, expected: &str) -> bool {
    element
        .attributes()
        .with_checks(false)
        .flatten()
        .any(|attr| attr.key.as_ref() == b"type" && attr.value.as_ref() == expected.as_bytes())
}
