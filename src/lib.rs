//! joyswap - arcade cabinet joystick identity check
//!
//! Works out which of two identical Xin-Mo encoders is wired as Player 1 and
//! keeps the MAME input configs in line with the order the kernel enumerated
//! them in on this boot.

pub mod catalog;
pub mod error;
pub mod inspector;
pub mod joystick;
pub mod leds;
pub mod poll;
pub mod prompt;
pub mod reconcile;
pub mod resolver;
pub mod settings;
pub mod swapper;
