//! Hardware vs. config reconciliation

use tracing::info;

/// Whether the config files must be rewritten.
///
/// The reference config encodes an assumption about stick order. When that
/// assumption disagrees with the hardware, one swap restores consistency;
/// when both agree (either way round) nothing must change.
pub fn reconcile(hardware_swapped: bool, config_swapped: bool) -> bool {
    hardware_swapped ^ config_swapped
}

/// Decision record for one `swap` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapDecision {
    pub hardware_swapped: bool,
    pub config_swapped: bool,
    pub need_swap: bool,
}

impl SwapDecision {
    /// `config_normal` is what the inspector reported for the reference file
    pub fn new(hardware_swapped: bool, config_normal: bool) -> Self {
        let config_swapped = !config_normal;
        let need_swap = reconcile(hardware_swapped, config_swapped);
        info!(
            "Hardware swapped: {}, config swapped: {} -> swap needed: {}",
            hardware_swapped, config_swapped, need_swap
        );
        Self {
            hardware_swapped,
            config_swapped,
            need_swap,
        }
    }
}
