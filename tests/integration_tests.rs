//! Integration tests for joyswap
//!
//! These tests drive inspection, reconciliation and swapping together on
//! temporary config directories. Tests that require hardware live in
//! `hardware_tests.rs`.

use joyswap::inspector;
use joyswap::reconcile::SwapDecision;
use joyswap::settings::AppSettings;
use joyswap::swapper::{self, TokenPair};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DEFAULT_CFG_NORMAL: &str = r#"<?xml version="1.0"?>
<mameconfig version="10">
    <system name="default">
        <input>
            <port type="P1_BUTTON1">
                <newseq type="standard">JOYCODE_2_BUTTON1</newseq>
            </port>
            <port type="P2_BUTTON1">
                <newseq type="standard">JOYCODE_3_BUTTON1</newseq>
            </port>
        </input>
    </system>
</mameconfig>
"#;

const GAME_CFG: &str = r#"<?xml version="1.0"?>
<mameconfig version="10">
    <system name="sf2">
        <input>
            <port tag=":IN1" type="P1_JOYSTICK_UP" mask="8" defvalue="8">
                <newseq type="standard">JOYCODE_2_YAXIS_UP_SWITCH</newseq>
            </port>
            <port tag=":IN1" type="P2_JOYSTICK_UP" mask="2048" defvalue="2048">
                <newseq type="standard">JOYCODE_3_YAXIS_UP_SWITCH</newseq>
            </port>
        </input>
    </system>
</mameconfig>
"#;

fn cfg_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("default.cfg"), DEFAULT_CFG_NORMAL).unwrap();
    fs::write(dir.path().join("sf2.cfg"), GAME_CFG).unwrap();
    fs::write(dir.path().join("galaga.cfg"), "<mameconfig version=\"10\"/>\n").unwrap();
    dir
}

/// Same steps as `joyswap swap <dir> <flag>`, returns the swap total
fn run_swap(dir: &Path, hardware_swapped: bool) -> usize {
    let settings = AppSettings::default();
    let tokens = settings.token_pair().unwrap();
    let normal = inspector::inspect(
        &dir.join(&settings.mapping.reference_file),
        &settings.mapping.anchor_port,
        tokens.second(),
    );
    let decision = SwapDecision::new(hardware_swapped, normal);
    if !decision.need_swap {
        return 0;
    }
    swapper::swap_directory(dir, &settings.mapping.file_suffix, &tokens)
        .unwrap()
        .total()
}

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (e.file_name().to_string_lossy().to_string(), fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_consistent_state_is_a_no_op() {
    let dir = cfg_dir();
    let before = snapshot(dir.path());

    assert_eq!(run_swap(dir.path(), false), 0);
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn test_swapped_hardware_rewrites_all_configs() {
    let dir = cfg_dir();

    assert_eq!(run_swap(dir.path(), true), 4);

    let default_cfg = dir.path().join("default.cfg");
    assert_eq!(
        inspector::read_anchor_sequence(&default_cfg, "P1_BUTTON1").unwrap().as_deref(),
        Some("JOYCODE_3_BUTTON1")
    );
    assert_eq!(
        inspector::read_anchor_sequence(&default_cfg, "P2_BUTTON1").unwrap().as_deref(),
        Some("JOYCODE_2_BUTTON1")
    );
    let sf2 = fs::read_to_string(dir.path().join("sf2.cfg")).unwrap();
    let expected = GAME_CFG
        .replace("JOYCODE_2_", "@")
        .replace("JOYCODE_3_", "JOYCODE_2_")
        .replace('@', "JOYCODE_3_");
    assert_eq!(sf2, expected);
    assert!(!inspector::inspect(&dir.path().join("default.cfg"), "P2_BUTTON1", "JOYCODE_3_"));
}

#[test]
fn test_rerun_after_correction_is_a_no_op() {
    let dir = cfg_dir();
    assert_eq!(run_swap(dir.path(), true), 4);
    let corrected = snapshot(dir.path());

    // Config now encodes swapped order, hardware is still swapped
    assert_eq!(run_swap(dir.path(), true), 0);
    assert_eq!(snapshot(dir.path()), corrected);

    // Hardware back to normal on the next boot: swap back to the original
    assert_eq!(run_swap(dir.path(), false), 4);
    assert_eq!(
        fs::read_to_string(dir.path().join("default.cfg")).unwrap(),
        DEFAULT_CFG_NORMAL
    );
}

#[test]
fn test_swapping_directory_twice_restores_bytes() {
    let dir = cfg_dir();
    let original = snapshot(dir.path());
    let tokens = TokenPair::new("JOYCODE_2_", "JOYCODE_3_").unwrap();

    swapper::swap_directory(dir.path(), "cfg", &tokens).unwrap();
    assert_ne!(snapshot(dir.path()), original);
    swapper::swap_directory(dir.path(), "cfg", &tokens).unwrap();
    assert_eq!(snapshot(dir.path()), original);
}

#[test]
fn test_missing_reference_file_counts_as_swapped() {
    let dir = cfg_dir();
    fs::remove_file(dir.path().join("default.cfg")).unwrap();

    // Missing reference reads as swapped, so swapped hardware needs no change
    assert_eq!(run_swap(dir.path(), true), 0);
    // and normal hardware triggers a swap of the remaining files
    assert_eq!(run_swap(dir.path(), false), 2);
}

#[test]
fn test_settings_file_drives_token_pair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        "[mapping]\nfirst_token = \"JOYCODE_4_\"\nsecond_token = \"JOYCODE_5_\"\n",
    )
    .unwrap();

    let settings = AppSettings::load(Some(&path)).unwrap();
    let tokens = settings.token_pair().unwrap();
    let (text, count) = tokens.swap_text("JOYCODE_4_BUTTON1 JOYCODE_2_BUTTON1").unwrap().unwrap();
    assert_eq!(text, "JOYCODE_5_BUTTON1 JOYCODE_2_BUTTON1");
    assert_eq!(count, 1);
}
