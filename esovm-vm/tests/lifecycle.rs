//! Behaviour every machine shares: halting, resource limits, the trailing
//! annotation and debug snapshots.

use esovm_vm::geometric::{Hue, Lightness};
use esovm_vm::{
    run, Color, ColorGrid, ErrorKind, ExecutionResult, GeometricMachine, GridMachine, Language, Options,
    PixelGrid, TapeMachine, TernaryMachine, TrieMachine,
};

const LR: Color = Color::Chromatic(Hue::Red, Lightness::Light);
const NR: Color = Color::Chromatic(Hue::Red, Lightness::Normal);
const DM: Color = Color::Chromatic(Hue::Magenta, Lightness::Dark);
const K: Color = Color::Black;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Whitespace source from visible S/T/L markers
fn ws(marked: &str) -> String {
    marked
        .chars()
        .filter_map(|c| match c {
            'S' => Some(' '),
            'T' => Some('\t'),
            'L' => Some('\n'),
            _ => None,
        })
        .collect()
}

/// Malbolge source whose cells decode to `ops` in order
fn assemble(ops: &[i64]) -> String {
    ops.iter()
        .enumerate()
        .map(|(address, op)| {
            let code = (op - address as i64).rem_euclid(94);
            let code = if code < 33 { code + 94 } else { code };
            char::from(code as u8)
        })
        .collect()
}

/// Outputs the number of codels in its first block, 2
fn print_two() -> ColorGrid {
    ColorGrid::from_rows(vec![vec![LR, LR, NR, DM], vec![K, K, DM, DM]])
}

fn run_text(language: Language, source: &str, input: &str, options: &Options) -> ExecutionResult {
    language.run_source(source, input, options).unwrap()
}

fn run_geometric(grid: ColorGrid, options: &Options) -> ExecutionResult {
    run(&GeometricMachine::new(grid, options).unwrap(), "")
}

#[test]
fn test_halt_only_programs() {
    init_logging();
    let options = Options::default();
    let programs = [
        (Language::Tape, String::new()),
        (Language::Grid, "@".to_string()),
        (Language::Ternary, assemble(&[81])),
        (Language::Trie, ws("LLL")),
    ];
    for (language, source) in programs {
        let result = run_text(language, &source, "", &options);
        assert!(result.is_ok(), "{} faulted: {:?}", language, result.fault);
        assert!(result.output.is_empty());
        assert_eq!(result.cycles, 1, "{}", language);
        assert!(result.annotation().starts_with("Finished in 1 cycle ("));
    }

    let result = run_geometric(ColorGrid::from_rows(vec![vec![NR]]), &options);
    assert!(result.is_ok());
    assert!(result.output.is_empty());
}

#[test]
fn test_every_variant_hits_the_cycle_cap() {
    init_logging();
    let options = Options::default().with_max_cycles(5);
    let programs = [
        (Language::Tape, "+[]".to_string()),
        (Language::Grid, "><".to_string()),
        (Language::Ternary, assemble(&[68; 20])),
        (Language::Trie, ws("LSSSL LSLSL LLL")),
    ];
    for (language, source) in programs {
        let result = run_text(language, &source, "", &options);
        let fault = result.fault.as_ref().unwrap();
        assert_eq!(fault.kind(), ErrorKind::ExceededCycles, "{}", language);
        assert_eq!(result.cycles, 5);
        assert!(result.annotation().starts_with("Exceeded cycle limit"));
    }

    // Two adjacent blocks bounce the pointer back and forth long enough.
    let grid = ColorGrid::from_rows(vec![vec![NR, LR]]);
    let result = run_geometric(grid, &Options::default().with_max_cycles(3));
    assert_eq!(result.fault.unwrap().kind(), ErrorKind::ExceededCycles);
}

#[test]
fn test_output_cap() {
    let options = Options::default().with_max_output(5);
    let result = run_text(Language::Tape, "+[.]", "", &options);
    assert_eq!(result.fault.as_ref().unwrap().kind(), ErrorKind::OutputTooLong);
    assert_eq!(result.output.chars().count(), 5);
    assert!(result.annotation().starts_with("Output too long"));

    let options = Options::default().with_max_output(6).with_wrap(true);
    let result = run_text(Language::Grid, "1.", "", &options);
    assert_eq!(result.fault.unwrap().kind(), ErrorKind::OutputTooLong);
    assert_eq!(result.output, "1 1 1 ");
}

#[test]
fn test_time_cap() {
    let options = Options::default().with_max_cycles(u64::MAX).with_max_time_ms(1);
    let result = run_text(Language::Tape, "+[]", "", &options);
    let fault = result.fault.as_ref().unwrap();
    assert_eq!(fault.kind(), ErrorKind::ExceededTime);
    assert!(result.annotation().starts_with("Exceeded time limit"));
}

#[test]
fn test_hello_in_each_text_language() {
    let options = Options::default();

    let tape = run_text(Language::Tape, "++++++++[>++++++++<-]>+.+.", "", &options);
    assert_eq!(tape.output, "AB");

    let grid = run_text(Language::Grid, "\"BA\",,@", "", &options);
    assert_eq!(grid.output, "AB");

    // push 65, print it as a character, exit
    let trie = run_text(Language::Trie, &ws("SS STSSSSST L TLSS LLL"), "", &options);
    assert_eq!(trie.output, "A");

    // read a character, print it, halt
    let ternary = run_text(Language::Ternary, &assemble(&[23, 5, 81]), "A", &options);
    assert_eq!(ternary.output, "A");
}

#[test]
fn test_geometric_from_image_with_codel_size() {
    let grid = print_two();
    let mut pixels = PixelGrid::new(grid.width() * 3, grid.height() * 3, [0, 0, 0]);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let color = grid.get(x as i64, y as i64).unwrap();
            pixels.fill_square(x * 3, y * 3, 3, color.to_rgb());
        }
    }
    let decoded = PixelGrid::from_ppm(&pixels.to_ppm()).unwrap();

    let options = Options::default().with_codel_size(3);
    let result = Language::run_pixels(&decoded, "", &options).unwrap();
    assert!(result.is_ok());
    assert_eq!(result.output, "2");
    assert_eq!(result.report(), format!("2\n{}", result.annotation()));
}

#[test]
fn test_faults_are_recorded_not_raised() {
    let options = Options::default();

    let result = run_text(Language::Grid, "10/.@", "", &options);
    let fault = result.fault.as_ref().unwrap();
    assert_eq!(fault.kind(), ErrorKind::DivisionByZero);
    assert!(result.annotation().starts_with("Runtime error"));

    let result = run_text(Language::Tape, "<", "", &options);
    assert_eq!(result.fault.unwrap().kind(), ErrorKind::PointerOutOfBounds);
}

#[test]
fn test_syntax_errors_are_returned() {
    let options = Options::default();
    let err = Language::Tape.run_source("[", "", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmatchedBracket);
    assert!(err.annotation().starts_with("Syntax error"));

    let err = Language::Trie.run_source(&ws("SSSTL"), "", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingExit);

    let err = Language::Ternary.run_source("a", "", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInstruction);
}

#[test]
fn test_debug_snapshot() {
    let options = Options::default().with_debug(1);
    let result = run_text(Language::Tape, "+++>++", "", &options);
    let snapshot = result.snapshot.unwrap();
    assert_eq!(snapshot.language, "tape");
    assert_eq!(snapshot.cycles, result.cycles);
    assert!(snapshot.memory.contains(&(0, 3)));
    assert!(snapshot.to_json().contains("\"registers\""));

    let quiet = run_text(Language::Tape, "+", "", &Options::default());
    assert!(quiet.snapshot.is_none());
}

#[test]
fn test_options_from_json_drive_the_run() {
    let options = Options::from_json(r#"{"max_cycles": 3}"#).unwrap();
    let result = run_text(Language::Tape, "+[]", "", &options);
    assert_eq!(result.cycles, 3);

    let options = Options::from_json(r#"{"normalize": true}"#).unwrap();
    let result = run_text(Language::Trie, "SS STSSSSST L TLSS LLL", "", &options);
    assert_eq!(result.output, "A");
}

#[test]
fn test_every_constructor_validates_options() {
    let options = Options {
        max_cycles: 0,
        ..Options::default()
    };
    let kinds = [
        TapeMachine::new("+", &options).unwrap_err().kind(),
        GridMachine::new("@", &options).unwrap_err().kind(),
        TernaryMachine::new(&assemble(&[81]), &options).unwrap_err().kind(),
        TrieMachine::new(&ws("LLL"), &options).unwrap_err().kind(),
        GeometricMachine::new(ColorGrid::from_rows(vec![vec![NR]]), &options)
            .unwrap_err()
            .kind(),
    ];
    assert!(kinds.iter().all(|&kind| kind == ErrorKind::ConfigInvalid), "{:?}", kinds);
}
