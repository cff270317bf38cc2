#![allow(clippy::float_cmp, clippy::cast_possible_truncation)]
use approx::assert_relative_eq;
use isgri_algorithms::{average_housekeeping, transform_events, TransformConfig};
use isgri_core::{CalibrationTables, Lut2Cube, ReplayRandom, LUT2_RISE_TIME_CLASSES, N_PIXELS};
use isgri_io::{load_law2, load_lut1, read_events, read_housekeeping, write_corrected, RunConfig};
use std::fmt::Write as _;
use std::path::Path;

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn lut1_csv() -> String {
    let mut text = String::from("gain,offset,rise_gain,rise_offset,pixel_type\n");
    for _ in 0..N_PIXELS {
        text.push_str("5,-1,2,-2,0\n");
    }
    text
}

fn law_csv(row: &str) -> String {
    let mut text = String::new();
    for _ in 0..LUT2_RISE_TIME_CLASSES {
        writeln!(text, "{row}").unwrap();
    }
    text
}

fn housekeeping_csv() -> String {
    let mut text = String::from("kind,module,value\n");
    for module in 0..8 {
        writeln!(text, "temperature,{module},-8.0").unwrap();
        writeln!(text, "temperature,{module},-99.0").unwrap();
        writeln!(text, "bias,{module},-120.0").unwrap();
    }
    text
}

#[test]
fn test_files_to_corrected_csv() {
    let dir = tempfile::tempdir().unwrap();
    let lut1 = write_file(dir.path(), "lut1.csv", &lut1_csv());
    let gain2 = write_file(dir.path(), "gain2.csv", &law_csv("2.0,0.0"));
    let offset2 = write_file(dir.path(), "offset2.csv", &law_csv("-5.0,0.0,0.0"));
    let events = write_file(dir.path(), "events.csv", "pha,rise_time,y,z\n1000,128,0,0\n");
    let hk = write_file(dir.path(), "hk.csv", &housekeeping_csv());
    let output = dir.path().join("out.csv");

    let mut cube = Lut2Cube::zeroed();
    for class in 0..LUT2_RISE_TIME_CLASSES {
        cube.fill_row(class, 0, |ch| (ch * 30) as i16);
    }
    let tables = CalibrationTables::new(
        load_lut1(&lut1).unwrap(),
        cube,
        load_law2(&gain2, &offset2).unwrap(),
    );

    let summary = average_housekeeping(&read_housekeeping(&hk).unwrap());
    assert!(summary.rejected_modules.is_empty());
    assert_eq!(summary.conditions.temperatures_c, [-8.0; 8]);

    let batch = read_events(&events).unwrap();
    let config = TransformConfig::default().with_gain_drift_correction(false);
    let mut rng = ReplayRandom::constant(0.001);
    let out = transform_events(&tables, summary.conditions, &batch, config, &mut rng).unwrap();

    write_corrected(&output, &out.corrected, true).unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "rise_time_class,energy_kev,pha1,rt1,pha2");

    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields[0], "73");
    let energy: f32 = fields[1].parse().unwrap();
    assert_relative_eq!(energy, 499.7844, epsilon = 1e-3);
    assert_eq!(&fields[2..], &["1015", "73", "500"]);
}

#[test]
fn test_empty_event_list_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let events = write_file(dir.path(), "events.csv", "# no events\n");
    let batch = read_events(&events).unwrap();
    assert!(batch.is_empty());

    let output = dir.path().join("out.bin");
    write_corrected(&output, &isgri_core::CorrectedBatch::default(), false).unwrap();
    assert_eq!(std::fs::metadata(&output).unwrap().len(), 0);
}

#[test]
fn test_run_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "run.json",
        r#"{"events": "events.bin", "output": "out.h5", "housekeeping": "hk.csv"}"#,
    );
    let config = RunConfig::from_file(&path).unwrap();
    assert_eq!(config.events, Path::new("events.bin"));
    assert_eq!(config.housekeeping.as_deref(), Some(Path::new("hk.csv")));
    assert!(config.seed.is_none());
}
