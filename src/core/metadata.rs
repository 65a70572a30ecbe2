//! Print-cost metadata read from the summary comments the engine writes into
//! each toolpath file.
//!
//! The engine emits `; key = value` (footer) and `; key : value` (header)
//! comments, sometimes several `key: value` pairs on one line separated by `;`.
//! Only the keys below are recognised; when more than one key carries the same
//! quantity the lower rank wins.

use crate::domain::model::SliceMetadata;
use crate::utils::error::{Result, SliceError};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    PrintTime,
    Grams,
    Millimeters,
}

const KEYS: &[(&str, Field, u8)] = &[
    ("estimated printing time (normal mode)", Field::PrintTime, 0),
    ("model printing time", Field::PrintTime, 1),
    ("total estimated time", Field::PrintTime, 2),
    ("total filament weight [g]", Field::Grams, 0),
    ("total filament used [g]", Field::Grams, 0),
    ("filament used [g]", Field::Grams, 1),
    ("total filament length [mm]", Field::Millimeters, 0),
    ("filament used [mm]", Field::Millimeters, 1),
];

fn pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(.+?)\s*[:=]\s*(.+?)\s*$").expect("valid regex"))
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*([dhms])").expect("valid regex"))
}

#[derive(Debug, Default)]
struct Summary {
    print_time: Option<(u8, u64)>,
    grams: Option<(u8, f64)>,
    millimeters: Option<(u8, f64)>,
}

impl Summary {
    fn found_any(&self) -> bool {
        self.print_time.is_some() || self.grams.is_some() || self.millimeters.is_some()
    }

    fn into_metadata(self) -> SliceMetadata {
        SliceMetadata {
            print_time_seconds: self.print_time.map(|(_, v)| v).unwrap_or(0),
            filament_used_grams: self.grams.map(|(_, v)| v).unwrap_or(0.0),
            filament_used_millimeters: self.millimeters.map(|(_, v)| v).unwrap_or(0.0),
        }
    }

    fn offer(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let key = key.to_ascii_lowercase();
        let Some(&(_, field, rank)) = KEYS.iter().find(|(k, _, _)| *k == key) else {
            return Ok(());
        };

        match field {
            Field::PrintTime => {
                let seconds = parse_duration(value)?;
                keep_best(&mut self.print_time, rank, seconds);
            }
            Field::Grams => {
                let grams = parse_amount(value)?;
                keep_best(&mut self.grams, rank, grams);
            }
            Field::Millimeters => {
                let mm = parse_amount(value)?;
                keep_best(&mut self.millimeters, rank, mm);
            }
        }
        Ok(())
    }
}

fn keep_best<T>(slot: &mut Option<(u8, T)>, rank: u8, value: T) {
    match slot {
        Some((current, _)) if *current <= rank => {}
        _ => *slot = Some((rank, value)),
    }
}

/// `1d 2h 3m 4s`, any subset of units.
pub fn parse_duration(value: &str) -> std::result::Result<u64, String> {
    let mut total = 0u64;
    let mut matched = false;
    for caps in duration_regex().captures_iter(value) {
        matched = true;
        let amount: u64 = caps[1]
            .parse()
            .map_err(|e| format!("bad duration '{}': {}", value, e))?;
        let unit = match &caps[2] {
            "d" => 86_400,
            "h" => 3_600,
            "m" => 60,
            _ => 1,
        };
        total = amount
            .checked_mul(unit)
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(|| format!("bad duration '{}': out of range", value))?;
    }
    if !matched {
        return Err(format!("bad duration '{}'", value));
    }
    Ok(total)
}

/// A single number or a per-extruder comma list, summed.
fn parse_amount(value: &str) -> std::result::Result<f64, String> {
    let mut total = 0.0;
    for part in value.split(',') {
        let amount: f64 = part
            .trim()
            .parse()
            .map_err(|_| format!("bad amount '{}'", value))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("bad amount '{}'", value));
        }
        total += amount;
    }
    Ok(total)
}

/// Parses one toolpath file. Fails when the file carries no summary at all.
pub fn extract(artifact: &Path) -> Result<SliceMetadata> {
    let parse_error = |reason: String| SliceError::MetadataParseError {
        path: artifact.to_path_buf(),
        reason,
    };

    let file = File::open(artifact).map_err(|e| parse_error(e.to_string()))?;
    let mut reader = BufReader::new(file);
    let mut summary = Summary::default();
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| parse_error(e.to_string()))?;
        if read == 0 {
            break;
        }
        if line.first() != Some(&b';') {
            continue;
        }

        let text = String::from_utf8_lossy(&line[1..]);
        for segment in text.split(';') {
            if let Some(caps) = pair_regex().captures(segment) {
                summary.offer(&caps[1], &caps[2]).map_err(&parse_error)?;
            }
        }
    }

    if !summary.found_any() {
        return Err(parse_error("no summary block found".to_string()));
    }

    let metadata = summary.into_metadata();
    tracing::debug!(
        "📊 {}: {}s, {:.2}g, {:.2}mm",
        artifact.display(),
        metadata.print_time_seconds,
        metadata.filament_used_grams,
        metadata.filament_used_millimeters
    );
    Ok(metadata)
}

/// Field-wise sum, starting from zero.
pub fn aggregate<'a, I>(items: I) -> SliceMetadata
where
    I: IntoIterator<Item = &'a SliceMetadata>,
{
    items
        .into_iter()
        .fold(SliceMetadata::default(), |acc, item| acc + *item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ORCA_GCODE: &str = "\
; HEADER_BLOCK_START
; generated by OrcaSlicer 2.1.1 on 2024-05-01 at 10:12:33
; model printing time: 15m 34s; total estimated time: 16m 2s
; total layer number: 50
; total filament length [mm] : 237.64
; total filament volume [cm^3] : 571.58
; total filament weight [g] : 0.71
; HEADER_BLOCK_END
G28
G1 X10 Y10 E0.5 ; move
; filament used [mm] = 237.64
; filament used [g] = 0.71
; estimated printing time (normal mode) = 15m 34s
";

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_extract_engine_summary() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Cube.gcode", ORCA_GCODE);

        let metadata = extract(&path).unwrap();

        assert_eq!(metadata.print_time_seconds, 934);
        assert_eq!(metadata.filament_used_grams, 0.71);
        assert_eq!(metadata.filament_used_millimeters, 237.64);
    }

    #[test]
    fn test_extract_any_order_and_multi_extruder() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "plate.gcode",
            "; filament used [g] = 1.5, 0.5\nG1 X0\n; estimated printing time (normal mode) = 1h 2m 3s\n; filament used [mm] = 100.0,50.0\n",
        );

        let metadata = extract(&path).unwrap();

        assert_eq!(metadata.print_time_seconds, 3723);
        assert_eq!(metadata.filament_used_grams, 2.0);
        assert_eq!(metadata.filament_used_millimeters, 150.0);
    }

    #[test]
    fn test_extract_zero_usage_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "empty.gcode",
            "; filament used [g] = 0.00\n; filament used [mm] = 0.00\n; estimated printing time (normal mode) = 0s\n",
        );

        assert_eq!(extract(&path).unwrap(), SliceMetadata::default());
    }

    #[test]
    fn test_extract_without_summary_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bare.gcode", "G28\nG1 X10 Y10\n; just a comment\n");

        assert!(matches!(
            extract(&path),
            Err(SliceError::MetadataParseError { .. })
        ));
    }

    #[test]
    fn test_extract_rejects_garbage_values() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.gcode", "; filament used [g] = lots\n");

        assert!(extract(&path).is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("34s").unwrap(), 34);
        assert_eq!(parse_duration("1d 0h 0m 1s").unwrap(), 86_401);
        assert_eq!(parse_duration("2h").unwrap(), 7_200);
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("999999999999999d").is_err());
        assert!(parse_duration("18446744073709551615s 1s").is_err());
    }

    #[test]
    fn test_extract_out_of_range_duration_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "huge.gcode",
            "; estimated printing time (normal mode) = 999999999999999d
",
        );

        assert!(matches!(
            extract(&path),
            Err(SliceError::MetadataParseError { .. })
        ));
    }

    #[test]
    fn test_aggregate_saturates_print_time() {
        let long = SliceMetadata {
            print_time_seconds: u64::MAX,
            ..SliceMetadata::default()
        };

        assert_eq!(aggregate(&[long, long]).print_time_seconds, u64::MAX);
    }

    #[test]
    fn test_aggregate_identity_and_sum() {
        let a = SliceMetadata {
            print_time_seconds: 100,
            filament_used_grams: 1.0,
            filament_used_millimeters: 10.0,
        };
        let b = SliceMetadata {
            print_time_seconds: 200,
            filament_used_grams: 2.0,
            filament_used_millimeters: 20.0,
        };

        assert_eq!(aggregate([&a]), a);
        assert_eq!(aggregate(&[a, b]), aggregate(&[b, a]));
        assert_eq!(
            aggregate(&[a, b]),
            SliceMetadata {
                print_time_seconds: 300,
                filament_used_grams: 3.0,
                filament_used_millimeters: 30.0,
            }
        );
        assert_eq!(aggregate(&[]), SliceMetadata::default());
    }
}
