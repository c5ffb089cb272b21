use std::fs;
use std::path::{Path, PathBuf};

use calver_rs::api::{BatchRunner, CalibrationVerifier, VerifierConfig};
use calver_rs::core::ScreenGeometry;
use calver_rs::io::reformat_file;
use calver_rs::telemetry::init_default_tracing;
use tracing::info;

const USAGE: &str = "usage: calver verify <dir> [--config <json>] [--screen-mm <height> <width>] [--screen-px <height> <width>] [--values-file <path>] [--json]\n       calver reformat <input.csv> [--output <path>]";
const DEFAULT_VALUES_FILE: &str = "calibrationvalues.txt";

#[derive(Debug)]
struct VerifyArgs {
    input_dir: PathBuf,
    config: Option<PathBuf>,
    screen_mm: Option<(f64, f64)>,
    screen_px: Option<(f64, f64)>,
    values_file: PathBuf,
    json: bool,
}

#[derive(Debug)]
struct ReformatArgs {
    input: PathBuf,
    output: Option<PathBuf>,
}

#[derive(Debug)]
enum CliArgs {
    Verify(VerifyArgs),
    Reformat(ReformatArgs),
}

fn main() {
    let _ = init_default_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    match parse_args(std::env::args().skip(1))? {
        CliArgs::Verify(args) => run_verify(&args),
        CliArgs::Reformat(args) => run_reformat(&args),
    }
}

fn run_verify(args: &VerifyArgs) -> Result<(), String> {
    let config = resolve_config(args)?;
    let verifier = CalibrationVerifier::new(config).map_err(|err| err.to_string())?;
    let report = BatchRunner::new(verifier)
        .run(&args.input_dir)
        .map_err(|err| err.to_string())?;

    if args.json {
        let raw = serde_json::to_string_pretty(&report)
            .map_err(|err| format!("failed to serialize report: {err}"))?;
        println!("{raw}");
    } else {
        println!(
            "processed {} file(s), skipped {}",
            report.processed.len(),
            report.skipped.len()
        );
        for (reason, count) in report.skip_counts() {
            if count > 0 {
                println!("  {reason}: {count}");
            }
        }
        if let Some(mean) = report.mean_distance_mm() {
            println!("mean viewer distance: {mean:.1} mm");
        }
    }
    Ok(())
}

fn run_reformat(args: &ReformatArgs) -> Result<(), String> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_long_output(&args.input));
    let rows = reformat_file(&args.input, &output).map_err(|err| err.to_string())?;
    println!("wrote {rows} row(s) to `{}`", output.display());
    Ok(())
}

fn default_long_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "summary".to_owned());
    input.with_file_name(format!("{stem}_long.csv"))
}

/// Flags override the config file, which overrides the remembered values file.
fn resolve_config(args: &VerifyArgs) -> Result<VerifierConfig, String> {
    let from_file = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
            Some(VerifierConfig::from_json_str(&raw).map_err(|err| err.to_string())?)
        }
        None => None,
    };

    let flags_given = args.screen_mm.is_some() || args.screen_px.is_some();
    let base = match &from_file {
        Some(config) => Some(config.geometry),
        None if args.values_file.exists() => Some(
            ScreenGeometry::load_values_file(&args.values_file).map_err(|err| err.to_string())?,
        ),
        None => None,
    };

    let geometry = match (base, args.screen_mm, args.screen_px) {
        (_, Some((height_mm, width_mm)), Some((height_px, width_px))) => {
            ScreenGeometry::new(height_mm, width_mm, height_px, width_px)
        }
        (Some(base), mm, px) => {
            let (height_mm, width_mm) = mm.unwrap_or((base.height_mm, base.width_mm));
            let (height_px, width_px) = px.unwrap_or((base.height_px, base.width_px));
            ScreenGeometry::new(height_mm, width_mm, height_px, width_px)
        }
        (None, _, _) => {
            return Err(format!(
                "no screen geometry: pass --screen-mm and --screen-px, --config, or create `{}`",
                args.values_file.display()
            ));
        }
    }
    .map_err(|err| err.to_string())?;

    if flags_given {
        geometry
            .save_values_file(&args.values_file)
            .map_err(|err| err.to_string())?;
        info!(path = %args.values_file.display(), "saved screen geometry");
    }

    let config = match from_file {
        Some(config) => VerifierConfig {
            geometry,
            ..config
        },
        None => VerifierConfig::new(geometry),
    };
    Ok(config)
}

fn parse_pair(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<(f64, f64), String> {
    let mut next = || -> Result<f64, String> {
        let value = args
            .next()
            .ok_or_else(|| format!("missing value for {flag}"))?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid number `{value}` for {flag}"))
    };
    let height = next()?;
    let width = next()?;
    Ok((height, width))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut args = args.into_iter();
    match args.next().as_deref() {
        Some("verify") => parse_verify(args).map(CliArgs::Verify),
        Some("reformat") => parse_reformat(args).map(CliArgs::Reformat),
        _ => Err(USAGE.to_owned()),
    }
}

fn parse_verify(mut args: impl Iterator<Item = String>) -> Result<VerifyArgs, String> {
    let mut input_dir = None::<PathBuf>;
    let mut config = None::<PathBuf>;
    let mut screen_mm = None;
    let mut screen_px = None;
    let mut values_file = PathBuf::from(DEFAULT_VALUES_FILE);
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_owned())?;
                config = Some(PathBuf::from(value));
            }
            "--screen-mm" => screen_mm = Some(parse_pair(&mut args, "--screen-mm")?),
            "--screen-px" => screen_px = Some(parse_pair(&mut args, "--screen-px")?),
            "--values-file" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --values-file".to_owned())?;
                values_file = PathBuf::from(value);
            }
            "--json" => json = true,
            "--help" | "-h" => return Err(USAGE.to_owned()),
            flag if flag.starts_with("--") => return Err(format!("unknown argument `{flag}`")),
            _ if input_dir.is_none() => input_dir = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument `{arg}`")),
        }
    }

    let input_dir = input_dir.ok_or_else(|| "missing input directory".to_owned())?;
    Ok(VerifyArgs {
        input_dir,
        config,
        screen_mm,
        screen_px,
        values_file,
        json,
    })
}

fn parse_reformat(mut args: impl Iterator<Item = String>) -> Result<ReformatArgs, String> {
    let mut input = None::<PathBuf>;
    let mut output = None::<PathBuf>;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --output".to_owned())?;
                output = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Err(USAGE.to_owned()),
            flag if flag.starts_with("--") => return Err(format!("unknown argument `{flag}`")),
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument `{arg}`")),
        }
    }

    let input = input.ok_or_else(|| "missing input file".to_owned())?;
    Ok(ReformatArgs { input, output })
}

#[cfg(test)]
mod tests {
    use super::{CliArgs, parse_args};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| (*arg).to_owned()).collect()
    }

    #[test]
    fn verify_parses_geometry_pairs() {
        let parsed = parse_args(args(&[
            "verify",
            "data",
            "--screen-mm",
            "344",
            "594",
            "--screen-px",
            "1080",
            "1920",
        ]))
        .expect("parse");
        let CliArgs::Verify(verify) = parsed else {
            panic!("expected verify command");
        };
        assert_eq!(verify.screen_mm, Some((344.0, 594.0)));
        assert_eq!(verify.screen_px, Some((1080.0, 1920.0)));
        assert!(!verify.json);
    }

    #[test]
    fn non_numeric_geometry_is_rejected() {
        let err = parse_args(args(&["verify", "data", "--screen-mm", "tall", "594"]))
            .expect_err("bad number");
        assert!(err.contains("invalid number"));
    }

    #[test]
    fn unknown_command_prints_usage() {
        let err = parse_args(args(&["plot"])).expect_err("unknown");
        assert!(err.starts_with("usage:"));
    }
}
