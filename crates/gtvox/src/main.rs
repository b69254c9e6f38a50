//! `gtvox` command-line entry point.
//!
//! ```text
//! gtvox [--leaf-size|-l <f32>] [--mode aligned|unaligned] [--config <json>]
//!       [--replay <dir>] [--out <dir>]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use gtvox::{run, OperatingMode, PipelineConfig, ReplaySimulator, StopSignal};

const USAGE: &str = "Usage: gtvox [--leaf-size|-l <f32>] [--mode aligned|unaligned] \
                     [--config <json>] [--replay <dir>] [--out <dir>]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    leaf_size: Option<f32>,
    mode: Option<OperatingMode>,
    config: Option<PathBuf>,
    replay: Option<PathBuf>,
    out: Option<PathBuf>,
    help: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut cli = Self::default();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| format!("missing value for {flag}"))
            };
            match arg.as_str() {
                "-l" | "--leaf-size" => {
                    let raw = value(&arg)?;
                    cli.leaf_size = Some(
                        raw.parse()
                            .map_err(|_| format!("invalid leaf size '{raw}'"))?,
                    );
                }
                "--mode" => {
                    let raw = value(&arg)?;
                    cli.mode = Some(raw.parse().map_err(|e| format!("{e}"))?);
                }
                "--config" => cli.config = Some(PathBuf::from(value(&arg)?)),
                "--replay" => cli.replay = Some(PathBuf::from(value(&arg)?)),
                "--out" => cli.out = Some(PathBuf::from(value(&arg)?)),
                "-h" | "--help" => cli.help = true,
                other => return Err(format!("unknown argument '{other}'")),
            }
        }
        Ok(cli)
    }

    /// Builds the pipeline configuration: file or mode preset, then flag overrides.
    fn into_config(self) -> gtvox::Result<(PipelineConfig, PathBuf)> {
        let mut config = match (&self.config, self.mode) {
            (Some(path), mode) => {
                let mut config = PipelineConfig::from_json_file(path)?;
                if let Some(mode) = mode {
                    log::warn!("--mode {mode:?} only switches the mode; presets come from the file");
                    config.mode = mode;
                }
                config
            }
            (None, mode) => PipelineConfig::for_mode(mode.unwrap_or_default()),
        };
        if let Some(leaf_size) = self.leaf_size {
            config.leaf_size = leaf_size;
            // Unaligned grids are rasterized at the leaf size
            if config.mode == OperatingMode::Unaligned {
                config.occupancy.voxel_size = f64::from(leaf_size);
            }
        }
        if let Some(out) = self.out {
            config.output.root = out;
        }
        config.validate()?;
        let replay = self.replay.unwrap_or_else(|| PathBuf::from("recording"));
        Ok((config, replay))
    }
}

fn main() -> ExitCode {
    gtvox::init_logging();

    let cli = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if cli.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: CliArgs) -> gtvox::Result<()> {
    let (config, replay) = cli.into_config()?;
    let mut sim = ReplaySimulator::open(&replay)?;
    let summary = run(&mut sim, &config, &StopSignal::new())?;
    log::info!(
        "done: {} frames written, {} skipped, last frame {:?}",
        summary.processed,
        summary.skipped,
        summary.last_frame
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        CliArgs::parse(args.iter().map(ToString::to_string))
    }

    #[test]
    fn test_defaults_follow_mode() {
        let (config, replay) = parse(&[]).unwrap().into_config().unwrap();
        assert_eq!(config.leaf_size, 0.2);
        assert_eq!(replay, PathBuf::from("recording"));

        let (config, _) = parse(&["--mode", "unaligned"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.leaf_size, 0.1);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&["-l", "0.5", "--out", "/tmp/x", "--replay", "rec"]).unwrap();
        let (config, replay) = cli.into_config().unwrap();
        assert_eq!(config.leaf_size, 0.5);
        assert_eq!(config.output.root, PathBuf::from("/tmp/x"));
        assert_eq!(replay, PathBuf::from("rec"));
        assert_eq!(config.occupancy.voxel_size, 0.4);

        let cli = parse(&["--mode", "unaligned", "-l", "0.25"]).unwrap();
        let (config, _) = cli.into_config().unwrap();
        assert_eq!(config.leaf_size, 0.25);
        assert_eq!(config.occupancy.voxel_size, 0.25);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["--leaf-size"]).is_err());
        assert!(parse(&["--leaf-size", "abc"]).is_err());
        assert!(parse(&["--mode", "sideways"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
        assert!(parse(&["-l", "0"]).unwrap().into_config().is_err());
    }
}
