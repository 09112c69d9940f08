use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

use crate::map::{BaseStyle, RenderOptions};

/// Environment variable naming the dataset when no path is given.
pub const DATA_ENV: &str = "MAPAS_DATA";

pub const DEFAULT_DATA_PATH: &str = "dados_municipais.csv";

const USAGE: &str = "Usage: mapas-municipais [<data-file>] [--data <path>] \
[--style <open-street-map|carto-positron|carto-darkmatter>] [--height <400-1000>]\n\n\
The data file may be .csv, .json or .parquet. Without one, $MAPAS_DATA or \
./dados_municipais.csv is used.";

/// Startup configuration from the command line and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    /// Initial map customisation.
    pub render: RenderOptions,
}

impl AppConfig {
    /// `args` includes the program name at index 0. `env_data` is the value of
    /// [`DATA_ENV`], if set.
    pub fn from_args_and_env(args: &[String], env_data: Option<String>) -> Result<Self> {
        let mut data_path: Option<PathBuf> = None;
        let mut render = RenderOptions::default();

        let mut idx = 1;
        while idx < args.len() {
            match args[idx].as_str() {
                "-h" | "--help" => bail!(USAGE),
                "--data" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--data requires a value"))?;
                    data_path = Some(PathBuf::from(value));
                }
                "--style" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--style requires a value"))?;
                    render.style = value.parse::<BaseStyle>()?;
                }
                "--height" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--height requires a value"))?;
                    let height: u32 = value
                        .parse()
                        .with_context(|| format!("invalid --height '{value}'"))?;
                    render.set_height(height);
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n\n{USAGE}"),
                positional => {
                    if data_path.is_some() {
                        bail!("more than one data file given\n\n{USAGE}");
                    }
                    data_path = Some(PathBuf::from(positional));
                }
            }
            idx += 1;
        }

        let data_path = data_path
            .or_else(|| env_data.filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        Ok(Self { data_path, render })
    }

    pub fn from_env() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args_and_env(&args, std::env::var(DATA_ENV).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("mapas-municipais")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_without_arguments() {
        let cfg = AppConfig::from_args_and_env(&args(&[]), None).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(cfg.render, RenderOptions::default());
    }

    #[test]
    fn argument_beats_environment() {
        let env = Some("/srv/env.csv".to_string());
        let cfg = AppConfig::from_args_and_env(&args(&["local.parquet"]), env.clone()).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("local.parquet"));

        let cfg = AppConfig::from_args_and_env(&args(&[]), env).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("/srv/env.csv"));

        let cfg = AppConfig::from_args_and_env(&args(&[]), Some(String::new())).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from(DEFAULT_DATA_PATH));
    }

    #[test]
    fn parses_render_overrides() {
        let cfg = AppConfig::from_args_and_env(
            &args(&["--data", "x.json", "--style", "carto-darkmatter", "--height", "5000"]),
            None,
        )
        .unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("x.json"));
        assert_eq!(cfg.render.style, BaseStyle::CartoDarkmatter);
        assert_eq!(cfg.render.height, 1000);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(AppConfig::from_args_and_env(&args(&["--style", "satellite"]), None).is_err());
        assert!(AppConfig::from_args_and_env(&args(&["--height"]), None).is_err());
        assert!(AppConfig::from_args_and_env(&args(&["--verbose"]), None).is_err());
        assert!(AppConfig::from_args_and_env(&args(&["a.csv", "b.csv"]), None).is_err());
    }
}
