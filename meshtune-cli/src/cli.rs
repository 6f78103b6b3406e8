use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use meshtune_io::MeshFormat;

#[derive(Parser, Debug)]
#[command(
    name = "meshtune",
    author,
    version,
    about = "Tune parametric model parameters and render mesh previews"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List parameter groups, parameters and their inferred controls.
    Inspect(ModelArgs),
    /// Print the share link for schema defaults plus overrides.
    Share(ShareArgs),
    /// Render the model and write `model.<format>` to the output directory.
    Render(RenderArgs),
    /// Show or change the display theme preference.
    Theme(ThemeArgs),
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Schema document describing the model parameters.
    #[arg(long, short = 's', value_name = "PATH")]
    pub schema: PathBuf,

    /// Skip malformed schema entries instead of failing.
    #[arg(long)]
    pub lenient: bool,
}

#[derive(Args, Debug)]
pub struct OverrideArgs {
    /// Override one parameter (repeatable), e.g. `--set width=50`.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Share link (or its fragment) to start from instead of plain defaults.
    #[arg(long, value_name = "LINK")]
    pub fragment: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShareArgs {
    #[command(flatten)]
    pub model: ModelArgs,
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub model: ModelArgs,
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Base model source the parameter assignments are prepended to.
    #[arg(long, short = 't', value_name = "PATH")]
    pub template: PathBuf,

    /// Requested mesh format.
    #[arg(long, value_name = "FORMAT", default_value = "stl")]
    pub format: MeshFormat,

    /// Geometry kernel command line; `{input}` and `{output}` are substituted.
    #[arg(
        long,
        env = "MESHTUNE_ENGINE",
        value_name = "COMMAND",
        default_value = "openscad -o {output} {input}"
    )]
    pub engine: String,

    /// Directory receiving the rendered mesh.
    #[arg(long, short = 'o', value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Preview size used to report the fitted camera (e.g. `800x600`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),
}

#[derive(Args, Debug)]
pub struct ThemeArgs {
    #[command(subcommand)]
    pub action: Option<ThemeAction>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    /// Print the current theme (default).
    Show,
    /// Switch to the light theme.
    Light,
    /// Switch to the dark theme.
    Dark,
    /// Flip between light and dark.
    Toggle,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width = width.trim().parse::<u32>().map_err(|e| format!("bad width: {e}"))?;
    let height = height.trim().parse::<u32>().map_err(|e| format!("bad height: {e}"))?;
    if width == 0 || height == 0 {
        return Err("size must be non-zero".to_string());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("label=a=b").unwrap(),
            ("label".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("width").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn size_parses_both_separators() {
        assert_eq!(parse_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_size("64X48").unwrap(), (64, 48));
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn render_args_parse() {
        let cli = Cli::try_parse_from([
            "meshtune", "render", "-s", "schema.json", "-t", "model.scad", "--set", "width=50",
            "--format", "off",
        ])
        .unwrap();
        match cli.command {
            Command::Render(args) => {
                assert_eq!(args.format, MeshFormat::Off);
                assert_eq!(args.overrides.set, vec![("width".to_string(), "50".to_string())]);
                assert_eq!(args.size, (800, 600));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn theme_action_is_optional() {
        let cli = Cli::try_parse_from(["meshtune", "theme"]).unwrap();
        assert!(matches!(cli.command, Command::Theme(ThemeArgs { action: None })));
    }
}
