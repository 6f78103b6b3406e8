use std::fs;
use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use meshtune_core::{ControlKind, ParamValue, ParameterSchema, ParameterState};
use meshtune_io::share::{self, ShareSync};
use meshtune_render::{CommandEngine, PreviewState, Session, Worker};
use meshtune_visualization::{HeadlessSurface, MeshViewer};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ModelArgs, OverrideArgs, RenderArgs, ShareArgs, ThemeAction};
use crate::paths::AppPaths;
use crate::preferences::{Preferences, Theme};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Inspect(args) => inspect(&args, &mut out),
        Command::Share(args) => share_link(&args, &mut out),
        Command::Render(args) => render(&args, &mut out),
        Command::Theme(args) => {
            let paths = AppPaths::discover()?;
            theme(&paths, args.action.unwrap_or(ThemeAction::Show), &mut out)
        }
    }
}

fn load_schema(args: &ModelArgs) -> Result<ParameterSchema> {
    let text = fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read schema at {}", args.schema.display()))?;
    if args.lenient {
        Ok(ParameterSchema::from_json_lenient(&text))
    } else {
        ParameterSchema::from_json(&text)
            .with_context(|| format!("invalid schema at {}", args.schema.display()))
    }
}

fn describe_control(control: &ControlKind) -> String {
    match control {
        ControlKind::Range { min, max, step } => match step {
            Some(step) => format!("range {min}..{max} step {step}"),
            None => format!("range {min}..{max}"),
        },
        ControlKind::Toggle { on, off } => format!("toggle {on}/{off}"),
        ControlKind::Dropdown { options } => {
            let options: Vec<String> = options.iter().map(ToString::to_string).collect();
            format!("dropdown [{}]", options.join(", "))
        }
        ControlKind::Text { max_length: Some(max) } => format!("text (max {max})"),
        other => other.label().to_string(),
    }
}

fn inspect(args: &ModelArgs, out: &mut dyn Write) -> Result<()> {
    let schema = load_schema(args)?;
    if let Some(title) = &schema.title {
        writeln!(out, "{title}")?;
    }
    if let Some(description) = &schema.description {
        writeln!(out, "{description}")?;
    }

    for group in schema.groups() {
        writeln!(out, "[{}]", group.label)?;
        for name in &group.parameters {
            let Some(parameter) = schema.get(name) else {
                continue;
            };
            writeln!(
                out,
                "  {} ({}): {} = {}",
                parameter.name,
                parameter.value_type.name(),
                describe_control(&parameter.control),
                parameter.default
            )?;
        }
    }
    Ok(())
}

/// Apply `--set` overrides the way the matching controls would coerce them
fn apply_overrides(
    schema: &ParameterSchema,
    state: &mut ParameterState,
    overrides: &[(String, String)],
) -> Result<()> {
    for (name, raw) in overrides {
        let parameter = schema
            .get(name)
            .ok_or_else(|| anyhow!("unknown parameter '{name}'"))?;
        let value = parameter.coerce(ParamValue::Text(raw.clone()));
        state
            .set(schema, name, value)
            .with_context(|| format!("cannot set '{name}' to '{raw}'"))?;
    }
    Ok(())
}

fn initial_state(schema: &ParameterSchema, overrides: &OverrideArgs) -> Result<ParameterState> {
    let mut state = ShareSync::new().load(schema, overrides.fragment.as_deref().map(fragment_of));
    apply_overrides(schema, &mut state, &overrides.set)?;
    Ok(state)
}

/// Accept either a bare fragment or a full link ending in `#fragment`
fn fragment_of(link: &str) -> &str {
    link.rsplit_once('#').map_or(link, |(_, fragment)| fragment)
}

fn share_link(args: &ShareArgs, out: &mut dyn Write) -> Result<()> {
    let schema = load_schema(&args.model)?;
    let state = initial_state(&schema, &args.overrides)?;
    writeln!(out, "#{}", share::encode(&state))?;
    Ok(())
}

fn render(args: &RenderArgs, out: &mut dyn Write) -> Result<()> {
    let schema = load_schema(&args.model)?;
    let template = fs::read_to_string(&args.template)
        .with_context(|| format!("failed to read template at {}", args.template.display()))?;
    let engine = CommandEngine::from_command_line(&args.engine)
        .ok_or_else(|| anyhow!("engine command is empty"))?;
    let worker = Worker::spawn(engine).context("failed to start render worker")?;

    let fragment = args.overrides.fragment.as_deref().map(fragment_of);
    let mut session = Session::new(schema, template, worker, args.format, fragment);
    for (name, raw) in &args.overrides.set {
        session
            .edit(name, ParamValue::Text(raw.clone()))
            .with_context(|| format!("cannot set '{name}' to '{raw}'"))?;
    }

    tracing::info!(format = %args.format, "rendering model");
    session.trigger();
    for update in session.wait() {
        tracing::debug!(?update, "render update");
    }
    if session.preview() != PreviewState::Current {
        bail!("{}", session.status_text());
    }

    let artifact = session
        .download()
        .ok_or_else(|| anyhow!("render finished without a mesh"))?;
    let path = artifact
        .save_to(&args.output)
        .with_context(|| format!("failed to write mesh into {}", args.output.display()))?;
    writeln!(out, "wrote {} ({} bytes)", path.display(), artifact.bytes().len())?;

    report_camera(&artifact.payload, args.size, out)?;
    if let Some(link) = session.share_link() {
        writeln!(out, "share: #{link}")?;
    }
    Ok(())
}

fn report_camera(
    payload: &meshtune_io::MeshPayload,
    (width, height): (u32, u32),
    out: &mut dyn Write,
) -> Result<()> {
    let mut viewer = MeshViewer::attach(HeadlessSurface::new(width, height))?;
    let fit = viewer.show_mesh(payload)?;
    viewer.on_animation_frame()?;
    viewer.detach();

    writeln!(
        out,
        "camera: distance {:.3}, position ({:.3}, {:.3}, {:.3})",
        fit.distance, fit.position.x, fit.position.y, fit.position.z
    )?;
    Ok(())
}

fn theme(paths: &AppPaths, action: ThemeAction, out: &mut dyn Write) -> Result<()> {
    let path = paths.preferences_file();
    let mut preferences = Preferences::load_or_default(&path)?;
    let theme = match action {
        ThemeAction::Show => preferences.theme,
        ThemeAction::Light => Theme::Light,
        ThemeAction::Dark => Theme::Dark,
        ThemeAction::Toggle => preferences.theme.toggled(),
    };
    if theme != preferences.theme {
        preferences.theme = theme;
        preferences.persist(&path)?;
        tracing::debug!(path = %path.display(), %theme, "theme preference saved");
    }
    writeln!(out, "{theme}")?;
    Ok(())
}
