use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;
use clap::Parser;

use card_composer::{clipboard, settings, CardComposer, CardState, Language};

#[derive(Parser, Debug)]
#[command(
    name = "card-composer",
    version,
    about = "Compose personalized greeting-card images"
)]
struct Cli {
    /// Card language (ar, en, fr, bn, in, ur)
    #[arg(short = 'l', long = "lang", default_value = "ar")]
    lang: String,

    /// Name to draw on the card
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Absolute anchor x in pixels (overrides settings)
    #[arg(short = 'x', long = "x")]
    x: Option<i32>,

    /// Absolute anchor y in pixels (overrides settings)
    #[arg(short = 'y', long = "y")]
    y: Option<i32>,

    /// Horizontal nudge in pixels (negative moves left)
    #[arg(long = "dx")]
    dx: Option<i32>,

    /// Vertical nudge in pixels (negative moves up)
    #[arg(long = "dy")]
    dy: Option<i32>,

    /// Output file or directory (default: generated filename in cwd)
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Directory holding the card-<lang>.png backgrounds
    #[arg(short = 'a', long = "assets")]
    assets: Option<String>,

    /// Font file used for text measurement and rasterization
    #[arg(long = "font")]
    font: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Print the anchor coordinates after rendering
    #[arg(long = "print-coords")]
    print_coords: bool,

    /// Show supported language codes and exit
    #[arg(long = "show-enabled-languages")]
    show_enabled_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Interactive calibration mode
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    card_composer::logging::init(cli.verbose)?;
    if cli.interactive {
        return run_interactive(cli);
    }

    let output = card_composer::run(card_composer::Config {
        lang: cli.lang,
        name: cli.name,
        x: cli.x,
        y: cli.y,
        dx: cli.dx,
        dy: cli.dy,
        output: cli.output,
        assets: cli.assets,
        font: cli.font,
        settings_path: cli.read_settings,
        print_coords: cli.print_coords,
        show_enabled_languages: cli.show_enabled_languages,
    })?;

    println!("{}", output);
    Ok(())
}

struct InteractiveState {
    composer: CardComposer,
    card: CardState,
    step: i32,
    default_output: Option<String>,
}

fn run_interactive(cli: Cli) -> Result<()> {
    let settings = settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
    let composer = CardComposer::new(
        settings,
        cli.assets.as_deref().map(Path::new),
        cli.font.as_deref().map(Path::new),
    )?;

    let mut card = CardState::new(composer.settings());
    card.language = Language::from_code(&cli.lang);
    if let Some(name) = cli.name {
        card.name = name;
    }
    if let Some(x) = cli.x {
        card.anchor_x = x;
    }
    if let Some(y) = cli.y {
        card.anchor_y = y;
    }
    card.nudge(cli.dx.unwrap_or(0), cli.dy.unwrap_or(0));

    let mut state = InteractiveState {
        step: composer.settings().nudge_step,
        composer,
        card,
        default_output: cli.output,
    };

    println!("Interactive calibration. Use /quit or /exit to finish.");
    println!("Type /help to see available commands.");

    let mut line = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    loop {
        line.clear();
        print!("> ");
        io::stdout().flush()?;
        if stdin_lock.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if handle_interactive_command(input, &mut state)? {
            break;
        }
    }
    Ok(())
}

fn handle_interactive_command(input: &str, state: &mut InteractiveState) -> Result<bool> {
    let trimmed = input.trim();
    if matches!(trimmed, "/quit" | "/exit") {
        return Ok(true);
    }
    if trimmed == "/help" {
        print_interactive_help();
        return Ok(false);
    }

    if let Some((dx, dy)) = match trimmed {
        "/up" => Some((0, -state.step)),
        "/down" => Some((0, state.step)),
        "/left" => Some((-state.step, 0)),
        "/right" => Some((state.step, 0)),
        _ => None,
    } {
        state.card.nudge(dx, dy);
        println!("{}", state.card.coords_payload());
        return Ok(false);
    }

    if trimmed == "/reset" {
        state.card.reset_anchor(state.composer.settings());
        println!("{}", state.card.coords_payload());
        return Ok(false);
    }
    if trimmed == "/coords" {
        println!("{}", state.card.coords_payload());
        return Ok(false);
    }
    if trimmed == "/copy" {
        let payload = state.card.coords_payload();
        match clipboard::copy_text(&payload) {
            Ok(()) => println!("copied: {}", payload),
            // fallback: show the payload instead
            Err(_) => println!("{}", payload),
        }
        return Ok(false);
    }

    if let Some(arg) = trimmed.strip_prefix("/lang") {
        let value = arg.trim();
        if value.is_empty() {
            println!("lang: {}", state.card.language);
        } else {
            state.card.language = Language::from_code(value);
            println!("lang set to {}", state.card.language);
        }
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/name") {
        let value = arg.trim();
        if value.is_empty() {
            println!("name: {}", state.card.name);
        } else {
            state.card.name = value.to_string();
            println!("name set to {}", value);
        }
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/step") {
        let value = arg.trim();
        if value.is_empty() {
            println!("step: {}", state.step);
        } else {
            match value.parse::<i32>() {
                Ok(step) if step > 0 => {
                    state.step = step;
                    println!("step set to {}", step);
                }
                _ => eprintln!("expected a positive pixel count"),
            }
        }
        return Ok(false);
    }
    if let Some(arg) = trimmed.strip_prefix("/export") {
        let value = arg.trim();
        let output = if value.is_empty() {
            state.default_output.as_deref()
        } else {
            Some(value)
        };
        let card = state.composer.export(&state.card)?;
        let path = card_composer::write_card(&card, output)?;
        println!("wrote {}", path.display());
        return Ok(false);
    }

    eprintln!("unknown command: {}", trimmed);
    Ok(false)
}

fn print_interactive_help() {
    println!("Commands:");
    println!("  /quit, /exit          Exit interactive mode");
    println!("  /lang <code>          Set card language (or show current)");
    println!("  /name <text>          Set the name (or show current)");
    println!("  /up /down /left /right  Nudge the anchor by the step");
    println!("  /step <px>            Set the nudge step (or show current)");
    println!("  /coords               Show the anchor coordinates");
    println!("  /copy                 Copy the coordinates to the clipboard");
    println!("  /reset                Restore the default anchor");
    println!("  /export [path]        Write the card PNG");
}
