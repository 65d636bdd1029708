//! PopOut - Edge-docked pop-out windows
//!
//! Pins windows to one of eight screen-edge segments, slides them off-screen
//! and pops them back out when the cursor touches the watched segment.

mod animation;
mod assignments;
mod config;
mod console;
mod platform;
mod screen;
mod session;
mod trigger;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use assignments::AnimationOptions;
use config::Config;
use platform::{WindowHandle, WindowInfo, WindowSystem};
use screen::EdgeSegment;
use session::{Session, SessionHandle};

/// PopOut - slide windows off the screen edge and pop them back out
#[derive(Parser)]
#[command(name = "popout")]
#[command(author = "PopOut Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Dock windows behind screen edges and reveal them with the cursor", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List windows that can be assigned
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assign windows, hide them and watch the edge until quit or Ctrl+C
    Run(RunArgs),

    /// Show the edge segments and where their windows slide
    Segments,

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Write to this path instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show system information
    Info,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Window to pin, as SEGMENT=HANDLE (e.g. top-left=0x1a2b)
    #[arg(short, long = "assign", value_name = "SEGMENT=HANDLE", value_parser = console::parse_assignment, required = true)]
    assignments: Vec<(EdgeSegment, WindowHandle)>,

    /// Segment whose edge reveals its windows (defaults to the last assigned)
    #[arg(short, long)]
    watch: Option<EdgeSegment>,

    /// Steps per slide
    #[arg(long)]
    steps: Option<u32>,

    /// Milliseconds between slide steps
    #[arg(long)]
    interval: Option<u64>,

    /// Smoothstep easing
    #[arg(long)]
    ease: bool,

    /// Fade while sliding
    #[arg(long)]
    fade: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.general.log_level.as_deref().unwrap_or("info"))
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::List { json } => {
            list_windows(json)?;
        }
        Commands::Run(args) => {
            run(config, args).await?;
        }
        Commands::Segments => {
            print_segments();
        }
        Commands::Config { generate, output } => {
            let config = if generate {
                config::sample_config()
            } else {
                config
            };
            if let Some(path) = output {
                config.save(&path)?;
                println!("Configuration written to: {}", path.display());
            } else {
                println!("{}", config.to_toml()?);
            }
        }
        Commands::Info => {
            print_system_info();
        }
    }

    Ok(())
}

#[cfg(target_os = "windows")]
fn list_windows(json: bool) -> anyhow::Result<()> {
    let system = platform::Win32WindowSystem::new();
    println!("{}", format_window_list(&system.visible_windows()?, json)?);
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn list_windows(_json: bool) -> anyhow::Result<()> {
    anyhow::bail!(
        "Listing windows is not supported on {}",
        platform::platform_name()
    );
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn format_window_list(windows: &[WindowInfo], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(windows)?);
    }

    let mut out = format!("{:<12} {:<24} TITLE", "HANDLE", "RECT");
    for window in windows {
        out.push_str(&format!(
            "\n{:<12} {:<24} {}",
            window.handle.to_string(),
            window.rect.to_string(),
            window.title
        ));
    }
    Ok(out)
}

#[cfg(target_os = "windows")]
async fn run(config: Config, args: RunArgs) -> anyhow::Result<()> {
    run_with(platform::Win32WindowSystem::new(), config, args).await
}

#[cfg(not(target_os = "windows"))]
async fn run(_config: Config, _args: RunArgs) -> anyhow::Result<()> {
    anyhow::bail!(
        "Moving windows is not supported on {}",
        platform::platform_name()
    );
}

/// Run the session alongside the console that drives it
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
async fn run_with<W: WindowSystem>(system: W, config: Config, args: RunArgs) -> anyhow::Result<()> {
    let mut animation = config.animation.clone();
    if let Some(steps) = args.steps {
        config::validate_steps(steps)?;
        animation.steps = steps;
    }
    if let Some(interval) = args.interval {
        config::validate_interval(interval)?;
        animation.interval_ms = interval;
    }
    animation.ease |= args.ease;
    animation.fade |= args.fade;
    let options = animation.options();

    let (mut session, handle) = Session::new(system, &config.trigger);

    // The session stops once `start` drops its handle, whether it failed or not
    let (_, result) = tokio::join!(session.run(), start(handle, args, options));
    result
}

/// Assign and enable the requested windows, then hand over to the console
async fn start(handle: SessionHandle, args: RunArgs, options: AnimationOptions) -> anyhow::Result<()> {
    for (segment, window) in &args.assignments {
        handle.assign(*segment, *window, options).await?;
    }
    let watched = args
        .watch
        .or_else(|| args.assignments.last().map(|(segment, _)| *segment));
    handle.watch(watched).await?;
    handle.enable().await?;

    let status = handle.status().await?;
    println!("\n========================================");
    println!("  PopOut Running");
    println!("========================================");
    println!("  Windows: {}", status.assignments);
    if let Some(segment) = status.watched {
        println!("  Watching: {} (slides {})", segment, segment.direction());
    }
    println!(
        "  Slide: {} steps every {}ms{}{}",
        options.step_count,
        options.tick_interval_ms,
        if options.use_easing { ", eased" } else { "" },
        if options.use_fade { ", faded" } else { "" }
    );
    println!("========================================");
    println!("\nType 'help' for commands. 'quit' or Ctrl+C restores all windows and exits.\n");

    let lines = console::spawn_stdin_reader()?;
    console::serve(&handle, lines, console::exit_signal(), options).await?;
    Ok(())
}

/// Print the segment table
fn print_segments() {
    println!("{:<6} {:<14} SLIDES", "INDEX", "SEGMENT");
    for segment in EdgeSegment::ALL {
        println!(
            "{:<6} {:<14} {}",
            segment.index(),
            segment.name(),
            segment.direction()
        );
    }
}

/// Print system information
fn print_system_info() {
    println!("PopOut System Information");
    println!("=========================\n");

    println!("Platform: {}", platform::platform_name());
    println!(
        "Window control: {}",
        if platform::is_supported() {
            "supported"
        } else {
            "not supported"
        }
    );

    #[cfg(target_os = "windows")]
    {
        let (width, height) = platform::Win32WindowSystem::new().screen_size();
        println!("Screen: {}x{}", width, height);
        println!("\nWindows Notes:");
        println!("  - Windows of elevated processes can only be moved when running as Administrator");
        println!("  - Focus may not follow a revealed window if another app holds the foreground lock");
    }

    println!("\nConfiguration search path:");
    for path in Config::default_paths() {
        println!("  {}", path.display());
    }
}
