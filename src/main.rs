mod actions;
mod commands;
mod core;
mod graph;
mod recipes;
mod release;
#[cfg(test)]
mod testing;
mod ui;

use clap::{Args, Parser, Subcommand};
use crate::core::error::{ForgeError, print_error};
use crate::graph::dot::DotOptions;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Plan and execute releases of a multi-package distribution
#[derive(Parser)]
#[command(name = "forgeplan")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Workspace root (defaults to the current directory)
  #[arg(long, global = true, env = "FORGEPLAN_ROOT")]
  root: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct Selection {
  /// Packages to consider: `all`, names or globs, `-term` to exclude (comma-separated)
  #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
  select: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Planning
  // ============================================================================
  /// Compute a packaging plan for packages changed since the last release
  Plan {
    /// Publication directory (`none` to skip publication)
    #[arg(long)]
    publish_dir: Option<String>,
    #[command(flatten)]
    selection: Selection,
    /// Build unclean sources and replace an already applied plan
    #[arg(long)]
    force: bool,
    /// Run package tests while building
    #[arg(long)]
    test: bool,
  },

  /// Plan version bumps of packages modified since the last release
  VersionPlan {
    /// Publication directory holding the release history (`none` for no history)
    #[arg(long)]
    publish_dir: Option<String>,
    #[command(flatten)]
    selection: Selection,
    /// Replace an already applied plan
    #[arg(long)]
    force: bool,
  },

  /// Show the current plan and the status of its actions
  ShowPlan,

  // ============================================================================
  // Execution
  // ============================================================================
  /// Execute the pending actions of the current plan
  ApplyPlan,

  // ============================================================================
  // Inspection
  // ============================================================================
  /// Print the recipe dependency graph in Graphviz format
  Graph {
    #[command(flatten)]
    selection: Selection,
    /// Also draw third-party run requirements
    #[arg(long)]
    show_external: bool,
    /// Include package versions in labels
    #[arg(long)]
    show_versions: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Notices go to stderr so stdout stays clean for plans and graphs
fn init_tracing() {
  let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "forgeplan=info".into()));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false),
    )
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing();

  let workspace_root = match cli.root {
    Some(root) => root,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => {
        eprintln!("Error: Failed to get current directory: {}", e);
        std::process::exit(1);
      }
    },
  };

  // Every command needs the configuration, build it once
  let ctx = match crate::core::context::ForgeContext::build(&workspace_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Plan {
      publish_dir,
      selection,
      force,
      test,
    } => commands::run_plan(
      &ctx,
      commands::PlanArgs {
        publish_dir,
        select: selection.select,
        force,
        test,
      },
    ),
    Commands::VersionPlan {
      publish_dir,
      selection,
      force,
    } => commands::run_version_plan(
      &ctx,
      commands::PlanArgs {
        publish_dir,
        select: selection.select,
        force,
        test: false,
      },
    ),
    Commands::ShowPlan => commands::run_show_plan(&ctx),
    Commands::ApplyPlan => commands::run_apply_plan(&ctx),
    Commands::Graph {
      selection,
      show_external,
      show_versions,
    } => commands::run_graph(
      &ctx,
      &selection.select,
      DotOptions {
        show_external,
        show_versions,
      },
    ),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ForgeError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
