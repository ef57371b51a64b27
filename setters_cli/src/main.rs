use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use setters_cli::OutputFormat;
use setters_cli::SettersCli;
use setters_core::Discovery;
use setters_core::list_setters;
use setters_core::package::scan_package_with_config;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = SettersCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	if let Err(e) = run_list(&args) {
		match e.downcast::<setters_core::SettersError>() {
			Ok(setters_err) => {
				let report: miette::Report = (*setters_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("setters_core=debug,error")
		} else {
			EnvFilter::new("error")
		}
	});

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(verbose)
		.try_init();
}

fn resolve_root(args: &SettersCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_list(args: &SettersCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let documents = scan_package_with_config(&root)?;
	let discovery = list_setters(&documents)?;

	match args.format {
		OutputFormat::Text => print_text(&discovery),
		OutputFormat::Json => print_json(&discovery)?,
	}

	Ok(())
}

fn print_text(discovery: &Discovery) {
	for warning in &discovery.warnings {
		let report = miette::Report::new(warning.clone());
		eprintln!("{report:?}");
	}

	if discovery.results.is_empty() {
		println!("{}", colored!("No setters found.", yellow));
		return;
	}

	for setter in &discovery.results {
		println!("{setter}");
	}
}

fn print_json(discovery: &Discovery) -> Result<(), Box<dyn std::error::Error>> {
	let warnings: Vec<String> = discovery
		.warnings
		.iter()
		.map(ToString::to_string)
		.collect();
	let output = serde_json::json!({
		"setters": discovery.results,
		"warnings": warnings,
	});
	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}
