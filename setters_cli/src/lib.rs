use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "List the setters used in a kpt package.",
	long_about = "list-setters reads every resource of a kpt package and reports the setters \
	              declared through `# kpt-set: <pattern>` field comments.\n\nSetters declared \
	              by the apply-setters function of the Kptfile pipeline are listed too, with a \
	              count of zero when no field uses them.\n\nEach setter is reported with its \
	              current value, its type (`string` or `list`) and the number of fields it \
	              controls."
)]
pub struct SettersCli {
	/// Path to the package root directory.
	#[arg(long, short)]
	pub path: Option<PathBuf>,

	/// Output format. Use `text` for one line per setter or `json` for
	/// programmatic consumption.
	#[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Enable verbose output. Logs every discovered setter to stderr.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output.
	Text,
	/// JSON output with a `setters` array and a `warnings` array.
	Json,
}
