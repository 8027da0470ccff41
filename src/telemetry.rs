use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
	#[error("Invalid log directive {directive}: {source}")]
	InvalidDirective {
		directive: String,
		#[source]
		source: tracing_subscriber::filter::ParseError,
	},

	#[error("Tracing subscriber could not be installed: {0}")]
	Install(String),
}

/// Install the global fmt subscriber.
///
/// The filter starts from `RUST_LOG` and adds each of `directives`
/// (e.g. `"zcash_sync_bridge=debug"`). Fails instead of panicking when a
/// subscriber is already installed.
pub fn init_tracing(directives: &[&str]) -> Result<(), TelemetryError> {
	let mut filter = EnvFilter::from_default_env();
	for directive in directives {
		let parsed = directive
			.parse::<Directive>()
			.map_err(|source| TelemetryError::InvalidDirective {
				directive: directive.to_string(),
				source,
			})?;
		filter = filter.add_directive(parsed);
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.try_init()
		.map_err(|e| TelemetryError::Install(e.to_string()))
}
