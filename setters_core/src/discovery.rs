use crate::DiscoveryWarning;
use crate::SettersResult;
use crate::document::Document;
use crate::manifest::ManifestSeed;
use crate::manifest::find_setters_from_kptfile;
use crate::registry::DiscoveryResult;
use crate::registry::SetterRegistry;
use crate::walker::SetterWalker;

/// Discovers the setters used in a set of package documents.
///
/// Setters declared by the Kptfile's apply-setters function are seeded first
/// with a count of zero, then every document is walked and each field comment
/// carrying a setter marker creates or bumps an entry.
#[derive(Debug, Clone, Default)]
pub struct ListSetters {
	registry: SetterRegistry,
	warnings: Vec<DiscoveryWarning>,
}

impl ListSetters {
	pub fn new() -> Self {
		Self::default()
	}

	/// Run discovery over `documents`. The documents are only read, and are
	/// returned to the caller untouched.
	///
	/// Calling `filter` more than once accumulates counts into the same
	/// registry.
	pub fn filter(&mut self, documents: &[Document]) -> SettersResult<()> {
		match find_setters_from_kptfile(documents)? {
			ManifestSeed::Setters(setters) => {
				tracing::debug!(count = setters.len(), "seeding setters from Kptfile");
				for (name, value) in setters {
					self.registry.seed(&name, value);
				}
			}
			ManifestSeed::Skipped(warning) => {
				tracing::warn!(%warning, "continuing without Kptfile setters");
				self.warnings.push(warning);
			}
		}

		let mut walker = SetterWalker::new(&mut self.registry);
		for document in documents {
			walker.walk(document);
		}

		Ok(())
	}

	pub fn registry(&self) -> &SetterRegistry {
		&self.registry
	}

	/// The discovered setters sorted by name.
	pub fn results(&self) -> Vec<DiscoveryResult> {
		self.registry.results()
	}

	pub fn warnings(&self) -> &[DiscoveryWarning] {
		&self.warnings
	}
}

/// The sorted setters of one discovery pass and any warnings it raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
	pub results: Vec<DiscoveryResult>,
	pub warnings: Vec<DiscoveryWarning>,
}

/// Run a single discovery pass over `documents`.
pub fn list_setters(documents: &[Document]) -> SettersResult<Discovery> {
	let mut list = ListSetters::new();
	list.filter(documents)?;

	Ok(Discovery {
		results: list.results(),
		warnings: list.warnings,
	})
}
