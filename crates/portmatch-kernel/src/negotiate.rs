//! Per-port negotiation of requirements against offerings.
//!
//! Each requirement port is resolved on its own: find the offering with the
//! same `class/interface`, check the scalar/vector shapes agree, and for
//! vectors pick an entry count both sides accept. There is no search: the
//! first applicable sizing rule decides, and a bound violation is fatal.

use crate::error::{PortShape, ResolveError, Shortfall};
use crate::merge::merge_overrides;
use crate::port::{EntryLimit, OfferingSet, PortDescriptor, RequirementSet};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// A satisfied requirement port and the offering it was paired with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedMatch {
    pub requirement: PortDescriptor,
    pub offering: PortDescriptor,
    /// Present only for vector ports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_entries: Option<u64>,
}

/// Everything a renderer needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Resolution {
    pub requirements: RequirementSet,
    pub offerings: OfferingSet,
    pub matches: Vec<ResolvedMatch>,
    /// SHA-256 over the merged requirements, offerings and matches.
    pub digest: String,
}

impl Resolution {
    /// Bundle an already merged and negotiated run, stamping its digest.
    pub fn new(
        requirements: RequirementSet,
        offerings: OfferingSet,
        matches: Vec<ResolvedMatch>,
    ) -> Self {
        let digest = resolution_digest(&requirements, &offerings, &matches);
        Self {
            requirements,
            offerings,
            matches,
            digest,
        }
    }
}

/// Merge consumer overrides into `base`, then negotiate against `offerings`.
pub fn resolve(
    base: &RequirementSet,
    overrides: &[Value],
    overrides_origin: &str,
    offerings: &OfferingSet,
) -> Result<Resolution, ResolveError> {
    let requirements = merge_overrides(base, overrides, overrides_origin)?;
    let matches = negotiate(&requirements, offerings)?;
    Ok(Resolution::new(requirements, offerings.clone(), matches))
}

/// Resolve every requirement port in (`class`, `interface`) order.
///
/// Unmatched optional ports are skipped. Any other failure aborts the run and
/// no partial list is returned.
pub fn negotiate(
    requirements: &RequirementSet,
    offerings: &OfferingSet,
) -> Result<Vec<ResolvedMatch>, ResolveError> {
    let owner = requirements.name.as_str();
    let offering_name = offerings.name.as_str();
    log_ports(requirements, offerings);

    let mut matches = Vec::new();
    for requirement in requirements.sorted_ports() {
        let key = requirement.key();
        let Some(offering) = offerings.get(&key) else {
            if requirement.optional {
                debug!(port = %key, "skipping unmatched optional port");
                continue;
            }
            return Err(ResolveError::UnsatisfiedRequirement {
                owner: owner.to_string(),
                port: key.label(),
                offering: offering_name.to_string(),
            });
        };
        info!(port = %key.label(), "found match for port");

        let num_entries = match (requirement.vector, offering.vector) {
            (false, false) => None,
            (true, true) => Some(size_vector(requirement, offering, owner, offering_name)?),
            (requested, offered) => {
                return Err(ResolveError::VectorMismatch {
                    owner: owner.to_string(),
                    port: key.label(),
                    offering: offering_name.to_string(),
                    requested: PortShape::of(requested),
                    offered: PortShape::of(offered),
                });
            }
        };

        matches.push(ResolvedMatch {
            requirement: requirement.clone(),
            offering: offering.clone(),
            num_entries,
        });
    }
    Ok(matches)
}

/// Pick the entry count for a vector-to-vector match.
///
/// Rules, first applicable wins:
/// 1. requirement has no pinned maximum and its default fits the offering window;
/// 2. requirement has no pinned maximum and the offering default meets the
///    requirement minimum;
/// 3. the offering maximum.
///
/// The choice is then clamped to the requirement maximum and checked against
/// both minimums.
pub fn size_vector(
    requirement: &PortDescriptor,
    offering: &PortDescriptor,
    owner: &str,
    offering_name: &str,
) -> Result<u64, ResolveError> {
    let key = requirement.key();
    let EntryLimit::Bounded(offered_max) = offering.max_entries else {
        return Err(ResolveError::Schema {
            origin: offering_name.to_string(),
            detail: format!("offered vector port {} must declare max-entries", key.label()),
        });
    };
    if let Some(offered_default) = offering.default_entries
        && (offered_default < offering.min_entries || offered_default > offered_max)
    {
        return Err(ResolveError::Schema {
            origin: offering_name.to_string(),
            detail: format!(
                "offered vector port {} default-entries {offered_default} is outside [{}, {offered_max}]",
                key.label(),
                offering.min_entries
            ),
        });
    }
    let open_max = requirement.max_entries.is_unbounded();

    let mut entries = match (requirement.default_entries, offering.default_entries) {
        (Some(wanted), _)
            if open_max && wanted >= offering.min_entries && wanted <= offered_max =>
        {
            wanted
        }
        (_, Some(offered)) if open_max && offered >= requirement.min_entries => offered,
        _ => offered_max,
    };

    if let EntryLimit::Bounded(accepted_max) = requirement.max_entries
        && entries > accepted_max
    {
        entries = accepted_max;
    }

    let insufficient = |side: Shortfall, minimum: u64| ResolveError::InsufficientEntries {
        owner: owner.to_string(),
        port: key.label(),
        offering: offering_name.to_string(),
        shortfall: side,
        entries,
        minimum,
    };
    if entries < requirement.min_entries {
        return Err(insufficient(Shortfall::Requirement, requirement.min_entries));
    }
    if entries < offering.min_entries {
        return Err(insufficient(Shortfall::Offering, offering.min_entries));
    }

    debug!(port = %key, entries, "resolved vector length");
    Ok(entries)
}

fn log_ports(requirements: &RequirementSet, offerings: &OfferingSet) {
    debug!(owner = %requirements.name, "starting module ports match");
    for port in requirements.sorted_ports() {
        debug!(port = %port.key().label(), optional = port.optional, "requested");
    }
    for key in offerings.module_ports_offered.keys() {
        debug!(platform = %offerings.name, port = %key.label(), "offered");
    }
}

fn resolution_digest(
    requirements: &RequirementSet,
    offerings: &OfferingSet,
    matches: &[ResolvedMatch],
) -> String {
    let bytes = serde_json::to_vec(&(requirements, offerings, matches)).unwrap_or_default();
    let mut digest = Sha256::new();
    digest.update(bytes.as_slice());
    let output = digest.finalize();
    let mut rendered = String::with_capacity(output.len() * 2);
    for byte in output {
        rendered.push_str(format!("{byte:02x}").as_str());
    }
    rendered
}
