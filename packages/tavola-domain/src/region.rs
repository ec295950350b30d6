/// How the two region-membership signals combine. The source system accepted
/// a candidate when either signal passed; that stays the default, with the
/// stricter readings selectable instead of hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipPolicy {
	/// Accept when coordinates fall in the box or the locality name matches.
	CoordsOrName,
	/// Accept only when both signals pass.
	CoordsAndName,
	/// Coordinates decide; the name only controls the canonical override.
	CoordsOverName,
}
impl MembershipPolicy {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"coords_or_name" => Some(Self::CoordsOrName),
			"coords_and_name" => Some(Self::CoordsAndName),
			"coords_over_name" => Some(Self::CoordsOverName),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
	/// In-region. When the provider's locality name did not match, it is
	/// overridden to the canonical name rather than trusted.
	Accepted { canonical_override: bool },
	Rejected,
}

pub fn evaluate(policy: MembershipPolicy, in_bounds: bool, name_matches: bool) -> Membership {
	let accepted = match policy {
		MembershipPolicy::CoordsOrName => in_bounds || name_matches,
		MembershipPolicy::CoordsAndName => in_bounds && name_matches,
		MembershipPolicy::CoordsOverName => in_bounds,
	};

	if accepted {
		Membership::Accepted { canonical_override: in_bounds && !name_matches }
	} else {
		Membership::Rejected
	}
}

pub fn name_matches(locality: &str, canonical_names: &[String]) -> bool {
	let trimmed = locality.trim();

	canonical_names.iter().any(|name| name.trim().eq_ignore_ascii_case(trimmed))
}
