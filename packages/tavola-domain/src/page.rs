/// In-memory pagination over an already-filtered set. Pages count from zero;
/// the flag reports whether later pages remain.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> (Vec<T>, bool) {
	if limit == 0 {
		return (Vec::new(), false);
	}

	let offset = page.saturating_mul(limit);

	if offset >= items.len() {
		return (Vec::new(), false);
	}

	let end = (offset + limit).min(items.len());

	(items[offset..end].to_vec(), end < items.len())
}
