/// Full schema, executed statement by statement under an advisory lock. The
/// venue table is owned by this subsystem; the social tables are owned by
/// external collaborators and created here only so a fresh database can serve
/// the read path.
pub fn render_schema() -> &'static str {
	SCHEMA
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS venues (
	provider_id TEXT PRIMARY KEY,
	name TEXT NOT NULL,
	name_localized TEXT,
	address TEXT,
	city TEXT,
	lat DOUBLE PRECISION,
	lng DOUBLE PRECISION,
	phone TEXT,
	website TEXT,
	rating REAL,
	review_count INTEGER,
	price_level INTEGER,
	categories TEXT[] NOT NULL DEFAULT '{}',
	kosher BOOLEAN NOT NULL DEFAULT FALSE,
	vegetarian BOOLEAN NOT NULL DEFAULT FALSE,
	opening_hours JSONB,
	photo_refs TEXT[] NOT NULL DEFAULT '{}',
	review_snippets TEXT[] NOT NULL DEFAULT '{}',
	summary_text TEXT,
	summary_embedding REAL[],
	reviews_embedding REAL[],
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_venues_geo ON venues (lat, lng);

CREATE INDEX IF NOT EXISTS idx_venues_city ON venues (city);

CREATE TABLE IF NOT EXISTS user_taste_profiles (
	user_id UUID PRIMARY KEY,
	taste_embedding REAL[],
	kosher BOOLEAN NOT NULL DEFAULT FALSE,
	vegetarian BOOLEAN NOT NULL DEFAULT FALSE,
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS profiles (
	user_id UUID PRIMARY KEY,
	username TEXT NOT NULL,
	avatar_url TEXT
);

CREATE TABLE IF NOT EXISTS follows (
	follower_id UUID NOT NULL,
	followee_id UUID NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	PRIMARY KEY (follower_id, followee_id)
);

CREATE TABLE IF NOT EXISTS reviews (
	review_id UUID PRIMARY KEY,
	venue_id TEXT NOT NULL REFERENCES venues (provider_id),
	user_id UUID NOT NULL,
	rating REAL,
	body TEXT,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_reviews_venue ON reviews (venue_id);

CREATE INDEX IF NOT EXISTS idx_reviews_created ON reviews (created_at DESC);

CREATE TABLE IF NOT EXISTS review_media (
	media_id UUID PRIMARY KEY,
	review_id UUID NOT NULL REFERENCES reviews (review_id),
	url TEXT NOT NULL,
	kind TEXT NOT NULL DEFAULT 'photo'
);

CREATE INDEX IF NOT EXISTS idx_review_media_review ON review_media (review_id);

CREATE TABLE IF NOT EXISTS review_likes (
	review_id UUID NOT NULL REFERENCES reviews (review_id),
	user_id UUID NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	PRIMARY KEY (review_id, user_id)
);

CREATE TABLE IF NOT EXISTS review_comments (
	comment_id UUID PRIMARY KEY,
	review_id UUID NOT NULL REFERENCES reviews (review_id),
	user_id UUID NOT NULL,
	body TEXT NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_review_comments_review ON review_comments (review_id);

CREATE TABLE IF NOT EXISTS wishlist_items (
	user_id UUID NOT NULL,
	venue_id TEXT NOT NULL REFERENCES venues (provider_id),
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	PRIMARY KEY (user_id, venue_id)
);
"#;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_contains_every_owned_and_collaborator_table() {
		let schema = render_schema();

		for table in [
			"venues",
			"user_taste_profiles",
			"profiles",
			"follows",
			"reviews",
			"review_media",
			"review_likes",
			"review_comments",
			"wishlist_items",
		] {
			assert!(
				schema.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
				"missing table {table}"
			);
		}
	}

	#[test]
	fn statements_split_cleanly_on_semicolons() {
		let statements: Vec<&str> = render_schema()
			.split(';')
			.map(str::trim)
			.filter(|statement| !statement.is_empty())
			.collect();

		assert!(statements.len() > 10);
		assert!(statements.iter().all(|statement| statement.starts_with("CREATE")));
	}
}
