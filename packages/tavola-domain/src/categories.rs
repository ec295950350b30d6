/// Closed category vocabulary. The summarizer is asked for at most two of
/// these; anything outside the set is dropped at validation.
pub const VOCABULARY: &[&str] = &[
	"asian",
	"bakery",
	"bar",
	"breakfast",
	"burger",
	"cafe",
	"dessert",
	"fine_dining",
	"french",
	"italian",
	"japanese",
	"kosher",
	"mediterranean",
	"middle_eastern",
	"pizza",
	"seafood",
	"steakhouse",
	"street_food",
	"sushi",
	"vegan",
	"vegetarian",
];

pub const MAX_CATEGORIES: usize = 2;

pub fn in_vocabulary(category: &str) -> bool {
	VOCABULARY.binary_search(&category).is_ok()
}

/// Lowercases, trims, drops out-of-vocabulary entries and duplicates, and
/// caps the list at [`MAX_CATEGORIES`].
pub fn sanitize(raw: &[String]) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(MAX_CATEGORIES);

	for category in raw {
		let normalized = category.trim().to_lowercase().replace([' ', '-'], "_");

		if !in_vocabulary(&normalized) || out.contains(&normalized) {
			continue;
		}

		out.push(normalized);

		if out.len() == MAX_CATEGORIES {
			break;
		}
	}

	out
}

/// Fallback mapping from the provider's raw type taxonomy, used when the
/// summarizer returns nothing usable.
pub fn from_provider_types(types: &[String]) -> Vec<String> {
	let mut raw = Vec::new();

	for provider_type in types {
		let mapped = match provider_type.as_str() {
			"bakery" => "bakery",
			"bar" | "night_club" => "bar",
			"cafe" | "coffee_shop" => "cafe",
			"meal_takeaway" | "meal_delivery" => "street_food",
			"japanese_restaurant" => "japanese",
			"sushi_restaurant" => "sushi",
			"italian_restaurant" => "italian",
			"pizza_restaurant" => "pizza",
			"hamburger_restaurant" => "burger",
			"seafood_restaurant" => "seafood",
			"steak_house" => "steakhouse",
			"vegan_restaurant" => "vegan",
			"vegetarian_restaurant" => "vegetarian",
			"breakfast_restaurant" | "brunch_restaurant" => "breakfast",
			_ => continue,
		};

		raw.push(mapped.to_string());
	}

	sanitize(&raw)
}

/// Dietary flags derived from the accepted categories.
pub fn dietary_flags(categories: &[String]) -> (bool, bool) {
	let kosher = categories.iter().any(|category| category == "kosher");
	let vegetarian =
		categories.iter().any(|category| category == "vegan" || category == "vegetarian");

	(kosher, vegetarian)
}
