pub mod categories;
pub mod geo;
pub mod grid;
pub mod hours;
pub mod page;
pub mod region;
pub mod score;
