use log::warn;
use minijinja::Environment;
use regex::Regex;

pub use cruet::{
    case::{
        camel::to_camel_case, kebab::to_kebab_case, pascal::to_pascal_case,
        screaming_snake::to_screaming_snake_case, snake::to_snake_case,
        table::to_table_case, train::to_train_case,
    },
    string::{pluralize::to_plural, singularize::to_singular},
    suffix::foreign_key::to_foreign_key,
};

/// Registers the naming filters scripts use to turn project names into identifiers.
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("camel_case", to_camel_case);
    env.add_filter("kebab_case", to_kebab_case);
    env.add_filter("pascal_case", to_pascal_case);
    env.add_filter("screaming_snake_case", to_screaming_snake_case);
    env.add_filter("snake_case", to_snake_case);
    env.add_filter("table_case", to_table_case);
    env.add_filter("train_case", to_train_case);
    env.add_filter("plural", to_plural);
    env.add_filter("singular", to_singular);
    env.add_filter("foreign_key", to_foreign_key);
    env.add_filter("regex", regex_filter);
}

/// Tests whether `val` matches the pattern `re`.
///
/// An invalid pattern is logged and treated as "no match" so a typo in a
/// filter argument does not abort generation.
pub fn regex_filter(val: &str, re: &str) -> bool {
    match Regex::new(re) {
        Ok(re) => re.is_match(val),
        Err(err) => {
            warn!("Invalid regex '{re}': {err}");
            false
        }
    }
}
