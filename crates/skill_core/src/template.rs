use std::collections::BTreeMap;

/// Named values substituted into `{key}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens(BTreeMap<String, String>);

impl Tokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Tokens {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tokens = Self::new();
        for (key, value) in iter {
            tokens.insert(key, value);
        }
        tokens
    }
}

/// Replaces every `{key}` with its token value in a single pass.
///
/// Unknown keys are left as written and substituted values are never
/// scanned again, so a value containing `{count}` stays literal.
pub fn render(template: &str, tokens: &Tokens) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let key = &after[..key_len];

        if !key.is_empty() && after[key_len..].starts_with('}') {
            if let Some(value) = tokens.get(key) {
                out.push_str(value);
                rest = &after[key_len + 1..];
                continue;
            }
        }

        out.push('{');
        rest = after;
    }

    out.push_str(rest);
    out
}

/// Joins items the way they are read aloud: "A and B", "A, B, and C".
pub fn join_english<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [head @ .., last] => {
            let mut out = String::new();
            for item in head {
                out.push_str(item.as_ref());
                out.push_str(", ");
            }
            out.push_str("and ");
            out.push_str(last.as_ref());
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_tokens() {
        let tokens = Tokens::new().with("count", 3);
        assert_eq!(render("Found {count} items", &tokens), "Found 3 items");
    }

    #[test]
    fn missing_tokens_stay_literal() {
        let tokens = Tokens::new().with("count", 3);
        assert_eq!(
            render("{count} of {total} for {name", &tokens),
            "3 of {total} for {name"
        );
    }

    #[test]
    fn repeated_tokens_are_all_replaced() {
        let tokens: Tokens = [("start", "1"), ("end", "5"), ("count", "12")]
            .into_iter()
            .collect();
        assert_eq!(
            render("Results {start} to {end} of {count}. {count} total.", &tokens),
            "Results 1 to 5 of 12. 12 total."
        );
    }

    #[test]
    fn substitution_is_not_recursive() {
        let tokens = Tokens::new()
            .with("items", "{count} widgets")
            .with("count", 2);
        assert_eq!(render("{items}", &tokens), "{count} widgets");
    }

    #[test]
    fn braces_without_keys_pass_through() {
        let tokens = Tokens::new().with("name", "Behr");
        assert_eq!(render("{} {{name}} {name!}", &tokens), "{} {Behr} {name!}");
    }

    #[test]
    fn joins_like_spoken_english() {
        let empty: [&str; 0] = [];
        assert_eq!(join_english(&empty), "");
        assert_eq!(join_english(&["Behr"]), "Behr");
        assert_eq!(join_english(&["Behr", "Kenmore"]), "Behr and Kenmore");
        assert_eq!(
            join_english(&["AV", "Ceilings", "Flooring"]),
            "AV, Ceilings, and Flooring"
        );
    }
}
