//! Reference resolution — turning `$NAME`, `${NAME}`, and `<option-name>`
//! configuration scalars into concrete runtime values.
//!
//! Resolution reads immutable snapshots captured once at startup, so the
//! compiled table cannot drift if the process environment changes later.
//! A miss resolves to the empty string; a string matching neither pattern is
//! a literal and passes through unchanged.

use std::collections::HashMap;

use serde_json::Value;

/// Immutable snapshot of the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// An empty snapshot. Every environment reference resolves to `""`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from explicit pairs (tests, hosts with synthetic
    /// environments).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Immutable snapshot of parsed command-line option values.
///
/// Option names are canonicalized to underscores, so `<fluentd-tag>` and a
/// flag registered as `fluentd-tag` meet at `fluentd_tag`.
#[derive(Debug, Clone, Default)]
pub struct ArgSnapshot {
    options: HashMap<String, String>,
}

impl ArgSnapshot {
    /// An empty snapshot. Every argument reference resolves to `""`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record an option value under its canonical name.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.options.insert(canonical(name), value.into());
    }

    /// Build a snapshot from explicit `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut snapshot = Self::empty();
        for (name, value) in pairs {
            snapshot.set(name.as_ref(), value);
        }
        snapshot
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.options.get(&canonical(name)).map(String::as_str)
    }
}

fn canonical(name: &str) -> String {
    name.replace('-', "_")
}

/// Resolves reference strings against an environment snapshot and an
/// argument snapshot. Pure: same snapshots, same answers.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    env: EnvSnapshot,
    args: ArgSnapshot,
}

impl Resolver {
    pub fn new(env: EnvSnapshot, args: ArgSnapshot) -> Self {
        Self { env, args }
    }

    /// Resolve one scalar. The environment pattern is checked first, then
    /// the argument pattern; anything else is a literal.
    pub fn resolve(&self, value: &str) -> String {
        if let Some(name) = env_identifier(value) {
            self.env.get(name).unwrap_or_default().to_string()
        } else if let Some(name) = arg_identifier(value) {
            self.args.get(name).unwrap_or_default().to_string()
        } else {
            value.to_string()
        }
    }

    /// Resolve the string leaves of a settings value, one level deep:
    /// scalars directly, mapping values and sequence elements each on their
    /// own. Non-string leaves pass through untouched.
    pub fn resolve_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.resolve(s)),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve_leaf(v)))
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.resolve_leaf(v)).collect())
            }
            other => other.clone(),
        }
    }

    /// Resolve the string values of a mapping, leaving keys and non-string
    /// values alone. Used for the `replace.keys`/`replace.values` submaps and
    /// the `add` block.
    pub fn resolve_map(
        &self,
        map: &serde_json::Map<String, Value>,
    ) -> serde_json::Map<String, Value> {
        map.iter()
            .map(|(k, v)| (k.clone(), self.resolve_leaf(v)))
            .collect()
    }

    fn resolve_leaf(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.resolve(s)),
            other => other.clone(),
        }
    }
}

/// `$NAME` or `${NAME}`, identifier `[A-Za-z0-9_]+`, each brace optional.
fn env_identifier(value: &str) -> Option<&str> {
    let rest = value.strip_prefix('$')?;
    let rest = rest.strip_prefix('{').unwrap_or(rest);
    let rest = rest.strip_suffix('}').unwrap_or(rest);
    (!rest.is_empty()
        && rest
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_'))
    .then_some(rest)
}

/// `<name>`, identifier `[A-Za-z0-9_-]+`.
fn arg_identifier(value: &str) -> Option<&str> {
    let rest = value.strip_prefix('<')?.strip_suffix('>')?;
    (!rest.is_empty()
        && rest
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-'))
    .then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> Resolver {
        Resolver::new(
            EnvSnapshot::from_pairs([("USE_ENV", "hello")]),
            ArgSnapshot::from_pairs([("fluentd-tag", "test"), ("fluentd-label", "pytest")]),
        )
    }

    #[test]
    fn env_reference_with_and_without_braces() {
        let r = resolver();
        assert_eq!(r.resolve("${USE_ENV}"), "hello");
        assert_eq!(r.resolve("$USE_ENV"), "hello");
    }

    #[test]
    fn missing_env_resolves_to_empty() {
        assert_eq!(resolver().resolve("${MISSING}"), "");
    }

    #[test]
    fn arg_reference_with_hyphen_translation() {
        let r = resolver();
        assert_eq!(r.resolve("<fluentd-tag>"), "test");
        assert_eq!(r.resolve("<fluentd_tag>"), "test");
    }

    #[test]
    fn missing_arg_resolves_to_empty() {
        assert_eq!(resolver().resolve("<unknown-option>"), "");
    }

    #[test]
    fn literal_passes_through() {
        let r = resolver();
        assert_eq!(r.resolve("run"), "run");
        assert_eq!(r.resolve("a $literal inside"), "a $literal inside");
        assert_eq!(r.resolve("<not closed"), "<not closed");
        assert_eq!(r.resolve("$"), "$");
    }

    #[test]
    fn env_pattern_checked_before_arg_pattern() {
        // "$<x>" is neither; "$X" is env even when an arg named X exists.
        let r = Resolver::new(
            EnvSnapshot::from_pairs([("X", "env")]),
            ArgSnapshot::from_pairs([("X", "arg")]),
        );
        assert_eq!(r.resolve("$X"), "env");
        assert_eq!(r.resolve("<X>"), "arg");
    }

    #[test]
    fn snapshot_is_isolated_from_later_env_changes() {
        let snapshot = EnvSnapshot::from_pairs([("FROZEN", "before")]);
        let r = Resolver::new(snapshot, ArgSnapshot::empty());
        // SAFETY: single-threaded test process.
        unsafe { std::env::set_var("FROZEN", "after") };
        assert_eq!(r.resolve("${FROZEN}"), "before");
    }

    #[test]
    fn resolve_value_recurses_one_level() {
        let r = resolver();
        let value = json!({"info": "${USE_ENV}", "count": 3});
        assert_eq!(
            r.resolve_value(&value),
            json!({"info": "hello", "count": 3})
        );

        let list = json!(["<fluentd-tag>", 1]);
        assert_eq!(r.resolve_value(&list), json!(["test", 1]));
    }

    #[test]
    fn nested_structures_below_one_level_are_untouched() {
        let r = resolver();
        let value = json!({"nested": {"deep": "${USE_ENV}"}});
        assert_eq!(r.resolve_value(&value), value);
    }
}
