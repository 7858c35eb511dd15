//! Declarative flag constraints checked before a command does any work.

use crate::error::{CommandError, Result};

/// Presence of each flag relevant to a command, by long name.
#[derive(Debug, Default)]
pub struct FlagSet {
    present: Vec<(&'static str, bool)>,
}

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whether `flag` was given.
    #[must_use]
    pub fn with(mut self, flag: &'static str, present: bool) -> Self {
        self.present.push((flag, present));
        self
    }

    fn is_set(&self, flag: &str) -> bool {
        self.present
            .iter()
            .any(|(name, present)| *name == flag && *present)
    }

    fn count(&self, flags: &[&str]) -> usize {
        flags.iter().filter(|flag| self.is_set(flag)).count()
    }
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    ExactlyOneOf(&'static [&'static str]),
    AtLeastOneOf(&'static [&'static str]),
    AtMostOneOf(&'static [&'static str]),
    Requires {
        flag: &'static str,
        required: &'static str,
    },
}

/// A single constraint over a [`FlagSet`].
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    rule: Rule,
    missing: Option<&'static str>,
}

impl Constraint {
    const fn new(rule: Rule) -> Self {
        Self {
            rule,
            missing: None,
        }
    }

    /// Exactly one of `flags` must be given.
    #[must_use]
    pub const fn exactly_one_of(flags: &'static [&'static str]) -> Self {
        Self::new(Rule::ExactlyOneOf(flags))
    }

    /// At least one of `flags` must be given.
    #[must_use]
    pub const fn at_least_one_of(flags: &'static [&'static str]) -> Self {
        Self::new(Rule::AtLeastOneOf(flags))
    }

    /// No more than one of `flags` may be given.
    #[must_use]
    pub const fn at_most_one_of(flags: &'static [&'static str]) -> Self {
        Self::new(Rule::AtMostOneOf(flags))
    }

    /// `flag` may only be given together with `required`.
    #[must_use]
    pub const fn requires(flag: &'static str, required: &'static str) -> Self {
        Self::new(Rule::Requires { flag, required })
    }

    /// Override the message used when a required flag is absent.
    #[must_use]
    pub const fn missing_message(mut self, message: &'static str) -> Self {
        self.missing = Some(message);
        self
    }

    fn check(&self, flags: &FlagSet) -> Option<String> {
        match self.rule {
            Rule::ExactlyOneOf(names) => match flags.count(names) {
                0 => Some(self.missing_text(names)),
                1 => None,
                _ => Some(Self::conflict_text(names)),
            },
            Rule::AtLeastOneOf(names) => {
                (flags.count(names) == 0).then(|| self.missing_text(names))
            }
            Rule::AtMostOneOf(names) => (flags.count(names) > 1).then(|| Self::conflict_text(names)),
            Rule::Requires { flag, required } => {
                (flags.is_set(flag) && !flags.is_set(required)).then(|| {
                    self.missing.map_or_else(
                        || format!("you must provide --{required} when using --{flag}"),
                        str::to_string,
                    )
                })
            }
        }
    }

    fn missing_text(&self, names: &[&str]) -> String {
        self.missing
            .map_or_else(|| format!("you must provide {}", join(names)), str::to_string)
    }

    fn conflict_text(names: &[&str]) -> String {
        format!("you may only provide one of {}", join(names))
    }
}

fn join(names: &[&str]) -> String {
    let flags: Vec<String> = names.iter().map(|name| format!("--{name}")).collect();
    match flags.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {last}", rest.join(", ")),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

/// Check `constraints` in order and report the first one violated.
///
/// # Errors
/// Returns [`CommandError::Validation`] naming the violated constraint.
pub fn validate(flags: &FlagSet, constraints: &[Constraint]) -> Result<()> {
    match constraints.iter().find_map(|constraint| constraint.check(flags)) {
        Some(message) => Err(CommandError::Validation(message)),
        None => Ok(()),
    }
}
