use glob::{Pattern, PatternError};

/// Decides which package names take part in a run.
///
/// Patterns are globs; a leading `!` negates one. When the first pattern is
/// negated every name starts out selected, otherwise every name starts out
/// excluded. Patterns are then applied in order: a matching positive pattern
/// selects the name, a matching negated pattern drops it.
#[derive(Debug, Clone)]
pub struct Selection {
    rules: Vec<Rule>,
    default_selected: bool,
}

#[derive(Debug, Clone)]
struct Rule {
    negated: bool,
    pattern: Pattern,
}

impl Selection {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let rules = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                let (negated, glob) = match p.strip_prefix('!') {
                    Some(rest) => (true, rest),
                    None => (false, p),
                };
                Ok(Rule {
                    negated,
                    pattern: Pattern::new(glob)?,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        let default_selected = rules.first().is_none_or(|r| r.negated);

        Ok(Self {
            rules,
            default_selected,
        })
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.rules
            .iter()
            .fold(self.default_selected, |selected, rule| {
                if rule.pattern.matches(name) {
                    !rule.negated
                } else {
                    selected
                }
            })
    }
}
