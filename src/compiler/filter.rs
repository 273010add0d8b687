//! Include / exclude filter over module ids.

use regex::RegexSet;

#[derive(Debug, Clone)]
pub struct ModuleFilter {
    include: RegexSet,
    exclude: RegexSet,
}

impl ModuleFilter {
    /// Build from pattern lists. An empty include list matches everything.
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self, regex::Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Ok(Self {
            include: RegexSet::new(include)?,
            exclude: RegexSet::new(exclude)?,
        })
    }

    /// Whether `id` should be handled. Virtual ids (`\0` prefixed) never are.
    pub fn matches(&self, id: &str) -> bool {
        if id.contains('\0') {
            return false;
        }
        let id = id.replace('\\', "/");
        if self.exclude.is_match(&id) {
            return false;
        }
        self.include.is_empty() || self.include.is_match(&id)
    }
}

impl Default for ModuleFilter {
    fn default() -> Self {
        Self {
            include: RegexSet::new([r"\.vue$"]).expect("valid regex"),
            exclude: RegexSet::empty(),
        }
    }
}
