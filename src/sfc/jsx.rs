//! Markup-in-script sniffing.
//!
//! Detection is a best-effort heuristic; false positives and negatives are
//! accepted. Hosts that know better plug in their own [`MarkupDetector`].

use regex::Regex;

use crate::core::Block;

/// Decides whether logic code contains embedded markup (JSX).
pub trait MarkupDetector: Send + Sync {
    fn looks_like_markup(&self, code: &str) -> bool;
}

/// Regex-backed detector. Default pattern matches anything tag-shaped.
#[derive(Debug, Clone)]
pub struct RegexMarkupDetector {
    pattern: Regex,
}

impl RegexMarkupDetector {
    pub const DEFAULT_PATTERN: &'static str = r"<[^>]+>";

    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Default for RegexMarkupDetector {
    fn default() -> Self {
        Self {
            pattern: Regex::new(Self::DEFAULT_PATTERN).expect("valid regex"),
        }
    }
}

impl MarkupDetector for RegexMarkupDetector {
    fn looks_like_markup(&self, code: &str) -> bool {
        self.pattern.is_match(code)
    }
}

/// Tag a script section as `jsx` when it has no language and looks like markup.
///
/// Returns true when the tag was added.
pub fn infer_script_lang(script: &mut Block, detector: &dyn MarkupDetector) -> bool {
    if script.lang.is_some() || !detector.looks_like_markup(&script.content) {
        return false;
    }
    script.set_lang("jsx");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BlockKind;
    use crate::core::block::test_block;

    struct Never;

    impl MarkupDetector for Never {
        fn looks_like_markup(&self, _: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_default_detector() {
        let d = RegexMarkupDetector::default();
        assert!(d.looks_like_markup("render() { return <div>hi</div> }"));
        assert!(!d.looks_like_markup("export default { data() { return {} } }"));
    }

    #[test]
    fn test_infer_sets_jsx_when_untagged() {
        let mut script = test_block(BlockKind::Script, "const a = <p/>", &[]);
        assert!(infer_script_lang(&mut script, &RegexMarkupDetector::default()));
        assert_eq!(script.lang.as_deref(), Some("jsx"));
        assert!(script.has_attr("lang"));
    }

    #[test]
    fn test_infer_keeps_explicit_lang() {
        let mut script = test_block(BlockKind::Script, "const a = <p/>", &[("lang", Some("tsx"))]);
        assert!(!infer_script_lang(&mut script, &RegexMarkupDetector::default()));
        assert_eq!(script.lang.as_deref(), Some("tsx"));
    }

    #[test]
    fn test_infer_respects_pluggable_detector() {
        let mut script = test_block(BlockKind::Script, "const a = <p/>", &[]);
        assert!(!infer_script_lang(&mut script, &Never));
        assert!(script.lang.is_none());
    }

    #[test]
    fn test_custom_pattern() {
        let d = RegexMarkupDetector::new(r"<[A-Z][A-Za-z]*").unwrap();
        assert!(d.looks_like_markup("<Foo />"));
        assert!(!d.looks_like_markup("<div>"));
        assert!(RegexMarkupDetector::new("(").is_err());
    }
}
