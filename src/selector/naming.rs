//! Heuristics for names that were produced by tooling rather than authors.
//!
//! Generated ids and classes change between builds or page loads, so a
//! selector built on them would not replay. Each heuristic is a
//! [`NamingConvention`]; they are grouped per concern in [`GeneratedNames`]
//! and new conventions can be registered without touching the synthesizer.

use regex::Regex;
use std::sync::LazyLock;

/// A predicate recognising one family of machine-generated names
pub trait NamingConvention: Send + Sync {
    /// Short label used in logs
    fn label(&self) -> &str;

    fn is_generated(&self, name: &str) -> bool;
}

/// Convention backed by a list of regular expressions; any match counts
#[derive(Debug, Clone)]
pub struct PatternConvention {
    label: String,
    patterns: Vec<Regex>,
}

impl PatternConvention {
    pub fn new(label: impl Into<String>, patterns: Vec<Regex>) -> Self {
        Self { label: label.into(), patterns }
    }

    /// Compile a convention from pattern sources
    pub fn from_sources(label: impl Into<String>, sources: &[&str]) -> Result<Self, regex::Error> {
        let patterns = sources.iter().map(|s| Regex::new(s)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(label, patterns))
    }
}

impl NamingConvention for PatternConvention {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_generated(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }
}

/// An ordered set of conventions for one kind of name
#[derive(Default)]
pub struct NamingRules {
    conventions: Vec<Box<dyn NamingConvention>>,
}

impl NamingRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register another convention
    pub fn push(&mut self, convention: impl NamingConvention + 'static) {
        self.conventions.push(Box::new(convention));
    }

    pub fn with(mut self, convention: impl NamingConvention + 'static) -> Self {
        self.push(convention);
        self
    }

    /// Label of the first convention that claims `name`
    pub fn matched_by(&self, name: &str) -> Option<&str> {
        self.conventions.iter().find(|c| c.is_generated(name)).map(|c| c.label())
    }

    pub fn is_generated(&self, name: &str) -> bool {
        self.matched_by(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }
}

impl std::fmt::Debug for NamingRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.conventions.iter().map(|c| c.label())).finish()
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).expect("built-in naming pattern")).collect()
}

static HEX_DIGEST: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^[0-9a-fA-F]{8,}$",
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    ])
});

static NUMERIC: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&[r"^\d+$"]));

static FRAMEWORK_PREFIXED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^(ember|react|ng|vue|svelte|mui|radix|headlessui|rc|el|ui-id|select2|downshift|mat-|cdk-)[-_:]?\d+",
        r"^:r[0-9a-z]+:$",
        r"^radix-:",
    ])
});

static TIMESTAMP_SUFFIX: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&[r"[-_]?\d{10,13}$"]));

static LEGACY_AUTO_ID: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^(ext-gen|ext-comp|ext-element-|gwt-uid-|yui_|yui-gen|j_idt|ctl\d+_)",
        r"^(id|uid|gen|auto)[-_]?\d+$",
    ])
});

static HASHED_CLASS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^css-[a-z0-9]+(-[A-Za-z]+)?$",
        r"^sc-[a-zA-Z0-9]+$",
        r"^jsx-\d+$",
        r"^svelte-[a-z0-9]+$",
        r"^[A-Za-z][A-Za-z0-9]*_[A-Za-z0-9]+__[A-Za-z0-9_-]{5}$",
        r"^[a-z]+-[0-9a-f]{5,}$",
        r"^_[A-Za-z0-9_-]{5,}$",
    ])
});

static BUILD_TOOL_CLASS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^ng-(star-inserted|tns-|untouched|touched|pristine|dirty|valid|invalid|trigger)",
        r"^(v|fade|slide)-(enter|leave)",
        r"^data-v-[0-9a-f]+$",
    ])
});

static UTILITY_CLASS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r":",
        r"^-?[mp][trblxyse]?-\d",
        r"^(min-|max-)?[wh]-",
        r"^(text|bg|border|rounded|shadow|font)-(xs|sm|base|md|lg|\d?xl|left|center|right|bold|semibold|medium|normal|light|white|black|transparent|none|full|[a-z]+-\d{2,3})$",
        r"^(gap|space-[xy]|grid-cols|col-span|z|opacity|top|left|right|bottom|inset|order|leading|tracking)-\d",
        r"^(items|justify|self)-(start|end|center|between|around|stretch|baseline)$",
        r"^d-(none|block|flex|inline|inline-block|grid)$",
        r"^(flex|grid|block|inline|inline-block|hidden|relative|absolute|fixed|sticky|truncate|underline|uppercase|italic|clearfix)$",
    ])
});

static STATE_CLASS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[r"^(is-)?(active|selected|hover|hovered|focus|focused|disabled|open|show|visible|checked)$"])
});

static GENERATED_ATTRIBUTE_NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[r"^data-v-[0-9a-f]+$", r"^data-react", r"^data-qa-node$", r"^data-(emotion|styled)"])
});

static GENERATED_ATTRIBUTE_VALUE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^[0-9a-fA-F]{8,}$",
        r"^\d{5,}$",
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-",
    ])
});

/// Built-in conventions, grouped by the kind of name they judge
pub struct GeneratedNames {
    pub ids: NamingRules,
    pub classes: NamingRules,
    pub attribute_names: NamingRules,
    pub attribute_values: NamingRules,
}

impl Default for GeneratedNames {
    fn default() -> Self {
        let ids = NamingRules::new()
            .with(PatternConvention::new("hex-digest", HEX_DIGEST.clone()))
            .with(PatternConvention::new("numeric", NUMERIC.clone()))
            .with(PatternConvention::new("framework-prefixed", FRAMEWORK_PREFIXED.clone()))
            .with(PatternConvention::new("timestamp-suffixed", TIMESTAMP_SUFFIX.clone()))
            .with(PatternConvention::new("legacy-auto-id", LEGACY_AUTO_ID.clone()));

        let classes = NamingRules::new()
            .with(PatternConvention::new("hashed", HASHED_CLASS.clone()))
            .with(PatternConvention::new("build-tool", BUILD_TOOL_CLASS.clone()))
            .with(PatternConvention::new("utility", UTILITY_CLASS.clone()))
            .with(PatternConvention::new("state", STATE_CLASS.clone()));

        let attribute_names =
            NamingRules::new().with(PatternConvention::new("framework-attribute", GENERATED_ATTRIBUTE_NAME.clone()));

        let attribute_values =
            NamingRules::new().with(PatternConvention::new("opaque-value", GENERATED_ATTRIBUTE_VALUE.clone()));

        Self { ids, classes, attribute_names, attribute_values }
    }
}

impl std::fmt::Debug for GeneratedNames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedNames")
            .field("ids", &self.ids)
            .field("classes", &self.classes)
            .field("attribute_names", &self.attribute_names)
            .field("attribute_values", &self.attribute_values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids() {
        let names = GeneratedNames::default();
        for id in ["a3f9c2e1b7", "123456", "ember1234", "react-42", ":r1f:", "quiz_1700000000123", "ext-gen1021", "ctl00_main"] {
            assert!(names.ids.is_generated(id), "{id} should look generated");
        }
        for id in ["question-text", "answers", "main-content", "q1"] {
            assert!(!names.ids.is_generated(id), "{id} should look authored");
        }
    }

    #[test]
    fn test_generated_classes() {
        let names = GeneratedNames::default();
        assert_eq!(names.classes.matched_by("css-1q2w3e"), Some("hashed"));
        assert_eq!(names.classes.matched_by("Answer_choice__x8Yq2"), Some("hashed"));
        assert_eq!(names.classes.matched_by("ng-star-inserted"), Some("build-tool"));
        assert_eq!(names.classes.matched_by("hover:bg-blue-500"), Some("utility"));
        assert_eq!(names.classes.matched_by("mt-4"), Some("utility"));
        assert_eq!(names.classes.matched_by("selected"), Some("state"));

        for class in ["question", "answer-option", "choice", "correct", "qtext"] {
            assert!(!names.classes.is_generated(class), "{class} should look authored");
        }
    }

    #[test]
    fn test_attribute_values() {
        let names = GeneratedNames::default();
        assert!(names.attribute_values.is_generated("9f86d081884c"));
        assert!(names.attribute_values.is_generated("1234567"));
        assert!(!names.attribute_values.is_generated("answer"));
        assert!(!names.attribute_values.is_generated("42"));
        assert!(names.attribute_names.is_generated("data-v-7ba5bd90"));
        assert!(!names.attribute_names.is_generated("data-testid"));
    }

    struct PrefixConvention;

    impl NamingConvention for PrefixConvention {
        fn label(&self) -> &str {
            "lms-generated"
        }

        fn is_generated(&self, name: &str) -> bool {
            name.starts_with("yui3-")
        }
    }

    #[test]
    fn test_custom_convention_can_be_registered() {
        let mut names = GeneratedNames::default();
        let before = names.classes.len();
        assert!(!names.classes.is_generated("yui3-widget"));

        names.classes.push(PrefixConvention);
        assert_eq!(names.classes.len(), before + 1);
        assert_eq!(names.classes.matched_by("yui3-widget"), Some("lms-generated"));
    }

    #[test]
    fn test_pattern_convention_from_sources() {
        let convention = PatternConvention::from_sources("moodle", &[r"^yui_\d"]).unwrap();
        assert!(convention.is_generated("yui_3_17"));
        assert!(PatternConvention::from_sources("bad", &["("]).is_err());
    }
}
