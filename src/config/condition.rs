//! Conditions written in recipe files.
//!
//! A [`Condition`] is the data form of a [`Predicate`]. Recipe files use it
//! wherever the builder API takes a predicate:
//!
//! ```yaml
//! when:
//!   all:
//!     - enabled: universal
//!     - not: { os: linux }
//! ```

use std::fmt;

use schemars::JsonSchema;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::recipe::Predicate;
use crate::requirements::{Compiler, CpuFamily, Os};

/// A boolean condition over the build state.
///
/// Written as a bare word (`always`, `never`) or as a map with exactly one
/// key naming the check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    Never,
    /// A boolean option is on.
    Enabled(String),
    /// A boolean option is off.
    Disabled(String),
    /// A valued option has exactly this value.
    Equals { option: String, value: String },
    /// The host runs this operating system.
    Os(Os),
    /// The host CPU family.
    Cpu(CpuFamily),
    /// The host word width in bits.
    WordWidth(u8),
    /// The chosen compiler (host default before compilation).
    Compiler(Compiler),
    /// A dependency is part of the install plan.
    Planned(String),
    /// A tool is on the search path.
    ToolPresent(String),
    /// A tool's binary holds every universal architecture.
    ToolUniversal(String),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

const CONDITION_KEYS: &[&str] = &[
    "always",
    "never",
    "enabled",
    "disabled",
    "equals",
    "os",
    "cpu",
    "word_width",
    "compiler",
    "planned",
    "tool_present",
    "tool_universal",
    "all",
    "any",
    "not",
];

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EqualsArgs {
    option: String,
    value: String,
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ConditionVisitor)
    }
}

struct ConditionVisitor;

impl<'de> Visitor<'de> for ConditionVisitor {
    type Value = Condition;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("`always`, `never` or a single-key map such as `{ enabled: <option> }`")
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Condition, E>
    where
        E: de::Error,
    {
        match value {
            "always" => Ok(Condition::Always),
            "never" => Ok(Condition::Never),
            other => Err(E::unknown_variant(other, &["always", "never"])),
        }
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Condition, A::Error>
    where
        A: MapAccess<'de>,
    {
        let key: String = map
            .next_key()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let condition = match key.as_str() {
            "always" => {
                map.next_value::<IgnoredAny>()?;
                Condition::Always
            }
            "never" => {
                map.next_value::<IgnoredAny>()?;
                Condition::Never
            }
            "enabled" => Condition::Enabled(map.next_value()?),
            "disabled" => Condition::Disabled(map.next_value()?),
            "equals" => {
                let EqualsArgs { option, value } = map.next_value()?;
                Condition::Equals { option, value }
            }
            "os" => Condition::Os(map.next_value()?),
            "cpu" => Condition::Cpu(map.next_value()?),
            "word_width" => Condition::WordWidth(map.next_value()?),
            "compiler" => Condition::Compiler(map.next_value()?),
            "planned" => Condition::Planned(map.next_value()?),
            "tool_present" => Condition::ToolPresent(map.next_value()?),
            "tool_universal" => Condition::ToolUniversal(map.next_value()?),
            "all" => Condition::All(map.next_value()?),
            "any" => Condition::Any(map.next_value()?),
            "not" => Condition::Not(Box::new(map.next_value()?)),
            other => return Err(de::Error::unknown_variant(other, CONDITION_KEYS)),
        };
        if map.next_key::<IgnoredAny>()?.is_some() {
            return Err(de::Error::custom(
                "a condition has exactly one key; combine checks with `all` or `any`",
            ));
        }
        Ok(condition)
    }
}

impl Condition {
    /// Convert to a predicate.
    pub fn to_predicate(&self) -> Predicate {
        match self {
            Condition::Always => Predicate::always(),
            Condition::Never => Predicate::never(),
            Condition::Enabled(key) => Predicate::enabled(key.clone()),
            Condition::Disabled(key) => Predicate::disabled(key.clone()),
            Condition::Equals { option, value } => {
                let (option, value) = (option.clone(), value.clone());
                Predicate::new(format!("{}={}", option, value), move |s| {
                    s.selection.text(&option) == Some(value.as_str())
                })
            }
            Condition::Os(os) => {
                let os = *os;
                Predicate::new(format!("os {:?}", os), move |s| s.host.os() == os)
            }
            Condition::Cpu(family) => {
                let family = *family;
                Predicate::new(format!("cpu {:?}", family), move |s| {
                    s.host.cpu_family() == family
                })
            }
            Condition::WordWidth(width) => {
                let width = *width;
                Predicate::new(format!("{}-bit", width), move |s| s.host.word_width() == width)
            }
            Condition::Compiler(compiler) => {
                let compiler = *compiler;
                Predicate::new(format!("compiler {}", compiler), move |s| {
                    s.effective_compiler() == compiler
                })
            }
            Condition::Planned(name) => {
                let name = name.clone();
                Predicate::new(format!("{} planned", name), move |s| s.planned(&name))
            }
            Condition::ToolPresent(tool) => {
                let tool = tool.clone();
                Predicate::new(format!("{} is installed", tool), move |s| {
                    s.host.tool_present(&tool)
                })
            }
            Condition::ToolUniversal(tool) => {
                let tool = tool.clone();
                Predicate::new(format!("{} is universal", tool), move |s| {
                    s.host.tool_is_universal(&tool)
                })
            }
            Condition::All(items) => items
                .iter()
                .map(Condition::to_predicate)
                .reduce(Predicate::and)
                .unwrap_or_else(Predicate::always),
            Condition::Any(items) => items
                .iter()
                .map(Condition::to_predicate)
                .reduce(Predicate::or)
                .unwrap_or_else(Predicate::never),
            Condition::Not(inner) => inner.to_predicate().negate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{OptionRegistry, OptionSpec};
    use crate::recipe::Scope;
    use crate::requirements::{Arch, StaticHostFacts};

    fn eval(yaml: &str, args: &[&str], host: &StaticHostFacts) -> bool {
        let condition: Condition = serde_yaml::from_str(yaml).unwrap();
        let mut registry = OptionRegistry::new();
        registry.register(OptionSpec::flag("universal", "")).unwrap();
        registry.register(OptionSpec::valued("layout", "tagged", "")).unwrap();
        let selection = registry.resolve(args).unwrap();
        condition.to_predicate().eval(&Scope::new(&selection, host))
    }

    #[test]
    fn option_conditions() {
        let host = StaticHostFacts::new();
        assert!(eval("enabled: universal", &["--universal"], &host));
        assert!(eval("disabled: universal", &[], &host));
        assert!(eval("equals: { option: layout, value: tagged }", &[], &host));
        assert!(!eval(
            "equals: { option: layout, value: system }",
            &[],
            &host
        ));
    }

    #[test]
    fn unit_conditions_parse_as_strings() {
        let host = StaticHostFacts::new();
        assert!(eval("always", &[], &host));
        assert!(!eval("never", &[], &host));
    }

    #[test]
    fn host_conditions() {
        let host = StaticHostFacts::new()
            .with_cpu(crate::requirements::CpuFamily::X86, 32)
            .with_tool("python", vec![Arch::I386, Arch::X86_64]);
        assert!(eval("word_width: 32", &[], &host));
        assert!(eval("cpu: x86", &[], &host));
        assert!(!eval("cpu: ppc", &[], &host));
        assert!(eval("os: linux", &[], &host));
        assert!(eval("compiler: gcc", &[], &host));
        assert!(eval("tool_universal: python", &[], &host));
        assert!(!eval("tool_present: pkg-config", &[], &host));
    }

    #[test]
    fn combinators() {
        let host = StaticHostFacts::new();
        let yaml = "all:\n  - enabled: universal\n  - not: { os: macos }\n";
        assert!(eval(yaml, &["--universal"], &host));
        assert!(!eval(yaml, &[], &host));
        assert!(eval("any: [never, { disabled: universal }]", &[], &host));
        assert!(eval("all: []", &[], &host));
        assert!(!eval("any: []", &[], &host));
    }

    #[test]
    fn nested_maps_inside_a_recipe_field() {
        #[derive(Deserialize)]
        struct Rule {
            when: Condition,
        }
        let rule: Rule = serde_yaml::from_str(
            "when: { any: [{ cpu: ppc }, { word_width: 32 }, { enabled: universal }] }\n",
        )
        .unwrap();
        assert_eq!(
            rule.when,
            Condition::Any(vec![
                Condition::Cpu(crate::requirements::CpuFamily::Ppc),
                Condition::WordWidth(32),
                Condition::Enabled("universal".to_string()),
            ])
        );
    }

    #[test]
    fn malformed_conditions_are_rejected() {
        assert!(serde_yaml::from_str::<Condition>("sometimes").is_err());
        assert!(serde_yaml::from_str::<Condition>("enabeld: universal").is_err());
        assert!(serde_yaml::from_str::<Condition>("{ enabled: a, disabled: b }").is_err());
        assert!(serde_yaml::from_str::<Condition>("{}").is_err());
    }
}
